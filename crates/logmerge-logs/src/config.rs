//! Pattern document loading.
//!
//! The document is a YAML mapping from component name to
//! [`ComponentConfig`]. Mapping order is kept: it decides which component
//! claims a file when several file patterns match.

use std::path::Path;

use regex::Regex;
use serde_yaml_ng::{Mapping, Value};

use logmerge_types::ComponentConfig;

use crate::error::{LogError, Result};
use crate::highlight::CompiledRule;

/// Name of the capture group every line format must define
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// A component with all of its regexes compiled
#[derive(Clone, Debug)]
pub struct CompiledComponent {
    pub name: String,
    pub config: ComponentConfig,
    file_pattern: Regex,
    line_format: Regex,
    rules: Vec<CompiledRule>,
}

impl CompiledComponent {
    pub fn compile(name: &str, config: ComponentConfig) -> Result<Self> {
        let file_pattern = anchored(name, "file name", &config.file_name_pattern)?;
        let line_format = anchored(name, "line format", &config.line_format)?;

        if !line_format
            .capture_names()
            .any(|group| group == Some(TIMESTAMP_FIELD))
        {
            return Err(LogError::MissingTimestampGroup {
                component: name.to_string(),
            });
        }

        let rules = config
            .highlight_rules
            .iter()
            .enumerate()
            .map(|(i, rule)| CompiledRule::compile(name, i, rule))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            config,
            file_pattern,
            line_format,
            rules,
        })
    }

    /// Whether the pattern matches at the start of the bare file name
    pub fn claims(&self, file_name: &str) -> bool {
        self.file_pattern.is_match(file_name)
    }

    pub fn line_format(&self) -> &Regex {
        &self.line_format
    }

    pub fn display_fields(&self) -> &[String] {
        &self.config.display_fields
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }
}

/// Compile `pattern` so it only matches at the start of the input
fn anchored(component: &str, field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})", pattern)).map_err(|source| LogError::InvalidPattern {
        component: component.to_string(),
        field: field.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// Every configured component, in document order
#[derive(Clone, Debug, Default)]
pub struct PatternSet {
    components: Vec<CompiledComponent>,
}

impl PatternSet {
    /// Read and compile a pattern document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LogError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let set = Self::from_yaml(&contents).map_err(|e| match e {
            LogError::ConfigLoad { reason, .. } => LogError::ConfigLoad {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), components = set.len(), "loaded pattern config");
        Ok(set)
    }

    /// Parse and compile a pattern document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let invalid = |reason: String| LogError::ConfigLoad {
            path: "<inline>".into(),
            reason,
        };

        let doc: Option<Mapping> =
            serde_yaml_ng::from_str(contents).map_err(|e| invalid(e.to_string()))?;

        let mut components = Vec::new();
        for (key, value) in doc.unwrap_or_default() {
            let name = match key {
                Value::String(name) => name,
                other => {
                    return Err(invalid(format!(
                        "component names must be strings, found {:?}",
                        other
                    )));
                }
            };
            let config: ComponentConfig = serde_yaml_ng::from_value(value)
                .map_err(|e| invalid(format!("component `{}`: {}", name, e)))?;
            components.push((name, config));
        }

        Self::from_components(components)
    }

    /// Compile already-deserialized components, keeping their order
    pub fn from_components<I>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, ComponentConfig)>,
    {
        let components = components
            .into_iter()
            .map(|(name, config)| CompiledComponent::compile(&name, config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { components })
    }

    pub fn components(&self) -> &[CompiledComponent] {
        &self.components
    }

    pub fn get(&self, name: &str) -> Option<&CompiledComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
