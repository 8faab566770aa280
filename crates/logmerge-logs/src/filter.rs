use regex::{Regex, RegexBuilder};

use logmerge_types::LogRecord;

use crate::error::{LogError, Result};

/// Compiled filter over each record's raw source line
#[derive(Clone)]
pub struct CompiledFilter {
    /// Regex pattern (if any)
    regex: Option<Regex>,

    /// Original pattern string
    pattern: String,

    /// Emit records that do NOT match
    invert: bool,

    case_insensitive: bool,
}

impl CompiledFilter {
    /// Create a new filter from a pattern string; empty matches everything
    pub fn new(pattern: &str) -> Result<Self> {
        Self::build(pattern, false)
    }

    /// Create a case-insensitive filter
    pub fn new_case_insensitive(pattern: &str) -> Result<Self> {
        Self::build(pattern, true)
    }

    fn build(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let regex = if pattern.is_empty() {
            None
        } else {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|source| LogError::InvalidPattern {
                    component: "<filter>".to_string(),
                    field: "filter".to_string(),
                    pattern: pattern.to_string(),
                    source,
                })?;
            Some(regex)
        };

        Ok(Self {
            regex,
            pattern: pattern.to_string(),
            invert: false,
            case_insensitive,
        })
    }

    /// Invert the match
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Check if a record passes this filter
    pub fn matches(&self, record: &LogRecord) -> bool {
        let text_match = match &self.regex {
            Some(re) => re.is_match(&record.raw),
            None => return true,
        };

        if self.invert { !text_match } else { text_match }
    }

    /// Get the original pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

impl std::fmt::Debug for CompiledFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFilter")
            .field("pattern", &self.pattern)
            .field("invert", &self.invert)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}
