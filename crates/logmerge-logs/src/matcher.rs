use std::collections::HashSet;

use crate::config::{CompiledComponent, PatternSet};

/// Picks the component that owns a file, by file name.
///
/// Components are tried in configuration order and the first whose file
/// pattern matches wins. When an allow-list is given, components outside
/// it (compared case-insensitively) are never considered.
#[derive(Clone, Debug)]
pub struct ComponentMatcher {
    allowed: Option<HashSet<String>>,
}

impl ComponentMatcher {
    /// `allowed` of `None`, or an empty list, admits every component
    pub fn new<I, S>(allowed: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed
            .map(|names| {
                names
                    .into_iter()
                    .map(|name| name.as_ref().trim().to_lowercase())
                    .collect::<HashSet<_>>()
            })
            .filter(|names| !names.is_empty());
        Self { allowed }
    }

    /// Admit every component
    pub fn any() -> Self {
        Self { allowed: None }
    }

    fn admits(&self, component: &CompiledComponent) -> bool {
        match &self.allowed {
            Some(allowed) => allowed.contains(&component.name.to_lowercase()),
            None => true,
        }
    }

    /// Name-match `file_name` (a bare name, not a path) against `patterns`
    pub fn find<'a>(&self, file_name: &str, patterns: &'a PatternSet) -> Option<&'a CompiledComponent> {
        patterns
            .components()
            .iter()
            .filter(|component| self.admits(component))
            .find(|component| component.claims(file_name))
    }
}
