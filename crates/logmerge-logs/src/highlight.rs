use ratatui::style::{Color, Style};
use regex::{Captures, Match, Regex};

use logmerge_types::{
    DEFAULT_COLOR, GroupRef, HighlightRule, StyledText, palette_color, resolve_color,
};

use crate::error::{LogError, Result};

/// Resolve a configured color identifier to its canonical name and style
fn color_style(component: &str, name: Option<&str>) -> (String, Style) {
    let canonical = resolve_color(name);
    let color = palette_color(&canonical).unwrap_or_else(|| {
        tracing::warn!(
            component,
            color = %canonical,
            "unknown color, using {}", DEFAULT_COLOR
        );
        Color::White
    });
    (canonical, Style::default().fg(color))
}

/// A sub-group color inside a rule
#[derive(Clone, Debug)]
pub struct CompiledGroup {
    pub group: GroupRef,
    pub color: String,
    style: Style,
}

impl CompiledGroup {
    /// Span of this group within one match, if the reference is valid and took part
    fn resolve<'h>(&self, caps: &Captures<'h>) -> Option<Match<'h>> {
        match &self.group {
            GroupRef::Index(idx) => caps.get(*idx),
            GroupRef::Name(name) => caps.name(name),
        }
    }
}

/// A highlight rule with its regex compiled and colors resolved
#[derive(Clone, Debug)]
pub struct CompiledRule {
    regex: Regex,
    pub color: String,
    style: Style,
    pub whole_line: bool,
    pub groups: Vec<CompiledGroup>,
}

impl CompiledRule {
    /// Compile one rule; `index` is its zero-based position in the component
    pub fn compile(component: &str, index: usize, rule: &HighlightRule) -> Result<Self> {
        let regex = Regex::new(&rule.regex).map_err(|source| LogError::InvalidPattern {
            component: component.to_string(),
            field: format!("highlight rule #{}", index + 1),
            pattern: rule.regex.clone(),
            source,
        })?;

        let (color, style) = color_style(component, rule.color.as_deref());

        let groups = rule
            .groups
            .iter()
            .map(|(group, color)| {
                let (color, style) = color_style(component, color.as_deref());
                CompiledGroup {
                    group: group.clone(),
                    color,
                    style,
                }
            })
            .collect();

        Ok(Self {
            regex,
            color,
            style,
            whole_line: rule.highlight_whole_line,
            groups,
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Layer this rule's styles onto `text`
    fn apply(&self, text: &mut StyledText, message: &str) {
        if self.whole_line {
            // Styling the whole message again per extra match changes nothing
            if self.regex.is_match(message) {
                text.stylize_all(self.style);
            }
            return;
        }

        for caps in self.regex.captures_iter(message) {
            if self.groups.is_empty() {
                if let Some(m) = caps.get(0) {
                    text.stylize(self.style, m.range());
                }
                continue;
            }

            for group in &self.groups {
                match group.resolve(&caps) {
                    Some(m) => text.stylize(group.style, m.range()),
                    None => tracing::trace!(group = %group.group, "group not in match, skipped"),
                }
            }
        }
    }
}

/// Apply `rules` to `message` in order; later rules override earlier ones
/// on every character they touch.
pub fn highlight(message: &str, rules: &[CompiledRule]) -> StyledText {
    let mut text = StyledText::new(message);
    for rule in rules {
        rule.apply(&mut text, message);
    }
    text
}
