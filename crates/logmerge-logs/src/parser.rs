use std::collections::HashMap;

use logmerge_types::Instant;

use crate::config::{CompiledComponent, TIMESTAMP_FIELD};
use crate::error::{LogError, Result};
use crate::timestamp::TimestampNormalizer;

/// Fields extracted from one line by a component's line format
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedLine {
    pub timestamp: Instant,

    /// Named groups other than `timestamp`; groups that did not take part
    /// in the match are absent
    pub fields: HashMap<String, String>,
}

impl ParsedLine {
    /// Join the requested fields with single spaces.
    ///
    /// Missing fields contribute an empty string, so the separator count
    /// stays fixed.
    pub fn message(&self, display_fields: &[String]) -> String {
        display_fields
            .iter()
            .map(|field| {
                if field == TIMESTAMP_FIELD {
                    self.timestamp.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string()
                } else {
                    self.fields.get(field).cloned().unwrap_or_default()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parser that extracts structure from raw lines using a component's line format
#[derive(Clone, Copy, Debug, Default)]
pub struct LineParser {
    timestamps: TimestampNormalizer,
}

impl LineParser {
    pub fn new(timestamps: TimestampNormalizer) -> Self {
        Self { timestamps }
    }

    /// Parse a line with `component`'s line format.
    ///
    /// Returns `Ok(None)` when the format does not match at the start of the
    /// line, and `UnparseableTimestamp` when it matches but the captured
    /// timestamp cannot be read.
    pub fn parse(&self, line: &str, component: &CompiledComponent) -> Result<Option<ParsedLine>> {
        let format = component.line_format();
        let Some(caps) = format.captures(line) else {
            return Ok(None);
        };

        let raw_ts = caps
            .name(TIMESTAMP_FIELD)
            .map(|m| m.as_str())
            .ok_or_else(|| LogError::UnparseableTimestamp(String::new()))?;
        let timestamp = self.timestamps.parse(raw_ts)?;

        let fields = format
            .capture_names()
            .flatten()
            .filter(|name| *name != TIMESTAMP_FIELD)
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();

        Ok(Some(ParsedLine { timestamp, fields }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use logmerge_types::ComponentConfig;

    fn component(line_format: &str, show: &[&str]) -> CompiledComponent {
        CompiledComponent::compile(
            "app",
            ComponentConfig {
                file_name_pattern: "app".to_string(),
                line_format: line_format.to_string(),
                display_fields: show.iter().map(|s| s.to_string()).collect(),
                highlight_rules: Vec::new(),
            },
        )
        .unwrap()
    }

    const FORMAT: &str = r"(?P<timestamp>\S+ \S+) \[(?P<level>\w+)\] (?P<msg>.*)";

    #[test]
    fn test_parse_fields() {
        let app = component(FORMAT, &["level", "msg"]);
        let parsed = LineParser::default()
            .parse("2024-01-15 10:30:00.123 [WARN] disk almost full", &app)
            .unwrap()
            .unwrap();

        assert_eq!(
            parsed.timestamp,
            DateTime::parse_from_rfc3339("2024-01-15T10:30:00.123Z")
                .unwrap()
                .with_timezone(&Utc)
        );
        assert_eq!(parsed.fields["level"], "WARN");
        assert_eq!(parsed.fields["msg"], "disk almost full");
        assert!(!parsed.fields.contains_key("timestamp"));
        assert_eq!(parsed.message(app.display_fields()), "WARN disk almost full");
    }

    #[test]
    fn test_match_anchored_at_start() {
        let app = component(FORMAT, &["msg"]);
        let line = "noise 2024-01-15 10:30:00.123 [WARN] late start";
        assert_eq!(LineParser::default().parse(line, &app).unwrap(), None);
    }

    #[test]
    fn test_non_matching_line() {
        let app = component(FORMAT, &["msg"]);
        assert_eq!(LineParser::default().parse("   at Foo.bar()", &app).unwrap(), None);
    }

    #[test]
    fn test_bad_timestamp_is_error() {
        let app = component(FORMAT, &["msg"]);
        let result = LineParser::default().parse("not a-time [INFO] hello", &app);
        assert!(matches!(result, Err(LogError::UnparseableTimestamp(_))));
    }

    #[test]
    fn test_message_field_order_and_duplicates() {
        let app = component(
            r"(?P<timestamp>\S+) (?P<a>\w+)(?: (?P<b>\w+))?",
            &["b", "a", "a", "missing"],
        );
        let parsed = LineParser::default()
            .parse("2024-01-15T10:30:00Z one two", &app)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.message(app.display_fields()), "two one one ");

        let parsed = LineParser::default()
            .parse("2024-01-15T10:30:00Z solo", &app)
            .unwrap()
            .unwrap();
        assert!(!parsed.fields.contains_key("b"));
        assert_eq!(parsed.message(app.display_fields()), " solo solo ");
    }

    #[test]
    fn test_timestamp_as_display_field() {
        let app = component(r"(?P<timestamp>\S+) (?P<msg>.*)", &["timestamp", "msg"]);
        let parsed = LineParser::default()
            .parse("2024-01-15T10:30:00.5+02:00 hi", &app)
            .unwrap()
            .unwrap();
        assert_eq!(
            parsed.message(app.display_fields()),
            "2024-01-15 08:30:00.500+00:00 hi"
        );
    }
}
