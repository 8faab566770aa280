use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use logmerge_types::Instant;

use crate::error::{LogError, Result};

/// A strptime-style template and whether it carries an offset
#[derive(Clone, Copy, Debug)]
enum Template {
    Aware(&'static str),
    Naive(&'static str),
}

/// Known layouts, in priority order. First full match wins.
const TEMPLATES: &[Template] = &[
    Template::Aware("%Y-%m-%d %H:%M:%S%.f%z"),
    Template::Naive("%Y-%m-%d %H:%M:%S%.f"),
    Template::Aware("%Y-%m-%dT%H:%M:%S%.f%z"),
    Template::Naive("%Y-%m-%dT%H:%M:%S%.f"),
    // Apache access log: 10/Oct/2000:13:55:36 -0700
    Template::Aware("%d/%b/%Y:%H:%M:%S %z"),
];

/// Generic ISO-8601 shapes tried after the templates
const ISO_FALLBACKS: &[Template] = &[
    Template::Aware("%Y-%m-%dT%H:%M%z"),
    Template::Aware("%Y-%m-%d %H:%M%z"),
    Template::Naive("%Y-%m-%dT%H:%M"),
    Template::Naive("%Y-%m-%d %H:%M"),
];

/// Parses heterogeneous timestamp strings into one canonical [`Instant`].
///
/// Timestamps without an offset are read in `naive_offset` (UTC unless
/// configured otherwise), so every returned instant is zone-aware.
#[derive(Clone, Copy, Debug)]
pub struct TimestampNormalizer {
    naive_offset: FixedOffset,
}

impl Default for TimestampNormalizer {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl TimestampNormalizer {
    pub fn new(naive_offset: FixedOffset) -> Self {
        Self { naive_offset }
    }

    pub fn naive_offset(&self) -> FixedOffset {
        self.naive_offset
    }

    /// Parse a raw timestamp, trying each known layout in order
    pub fn parse(&self, raw: &str) -> Result<Instant> {
        let value = normalize_zulu(raw.trim());

        for template in TEMPLATES.iter().chain(ISO_FALLBACKS) {
            if let Some(ts) = self.try_template(&value, *template) {
                return Ok(ts);
            }
        }

        if let Ok(ts) = DateTime::parse_from_rfc3339(&value) {
            return Ok(ts.with_timezone(&Utc));
        }

        // Bare date means midnight
        if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
            if let Some(ts) = date.and_hms_opt(0, 0, 0).and_then(|n| self.resolve_naive(n)) {
                return Ok(ts);
            }
        }

        Err(LogError::UnparseableTimestamp(raw.to_string()))
    }

    fn try_template(&self, value: &str, template: Template) -> Option<Instant> {
        match template {
            Template::Aware(fmt) => DateTime::parse_from_str(value, fmt)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            Template::Naive(fmt) => NaiveDateTime::parse_from_str(value, fmt)
                .ok()
                .and_then(|naive| self.resolve_naive(naive)),
        }
    }

    fn resolve_naive(&self, naive: NaiveDateTime) -> Option<Instant> {
        self.naive_offset
            .from_local_datetime(&naive)
            .single()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// Rewrite a trailing `Z` as an explicit zero offset
fn normalize_zulu(value: &str) -> String {
    match value.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{}+00:00", rest),
        None => value.to_string(),
    }
}

/// Parse an offset such as `+02:00`, `-0530`, `Z` or `UTC`
pub fn parse_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }
    DateTime::parse_from_str(&format!("2000-01-01 00:00:00 {}", value), "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|ts| *ts.offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn utc(s: &str) -> Instant {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_space_separated_with_offset() {
        let parser = TimestampNormalizer::default();
        assert_eq!(
            parser.parse("2024-03-05 14:07:09.123456+02:00").unwrap(),
            utc("2024-03-05T12:07:09.123456Z")
        );
        assert_eq!(
            parser.parse("2024-03-05 14:07:09.123456+0200").unwrap(),
            utc("2024-03-05T12:07:09.123456Z")
        );
    }

    #[test]
    fn test_zulu_suffix() {
        let parser = TimestampNormalizer::default();
        assert_eq!(
            parser.parse("2024-01-01T10:00:00.000Z").unwrap(),
            utc("2024-01-01T10:00:00Z")
        );
        assert_eq!(
            parser.parse("2024-01-01 10:00:00.5Z").unwrap(),
            utc("2024-01-01T10:00:00.5Z")
        );
    }

    #[test]
    fn test_apache_format() {
        let parser = TimestampNormalizer::default();
        assert_eq!(
            parser.parse("10/Oct/2000:13:55:36 -0700").unwrap(),
            utc("2000-10-10T20:55:36Z")
        );
    }

    #[test]
    fn test_naive_uses_configured_offset() {
        let raw = "2024-03-05 14:07:09.250";
        assert_eq!(
            TimestampNormalizer::default().parse(raw).unwrap(),
            utc("2024-03-05T14:07:09.250Z")
        );

        let plus_one = TimestampNormalizer::new(parse_offset("+01:00").unwrap());
        assert_eq!(plus_one.parse(raw).unwrap(), utc("2024-03-05T13:07:09.250Z"));
        assert_eq!(
            plus_one.parse("2024-03-05T14:07:09").unwrap(),
            utc("2024-03-05T13:07:09Z")
        );
    }

    #[test]
    fn test_iso_fallbacks() {
        let parser = TimestampNormalizer::default();
        assert_eq!(parser.parse("2024-03-05T14:07").unwrap(), utc("2024-03-05T14:07:00Z"));
        let midnight = parser.parse("2024-03-05").unwrap();
        assert_eq!(midnight.hour(), 0);
        assert_eq!(midnight, utc("2024-03-05T00:00:00Z"));
    }

    #[test]
    fn test_round_trip_each_template() {
        let parser = TimestampNormalizer::default();
        let offset = parse_offset("-03:30").unwrap();
        let instant = utc("2023-11-30T23:59:58.654321Z");
        let local = instant.with_timezone(&offset);
        let whole_seconds = utc("2023-11-30T23:59:58Z");

        let cases = [
            (local.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string(), instant),
            (local.format("%Y-%m-%dT%H:%M:%S%.6f%z").to_string(), instant),
            (instant.format("%Y-%m-%d %H:%M:%S%.6f").to_string(), instant),
            (instant.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(), instant),
            (instant.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(), instant),
            (
                whole_seconds
                    .with_timezone(&offset)
                    .format("%d/%b/%Y:%H:%M:%S %z")
                    .to_string(),
                whole_seconds,
            ),
        ];

        for (formatted, expected) in cases {
            assert_eq!(parser.parse(&formatted).unwrap(), expected, "{}", formatted);
        }
    }

    #[test]
    fn test_unparseable() {
        let parser = TimestampNormalizer::default();
        assert!(matches!(
            parser.parse("yesterday at noon"),
            Err(LogError::UnparseableTimestamp(_))
        ));
        assert!(parser.parse("").is_err());
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("Z"), Some(Utc.fix()));
        assert_eq!(parse_offset("+02:00").unwrap().local_minus_utc(), 7200);
        assert_eq!(parse_offset("-0530").unwrap().local_minus_utc(), -19800);
        assert_eq!(parse_offset("nope"), None);
    }
}
