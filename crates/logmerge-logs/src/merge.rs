use logmerge_types::LogRecord;

/// Order records by timestamp, oldest first.
///
/// The sort is stable: records with equal timestamps keep their collection
/// order (store, controller, file, line).
pub fn merge(mut records: Vec<LogRecord>) -> Vec<LogRecord> {
    records.sort_by_key(|record| record.timestamp);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn record(ts: &str, message: &str) -> LogRecord {
        LogRecord {
            timestamp: DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc),
            store: "s".to_string(),
            controller: "c".to_string(),
            component: "app".to_string(),
            message: message.to_string(),
            raw: message.to_string(),
        }
    }

    fn messages(records: &[LogRecord]) -> Vec<&str> {
        records.iter().map(|r| r.message.as_str()).collect()
    }

    #[test]
    fn test_orders_by_timestamp() {
        let merged = merge(vec![
            record("2024-01-01T10:00:00Z", "ten"),
            record("2024-01-01T09:00:00Z", "nine"),
            record("2024-01-01T11:00:00+02:00", "nine-utc"),
        ]);
        assert_eq!(messages(&merged), vec!["nine", "nine-utc", "ten"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let merged = merge(vec![
            record("2024-01-01T10:00:00Z", "a"),
            record("2024-01-01T09:00:00Z", "early"),
            record("2024-01-01T10:00:00Z", "b"),
            record("2024-01-01T10:00:00.000+00:00", "c"),
        ]);
        assert_eq!(messages(&merged), vec!["early", "a", "b", "c"]);
    }

    #[test]
    fn test_output_non_decreasing() {
        let base = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        // Scrambled but deterministic offsets, with plenty of duplicates
        let records: Vec<_> = (0..200i64)
            .map(|i| {
                let mut r = record("2024-01-01T00:00:00Z", &i.to_string());
                r.timestamp = base + Duration::seconds((i * 37) % 23);
                r
            })
            .collect();

        let merged = merge(records.clone());
        assert_eq!(merged.len(), records.len());
        assert!(merged.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        // Among equal timestamps, input index order is preserved
        for w in merged.windows(2) {
            if w[0].timestamp == w[1].timestamp {
                let a: i64 = w[0].message.parse().unwrap();
                let b: i64 = w[1].message.parse().unwrap();
                assert!(a < b);
            }
        }
    }

    #[test]
    fn test_empty() {
        assert!(merge(Vec::new()).is_empty());
    }
}
