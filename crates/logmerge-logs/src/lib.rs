//! Log processing for logmerge
//!
//! This crate turns a tree of log files into one ordered, highlighted
//! stream: timestamp normalization, per-component line parsing, component
//! matching, collection, chronological merging, filtering and highlighting.

mod collector;
mod config;
mod error;
mod filter;
mod highlight;
mod matcher;
mod merge;
mod parser;
mod timestamp;

pub use collector::{CollectStats, Collection, RecordCollector, SourceFile};
pub use config::{CompiledComponent, PatternSet, TIMESTAMP_FIELD};
pub use error::{LogError, Result};
pub use filter::CompiledFilter;
pub use highlight::{CompiledGroup, CompiledRule, highlight};
pub use matcher::ComponentMatcher;
pub use merge::merge;
pub use parser::{LineParser, ParsedLine};
pub use timestamp::{TimestampNormalizer, parse_offset};

// Re-export types used in our public API
pub use logmerge_types::{LogRecord, StyledText};
