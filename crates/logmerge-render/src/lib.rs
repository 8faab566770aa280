//! Output for logmerge
//!
//! Turns merged records and their highlighted messages into terminal lines
//! (ANSI or plain) or JSON lines.

mod format;
mod sink;
mod theme;

pub use format::{RenderOptions, format_header, format_record};
pub use sink::{JsonSink, OutputMode, RecordSink, TerminalSink, sink_for};
pub use theme::Theme;
