use chrono::Local;
use ratatui::text::{Line, Span};

use logmerge_types::{LogRecord, StyledText};

use crate::theme::Theme;

const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f%:z";

/// Options shared by every sink
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    /// Show header timestamps in the local zone instead of UTC
    pub use_local_time: bool,
}

/// `timestamp store/controller component: `
pub fn format_header(record: &LogRecord, options: &RenderOptions) -> String {
    let time_str = if options.use_local_time {
        record
            .timestamp
            .with_timezone(&Local)
            .format(HEADER_TIME_FORMAT)
            .to_string()
    } else {
        record.timestamp.format(HEADER_TIME_FORMAT).to_string()
    };
    format!("{} {} {}: ", time_str, record.source(), record.component)
}

/// Header span followed by the highlighted message spans
pub fn format_record(record: &LogRecord, message: &StyledText, options: &RenderOptions) -> Line<'static> {
    let mut spans = vec![Span::styled(format_header(record, options), Theme::header())];
    spans.extend(message.to_line(Theme::text()).spans);
    Line::from(spans)
}
