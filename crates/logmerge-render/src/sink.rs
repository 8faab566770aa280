use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use ratatui::style::Modifier;
use ratatui::text::Line;
use serde::Serialize;

use logmerge_types::{LogRecord, StyledText, color_name};

use crate::format::{RenderOptions, format_header, format_record};

/// How records are written out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Styled with ANSI escape sequences
    #[default]
    Ansi,
    /// Same text, no escape sequences
    Plain,
    /// One JSON object per line
    Json,
}

/// Destination for merged, highlighted records
pub trait RecordSink {
    fn write_record(&mut self, record: &LogRecord, message: &StyledText) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()>;
}

/// Build the sink for `mode` over `out`
pub fn sink_for<W>(mode: OutputMode, out: W, options: RenderOptions) -> Box<dyn RecordSink>
where
    W: Write + 'static,
{
    match mode {
        OutputMode::Ansi => Box::new(TerminalSink::new(out, options, true)),
        OutputMode::Plain => Box::new(TerminalSink::new(out, options, false)),
        OutputMode::Json => Box::new(JsonSink::new(out)),
    }
}

/// Writes `header message` lines, optionally colored
pub struct TerminalSink<W: Write> {
    out: W,
    options: RenderOptions,
    color: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, options: RenderOptions, color: bool) -> Self {
        Self {
            out,
            options,
            color,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_styled(&mut self, line: &Line<'_>) -> io::Result<()> {
        for span in &line.spans {
            let style = span.style;
            if let Some(fg) = style.fg {
                queue!(self.out, SetForegroundColor(fg.into()))?;
            }
            if let Some(bg) = style.bg {
                queue!(self.out, SetBackgroundColor(bg.into()))?;
            }
            for (modifier, attribute) in [
                (Modifier::BOLD, Attribute::Bold),
                (Modifier::DIM, Attribute::Dim),
                (Modifier::ITALIC, Attribute::Italic),
                (Modifier::UNDERLINED, Attribute::Underlined),
            ] {
                if style.add_modifier.contains(modifier) {
                    queue!(self.out, SetAttribute(attribute))?;
                }
            }
            queue!(self.out, Print(&span.content), SetAttribute(Attribute::Reset))?;
        }
        queue!(self.out, Print("\n"))
    }
}

impl<W: Write> RecordSink for TerminalSink<W> {
    fn write_record(&mut self, record: &LogRecord, message: &StyledText) -> io::Result<()> {
        if self.color {
            let line = format_record(record, message, &self.options);
            self.write_styled(&line)
        } else {
            writeln!(
                self.out,
                "{}{}",
                format_header(record, &self.options),
                message.text()
            )
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// A styled character range in JSON output
#[derive(Debug, Serialize)]
struct JsonHighlight {
    start: usize,
    end: usize,
    color: String,
}

#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    #[serde(flatten)]
    record: &'a LogRecord,
    highlights: Vec<JsonHighlight>,
}

/// Writes one JSON object per record
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for JsonSink<W> {
    fn write_record(&mut self, record: &LogRecord, message: &StyledText) -> io::Result<()> {
        let highlights = message
            .runs()
            .into_iter()
            .filter_map(|run| {
                run.style.fg.map(|fg| JsonHighlight {
                    start: run.chars.start,
                    end: run.chars.end,
                    color: color_name(fg),
                })
            })
            .collect();

        serde_json::to_writer(&mut self.out, &JsonRecord { record, highlights })?;
        self.out.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
