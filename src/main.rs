use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::FixedOffset;
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;

use logmerge_logs::parse_offset;
use logmerge_render::{OutputMode, RenderOptions, sink_for};

mod pipeline;

use pipeline::PipelineConfig;

/// logmerge - merge logs from many stores and controllers into one highlighted timeline
#[derive(Parser, Debug)]
#[command(name = "logmerge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Logs root; contains <store>/<controller>/... directories
    #[arg(long, default_value = "./logs")]
    path: PathBuf,

    /// Comma-separated components to include (case-insensitive)
    #[arg(long, value_delimiter = ',')]
    components: Option<Vec<String>>,

    /// Comma-separated controllers to include (case-sensitive)
    #[arg(long, value_delimiter = ',')]
    controllers: Option<Vec<String>>,

    /// Only show records whose raw line matches this regex
    #[arg(long)]
    pattern: Option<String>,

    /// Match --pattern case-insensitively
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Show records whose raw line does NOT match --pattern
    #[arg(long)]
    invert_match: bool,

    /// Component pattern document (YAML)
    #[arg(long, default_value = "log_patterns.yaml")]
    highlight_config: PathBuf,

    /// Offset assumed for timestamps that carry none, e.g. +02:00
    #[arg(long, default_value = "+00:00", value_parser = parse_naive_offset)]
    naive_offset: FixedOffset,

    /// Show header timestamps in the local time zone
    #[arg(long)]
    local_time: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Output::Auto)]
    output: Output,

    /// Read files one at a time instead of on the blocking pool
    #[arg(long)]
    sequential: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    /// ANSI colors when stdout is a terminal, plain text otherwise
    Auto,
    Ansi,
    Plain,
    Json,
}

impl Output {
    fn mode(self) -> OutputMode {
        match self {
            Self::Auto if io::stdout().is_terminal() => OutputMode::Ansi,
            Self::Auto => OutputMode::Plain,
            Self::Ansi => OutputMode::Ansi,
            Self::Plain => OutputMode::Plain,
            Self::Json => OutputMode::Json,
        }
    }
}

fn parse_naive_offset(value: &str) -> Result<FixedOffset, String> {
    parse_offset(value).ok_or_else(|| format!("invalid UTC offset `{}` (expected e.g. +02:00)", value))
}

impl From<&Args> for PipelineConfig {
    fn from(args: &Args) -> Self {
        let trimmed = |names: &Option<Vec<String>>| {
            names.as_ref().map(|names| {
                names
                    .iter()
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect::<Vec<_>>()
            })
        };

        Self {
            components: trimmed(&args.components),
            controllers: trimmed(&args.controllers),
            filter: args.pattern.clone(),
            ignore_case: args.ignore_case,
            invert_match: args.invert_match,
            naive_offset: args.naive_offset,
            sequential: args.sequential,
            ..Self::new(&args.path, &args.highlight_config)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout carries only log output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Ctrl-C stops collection and output
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let options = RenderOptions {
        use_local_time: args.local_time,
    };
    let mut sink = sink_for(
        args.output.mode(),
        BufWriter::new(io::stdout().lock()),
        options,
    );

    match pipeline::run(&PipelineConfig::from(&args), sink.as_mut(), cancel).await {
        Ok(summary) => {
            tracing::debug!(
                emitted = summary.emitted,
                lines_dropped = summary.stats.lines_dropped,
                "finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
