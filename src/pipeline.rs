//! load config → collect → merge → filter → highlight → emit

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use tokio_util::sync::CancellationToken;

use logmerge_logs::{
    CollectStats, CompiledFilter, ComponentMatcher, LineParser, LogError, PatternSet,
    RecordCollector, TimestampNormalizer, highlight, merge,
};
use logmerge_render::RecordSink;

/// Everything one run needs besides the output sink
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub root: PathBuf,
    pub pattern_config: PathBuf,
    pub components: Option<Vec<String>>,
    pub controllers: Option<Vec<String>>,
    pub filter: Option<String>,
    pub ignore_case: bool,
    pub invert_match: bool,
    pub naive_offset: FixedOffset,
    pub sequential: bool,
}

impl PipelineConfig {
    pub fn new(root: impl Into<PathBuf>, pattern_config: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pattern_config: pattern_config.into(),
            components: None,
            controllers: None,
            filter: None,
            ignore_case: false,
            invert_match: false,
            naive_offset: Utc.fix(),
            sequential: false,
        }
    }
}

/// What a finished run did
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub stats: CollectStats,
    pub emitted: usize,
}

fn build_filter(config: &PipelineConfig) -> Result<CompiledFilter> {
    let pattern = config.filter.as_deref().unwrap_or("");
    let filter = if config.ignore_case {
        CompiledFilter::new_case_insensitive(pattern)?
    } else {
        CompiledFilter::new(pattern)?
    };
    Ok(if config.invert_match {
        filter.inverted()
    } else {
        filter
    })
}

pub async fn run(
    config: &PipelineConfig,
    sink: &mut dyn RecordSink,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let patterns = Arc::new(PatternSet::load(&config.pattern_config)?);
    let filter = build_filter(config)?;

    let collector = RecordCollector::new(Arc::clone(&patterns))
        .with_matcher(ComponentMatcher::new(config.components.as_ref()))
        .with_controllers(config.controllers.clone())
        .with_parser(LineParser::new(TimestampNormalizer::new(config.naive_offset)))
        .with_cancellation(cancel.clone());

    let collection = if config.sequential {
        let root = config.root.clone();
        tokio::task::spawn_blocking(move || collector.collect(&root))
            .await
            .context("collection task failed")??
    } else {
        collector.collect_concurrent(&config.root).await?
    };

    let stats = collection.stats;
    tracing::info!(
        files_scanned = stats.files_scanned,
        files_matched = stats.files_matched,
        lines_read = stats.lines_read,
        lines_dropped = stats.lines_dropped,
        records = collection.records.len(),
        "collected records"
    );

    let mut emitted = 0;
    for record in merge(collection.records) {
        if cancel.is_cancelled() {
            return Err(LogError::Cancelled.into());
        }
        if !filter.matches(&record) {
            continue;
        }

        let rules = patterns
            .get(&record.component)
            .map(|component| component.rules())
            .unwrap_or_default();
        let message = highlight(&record.message, rules);

        match sink.write_record(&record, &message) {
            Ok(()) => emitted += 1,
            // Reader went away (e.g. piped into `head`)
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(RunSummary { stats, emitted }),
            Err(e) => return Err(e).context("failed to write output"),
        }
    }

    match sink.finish() {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
            return Err(e).context("failed to flush output");
        }
        _ => {}
    }

    tracing::info!(emitted, "done");
    Ok(RunSummary { stats, emitted })
}
