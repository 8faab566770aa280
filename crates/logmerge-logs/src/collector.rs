use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use logmerge_types::LogRecord;

use crate::config::PatternSet;
use crate::error::{LogError, Result};
use crate::matcher::ComponentMatcher;
use crate::parser::LineParser;

/// Counters gathered while collecting
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Regular files found under admitted controllers
    pub files_scanned: usize,
    /// Files claimed by a component
    pub files_matched: usize,
    pub lines_read: usize,
    /// Lines that did not match the line format or had a bad timestamp
    pub lines_dropped: usize,
}

impl CollectStats {
    fn absorb(&mut self, other: &CollectStats) {
        self.files_scanned += other.files_scanned;
        self.files_matched += other.files_matched;
        self.lines_read += other.lines_read;
        self.lines_dropped += other.lines_dropped;
    }
}

/// Records gathered from a log tree, in discovery order (not yet merged)
#[derive(Clone, Debug, Default)]
pub struct Collection {
    pub records: Vec<LogRecord>,
    pub stats: CollectStats,
}

/// A log file and the component that claimed it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub store: String,
    pub controller: String,
    pub component: String,
    pub path: PathBuf,
}

/// Walks `root/<store>/<controller>/**` and parses every claimed file.
///
/// Directory entries are visited in name order so that repeated runs, and
/// sequential versus concurrent runs, yield records in the same order.
#[derive(Clone)]
pub struct RecordCollector {
    patterns: Arc<PatternSet>,
    matcher: ComponentMatcher,
    controllers: Option<HashSet<String>>,
    parser: LineParser,
    cancel: CancellationToken,
}

impl RecordCollector {
    pub fn new(patterns: Arc<PatternSet>) -> Self {
        Self {
            patterns,
            matcher: ComponentMatcher::any(),
            controllers: None,
            parser: LineParser::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Restrict which components may claim files
    pub fn with_matcher(mut self, matcher: ComponentMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Restrict controllers by exact (case-sensitive) name; empty admits all
    pub fn with_controllers<I, S>(mut self, controllers: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.controllers = controllers
            .map(|names| names.into_iter().map(Into::into).collect::<HashSet<_>>())
            .filter(|names| !names.is_empty());
        self
    }

    pub fn with_parser(mut self, parser: LineParser) -> Self {
        self.parser = parser;
        self
    }

    /// Checked before each file is read
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn admits_controller(&self, controller: &str) -> bool {
        self.controllers
            .as_ref()
            .is_none_or(|allowed| allowed.contains(controller))
    }

    /// Find every file under `root` that some admitted component claims
    pub fn discover(&self, root: &Path) -> Result<(Vec<SourceFile>, CollectStats)> {
        let stores = sorted_entries(root).map_err(|source| LogError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        })?;

        let mut sources = Vec::new();
        let mut stats = CollectStats::default();

        for store_dir in stores.into_iter().filter(|p| p.is_dir()) {
            let store = entry_name(&store_dir);
            let controllers = match sorted_entries(&store_dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %store_dir.display(), error = %e, "skipping unreadable store");
                    continue;
                }
            };

            for controller_dir in controllers.into_iter().filter(|p| p.is_dir()) {
                if self.cancel.is_cancelled() {
                    return Err(LogError::Cancelled);
                }
                let controller = entry_name(&controller_dir);
                if !self.admits_controller(&controller) {
                    tracing::debug!(%store, %controller, "controller filtered out");
                    continue;
                }

                let mut files = Vec::new();
                walk_files(&controller_dir, &mut files, &self.cancel);
                if self.cancel.is_cancelled() {
                    return Err(LogError::Cancelled);
                }

                for path in files {
                    stats.files_scanned += 1;
                    let file_name = entry_name(&path);
                    match self.matcher.find(&file_name, &self.patterns) {
                        Some(component) => {
                            stats.files_matched += 1;
                            sources.push(SourceFile {
                                store: store.clone(),
                                controller: controller.clone(),
                                component: component.name.clone(),
                                path,
                            });
                        }
                        None => tracing::trace!(path = %path.display(), "no component claims file"),
                    }
                }
            }
        }

        Ok((sources, stats))
    }

    /// Parse one claimed file. Unreadable files and bad lines are dropped.
    pub fn read_source(&self, source: &SourceFile) -> (Vec<LogRecord>, CollectStats) {
        let mut records = Vec::new();
        let mut stats = CollectStats::default();

        let Some(component) = self.patterns.get(&source.component) else {
            tracing::warn!(component = %source.component, "unknown component, skipping file");
            return (records, stats);
        };

        let file = match File::open(&source.path) {
            Ok(file) => file,
            Err(source_err) => {
                let err = LogError::Io {
                    path: source.path.clone(),
                    source: source_err,
                };
                tracing::warn!(error = %err, "skipping file");
                return (records, stats);
            }
        };

        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match read_line_any(&mut reader, &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %source.path.display(), error = %e, "read failed, keeping lines read so far");
                    break;
                }
            }
            stats.lines_read += 1;

            let decoded = String::from_utf8_lossy(&buf);
            let line = decoded.trim_end();

            match self.parser.parse(line, component) {
                Ok(Some(parsed)) => records.push(LogRecord {
                    timestamp: parsed.timestamp,
                    store: source.store.clone(),
                    controller: source.controller.clone(),
                    component: component.name.clone(),
                    message: parsed.message(component.display_fields()),
                    raw: line.to_string(),
                }),
                Ok(None) => stats.lines_dropped += 1,
                Err(e) => {
                    tracing::trace!(path = %source.path.display(), error = %e, "dropping line");
                    stats.lines_dropped += 1;
                }
            }
        }

        tracing::debug!(
            path = %source.path.display(),
            component = %component.name,
            records = records.len(),
            dropped = stats.lines_dropped,
            "read log file"
        );
        (records, stats)
    }

    /// Collect every record under `root`, one file at a time
    pub fn collect(&self, root: &Path) -> Result<Collection> {
        let (sources, mut stats) = self.discover(root)?;
        let mut records = Vec::new();

        for source in &sources {
            if self.cancel.is_cancelled() {
                return Err(LogError::Cancelled);
            }
            let (file_records, file_stats) = self.read_source(source);
            records.extend(file_records);
            stats.absorb(&file_stats);
        }

        Ok(Collection { records, stats })
    }

    /// Like [`collect`](Self::collect) but reads files on the blocking pool.
    ///
    /// Per-file results are joined in discovery order, so the output equals
    /// the sequential one.
    pub async fn collect_concurrent(&self, root: &Path) -> Result<Collection> {
        let discovery = {
            let this = self.clone();
            let root = root.to_path_buf();
            tokio::task::spawn_blocking(move || this.discover(&root))
        };
        let (sources, mut stats) = discovery.await.map_err(join_failure)??;

        let tasks = sources.into_iter().map(|source| {
            let this = self.clone();
            tokio::task::spawn_blocking(move || {
                if this.cancel.is_cancelled() {
                    return Err(LogError::Cancelled);
                }
                Ok(this.read_source(&source))
            })
        });

        let results = futures::future::try_join_all(tasks)
            .await
            .map_err(join_failure)?;

        let mut records = Vec::new();
        for result in results {
            let (file_records, file_stats) = result?;
            records.extend(file_records);
            stats.absorb(&file_stats);
        }

        Ok(Collection { records, stats })
    }
}

/// Re-raise panics from blocking tasks; anything else means the runtime is shutting down
fn join_failure(err: JoinError) -> LogError {
    if err.is_panic() {
        std::panic::resume_unwind(err.into_panic());
    }
    LogError::Cancelled
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    Ok(entries)
}

/// Read one line ended by `\n`, `\r\n` or a lone `\r` into `buf`, without
/// the terminator. Returns the bytes consumed, 0 at end of input.
fn read_line_any<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    let mut consumed = 0;
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(consumed);
        }

        let Some(end) = available.iter().position(|&b| b == b'\n' || b == b'\r') else {
            let len = available.len();
            buf.extend_from_slice(available);
            reader.consume(len);
            consumed += len;
            continue;
        };

        let lone_cr = available[end] == b'\r';
        buf.extend_from_slice(&available[..end]);
        reader.consume(end + 1);
        consumed += end + 1;

        // The `\n` of a `\r\n` pair may sit in the next chunk
        if lone_cr && next_byte(reader)? == Some(b'\n') {
            reader.consume(1);
            consumed += 1;
        }
        return Ok(consumed);
    }
}

fn next_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        match reader.fill_buf() {
            Ok(available) => return Ok(available.first().copied()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Recursively gather regular files. Symlinked directories are not followed.
fn walk_files(dir: &Path, out: &mut Vec<PathBuf>, cancel: &CancellationToken) {
    if cancel.is_cancelled() {
        return;
    }
    let entries = match sorted_entries(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for path in entries {
        let is_real_dir = std::fs::symlink_metadata(&path)
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if is_real_dir {
            walk_files(&path, out, cancel);
        } else if path.is_file() {
            out.push(path);
        }
    }
}
