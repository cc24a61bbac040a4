//! Directory-backed task loading.
//!
//! Each `*.json` file directly inside the task directory holds one task.
//! Files are read independently: a defect in one file produces a
//! [`SkippedFile`] diagnostic and never aborts the load.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::normalize::normalize_task;
use crate::types::TaskRecord;

/// Default per-file size ceiling (1 MiB).
pub const MAX_TASK_FILE_BYTES: u64 = 1_048_576;

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Why a candidate file was left out of the task collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("resolved path escapes the task directory")]
    PathEscape,
    #[error("file is {size} bytes, limit is {limit}")]
    Oversized { size: u64, limit: u64 },
    #[error("unreadable: {0}")]
    Unreadable(String),
    #[error("malformed json: {0}")]
    MalformedJson(String),
    #[error("top-level json value is not an object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// File name relative to the task directory.
    pub file: String,
    pub reason: SkipReason,
}

/// Result of one directory scan.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Newest first by `created_at`.
    pub tasks: Vec<TaskRecord>,
    pub skipped: Vec<SkippedFile>,
    /// `false` when the directory does not exist or could not be listed.
    pub directory_found: bool,
}

// ---------------------------------------------------------------------------
// TaskStore
// ---------------------------------------------------------------------------

/// Reads task files from a single directory.
pub struct TaskStore {
    dir: PathBuf,
    max_file_bytes: u64,
    excluded: HashSet<String>,
}

impl TaskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_file_bytes: MAX_TASK_FILE_BYTES,
            excluded: HashSet::new(),
        }
    }

    pub fn with_max_file_bytes(mut self, limit: u64) -> Self {
        self.max_file_bytes = limit;
        self
    }

    /// Leave the named files out of the scan. Used for the sidecar files
    /// (feed events, agent status) that share the task directory.
    pub fn excluding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every task, using `now_ms` for records without usable dates.
    pub fn load(&self, now_ms: i64) -> LoadReport {
        let mut report = LoadReport::default();

        if !self.dir.is_dir() {
            warn!(dir = %self.dir.display(), "tasks directory not found");
            return report;
        }
        let root = match self.dir.canonicalize() {
            Ok(root) => root,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot resolve tasks directory");
                return report;
            }
        };
        let entries = match std::fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %root.display(), error = %e, "cannot list tasks directory");
                return report;
            }
        };
        report.directory_found = true;

        let mut names = Vec::new();
        for entry in entries.filter_map(|entry| entry.ok()) {
            match entry.file_name().into_string() {
                Ok(name) => {
                    if name.ends_with(".json") && !self.excluded.contains(&name) {
                        names.push(name);
                    }
                }
                Err(raw) => {
                    let lossy = raw.to_string_lossy().into_owned();
                    if lossy.ends_with(".json") {
                        let reason = SkipReason::Unreadable("file name is not valid UTF-8".into());
                        warn!(file = %lossy, reason = %reason, "skipping task file");
                        report.skipped.push(SkippedFile { file: lossy, reason });
                    }
                }
            }
        }
        names.sort();

        for name in names {
            match self.load_file(&root, &name, now_ms) {
                Ok(task) => {
                    debug!(file = %name, id = %task.id, "loaded task");
                    report.tasks.push(task);
                }
                Err(reason) => {
                    warn!(file = %name, reason = %reason, "skipping task file");
                    report.skipped.push(SkippedFile { file: name, reason });
                }
            }
        }

        report.tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        report
    }

    /// Load a single file named relative to the canonical directory `root`.
    pub fn load_file(&self, root: &Path, name: &str, now_ms: i64) -> Result<TaskRecord, SkipReason> {
        let path = root
            .join(name)
            .canonicalize()
            .map_err(|e| SkipReason::Unreadable(e.to_string()))?;
        if !is_strictly_inside(root, &path) {
            return Err(SkipReason::PathEscape);
        }

        let meta = std::fs::metadata(&path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
        if !meta.is_file() {
            return Err(SkipReason::Unreadable("not a regular file".into()));
        }
        if meta.len() > self.max_file_bytes {
            return Err(SkipReason::Oversized {
                size: meta.len(),
                limit: self.max_file_bytes,
            });
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
        let raw: Value =
            serde_json::from_str(&content).map_err(|e| SkipReason::MalformedJson(e.to_string()))?;
        let obj = raw.as_object().ok_or(SkipReason::NotAnObject)?;

        Ok(normalize_task(obj, file_stem(name), now_ms))
    }
}

/// Resolve `name` against the canonical directory `root`, returning the
/// resolved path only when it lies strictly inside `root`.
///
/// Symlinks are followed, so a link pointing outside the directory is
/// rejected the same way as a `../` name.
pub fn contained_path(root: &Path, name: &str) -> Option<PathBuf> {
    let resolved = root.join(name).canonicalize().ok()?;
    is_strictly_inside(root, &resolved).then_some(resolved)
}

fn is_strictly_inside(root: &Path, resolved: &Path) -> bool {
    resolved != root && resolved.starts_with(root)
}

fn file_stem(name: &str) -> &str {
    name.strip_suffix(".json").unwrap_or(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
