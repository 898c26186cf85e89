//! Commit activity and file statistics for a local checkout.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::git::TrackedFile;

/// Entries kept in the largest and most-changed file lists.
pub const FILE_LIST_LIMIT: usize = 10;

pub const NO_EXTENSION: &str = "no_extension";

/// Commits bucketed by author time in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActivity {
    /// `YYYY-MM` keys.
    pub by_month: BTreeMap<String, u64>,
    /// Index 0 is Monday.
    pub by_weekday: Vec<u64>,
    pub by_hour: Vec<u64>,
}

impl Default for CommitActivity {
    fn default() -> Self {
        Self {
            by_month: BTreeMap::new(),
            by_weekday: vec![0; 7],
            by_hour: vec![0; 24],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCount {
    pub path: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodebaseSummary {
    pub file_count: u64,
    pub by_extension: BTreeMap<String, u64>,
    pub largest_files: Vec<FileCount>,
    pub most_changed_files: Vec<FileCount>,
    pub activity: CommitActivity,
}

/// Accumulates a [`CodebaseSummary`] while history is walked.
#[derive(Debug, Default)]
pub struct CodebaseTally {
    activity: CommitActivity,
    changes: HashMap<String, u64>,
}

impl CodebaseTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_commit(&mut self, at: DateTime<Utc>) {
        let month = format!("{}-{:02}", at.year(), at.month());
        *self.activity.by_month.entry(month).or_insert(0) += 1;
        self.activity.by_weekday[at.weekday().num_days_from_monday() as usize] += 1;
        self.activity.by_hour[at.hour() as usize] += 1;
    }

    pub fn record_change(&mut self, path: &str) {
        *self.changes.entry(path.to_string()).or_insert(0) += 1;
    }

    /// Combines the walked history with the tracked files that survived exclusion.
    pub fn finish(self, files: &[TrackedFile]) -> CodebaseSummary {
        let mut by_extension = BTreeMap::new();
        for file in files {
            *by_extension.entry(extension_key(&file.path)).or_insert(0) += 1;
        }

        let largest = files
            .iter()
            .filter(|f| !f.is_binary)
            .map(|f| FileCount {
                path: f.path.clone(),
                count: f.lines,
            })
            .collect();
        let changed = self
            .changes
            .into_iter()
            .map(|(path, count)| FileCount { path, count })
            .collect();

        CodebaseSummary {
            file_count: files.len() as u64,
            by_extension,
            largest_files: top_files(largest),
            most_changed_files: top_files(changed),
            activity: self.activity,
        }
    }
}

/// Lowercased extension with its dot; dotfiles such as `.gitignore` have none.
pub fn extension_key(path: &str) -> String {
    match Path::new(path).extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => NO_EXTENSION.to_string(),
    }
}

fn top_files(mut files: Vec<FileCount>) -> Vec<FileCount> {
    files.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.path.cmp(&b.path)));
    files.truncate(FILE_LIST_LIMIT);
    files
}
