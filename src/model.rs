use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::source::SourceKind;

pub const SCHEMA_VERSION: u32 = 1;

pub type LanguageTag = String;

/// A contributor as seen in history: keyed by normalized email.
///
/// Two identities are equal when their emails match after trimming and
/// ASCII-lowercasing. The display name does not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn key(&self) -> String {
        self.email.trim().to_ascii_lowercase()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Line delta for one file. `Unknown` covers binary files and remote file
/// listings whose deltas are accounted for elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCount {
    Counted(u64),
    Unknown,
}

impl LineCount {
    pub fn value(self) -> u64 {
        match self {
            LineCount::Counted(n) => n,
            LineCount::Unknown => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub path: String,
    pub added: LineCount,
    pub deleted: LineCount,
    pub author: Identity,
}

impl ChangeRecord {
    pub fn new(path: impl Into<String>, added: LineCount, deleted: LineCount, author: Identity) -> Self {
        Self {
            path: path.into(),
            added,
            deleted,
            author,
        }
    }
}

/// Metadata for one commit as exposed by a version-control accessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitMeta {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    pub parent_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorAggregate {
    pub name: String,
    pub email: String,
    pub commit_count: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub files_changed: u64,
    pub languages: BTreeMap<LanguageTag, u64>,
    pub issues: u64,
    pub pull_requests: u64,
}

impl ContributorAggregate {
    pub fn new(identity: &Identity) -> Self {
        Self {
            name: identity.name.clone(),
            email: identity.email.clone(),
            ..Self::default()
        }
    }

    pub fn total_changes(&self) -> u64 {
        self.lines_added.saturating_add(self.lines_deleted)
    }
}

/// One ranked row derived from a finished ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorView {
    pub name: String,
    pub email: String,
    pub commit_count: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub files_changed: u64,
    pub total_changes: u64,
    pub percentage: f64,
    pub top_languages: Vec<(LanguageTag, u64)>,
    pub issues: u64,
    pub pull_requests: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageUnit {
    Files,
    Bytes,
    Lines,
}

impl std::fmt::Display for LanguageUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LanguageUnit::Files => "files",
            LanguageUnit::Bytes => "bytes",
            LanguageUnit::Lines => "lines",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: LanguageTag,
    pub amount: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageBreakdown {
    pub unit: LanguageUnit,
    pub total: u64,
    pub entries: Vec<LanguageShare>,
}

/// Repository-level facts gathered alongside ingestion. Popularity counters
/// are only known for remote repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryProfile {
    pub name: String,
    pub location: String,
    pub default_branch: Option<String>,
    pub total_commits: u64,
    pub first_commit: Option<DateTime<Utc>>,
    pub last_commit: Option<DateTime<Utc>>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
}

/// Lines-of-code summary for the tracked files at the analyzed ref.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocSummary {
    pub total_lines: u64,
    pub code_files: u64,
    pub non_code_files: u64,
    pub by_language: LanguageBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub source: SourceKind,
    pub stats_complete: bool,
    pub repository: RepositoryProfile,
    pub contributors: Vec<ContributorView>,
    pub languages: LanguageBreakdown,
    pub snapshot: Vec<ContributorAggregate>,
}
