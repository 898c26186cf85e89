//! History sources: one contract, a local git walk and a remote GitHub feed.

pub mod local;
pub mod remote;
pub mod retry;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ledger::Ledger;
use crate::model::{LanguageBreakdown, RepositoryProfile};

pub use local::{CommitEvent, LocalSource};
pub use remote::{parse_remote_url, RemoteSource};
pub use retry::{Poll, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Remote,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Local => f.write_str("local"),
            SourceKind::Remote => f.write_str("remote"),
        }
    }
}

/// What an ingestion pass reports back besides the ledger contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// `false` when the source fell back to reduced-fidelity data.
    pub stats_complete: bool,
    pub repository: RepositoryProfile,
}

/// A source of contribution history.
///
/// Implementations fill a ledger they do not own and never rank anything;
/// the caller snapshots the ledger once `ingest` returns.
pub trait HistorySource {
    fn kind(&self) -> SourceKind;

    fn ingest(&self, ledger: &Ledger) -> Result<IngestOutcome>;

    /// Repository-wide language totals; the breakdown names its unit.
    fn language_totals(&self) -> Result<LanguageBreakdown>;
}
