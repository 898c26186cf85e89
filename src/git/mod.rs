mod repo;

pub use repo::GitRepo;

use crate::error::Result;
use crate::model::CommitMeta;

/// A tracked file at the analyzed ref with its line count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    pub path: String,
    pub lines: u64,
    pub is_binary: bool,
}

/// Read access to a version-controlled tree.
///
/// `diff_summary` returns numstat-style lines (`added\tdeleted\tpath`,
/// `-\t-\tpath` for binary content); the caller parses them.
pub trait VcsAccessor {
    /// Human-readable location of the repository.
    fn location(&self) -> String;

    /// Every commit reachable from the analyzed ref, each exactly once.
    fn commits(&self) -> Result<Box<dyn Iterator<Item = Result<CommitMeta>> + '_>>;

    fn diff_summary(&self, commit: &str, parent: &str) -> Result<Vec<String>>;

    fn tracked_files(&self) -> Result<Vec<String>>;

    fn tracked_line_counts(&self) -> Result<Vec<TrackedFile>>;

    fn branch_name(&self) -> Option<String> {
        None
    }
}
