use crate::source::SourceKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PulseError>;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("{kind} source unavailable while trying to {step}: {reason}")]
    SourceUnavailable {
        kind: SourceKind,
        step: &'static str,
        reason: String,
    },
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("HTTP {status} from {endpoint}")]
    Http { status: u16, endpoint: String },
    #[error("Rate limited by {endpoint}")]
    RateLimited { endpoint: String },
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid remote repository: {0}")]
    InvalidRemote(String),
    #[error("Invalid exclusion pattern: {0}")]
    InvalidPattern(String),
    #[error("Malformed record: {0}")]
    Malformed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
}

impl PulseError {
    /// Wraps any failure as fatal for the named source and step.
    pub fn unavailable(kind: SourceKind, step: &'static str, cause: impl std::fmt::Display) -> Self {
        PulseError::SourceUnavailable {
            kind,
            step,
            reason: cause.to_string(),
        }
    }

    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, PulseError::SourceUnavailable { .. })
    }
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::object::find::existing::Error> for PulseError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        PulseError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for PulseError {
    fn from(err: gix::object::commit::Error) -> Self {
        PulseError::Commit(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for PulseError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        PulseError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for PulseError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        PulseError::HeadPeel(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for PulseError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        PulseError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for PulseError {
    fn from(err: gix::objs::decode::Error) -> Self {
        PulseError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for PulseError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        PulseError::DiffTreeToTree(Box::new(err))
    }
}

impl From<gix::discover::Error> for PulseError {
    fn from(err: gix::discover::Error) -> Self {
        PulseError::GitDiscover(Box::new(err))
    }
}
