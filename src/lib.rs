pub mod analyze;
pub mod cli;
pub mod codebase;
pub mod commands;
pub mod config;
pub mod diffstat;
pub mod error;
pub mod exclude;
pub mod git;
pub mod github;
pub mod language;
pub mod ledger;
pub mod model;
pub mod rank;
pub mod report;
pub mod source;

pub use analyze::analyze;
pub use error::{PulseError, Result};
