//! Plain configuration structs; the CLI fills these from flags and env.

use crate::error::Result;
use crate::exclude::ExclusionFilter;
use crate::language::Classifier;
use crate::source::RetryPolicy;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_COMMITS_PER_CONTRIBUTOR: usize = 100;

/// Settings shared by both history sources.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Extra gitignore-style globs excluded on top of the built-in rules.
    pub exclude_patterns: Vec<String>,
    /// Use the content-aware classifier stage before the extension table.
    pub lexical: bool,
    /// Report repository languages by line count (local only).
    pub lines: bool,
    pub progress: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            lexical: true,
            lines: false,
            progress: false,
        }
    }
}

impl AnalysisConfig {
    pub fn filter(&self) -> Result<ExclusionFilter> {
        if self.exclude_patterns.is_empty() {
            Ok(ExclusionFilter::new())
        } else {
            ExclusionFilter::with_patterns(&self.exclude_patterns)
        }
    }

    pub fn classifier(&self) -> Classifier {
        if self.lexical {
            Classifier::new()
        } else {
            Classifier::extension_only()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub retry: RetryPolicy,
    /// Worker threads for per-contributor language enrichment.
    pub concurrency: usize,
    pub max_commits_per_contributor: usize,
    pub include_activity: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            retry: RetryPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
            max_commits_per_contributor: DEFAULT_MAX_COMMITS_PER_CONTRIBUTOR,
            include_activity: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = AnalysisConfig::default();
        assert!(cfg.classifier().is_lexical());
        assert!(!cfg.filter().unwrap().is_excluded("src/main.rs"));

        let remote = RemoteConfig::default();
        assert_eq!(remote.api_url, "https://api.github.com");
        assert_eq!(remote.retry.max_attempts, 5);
        assert_eq!(remote.concurrency, 4);
    }

    #[test]
    fn extra_patterns_extend_the_filter() {
        let cfg = AnalysisConfig {
            exclude_patterns: vec!["generated/".to_string()],
            lexical: false,
            ..AnalysisConfig::default()
        };
        let filter = cfg.filter().unwrap();
        assert!(filter.is_excluded("generated/api.rs"));
        assert!(!filter.is_excluded("src/api.rs"));
        assert!(!cfg.classifier().is_lexical());
    }
}
