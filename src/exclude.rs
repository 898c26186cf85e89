use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::{PulseError, Result};

/// Directory names whose contents are dependencies, build output or VCS metadata.
const EXCLUDED_DIRS: &[&str] = &[
    "venv",
    "env",
    ".env",
    "node_modules",
    "bower_components",
    "dist",
    "build",
    "target",
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".pytest_cache",
    ".tox",
    ".idea",
    ".vscode",
    ".gradle",
    ".mvn",
    "vendor",
    "coverage",
    ".next",
    ".nuxt",
    ".output",
    ".serverless",
    ".terraform",
    ".vagrant",
    "site-packages",
    "eggs",
    ".eggs",
    "develop-eggs",
    "wheels",
    "sdist",
];

/// Exact file names that are generated or boilerplate.
const EXCLUDED_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Cargo.lock",
    "Gemfile.lock",
    "composer.lock",
    "Pipfile.lock",
    "go.sum",
    "flake.lock",
    ".DS_Store",
    "LICENSE",
    "COPYING",
    "COPYING.LESSER",
];

const EXCLUDED_SUFFIXES: &[&str] = &[".min.js", ".min.css", ".map"];

/// Decides whether a history path is left out of every aggregate.
///
/// Works purely on the path string: the path may name a file that no longer
/// exists at HEAD.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    extra: Option<Gitignore>,
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusionFilter {
    pub fn new() -> Self {
        Self { extra: None }
    }

    /// Adds gitignore-style patterns on top of the built-in deny-lists.
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::new());
        }
        let mut builder = GitignoreBuilder::new(".");
        for pattern in patterns {
            builder
                .add_line(None, pattern.as_ref())
                .map_err(|e| PulseError::InvalidPattern(format!("{}: {e}", pattern.as_ref())))?;
        }
        let extra = builder
            .build()
            .map_err(|e| PulseError::InvalidPattern(e.to_string()))?;
        Ok(Self { extra: Some(extra) })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        let normalized = normalized.trim_start_matches("./").trim_start_matches('/');
        if normalized.is_empty() {
            return false;
        }

        let mut segments = normalized.split('/').filter(|s| !s.is_empty()).peekable();
        let mut file_name = "";
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                file_name = segment;
            } else if EXCLUDED_DIRS.contains(&segment) {
                return true;
            }
        }

        if EXCLUDED_FILES.contains(&file_name) {
            return true;
        }
        if EXCLUDED_SUFFIXES.iter().any(|s| file_name.ends_with(s)) {
            return true;
        }

        match &self.extra {
            Some(gi) => gi.matched_path_or_any_parents(normalized, false).is_ignore(),
            None => false,
        }
    }
}

/// Checks a path against the built-in deny-lists only.
pub fn is_excluded(path: &str) -> bool {
    ExclusionFilter::new().is_excluded(path)
}
