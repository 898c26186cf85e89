use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::codebase::{CodebaseSummary, CodebaseTally};
use crate::diffstat;
use crate::error::{PulseError, Result};
use crate::exclude::ExclusionFilter;
use crate::git::{GitRepo, VcsAccessor};
use crate::language::Classifier;
use crate::ledger::Ledger;
use crate::model::{CommitMeta, Identity, LanguageBreakdown, LanguageUnit, LocSummary, RepositoryProfile};
use crate::rank::language_breakdown;
use crate::source::{HistorySource, IngestOutcome, SourceKind};

/// One commit as the local walk reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEvent {
    pub identity: Identity,
    pub timestamp: DateTime<Utc>,
    pub parent_exists: bool,
    /// Numstat lines against the first parent; empty for root commits.
    pub diff_summary: Vec<String>,
}

/// History from a local checkout, read through a [`VcsAccessor`].
pub struct LocalSource<A: VcsAccessor = GitRepo> {
    accessor: A,
    filter: ExclusionFilter,
    classifier: Classifier,
    lines_mode: bool,
    progress: bool,
}

impl LocalSource<GitRepo> {
    /// Opens the git tree at `path` (or the current directory).
    pub fn open<P: AsRef<Path>>(path: Option<P>, reference: Option<String>) -> Result<Self> {
        let repo = GitRepo::open(path)
            .map_err(|e| PulseError::unavailable(SourceKind::Local, "open repository", e))?;
        Ok(Self::with_accessor(repo.with_reference(reference)))
    }
}

impl<A: VcsAccessor> LocalSource<A> {
    pub fn with_accessor(accessor: A) -> Self {
        Self {
            accessor,
            filter: ExclusionFilter::new(),
            classifier: Classifier::new(),
            lines_mode: false,
            progress: false,
        }
    }

    /// Exclusion and classification rules for repository language totals.
    pub fn with_rules(mut self, filter: ExclusionFilter, classifier: Classifier) -> Self {
        self.filter = filter;
        self.classifier = classifier;
        self
    }

    /// Report repository languages by line count instead of file count.
    pub fn lines_mode(mut self, enabled: bool) -> Self {
        self.lines_mode = enabled;
        self
    }

    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Lazily walks history; diffs are computed as events are pulled.
    pub fn stream_commits(&self) -> Result<impl Iterator<Item = Result<CommitEvent>> + '_> {
        let commits = self
            .accessor
            .commits()
            .map_err(|e| PulseError::unavailable(SourceKind::Local, "walk commits", e))?;
        Ok(commits.map(move |meta| {
            let meta = meta.map_err(|e| PulseError::unavailable(SourceKind::Local, "read commit", e))?;
            self.event_for(meta)
        }))
    }

    fn event_for(&self, meta: CommitMeta) -> Result<CommitEvent> {
        let identity = Identity::new(meta.author_name, meta.author_email);
        let diff_summary = match meta.parent_ids.first() {
            Some(parent) => self
                .accessor
                .diff_summary(&meta.id, parent)
                .map_err(|e| PulseError::unavailable(SourceKind::Local, "diff commit", e))?,
            None => Vec::new(),
        };
        Ok(CommitEvent {
            identity,
            timestamp: meta.timestamp,
            parent_exists: !meta.parent_ids.is_empty(),
            diff_summary,
        })
    }

    /// Lines of code per language across tracked files at the analyzed ref.
    pub fn loc_summary(&self) -> Result<LocSummary> {
        let (filter, classifier) = (&self.filter, &self.classifier);
        let files = self
            .accessor
            .tracked_line_counts()
            .map_err(|e| PulseError::unavailable(SourceKind::Local, "count tracked lines", e))?;

        let mut by_language: BTreeMap<String, u64> = BTreeMap::new();
        let mut code_files = 0;
        let mut non_code_files = 0;
        for file in files.iter().filter(|f| !filter.is_excluded(&f.path)) {
            if file.is_binary {
                non_code_files += 1;
                continue;
            }
            code_files += 1;
            *by_language.entry(classifier.classify(&file.path)).or_insert(0) += file.lines;
        }

        let by_language = language_breakdown(LanguageUnit::Lines, by_language);
        Ok(LocSummary {
            total_lines: by_language.total,
            code_files,
            non_code_files,
            by_language,
        })
    }

    /// Commit activity over time plus file statistics at the analyzed ref.
    ///
    /// Change counts follow the first-parent diff of every non-root commit and
    /// skip excluded paths, as do the tracked-file figures.
    pub fn codebase_summary(&self) -> Result<CodebaseSummary> {
        let pb = self.spinner();
        let mut tally = CodebaseTally::new();
        for event in self.stream_commits()? {
            let event = event?;
            tally.record_commit(event.timestamp);
            for record in diffstat::parse(&event.diff_summary, &event.identity) {
                if !self.filter.is_excluded(&record.path) {
                    tally.record_change(&record.path);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        let files: Vec<_> = self
            .accessor
            .tracked_line_counts()
            .map_err(|e| PulseError::unavailable(SourceKind::Local, "count tracked lines", e))?
            .into_iter()
            .filter(|f| !self.filter.is_excluded(&f.path))
            .collect();
        Ok(tally.finish(&files))
    }

    fn file_counts(&self) -> Result<LanguageBreakdown> {
        let (filter, classifier) = (&self.filter, &self.classifier);
        let files = self
            .accessor
            .tracked_files()
            .map_err(|e| PulseError::unavailable(SourceKind::Local, "list tracked files", e))?;
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for path in files.iter().filter(|p| !filter.is_excluded(p)) {
            *counts.entry(classifier.classify(path)).or_insert(0) += 1;
        }
        Ok(language_breakdown(LanguageUnit::Files, counts))
    }

    fn spinner(&self) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} ({pos} commits)")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Walking history...");
        pb
    }
}

impl<A: VcsAccessor> HistorySource for LocalSource<A> {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    fn ingest(&self, ledger: &Ledger) -> Result<IngestOutcome> {
        let location = self.accessor.location();
        let mut repository = RepositoryProfile {
            name: Path::new(&location)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| location.clone()),
            location,
            default_branch: self.accessor.branch_name(),
            ..RepositoryProfile::default()
        };

        let pb = self.spinner();
        let mut skipped = 0usize;
        for event in self.stream_commits()? {
            let event = event?;
            ledger.fold_commit_seen(&event.identity);
            if event.parent_exists {
                for record in diffstat::parse(&event.diff_summary, &event.identity) {
                    if !ledger.fold(&record) {
                        skipped += 1;
                    }
                }
            }
            let ts = event.timestamp;
            repository.first_commit = Some(repository.first_commit.map_or(ts, |t| t.min(ts)));
            repository.last_commit = Some(repository.last_commit.map_or(ts, |t| t.max(ts)));
            repository.total_commits += 1;
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(commits = repository.total_commits, contributors = ledger.len(), "local history ingested");
        debug!(skipped, "excluded change records");

        Ok(IngestOutcome {
            stats_complete: true,
            repository,
        })
    }

    fn language_totals(&self) -> Result<LanguageBreakdown> {
        if self.lines_mode {
            Ok(self.loc_summary()?.by_language)
        } else {
            self.file_counts()
        }
    }
}
