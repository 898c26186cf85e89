use dashmap::DashMap;

use crate::exclude::ExclusionFilter;
use crate::language::Classifier;
use crate::model::{ChangeRecord, ContributorAggregate, Identity};

/// Running per-contributor totals for one analysis run.
///
/// Counters saturate at `u64::MAX`. Entries are keyed by normalized email, created on first sighting and
/// never removed. The first display name seen for an email is kept. Folds
/// for different contributors may run concurrently; the map shards its
/// locks so one contributor's updates never block on another's entry.
///
/// There is no deduplication: callers fold each record exactly once.
#[derive(Debug)]
pub struct Ledger {
    entries: DashMap<String, ContributorAggregate>,
    filter: ExclusionFilter,
    classifier: Classifier,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(ExclusionFilter::new(), Classifier::new())
    }
}

impl Ledger {
    pub fn new(filter: ExclusionFilter, classifier: Classifier) -> Self {
        Self {
            entries: DashMap::new(),
            filter,
            classifier,
        }
    }

    pub fn filter(&self) -> &ExclusionFilter {
        &self.filter
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Folds one touched file. Returns `false` when the path is excluded and
    /// nothing was recorded.
    pub fn fold(&self, record: &ChangeRecord) -> bool {
        if self.filter.is_excluded(&record.path) {
            return false;
        }
        let language = self.classifier.classify(&record.path);
        self.with_entry(&record.author, |agg| {
            agg.files_changed = agg.files_changed.saturating_add(1);
            agg.lines_added = agg.lines_added.saturating_add(record.added.value());
            agg.lines_deleted = agg.lines_deleted.saturating_add(record.deleted.value());
            let files = agg.languages.entry(language).or_insert(0);
            *files = files.saturating_add(1);
        });
        true
    }

    /// Counts one commit for `identity`, whether or not it carries a diff.
    pub fn fold_commit_seen(&self, identity: &Identity) {
        self.with_entry(identity, |agg| agg.commit_count = agg.commit_count.saturating_add(1));
    }

    /// Adds pre-summed totals (remote weekly buckets).
    pub fn fold_weekly_totals(&self, identity: &Identity, commits: u64, added: u64, deleted: u64) {
        self.with_entry(identity, |agg| {
            agg.commit_count = agg.commit_count.saturating_add(commits);
            agg.lines_added = agg.lines_added.saturating_add(added);
            agg.lines_deleted = agg.lines_deleted.saturating_add(deleted);
        });
    }

    pub fn fold_activity(&self, identity: &Identity, issues: u64, pull_requests: u64) {
        self.with_entry(identity, |agg| {
            agg.issues = agg.issues.saturating_add(issues);
            agg.pull_requests = agg.pull_requests.saturating_add(pull_requests);
        });
    }

    /// Commits folded so far for `identity`, if it has been seen.
    pub fn commit_count(&self, identity: &Identity) -> Option<u64> {
        self.entries.get(&identity.key()).map(|agg| agg.commit_count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ends ingestion and returns every aggregate, ordered by identity key.
    pub fn snapshot(self) -> LedgerSnapshot {
        let mut entries: Vec<(String, ContributorAggregate)> = self.entries.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        LedgerSnapshot {
            aggregates: entries.into_iter().map(|(_, agg)| agg).collect(),
        }
    }

    fn with_entry(&self, identity: &Identity, update: impl FnOnce(&mut ContributorAggregate)) {
        let mut entry = self
            .entries
            .entry(identity.key())
            .or_insert_with(|| ContributorAggregate::new(identity));
        update(entry.value_mut());
    }
}

/// Read-only view of a finished ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    aggregates: Vec<ContributorAggregate>,
}

impl LedgerSnapshot {
    pub fn aggregates(&self) -> &[ContributorAggregate] {
        &self.aggregates
    }

    pub fn get(&self, email: &str) -> Option<&ContributorAggregate> {
        let key = email.trim().to_ascii_lowercase();
        self.aggregates
            .iter()
            .find(|agg| agg.email.trim().to_ascii_lowercase() == key)
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    pub fn into_aggregates(self) -> Vec<ContributorAggregate> {
        self.aggregates
    }
}

impl From<Vec<ContributorAggregate>> for LedgerSnapshot {
    fn from(mut aggregates: Vec<ContributorAggregate>) -> Self {
        aggregates.sort_by_key(|agg| agg.email.trim().to_ascii_lowercase());
        Self { aggregates }
    }
}
