use chrono::Utc;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::model::{AnalysisReport, SCHEMA_VERSION};
use crate::rank::rank;
use crate::source::HistorySource;

/// Runs one full analysis: ingest into a fresh ledger, snapshot, rank, and
/// collect repository language totals.
pub fn analyze(source: &dyn HistorySource, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let ledger = Ledger::new(config.filter()?, config.classifier());
    let outcome = source.ingest(&ledger)?;
    let snapshot = ledger.snapshot();

    let contributors = rank(&snapshot);
    let languages = source.language_totals()?;
    info!(
        source = %source.kind(),
        contributors = contributors.len(),
        stats_complete = outcome.stats_complete,
        "analysis finished"
    );

    Ok(AnalysisReport {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        source: source.kind(),
        stats_complete: outcome.stats_complete,
        repository: outcome.repository,
        contributors,
        languages,
        snapshot: snapshot.into_aggregates(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ChangeRecord, Identity, LanguageBreakdown, LanguageUnit, LineCount, RepositoryProfile,
    };
    use crate::rank::language_breakdown;
    use crate::source::{IngestOutcome, SourceKind};
    use std::collections::BTreeMap;

    struct Scripted {
        records: Vec<ChangeRecord>,
    }

    impl HistorySource for Scripted {
        fn kind(&self) -> SourceKind {
            SourceKind::Local
        }

        fn ingest(&self, ledger: &Ledger) -> Result<IngestOutcome> {
            for record in &self.records {
                ledger.fold_commit_seen(&record.author);
                ledger.fold(record);
            }
            Ok(IngestOutcome {
                stats_complete: true,
                repository: RepositoryProfile {
                    name: "scripted".into(),
                    total_commits: self.records.len() as u64,
                    ..RepositoryProfile::default()
                },
            })
        }

        fn language_totals(&self) -> Result<LanguageBreakdown> {
            Ok(language_breakdown(LanguageUnit::Files, BTreeMap::from([("Rust".to_string(), 2)])))
        }
    }

    fn record(path: &str, added: u64, deleted: u64, who: &str) -> ChangeRecord {
        ChangeRecord::new(
            path,
            LineCount::Counted(added),
            LineCount::Counted(deleted),
            Identity::new(who, format!("{who}@x.com")),
        )
    }

    #[test]
    fn ranks_what_the_source_folded() {
        let source = Scripted {
            records: vec![
                record("src/a.rs", 200, 100, "big"),
                record("src/b.rs", 60, 40, "small"),
                record("Cargo.lock", 5000, 0, "small"),
            ],
        };
        let report = analyze(&source, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.version, SCHEMA_VERSION);
        assert_eq!(report.source, SourceKind::Local);
        assert_eq!(report.contributors.len(), 2);
        assert_eq!(report.contributors[0].name, "big");
        assert!((report.contributors[0].percentage - 75.0).abs() < 1e-9);
        assert!((report.contributors[1].percentage - 25.0).abs() < 1e-9);
        assert_eq!(report.snapshot.len(), 2);
        assert_eq!(report.languages.total, 2);
    }

    #[test]
    fn extra_patterns_apply_before_folding() {
        let source = Scripted {
            records: vec![record("generated/x.rs", 10, 0, "a"), record("src/y.rs", 5, 0, "a")],
        };
        let config = AnalysisConfig {
            exclude_patterns: vec!["generated/".to_string()],
            ..AnalysisConfig::default()
        };
        let report = analyze(&source, &config).unwrap();
        assert_eq!(report.contributors[0].total_changes, 5);
        assert_eq!(report.contributors[0].files_changed, 1);
    }
}
