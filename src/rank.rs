use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::ledger::LedgerSnapshot;
use crate::model::{
    ContributorAggregate, ContributorView, LanguageBreakdown, LanguageShare, LanguageTag, LanguageUnit,
};

pub const TOP_LANGUAGES: usize = 3;

/// Share of `part` in `total`, in percent; zero when `total` is zero.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Ranks every contributor by share of total changes.
///
/// The denominator is summed once over the whole snapshot. Ties on
/// percentage fall back to display name, then email, both ascending.
pub fn rank(snapshot: &LedgerSnapshot) -> Vec<ContributorView> {
    let total = snapshot
        .aggregates()
        .iter()
        .map(ContributorAggregate::total_changes)
        .fold(0u64, u64::saturating_add);

    let mut views: Vec<ContributorView> = snapshot
        .aggregates()
        .iter()
        .map(|agg| ContributorView {
            name: agg.name.clone(),
            email: agg.email.clone(),
            commit_count: agg.commit_count,
            lines_added: agg.lines_added,
            lines_deleted: agg.lines_deleted,
            files_changed: agg.files_changed,
            total_changes: agg.total_changes(),
            percentage: percentage(agg.total_changes(), total),
            top_languages: top_languages(&agg.languages, TOP_LANGUAGES),
            issues: agg.issues,
            pull_requests: agg.pull_requests,
        })
        .collect();

    views.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.email.cmp(&b.email))
    });
    views
}

/// First `limit` entries of a ranking.
pub fn top_contributors(views: &[ContributorView], limit: usize) -> &[ContributorView] {
    &views[..limit.min(views.len())]
}

/// The `k` most touched languages, count descending, label ascending on ties.
pub fn top_languages(histogram: &BTreeMap<LanguageTag, u64>, k: usize) -> Vec<(LanguageTag, u64)> {
    let mut langs: Vec<(LanguageTag, u64)> = histogram.iter().map(|(l, c)| (l.clone(), *c)).collect();
    langs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    langs.truncate(k);
    langs
}

/// Repository-wide language totals with percentages, tagged with their unit.
pub fn language_breakdown(unit: LanguageUnit, amounts: BTreeMap<LanguageTag, u64>) -> LanguageBreakdown {
    let total = amounts.values().copied().fold(0u64, u64::saturating_add);
    let mut entries: Vec<LanguageShare> = amounts
        .into_iter()
        .map(|(language, amount)| LanguageShare {
            percentage: percentage(amount, total),
            language,
            amount,
        })
        .collect();
    entries.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.language.cmp(&b.language)));
    LanguageBreakdown { unit, total, entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Identity;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn agg(name: &str, added: u64, deleted: u64) -> ContributorAggregate {
        let mut agg = ContributorAggregate::new(&Identity::new(name, format!("{}@x.com", name.to_lowercase())));
        agg.lines_added = added;
        agg.lines_deleted = deleted;
        agg
    }

    #[test]
    fn shares_of_three_hundred_and_one_hundred() {
        let snap = LedgerSnapshot::from(vec![agg("Small", 60, 40), agg("Big", 200, 100)]);
        let views = rank(&snap);
        assert_eq!(views[0].name, "Big");
        assert_eq!(views[0].percentage, 75.0);
        assert_eq!(views[1].name, "Small");
        assert_eq!(views[1].percentage, 25.0);
    }

    #[test]
    fn zero_total_gives_zero_percentages() {
        let snap = LedgerSnapshot::from(vec![agg("A", 0, 0), agg("B", 0, 0)]);
        let views = rank(&snap);
        assert!(views.iter().all(|v| v.percentage == 0.0));
        assert_eq!(views[0].name, "A");
    }

    #[test]
    fn ties_break_on_name() {
        let snap = LedgerSnapshot::from(vec![agg("zed", 5, 5), agg("Amy", 5, 5), agg("bob", 5, 5)]);
        let names: Vec<_> = rank(&snap).into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["Amy", "bob", "zed"]);
    }

    #[test]
    fn top_three_languages_with_label_tie_break() {
        let mut hist = BTreeMap::new();
        hist.insert("Rust".to_string(), 4);
        hist.insert("Python".to_string(), 4);
        hist.insert("Go".to_string(), 1);
        hist.insert("C".to_string(), 9);
        let top = top_languages(&hist, TOP_LANGUAGES);
        assert_eq!(
            top,
            vec![("C".to_string(), 9), ("Python".to_string(), 4), ("Rust".to_string(), 4)]
        );
    }

    #[test]
    fn breakdown_carries_unit_and_sorted_shares() {
        let mut amounts = BTreeMap::new();
        amounts.insert("Rust".to_string(), 30);
        amounts.insert("Python".to_string(), 10);
        let b = language_breakdown(LanguageUnit::Bytes, amounts);
        assert_eq!(b.unit, LanguageUnit::Bytes);
        assert_eq!(b.total, 40);
        assert_eq!(b.entries[0].language, "Rust");
        assert_eq!(b.entries[0].percentage, 75.0);
    }

    #[test]
    fn top_contributors_clamps_limit() {
        let snap = LedgerSnapshot::from(vec![agg("A", 1, 0)]);
        let views = rank(&snap);
        assert_eq!(top_contributors(&views, 10).len(), 1);
        assert_eq!(top_contributors(&views, 0).len(), 0);
    }

    proptest! {
        #[test]
        fn percentages_sum_to_one_hundred(
            counts in prop::collection::vec((0u64..100_000, 0u64..100_000), 1..40)
        ) {
            let aggs: Vec<_> = counts
                .iter()
                .enumerate()
                .map(|(i, (a, d))| agg(&format!("dev{i}"), *a, *d))
                .collect();
            let expected_total: u64 = counts.iter().map(|(a, d)| a + d).sum();
            let views = rank(&LedgerSnapshot::from(aggs));

            let total: u64 = views.iter().map(|v| v.total_changes).sum();
            prop_assert_eq!(total, expected_total);

            let sum: f64 = views.iter().map(|v| v.percentage).sum();
            if expected_total > 0 {
                prop_assert!((sum - 100.0).abs() < 1e-6, "sum was {}", sum);
            } else {
                prop_assert!(views.iter().all(|v| v.percentage == 0.0));
            }

            for pair in views.windows(2) {
                prop_assert!(pair[0].percentage >= pair[1].percentage);
            }
        }
    }
}
