//! Table, JSON and NDJSON renderings of analysis results.

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::codebase::{CodebaseSummary, FileCount};
use crate::model::{
    AnalysisReport, ContributorView, LanguageBreakdown, LanguageShare, LanguageUnit, LocSummary, RepositoryProfile,
    SCHEMA_VERSION,
};
use crate::source::SourceKind;

const TABLE_LIMIT: usize = 50;

#[derive(Serialize)]
pub struct ContributorsOutput<'a> {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub source: SourceKind,
    pub stats_complete: bool,
    pub repository: &'a RepositoryProfile,
    pub contributors: &'a [ContributorView],
}

#[derive(Serialize)]
pub struct LanguagesOutput<'a> {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub source: SourceKind,
    pub languages: &'a LanguageBreakdown,
}

#[derive(Serialize)]
pub struct LocOutput<'a> {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: &'a LocSummary,
}

#[derive(Serialize)]
pub struct CodebaseOutput<'a> {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: &'a CodebaseSummary,
}

/// NDJSON line for one contributor; each row carries whether statistics were complete.
#[derive(Serialize)]
pub struct ContributorRow<'a> {
    pub source: SourceKind,
    pub stats_complete: bool,
    #[serde(flatten)]
    pub contributor: &'a ContributorView,
}

/// NDJSON line for one language; `amount` is only meaningful next to its unit.
#[derive(Serialize)]
pub struct LanguageRow<'a> {
    pub source: SourceKind,
    pub unit: LanguageUnit,
    #[serde(flatten)]
    pub share: &'a LanguageShare,
}

pub fn contributor_rows(source: SourceKind, stats_complete: bool, contributors: &[ContributorView]) -> Vec<ContributorRow<'_>> {
    contributors
        .iter()
        .map(|contributor| ContributorRow {
            source,
            stats_complete,
            contributor,
        })
        .collect()
}

pub fn language_rows(source: SourceKind, languages: &LanguageBreakdown) -> Vec<LanguageRow<'_>> {
    languages
        .entries
        .iter()
        .map(|share| LanguageRow {
            source,
            unit: languages.unit,
            share,
        })
        .collect()
}

pub fn output_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn output_ndjson<T: Serialize>(rows: &[T]) -> Result<()> {
    for row in rows {
        println!("{}", serde_json::to_string(row)?);
    }
    Ok(())
}

pub fn contributors_output<'a>(report: &'a AnalysisReport, contributors: &'a [ContributorView]) -> ContributorsOutput<'a> {
    ContributorsOutput {
        version: SCHEMA_VERSION,
        generated_at: report.generated_at,
        source: report.source,
        stats_complete: report.stats_complete,
        repository: &report.repository,
        contributors,
    }
}

pub fn languages_output(source: SourceKind, languages: &LanguageBreakdown) -> LanguagesOutput<'_> {
    LanguagesOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        source,
        languages,
    }
}

pub fn loc_output(summary: &LocSummary) -> LocOutput<'_> {
    LocOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        summary,
    }
}

pub fn codebase_output(summary: &CodebaseSummary) -> CodebaseOutput<'_> {
    CodebaseOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        summary,
    }
}

pub fn output_repository(repo: &RepositoryProfile, source: SourceKind) {
    println!("{}", style(format!("Repository: {}", repo.name)).bold());
    println!("  Location:  {}", repo.location);
    if let Some(branch) = &repo.default_branch {
        println!("  Branch:    {branch}");
    }
    println!("  Commits:   {}", repo.total_commits);
    if let (Some(first), Some(last)) = (repo.first_commit, repo.last_commit) {
        println!(
            "  History:   {} .. {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }
    if source == SourceKind::Remote {
        println!(
            "  Stars: {}  Forks: {}  Watchers: {}",
            repo.stars, repo.forks, repo.watchers
        );
    }
    println!();
}

pub fn output_contributors_table(contributors: &[ContributorView], stats_complete: bool) {
    if contributors.is_empty() {
        println!("No contributors found");
        return;
    }
    if !stats_complete {
        println!(
            "{}",
            style("Contributor statistics were not ready; showing commit counts only.").yellow()
        );
    }

    println!(
        "{:<28} {:>8} {:>10} {:>10} {:>7} {:>8}  {}",
        style("Contributor").bold(),
        style("Commits").bold(),
        style("Added").bold(),
        style("Deleted").bold(),
        style("Files").bold(),
        style("Share").bold(),
        style("Top languages").bold()
    );
    println!("{}", "─".repeat(100));
    for view in contributors.iter().take(TABLE_LIMIT) {
        let langs: Vec<String> = view
            .top_languages
            .iter()
            .map(|(lang, n)| format!("{lang} ({n})"))
            .collect();
        println!(
            "{:<28} {:>8} {:>10} {:>10} {:>7} {:>7.1}%  {}",
            truncate(&view.name, 28),
            view.commit_count,
            style(format!("+{}", view.lines_added)).green(),
            style(format!("-{}", view.lines_deleted)).red(),
            view.files_changed,
            view.percentage,
            langs.join(", ")
        );
    }
    if contributors.len() > TABLE_LIMIT {
        println!("\n... and {} more contributors", contributors.len() - TABLE_LIMIT);
    }
}

pub fn output_languages_table(languages: &LanguageBreakdown) {
    if languages.entries.is_empty() {
        println!("No languages found");
        return;
    }
    let unit = languages.unit.to_string();
    println!(
        "{} (by {unit})",
        style("Language Distribution").bold()
    );
    println!(
        "{:<24} {:>12} {:>8}",
        style("Language").bold(),
        style(capitalize(&unit)).bold(),
        style("Share").bold()
    );
    println!("{}", "─".repeat(46));
    for entry in &languages.entries {
        println!(
            "{:<24} {:>12} {:>7.1}%",
            style(&entry.language).green(),
            entry.amount,
            entry.percentage
        );
    }
}

pub fn output_loc_table(summary: &LocSummary) {
    println!("{}", style("Lines of Code Summary").bold());
    println!("  Total lines:     {}", summary.total_lines);
    println!("  Code files:      {}", summary.code_files);
    println!("  Non-code files:  {}", summary.non_code_files);
    println!();
    if summary.by_language.entries.is_empty() {
        println!("{}", style("No code files found in the repository.").yellow());
    } else {
        output_languages_table(&summary.by_language);
    }
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn output_codebase_table(summary: &CodebaseSummary) {
    println!("{}", style("Codebase Statistics").bold());
    println!("  Tracked files:   {}", summary.file_count);
    println!();

    if !summary.by_extension.is_empty() {
        let mut extensions: Vec<(&String, &u64)> = summary.by_extension.iter().collect();
        extensions.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        println!("{:<24} {:>8}", style("Extension").bold(), style("Files").bold());
        println!("{}", "─".repeat(33));
        for (ext, n) in extensions.iter().take(TABLE_LIMIT) {
            println!("{:<24} {:>8}", ext, n);
        }
        println!();
    }

    output_file_counts("Largest files", "Lines", &summary.largest_files);
    output_file_counts("Most changed files", "Changes", &summary.most_changed_files);

    let activity = &summary.activity;
    if activity.by_month.is_empty() {
        println!("{}", style("No commits found.").yellow());
        return;
    }
    println!("{}", style("Commits by month (UTC)").bold());
    for (month, n) in &activity.by_month {
        println!("  {month}  {n:>6}");
    }
    println!();
    println!("{}", style("Commits by weekday").bold());
    for (day, n) in WEEKDAYS.iter().zip(&activity.by_weekday) {
        println!("  {day}  {n:>6}");
    }
    println!();
    println!("{}", style("Commits by hour").bold());
    for (hour, n) in activity.by_hour.iter().enumerate().filter(|(_, n)| **n > 0) {
        println!("  {hour:02}:00  {n:>6}");
    }
}

fn output_file_counts(title: &str, unit: &str, files: &[FileCount]) {
    if files.is_empty() {
        return;
    }
    println!("{:<60} {:>8}", style(title).bold(), style(unit).bold());
    println!("{}", "─".repeat(69));
    for file in files {
        println!("{:<60} {:>8}", truncate(&file.path, 60), file.count);
    }
    println!();
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
