use std::time::Duration;

use anyhow::{bail, Context};
use console::style;

use crate::analyze::analyze;
use crate::cli::CommonArgs;
use crate::config::{AnalysisConfig, RemoteConfig};
use crate::rank::top_contributors;
use crate::report::{
    codebase_output, contributor_rows, contributors_output, language_rows, languages_output, loc_output,
    output_codebase_table, output_contributors_table, output_json, output_languages_table, output_loc_table,
    output_ndjson, output_repository,
};
use crate::source::{HistorySource, LocalSource, RemoteSource, RetryPolicy, SourceKind};

/// Output format chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Table,
    Json,
    Ndjson,
}

impl Format {
    pub fn from_flags(json: bool, ndjson: bool) -> Self {
        if json {
            Format::Json
        } else if ndjson {
            Format::Ndjson
        } else {
            Format::Table
        }
    }

    fn shows_progress(self) -> bool {
        self == Format::Table
    }
}

impl CommonArgs {
    pub fn analysis_config(&self, lines: bool, format: Format) -> AnalysisConfig {
        AnalysisConfig {
            exclude_patterns: self.exclude.clone(),
            lexical: !self.no_lexer,
            lines,
            progress: format.shows_progress(),
        }
    }

    pub fn remote_config(&self) -> RemoteConfig {
        RemoteConfig {
            api_url: self.api_url.clone(),
            token: self.token.clone(),
            retry: RetryPolicy::new(self.retry_attempts, Duration::from_secs(self.retry_delay)),
            concurrency: self.concurrency,
            max_commits_per_contributor: self.max_commits,
            include_activity: self.activity,
        }
    }
}

fn open_source(common: &CommonArgs, config: &AnalysisConfig) -> anyhow::Result<Box<dyn HistorySource>> {
    if common.remote {
        let url = common
            .repo
            .as_deref()
            .context("--remote needs --repo <owner/repo or GitHub URL>")?;
        let source = RemoteSource::from_config(url, common.remote_config())
            .context("Failed to set up remote repository")?
            .show_progress(config.progress);
        Ok(Box::new(source))
    } else {
        Ok(Box::new(open_local(common, config)?))
    }
}

fn open_local(common: &CommonArgs, config: &AnalysisConfig) -> anyhow::Result<LocalSource> {
    let source = LocalSource::open(common.repo.as_deref(), common.reference.clone())
        .context("Failed to open git repository")?
        .with_rules(config.filter()?, config.classifier())
        .lines_mode(config.lines)
        .show_progress(config.progress);
    Ok(source)
}

pub fn analyze_exec(common: CommonArgs, json: bool, ndjson: bool, top: Option<usize>) -> anyhow::Result<()> {
    let format = Format::from_flags(json, ndjson);
    let config = common.analysis_config(false, format);
    let source = open_source(&common, &config)?;
    let mut report = analyze(source.as_ref(), &config).context("Analysis failed")?;
    if let Some(limit) = top {
        report.contributors.truncate(limit);
    }

    match format {
        Format::Json => output_json(&report)?,
        Format::Ndjson => output_ndjson(&contributor_rows(report.source, report.stats_complete, &report.contributors))?,
        Format::Table => {
            output_repository(&report.repository, report.source);
            output_contributors_table(&report.contributors, report.stats_complete);
            println!();
            output_languages_table(&report.languages);
        }
    }
    Ok(())
}

pub fn contributors_exec(common: CommonArgs, json: bool, ndjson: bool, top: Option<usize>) -> anyhow::Result<()> {
    let format = Format::from_flags(json, ndjson);
    let config = common.analysis_config(false, format);
    let source = open_source(&common, &config)?;
    let report = analyze(source.as_ref(), &config).context("Analysis failed")?;
    let shown = top_contributors(&report.contributors, top.unwrap_or(report.contributors.len()));

    match format {
        Format::Json => output_json(&contributors_output(&report, shown))?,
        Format::Ndjson => output_ndjson(&contributor_rows(report.source, report.stats_complete, shown))?,
        Format::Table => output_contributors_table(shown, report.stats_complete),
    }
    Ok(())
}

pub fn languages_exec(common: CommonArgs, json: bool, ndjson: bool, lines: bool) -> anyhow::Result<()> {
    let format = Format::from_flags(json, ndjson);
    if lines && common.remote {
        eprintln!(
            "{}",
            style("Note: line statistics are not available for remote repositories; GitHub reports bytes.").yellow()
        );
    }
    let config = common.analysis_config(lines, format);
    let source = open_source(&common, &config)?;
    let languages = source.language_totals().context("Failed to collect language totals")?;

    match format {
        Format::Json => output_json(&languages_output(source.kind(), &languages))?,
        Format::Ndjson => output_ndjson(&language_rows(source.kind(), &languages))?,
        Format::Table => output_languages_table(&languages),
    }
    Ok(())
}

pub fn loc_exec(common: CommonArgs, json: bool) -> anyhow::Result<()> {
    if common.remote {
        bail!(
            "line statistics are not available for {} repositories; use `gitpulse --remote languages` for byte counts",
            SourceKind::Remote
        );
    }
    let format = Format::from_flags(json, false);
    let config = common.analysis_config(true, format);
    let source = open_local(&common, &config)?;
    let summary = source.loc_summary().context("Failed to count lines of code")?;

    match format {
        Format::Json => output_json(&loc_output(&summary))?,
        _ => output_loc_table(&summary),
    }
    Ok(())
}

pub fn codebase_exec(common: CommonArgs, json: bool) -> anyhow::Result<()> {
    if common.remote {
        bail!(
            "codebase statistics are not available for {} repositories; they need a local checkout",
            SourceKind::Remote
        );
    }
    let format = Format::from_flags(json, false);
    let config = common.analysis_config(false, format);
    let source = open_local(&common, &config)?;
    let summary = source.codebase_summary().context("Failed to collect codebase statistics")?;

    match format {
        Format::Json => output_json(&codebase_output(&summary))?,
        _ => output_codebase_table(&summary),
    }
    Ok(())
}
