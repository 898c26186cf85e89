use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_API_URL, DEFAULT_CONCURRENCY, DEFAULT_MAX_COMMITS_PER_CONTRIBUTOR};

#[derive(Parser)]
#[command(name = "gitpulse")]
#[command(about = "Contribution and language analytics for git repositories")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, env = "GITPULSE_REPO", help = "Path to git repository, or owner/repo / GitHub URL with --remote")]
    pub repo: Option<String>,

    #[arg(long, help = "Analyze a GitHub repository through the REST API")]
    pub remote: bool,

    #[arg(long = "ref", help = "Analyze history reachable from this ref instead of HEAD (local only)")]
    pub reference: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub personal access token")]
    pub token: Option<String>,

    #[arg(long, env = "GITPULSE_API_URL", default_value = DEFAULT_API_URL, help = "GitHub API base URL")]
    pub api_url: String,

    #[arg(long, default_value_t = 5, help = "Polls of the contributor statistics endpoint before degrading")]
    pub retry_attempts: u32,

    #[arg(long, default_value_t = 2, help = "Seconds between statistics polls")]
    pub retry_delay: u64,

    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, help = "Parallel contributors during remote language enrichment")]
    pub concurrency: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_COMMITS_PER_CONTRIBUTOR, help = "Commits inspected per contributor for remote languages (0 disables)")]
    pub max_commits: usize,

    #[arg(long, help = "Also count issues and pull requests per contributor (remote only)")]
    pub activity: bool,

    #[arg(long = "exclude", value_name = "GLOB", help = "Additional gitignore-style pattern to exclude (repeatable)")]
    pub exclude: Vec<String>,

    #[arg(long, help = "Classify files by extension only")]
    pub no_lexer: bool,

    #[arg(short, long, help = "Verbose logging to stderr")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Contributors and repository languages
    Analyze {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,

        #[arg(long, help = "Show only the top N contributors")]
        top: Option<usize>,
    },
    /// Ranked contributor statistics
    Contributors {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,

        #[arg(long, help = "Show only the top N contributors")]
        top: Option<usize>,
    },
    /// Language distribution of the repository
    Languages {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,

        #[arg(long, help = "Count lines of code instead of files")]
        lines: bool,
    },
    /// Lines-of-code summary
    Loc {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Commit activity over time and file statistics (local only)
    Codebase {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        init_logging(self.common.verbose);
        match self.command {
            Commands::Analyze { json, ndjson, top } => crate::commands::analyze_exec(self.common, json, ndjson, top),
            Commands::Contributors { json, ndjson, top } => {
                crate::commands::contributors_exec(self.common, json, ndjson, top)
            }
            Commands::Languages { json, ndjson, lines } => {
                crate::commands::languages_exec(self.common, json, ndjson, lines)
            }
            Commands::Loc { json } => crate::commands::loc_exec(self.common, json),
            Commands::Codebase { json } => crate::commands::codebase_exec(self.common, json),
        }
    }
}

/// Logs go to stderr so JSON on stdout stays parseable.
fn init_logging(verbose: bool) {
    let default = if verbose { "gitpulse=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GITPULSE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
