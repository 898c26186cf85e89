use std::collections::{BTreeMap, HashMap};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::RemoteConfig;
use crate::error::{PulseError, Result};
use crate::github::{get_ok, get_paginated, GithubClient, HttpAccessor};
use crate::ledger::Ledger;
use crate::model::{ChangeRecord, Identity, LanguageBreakdown, LanguageUnit, LineCount, RepositoryProfile};
use crate::rank::language_breakdown;
use crate::source::retry::Poll;
use crate::source::{HistorySource, IngestOutcome, SourceKind};

/// Splits a GitHub location into `(owner, repo)`.
///
/// Accepts `https://github.com/o/r`, the same with `.git`, `git@github.com:o/r.git`,
/// `github.com/o/r` and bare `o/r`.
pub fn parse_remote_url(url: &str) -> Result<(String, String)> {
    let invalid = || PulseError::InvalidRemote(url.to_string());
    let trimmed = url.trim().trim_end_matches('/');

    let path = if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
        rest
    } else if let Some((_, rest)) = trimmed.split_once("://") {
        let (host, path) = rest.split_once('/').ok_or_else(invalid)?;
        let host = host.rsplit('@').next().unwrap_or(host);
        if !matches!(host, "github.com" | "www.github.com") {
            return Err(invalid());
        }
        path
    } else if let Some(rest) = trimmed
        .strip_prefix("github.com/")
        .or_else(|| trimmed.strip_prefix("www.github.com/"))
    {
        rest
    } else {
        trimmed
    };

    let mut parts = path.split('/');
    let (Some(owner), Some(repo)) = (parts.next(), parts.next()) else {
        return Err(invalid());
    };
    // Extra segments are only allowed for web URLs (`/tree/main`, ...).
    if parts.next().is_some() && !trimmed.contains("://") && !trimmed.starts_with("github.com/") {
        return Err(invalid());
    }
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    let valid = |s: &str| !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == ':');
    if !valid(owner) || !valid(repo) {
        return Err(invalid());
    }
    Ok((owner.to_string(), repo.to_string()))
}

/// Files touched by one commit.
///
/// The default implementation makes one API call per commit; a batching or
/// caching replacement can be swapped in with [`RemoteSource::with_commit_files`].
pub trait CommitFiles: Send + Sync {
    fn files(&self, sha: &str) -> Result<Vec<String>>;
}

struct ApiCommitFiles<'a, H: HttpAccessor> {
    http: &'a H,
    repo_path: &'a str,
}

impl<H: HttpAccessor> CommitFiles for ApiCommitFiles<'_, H> {
    fn files(&self, sha: &str) -> Result<Vec<String>> {
        let endpoint = format!("{}/commits/{sha}", self.repo_path);
        let body = get_ok(self.http, &endpoint, &[])?;
        Ok(body
            .get("files")
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(|f| f.get("filename").and_then(Value::as_str))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// A contributor as the listing endpoint reports them.
#[derive(Debug, Clone)]
struct Listed {
    login: String,
    id: Option<u64>,
    contributions: u64,
    identity: Identity,
}

impl Listed {
    fn from_json(value: &Value) -> Option<Self> {
        let login = value.get("login")?.as_str()?.to_string();
        let email = value
            .get("email")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{login}@users.noreply.github.com"));
        Some(Self {
            id: value.get("id").and_then(Value::as_u64),
            contributions: value.get("contributions").and_then(Value::as_u64).unwrap_or(0),
            identity: Identity::new(login.clone(), email),
            login,
        })
    }
}

/// Summed weekly buckets for one stats entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WeeklyTotals {
    commits: u64,
    added: u64,
    deleted: u64,
}

#[derive(Debug)]
struct StatsEntry {
    login: Option<String>,
    id: Option<u64>,
    totals: WeeklyTotals,
}

impl StatsEntry {
    fn from_json(value: &Value) -> Option<Self> {
        let author = value.get("author").filter(|a| a.is_object())?;
        let weeks = value.get("weeks")?.as_array()?;
        let mut totals = WeeklyTotals::default();
        for week in weeks {
            let field = |k: &str| week.get(k).and_then(Value::as_u64);
            totals.commits = totals.commits.saturating_add(field("c")?);
            totals.added = totals.added.saturating_add(field("a")?);
            totals.deleted = totals.deleted.saturating_add(field("d")?);
        }
        Some(Self {
            login: author.get("login").and_then(Value::as_str).map(str::to_string),
            id: author.get("id").and_then(Value::as_u64),
            totals,
        })
    }
}

/// History from the GitHub REST API.
pub struct RemoteSource<H: HttpAccessor = GithubClient> {
    owner: String,
    repo: String,
    http: H,
    config: RemoteConfig,
    commit_files: Option<Box<dyn CommitFiles>>,
    progress: bool,
}

impl RemoteSource<GithubClient> {
    /// Builds a source backed by the real API from config.
    pub fn from_config(url: &str, config: RemoteConfig) -> Result<Self> {
        let client = GithubClient::new(config.api_url.clone(), config.token.clone())
            .map_err(|e| PulseError::unavailable(SourceKind::Remote, "build HTTP client", e))?;
        Self::new(url, client, config)
    }
}

impl<H: HttpAccessor> RemoteSource<H> {
    pub fn new(url: &str, http: H, config: RemoteConfig) -> Result<Self> {
        let (owner, repo) = parse_remote_url(url)?;
        Ok(Self {
            owner,
            repo,
            http,
            config,
            commit_files: None,
            progress: false,
        })
    }

    pub fn with_commit_files(mut self, commit_files: Box<dyn CommitFiles>) -> Self {
        self.commit_files = Some(commit_files);
        self
    }

    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn repo_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }

    fn fail(step: &'static str) -> impl Fn(PulseError) -> PulseError {
        move |e| PulseError::unavailable(SourceKind::Remote, step, e)
    }

    fn fetch_profile(&self) -> Result<RepositoryProfile> {
        let body = get_ok(&self.http, &self.repo_path(), &[]).map_err(Self::fail("fetch repository"))?;
        let count = |k: &str| body.get(k).and_then(Value::as_u64).unwrap_or(0);
        let text = |k: &str| body.get(k).and_then(Value::as_str).map(str::to_string);
        Ok(RepositoryProfile {
            name: text("full_name").unwrap_or_else(|| self.slug()),
            location: text("html_url").unwrap_or_else(|| format!("https://github.com/{}", self.slug())),
            default_branch: text("default_branch"),
            stars: count("stargazers_count"),
            forks: count("forks_count"),
            watchers: body
                .get("subscribers_count")
                .and_then(Value::as_u64)
                .unwrap_or_else(|| count("watchers_count")),
            ..RepositoryProfile::default()
        })
    }

    fn fetch_contributors(&self) -> Result<Vec<Listed>> {
        let endpoint = format!("{}/contributors", self.repo_path());
        let items = get_paginated(&self.http, &endpoint, &[], None).map_err(Self::fail("fetch contributors"))?;
        let listed: Vec<Listed> = items
            .iter()
            .filter_map(|item| {
                let parsed = Listed::from_json(item);
                if parsed.is_none() {
                    debug!(%item, "skipping contributor without login");
                }
                parsed
            })
            .collect();
        Ok(listed)
    }

    /// Polls the statistics endpoint, which answers 202 while it computes.
    fn fetch_stats(&self) -> Result<Poll<Vec<Value>>> {
        let endpoint = format!("{}/stats/contributors", self.repo_path());
        self.config
            .retry
            .poll(|attempt| {
                let (status, body) = self.http.get(&endpoint, &[])?;
                debug!(attempt, status, "contributor statistics");
                match (status, body) {
                    (202, _) => Ok(Poll::NotReady),
                    (204, _) | (200, Value::Null) => Ok(Poll::Ready(Vec::new())),
                    (200, Value::Array(entries)) => Ok(Poll::Ready(entries)),
                    (200, _) => Ok(Poll::NotReady),
                    (status, _) => Err(PulseError::Http {
                        status,
                        endpoint: endpoint.clone(),
                    }),
                }
            })
            .map_err(Self::fail("fetch contributor statistics"))
    }

    fn fold_stats(&self, ledger: &Ledger, listed: &[Listed], entries: &[Value]) -> Vec<Listed> {
        let stats: Vec<StatsEntry> = entries
            .iter()
            .filter_map(|entry| {
                let parsed = StatsEntry::from_json(entry);
                if parsed.is_none() {
                    debug!("skipping malformed statistics entry");
                }
                parsed
            })
            .collect();
        let by_id: HashMap<u64, &StatsEntry> = stats.iter().filter_map(|s| Some((s.id?, s))).collect();
        let by_login: HashMap<&str, &StatsEntry> =
            stats.iter().filter_map(|s| Some((s.login.as_deref()?, s))).collect();

        let mut matched = Vec::new();
        for contributor in listed {
            let entry = contributor
                .id
                .and_then(|id| by_id.get(&id))
                .or_else(|| by_login.get(contributor.login.as_str()));
            let Some(entry) = entry else {
                debug!(login = %contributor.login, "no statistics for contributor");
                continue;
            };
            let t = entry.totals;
            ledger.fold_weekly_totals(&contributor.identity, t.commits, t.added, t.deleted);
            matched.push(contributor.clone());
        }
        matched
    }

    fn enrich_languages(&self, ledger: &Ledger, contributors: &[Listed]) -> Result<()> {
        let limit = self.config.max_commits_per_contributor;
        if limit == 0 || contributors.is_empty() {
            return Ok(());
        }

        let repo_path = self.repo_path();
        let api = ApiCommitFiles {
            http: &self.http,
            repo_path: &repo_path,
        };
        let files: &dyn CommitFiles = match &self.commit_files {
            Some(custom) => custom.as_ref(),
            None => &api,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency.max(1))
            .build()
            .map_err(|e| PulseError::unavailable(SourceKind::Remote, "start enrichment workers", e))?;

        let pb = self.progress_bar(contributors.len() as u64);
        let commits_endpoint = format!("{repo_path}/commits");
        let result = pool.install(|| {
            contributors.par_iter().try_for_each(|contributor| {
                let query = [("author", contributor.login.clone())];
                let commits = get_paginated(&self.http, &commits_endpoint, &query, Some(limit))?;
                for commit in &commits {
                    let Some(sha) = commit.get("sha").and_then(Value::as_str) else {
                        debug!("skipping commit without sha");
                        continue;
                    };
                    for path in files.files(sha)? {
                        let record = ChangeRecord::new(
                            path,
                            LineCount::Unknown,
                            LineCount::Unknown,
                            contributor.identity.clone(),
                        );
                        ledger.fold(&record);
                    }
                }
                pb.inc(1);
                Ok::<(), PulseError>(())
            })
        });
        pb.finish_and_clear();
        result.map_err(Self::fail("fetch commit files"))
    }

    fn fold_activity(&self, ledger: &Ledger, contributors: &[Listed]) -> Result<()> {
        let pulls_endpoint = format!("{}/pulls", self.repo_path());
        let pulls = get_paginated(&self.http, &pulls_endpoint, &[("state", "all".to_string())], None)
            .map_err(Self::fail("fetch pull requests"))?;
        let mut pulls_by_login: HashMap<&str, u64> = HashMap::new();
        for pull in &pulls {
            if let Some(login) = pull.pointer("/user/login").and_then(Value::as_str) {
                *pulls_by_login.entry(login).or_insert(0) += 1;
            }
        }

        let issues_endpoint = format!("{}/issues", self.repo_path());
        for contributor in contributors {
            let query = [("creator", contributor.login.clone()), ("state", "all".to_string())];
            let issues = get_paginated(&self.http, &issues_endpoint, &query, None)
                .map_err(Self::fail("fetch issues"))?;
            let issue_count = issues.iter().filter(|i| i.get("pull_request").is_none()).count() as u64;
            let pull_count = pulls_by_login.get(contributor.login.as_str()).copied().unwrap_or(0);
            ledger.fold_activity(&contributor.identity, issue_count, pull_count);
        }
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Fetching contributor commits...");
        pb
    }
}

impl<H: HttpAccessor> HistorySource for RemoteSource<H> {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    fn ingest(&self, ledger: &Ledger) -> Result<IngestOutcome> {
        let mut repository = self.fetch_profile()?;
        let listed = self.fetch_contributors()?;
        info!(repo = %self.slug(), contributors = listed.len(), "listed contributors");

        let (stats_complete, included) = match self.fetch_stats()? {
            Poll::Ready(entries) => {
                let matched = self.fold_stats(ledger, &listed, &entries);
                self.enrich_languages(ledger, &matched)?;
                (true, matched)
            }
            Poll::NotReady => {
                warn!(
                    attempts = self.config.retry.max_attempts,
                    "contributor statistics not ready; falling back to listing counts"
                );
                for contributor in &listed {
                    ledger.fold_weekly_totals(&contributor.identity, contributor.contributions, 0, 0);
                }
                (false, listed)
            }
        };

        if self.config.include_activity {
            self.fold_activity(ledger, &included)?;
        }

        repository.total_commits = if stats_complete {
            // Weekly buckets are the source of truth once statistics arrive.
            ledger_commit_total(ledger, &included)
        } else {
            included.iter().map(|c| c.contributions).sum()
        };

        Ok(IngestOutcome {
            stats_complete,
            repository,
        })
    }

    fn language_totals(&self) -> Result<LanguageBreakdown> {
        let endpoint = format!("{}/languages", self.repo_path());
        let body = get_ok(&self.http, &endpoint, &[]).map_err(Self::fail("fetch languages"))?;
        let bytes: BTreeMap<String, u64> = match body {
            Value::Object(map) => map
                .into_iter()
                .filter_map(|(lang, n)| Some((lang, n.as_u64()?)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Ok(language_breakdown(LanguageUnit::Bytes, bytes))
    }
}

fn ledger_commit_total(ledger: &Ledger, contributors: &[Listed]) -> u64 {
    contributors
        .iter()
        .filter_map(|c| ledger.commit_count(&c.identity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RetryPolicy;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Canned responses keyed by endpoint plus non-paging query pairs.
    /// The last response for a key repeats.
    #[derive(Default)]
    struct FakeHttp {
        routes: Mutex<HashMap<String, VecDeque<(u16, Value)>>>,
        limited: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeHttp {
        fn route(self, key: &str, status: u16, body: Value) -> Self {
            self.routes
                .lock()
                .unwrap()
                .entry(key.to_string())
                .or_default()
                .push_back((status, body));
            self
        }

        /// Answers `key` the way the client reports an exhausted quota.
        fn rate_limit(mut self, key: &str) -> Self {
            self.limited.push(key.to_string());
            self
        }

        fn calls_to(&self, key: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == key).count()
        }
    }

    impl HttpAccessor for FakeHttp {
        fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<(u16, Value)> {
            let params: Vec<String> = query
                .iter()
                .filter(|(k, _)| *k != "page" && *k != "per_page")
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            let key = if params.is_empty() {
                endpoint.to_string()
            } else {
                format!("{endpoint}?{}", params.join("&"))
            };
            self.calls.lock().unwrap().push(key.clone());
            if self.limited.contains(&key) {
                return Err(PulseError::RateLimited {
                    endpoint: endpoint.to_string(),
                });
            }

            let mut routes = self.routes.lock().unwrap();
            let queue = routes.get_mut(&key);
            match queue {
                Some(q) if q.len() > 1 => Ok(q.pop_front().unwrap()),
                Some(q) => Ok(q.front().cloned().unwrap()),
                None => Ok((404, json!({ "message": "Not Found" }))),
            }
        }
    }

    const REPO: &str = "/repos/acme/widget";

    fn config() -> RemoteConfig {
        RemoteConfig {
            retry: RetryPolicy::new(5, Duration::ZERO),
            concurrency: 2,
            ..RemoteConfig::default()
        }
    }

    fn base() -> FakeHttp {
        FakeHttp::default()
            .route(
                REPO,
                200,
                json!({
                    "full_name": "acme/widget",
                    "html_url": "https://github.com/acme/widget",
                    "default_branch": "main",
                    "stargazers_count": 42,
                    "forks_count": 7,
                    "subscribers_count": 3
                }),
            )
            .route(
                &format!("{REPO}/contributors"),
                200,
                json!([
                    { "login": "alice", "id": 1, "contributions": 12 },
                    { "login": "bob", "id": 2, "contributions": 5 }
                ]),
            )
    }

    fn ledger() -> Ledger {
        Ledger::new(crate::exclude::ExclusionFilter::new(), crate::language::Classifier::extension_only())
    }

    #[test]
    fn parses_supported_url_forms() {
        let expected = ("acme".to_string(), "widget".to_string());
        for url in [
            "https://github.com/acme/widget",
            "https://github.com/acme/widget.git",
            "https://github.com/acme/widget/",
            "git@github.com:acme/widget.git",
            "github.com/acme/widget",
            "acme/widget",
        ] {
            assert_eq!(parse_remote_url(url).unwrap(), expected, "{url}");
        }
        for bad in ["", "acme", "https://gitlab.com/acme/widget", "a b/c", "a/b/c"] {
            assert!(parse_remote_url(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn stats_after_two_pending_polls_use_weekly_buckets() {
        let http = base()
            .route(&format!("{REPO}/stats/contributors"), 202, Value::Null)
            .route(&format!("{REPO}/stats/contributors"), 202, Value::Null)
            .route(
                &format!("{REPO}/stats/contributors"),
                200,
                json!([
                    { "author": { "login": "alice", "id": 1 }, "weeks": [] },
                    { "author": { "login": "bob", "id": 2 },
                      "weeks": [ { "w": 1, "a": 30, "d": 10, "c": 2 }, { "w": 2, "a": 5, "d": 0, "c": 1 } ] }
                ]),
            )
            .route(&format!("{REPO}/commits?author=alice"), 200, json!([]))
            .route(&format!("{REPO}/commits?author=bob"), 200, json!([{ "sha": "abc" }]))
            .route(
                &format!("{REPO}/commits/abc"),
                200,
                json!({ "files": [ { "filename": "src/app.py" }, { "filename": "yarn.lock" } ] }),
            );
        let source = RemoteSource::new("acme/widget", http, config()).unwrap();
        let ledger = ledger();
        let outcome = source.ingest(&ledger).unwrap();

        assert!(outcome.stats_complete);
        assert_eq!(source.http.calls_to(&format!("{REPO}/stats/contributors")), 3);
        assert_eq!(outcome.repository.stars, 42);
        assert_eq!(outcome.repository.default_branch.as_deref(), Some("main"));
        assert_eq!(outcome.repository.total_commits, 3);

        let snap = ledger.snapshot();
        let alice = snap.get("alice@users.noreply.github.com").unwrap();
        assert_eq!(alice.commit_count, 0);
        assert_eq!(alice.total_changes(), 0);

        let bob = snap.get("bob@users.noreply.github.com").unwrap();
        assert_eq!((bob.commit_count, bob.lines_added, bob.lines_deleted), (3, 35, 10));
        assert_eq!(bob.files_changed, 1);
        assert_eq!(bob.languages.get("Python"), Some(&1));
    }

    #[test]
    fn pending_stats_degrade_to_listing_counts() {
        let http = base().route(&format!("{REPO}/stats/contributors"), 202, Value::Null);
        let source = RemoteSource::new("https://github.com/acme/widget", http, config()).unwrap();
        let ledger = ledger();
        let outcome = source.ingest(&ledger).unwrap();

        assert!(!outcome.stats_complete);
        assert_eq!(source.http.calls_to(&format!("{REPO}/stats/contributors")), 5);
        assert_eq!(source.http.calls_to(&format!("{REPO}/commits?author=alice")), 0);

        let snap = ledger.snapshot();
        let alice = snap.get("alice@users.noreply.github.com").unwrap();
        assert_eq!((alice.commit_count, alice.lines_added, alice.lines_deleted), (12, 0, 0));
        assert!(alice.languages.is_empty());
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn contributors_missing_from_stats_are_skipped() {
        let http = base()
            .route(
                &format!("{REPO}/stats/contributors"),
                200,
                json!([
                    { "author": { "login": "alice", "id": 1 }, "weeks": [ { "w": 1, "a": 1, "d": 1, "c": 1 } ] },
                    { "author": null, "weeks": [] },
                    { "author": { "login": "ghost" }, "weeks": [ { "w": 1, "a": "x" } ] }
                ]),
            )
            .route(&format!("{REPO}/commits?author=alice"), 200, json!([]));
        let source = RemoteSource::new("acme/widget", http, config()).unwrap();
        let ledger = ledger();
        source.ingest(&ledger).unwrap();

        let snap = ledger.snapshot();
        assert_eq!(snap.len(), 1);
        assert!(snap.get("bob@users.noreply.github.com").is_none());
    }

    #[test]
    fn hard_errors_name_the_failed_step() {
        let http = base().route(&format!("{REPO}/stats/contributors"), 500, Value::Null);
        let source = RemoteSource::new("acme/widget", http, config()).unwrap();
        let err = source.ingest(&ledger()).unwrap_err();
        assert!(err.is_source_unavailable());
        assert!(err.to_string().contains("fetch contributor statistics"), "{err}");

        let missing = RemoteSource::new("acme/missing", FakeHttp::default(), config()).unwrap();
        let err = missing.ingest(&ledger()).unwrap_err();
        assert!(err.to_string().contains("fetch repository"), "{err}");
    }

    #[test]
    fn rate_limit_during_enrichment_fails_the_commit_files_step() {
        let http = base()
            .route(
                &format!("{REPO}/stats/contributors"),
                200,
                json!([ { "author": { "login": "alice", "id": 1 }, "weeks": [ { "w": 1, "a": 2, "d": 0, "c": 1 } ] } ]),
            )
            .route(&format!("{REPO}/commits?author=alice"), 200, json!([{ "sha": "abc" }]))
            .route(&format!("{REPO}/commits?author=bob"), 200, json!([]))
            .rate_limit(&format!("{REPO}/commits/abc"));
        let source = RemoteSource::new("acme/widget", http, config()).unwrap();
        let err = source.ingest(&ledger()).unwrap_err();

        assert!(err.is_source_unavailable());
        let msg = err.to_string();
        assert!(msg.contains("fetch commit files"), "{msg}");
        assert!(msg.contains("Rate limited by"), "{msg}");
        assert_eq!(source.http.calls_to(&format!("{REPO}/commits/abc")), 1);
    }

    #[test]
    fn weekly_buckets_saturate_instead_of_overflowing() {
        let entry = StatsEntry::from_json(&json!({
            "author": { "login": "alice", "id": 1 },
            "weeks": [
                { "w": 1, "a": u64::MAX, "d": 1, "c": u64::MAX },
                { "w": 2, "a": 5, "d": 1, "c": 1 }
            ]
        }))
        .unwrap();
        assert_eq!(entry.totals.added, u64::MAX);
        assert_eq!(entry.totals.commits, u64::MAX);
        assert_eq!(entry.totals.deleted, 2);
    }

    #[test]
    fn activity_counts_issues_and_pulls_separately() {
        let http = base()
            .route(&format!("{REPO}/stats/contributors"), 202, Value::Null)
            .route(
                &format!("{REPO}/pulls?state=all"),
                200,
                json!([
                    { "user": { "login": "alice" } },
                    { "user": { "login": "alice" } },
                    { "user": { "login": "carol" } }
                ]),
            )
            .route(
                &format!("{REPO}/issues?creator=alice&state=all"),
                200,
                json!([ { "number": 1 }, { "number": 2, "pull_request": {} } ]),
            )
            .route(&format!("{REPO}/issues?creator=bob&state=all"), 200, json!([]));
        let cfg = RemoteConfig {
            include_activity: true,
            ..config()
        };
        let source = RemoteSource::new("acme/widget", http, cfg).unwrap();
        let ledger = ledger();
        source.ingest(&ledger).unwrap();

        let snap = ledger.snapshot();
        let alice = snap.get("alice@users.noreply.github.com").unwrap();
        assert_eq!((alice.issues, alice.pull_requests), (1, 2));
        let bob = snap.get("bob@users.noreply.github.com").unwrap();
        assert_eq!((bob.issues, bob.pull_requests), (0, 0));
    }

    #[test]
    fn custom_commit_files_replace_per_commit_calls() {
        struct Fixed;
        impl CommitFiles for Fixed {
            fn files(&self, _sha: &str) -> Result<Vec<String>> {
                Ok(vec!["lib/core.rs".to_string()])
            }
        }
        let http = base()
            .route(
                &format!("{REPO}/stats/contributors"),
                200,
                json!([ { "author": { "login": "alice", "id": 1 }, "weeks": [ { "w": 1, "a": 2, "d": 0, "c": 1 } ] } ]),
            )
            .route(&format!("{REPO}/commits?author=alice"), 200, json!([{ "sha": "s1" }, { "sha": "s2" }]));
        let source = RemoteSource::new("acme/widget", http, config())
            .unwrap()
            .with_commit_files(Box::new(Fixed));
        let ledger = ledger();
        source.ingest(&ledger).unwrap();

        assert_eq!(source.http.calls_to(&format!("{REPO}/commits/s1")), 0);
        let snap = ledger.snapshot();
        let alice = snap.get("alice@users.noreply.github.com").unwrap();
        assert_eq!(alice.files_changed, 2);
        assert_eq!(alice.languages.get("Rust"), Some(&2));
    }

    #[test]
    fn language_totals_are_bytes() {
        let http = FakeHttp::default().route(
            &format!("{REPO}/languages"),
            200,
            json!({ "Rust": 300, "Shell": 100 }),
        );
        let source = RemoteSource::new("acme/widget", http, config()).unwrap();
        let langs = source.language_totals().unwrap();
        assert_eq!(langs.unit, LanguageUnit::Bytes);
        assert_eq!(langs.total, 400);
        assert_eq!(langs.entries[0].language, "Rust");
        assert!((langs.entries[0].percentage - 75.0).abs() < 1e-9);
    }
}
