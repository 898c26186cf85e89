use gitpulse::config::AnalysisConfig;
use gitpulse::git::{GitRepo, VcsAccessor};
use gitpulse::source::{HistorySource, LocalSource};
use gitpulse::{analyze, PulseError};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    assert!(Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

fn init_git_repo(dir: &Path) {
    git(dir, &["init"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
}

fn commit_as(dir: &Path, email: &str, name: &str, content: &[u8]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    git(dir, &["add", "."]);
    assert!(Command::new("git")
        .args(["commit", "-m", &format!("touch {name}")])
        .env("GIT_AUTHOR_NAME", email.split('@').next().unwrap())
        .env("GIT_AUTHOR_EMAIL", email)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

#[test]
fn root_commit_counts_without_lines() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), "a@x.com", "main.py", b"print(1)\nprint(2)\n");

    let source = LocalSource::open(Some(dir.path()), None).unwrap();
    let report = analyze(&source, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.snapshot.len(), 1);
    let a = &report.snapshot[0];
    assert_eq!(a.email, "a@x.com");
    assert_eq!((a.commit_count, a.lines_added, a.lines_deleted), (1, 0, 0));
    assert_eq!(report.contributors[0].percentage, 0.0);
}

#[test]
fn stream_visits_each_commit_once_newest_first() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), "a@x.com", "a.txt", b"1\n");
    commit_as(dir.path(), "b@x.com", "a.txt", b"1\n2\n");
    commit_as(dir.path(), "c@x.com", "a.txt", b"2\n");

    let source = LocalSource::open(Some(dir.path()), None).unwrap();
    let events: Vec<_> = source.stream_commits().unwrap().map(|e| e.unwrap()).collect();
    let emails: Vec<&str> = events.iter().map(|e| e.identity.email.as_str()).collect();
    assert_eq!(emails, vec!["c@x.com", "b@x.com", "a@x.com"]);
    assert_eq!(events[0].diff_summary, vec!["0\t1\ta.txt".to_string()]);
    assert_eq!(events[1].diff_summary, vec!["1\t0\ta.txt".to_string()]);
    assert!(!events[2].parent_exists);
}

#[test]
fn binary_changes_count_files_but_not_lines() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), "a@x.com", "README.md", b"x\n");
    commit_as(dir.path(), "a@x.com", "logo.png", b"\x89PNG\0\0\x01\x02");

    let repo = GitRepo::open(Some(dir.path())).unwrap();
    let commits: Vec<_> = repo.commits().unwrap().map(|c| c.unwrap()).collect();
    let summary = repo.diff_summary(&commits[0].id, &commits[0].parent_ids[0]).unwrap();
    assert_eq!(summary, vec!["-\t-\tlogo.png".to_string()]);

    let source = LocalSource::with_accessor(repo);
    let report = analyze(&source, &AnalysisConfig::default()).unwrap();
    let a = &report.snapshot[0];
    assert_eq!((a.files_changed, a.lines_added), (1, 0));

    let loc = source.loc_summary().unwrap();
    assert_eq!((loc.code_files, loc.non_code_files, loc.total_lines), (1, 1, 1));
}

#[test]
fn reference_limits_the_walk() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), "a@x.com", "a.txt", b"1\n");
    git(dir.path(), &["tag", "first"]);
    commit_as(dir.path(), "b@x.com", "b.txt", b"2\n");

    let source = LocalSource::open(Some(dir.path()), Some("first".to_string())).unwrap();
    assert_eq!(source.stream_commits().unwrap().count(), 1);
    assert_eq!(source.language_totals().unwrap().total, 1);
}

#[test]
fn opening_a_plain_directory_fails_as_unavailable() {
    let dir = tempdir().unwrap();
    match LocalSource::open(Some(dir.path()), None) {
        Err(err @ PulseError::SourceUnavailable { .. }) => {
            assert!(err.to_string().starts_with("local source unavailable while trying to open repository"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("a plain directory opened as a repository"),
    }
}
