use crate::error::{PulseError, Result};
use crate::git::{TrackedFile, VcsAccessor};
use crate::model::CommitMeta;
use chrono::DateTime;
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use similar::{ChangeTag, TextDiff};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
    reference: Option<String>,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self {
            repo,
            path,
            reference: None,
        })
    }

    /// Analyze history reachable from `reference` instead of HEAD.
    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    fn start_commit(&self) -> Result<ObjectId> {
        match &self.reference {
            Some(spec) => {
                let id = self
                    .repo
                    .rev_parse_single(spec.as_str())
                    .map_err(|e| PulseError::GitRepo(format!("Invalid reference '{spec}': {e}")))?;
                let commit = id
                    .object()?
                    .try_into_commit()
                    .map_err(|_| PulseError::GitRepo(format!("Not a commit: {spec}")))?;
                Ok(commit.id)
            }
            None => {
                let mut head = self.repo.head()?;
                let commit = head.peel_to_commit_in_place()?;
                Ok(commit.id)
            }
        }
    }

    fn tree_entries(&self) -> Result<Vec<(String, ObjectId)>> {
        let start = self.start_commit()?;
        let tree = self.repo.find_commit(start)?.tree()?;
        let changes: Vec<ChangeDetached> = self.repo.diff_tree_to_tree(None, Some(&tree), None)?;

        let mut entries = Vec::new();
        for change in changes {
            match change {
                ChangeDetached::Addition {
                    id,
                    location,
                    entry_mode,
                    ..
                }
                | ChangeDetached::Rewrite {
                    id,
                    location,
                    entry_mode,
                    ..
                } if !entry_mode.is_tree() => entries.push((location.to_string(), id)),
                _ => {}
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn numstat_line(&self, change: ChangeDetached) -> Option<String> {
        match change {
            ChangeDetached::Addition {
                id,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() {
                    return None;
                }
                let obj = self.load_blob(id, &location.to_string())?;
                if is_binary(&obj.data) {
                    Some(format!("-\t-\t{location}"))
                } else {
                    Some(format!("{}\t0\t{location}", count_lines(&obj.data)))
                }
            }
            ChangeDetached::Deletion {
                id,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() {
                    return None;
                }
                let obj = self.load_blob(id, &location.to_string())?;
                if is_binary(&obj.data) {
                    Some(format!("-\t-\t{location}"))
                } else {
                    Some(format!("0\t{}\t{location}", count_lines(&obj.data)))
                }
            }
            ChangeDetached::Modification {
                previous_id,
                id,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() {
                    return None;
                }
                self.modification_line(previous_id, id, &location.to_string())
            }
            ChangeDetached::Rewrite {
                source_id,
                id,
                source_location,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() {
                    return None;
                }
                let path = format!("{source_location} => {location}");
                self.modification_line(source_id, id, &path)
            }
        }
    }

    /// A missing or unreadable blob drops its numstat line instead of failing the walk.
    fn load_blob(&self, id: ObjectId, path: &str) -> Option<gix::Object<'_>> {
        match self.repo.find_object(id) {
            Ok(obj) => Some(obj),
            Err(err) => {
                debug!(%id, path, %err, "object lookup failed, skipping numstat line");
                None
            }
        }
    }

    fn modification_line(&self, old_id: ObjectId, new_id: ObjectId, path: &str) -> Option<String> {
        let old_obj = self.load_blob(old_id, path)?;
        let new_obj = self.load_blob(new_id, path)?;
        if is_binary(&old_obj.data) || is_binary(&new_obj.data) {
            return Some(format!("-\t-\t{path}"));
        }
        let (added, deleted) = line_delta(&old_obj.data, &new_obj.data);
        Some(format!("{added}\t{deleted}\t{path}"))
    }
}

impl VcsAccessor for GitRepo {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn commits(&self) -> Result<Box<dyn Iterator<Item = Result<CommitMeta>> + '_>> {
        let start = self.start_commit()?;
        Ok(Box::new(CommitWalk {
            repo: &self.repo,
            stack: vec![start],
            seen: HashSet::new(),
        }))
    }

    fn diff_summary(&self, commit: &str, parent: &str) -> Result<Vec<String>> {
        let commit_tree = self.repo.find_commit(parse_oid(commit)?)?.tree()?;
        let parent_tree = self.repo.find_commit(parse_oid(parent)?)?.tree()?;

        let changes: Vec<ChangeDetached> =
            self.repo
                .diff_tree_to_tree(Some(&parent_tree), Some(&commit_tree), None)?;

        Ok(changes
            .into_iter()
            .filter_map(|change| self.numstat_line(change))
            .collect())
    }

    fn tracked_files(&self) -> Result<Vec<String>> {
        Ok(self.tree_entries()?.into_iter().map(|(path, _)| path).collect())
    }

    fn tracked_line_counts(&self) -> Result<Vec<TrackedFile>> {
        let mut files = Vec::new();
        for (path, id) in self.tree_entries()? {
            let Ok(obj) = self.repo.find_object(id) else {
                continue;
            };
            let is_binary = is_binary(&obj.data);
            let lines = if is_binary { 0 } else { count_lines(&obj.data) };
            files.push(TrackedFile { path, lines, is_binary });
        }
        Ok(files)
    }

    fn branch_name(&self) -> Option<String> {
        if let Some(reference) = &self.reference {
            return Some(reference.clone());
        }
        self.repo
            .head_name()
            .ok()
            .flatten()
            .map(|name| name.shorten().to_string())
    }
}

/// Depth-first walk from the start commit; first parents are visited first
/// so a linear history comes out newest-first.
struct CommitWalk<'r> {
    repo: &'r Repository,
    stack: Vec<ObjectId>,
    seen: HashSet<ObjectId>,
}

impl CommitWalk<'_> {
    fn load(&mut self, commit_id: ObjectId) -> Result<CommitMeta> {
        let commit = self.repo.find_commit(commit_id)?;
        let secs = commit.time()?.seconds;
        let timestamp = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| PulseError::GitRepo(format!("Invalid timestamp: {secs}")))?;

        let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();
        let author = commit.author()?;
        let meta = CommitMeta {
            id: commit_id.to_string(),
            author_name: author.name.to_string(),
            author_email: author.email.to_string(),
            timestamp,
            parent_ids: parents.iter().map(|id| id.to_string()).collect(),
        };

        for pid in parents.into_iter().rev() {
            if !self.seen.contains(&pid) {
                self.stack.push(pid);
            }
        }
        Ok(meta)
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = Result<CommitMeta>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(commit_id) = self.stack.pop() {
            if self.seen.insert(commit_id) {
                return Some(self.load(commit_id));
            }
        }
        None
    }
}

fn parse_oid(hex: &str) -> Result<ObjectId> {
    ObjectId::from_hex(hex.as_bytes()).map_err(|e| PulseError::GitRepo(format!("Invalid commit ID '{hex}': {e}")))
}

fn is_binary(data: &[u8]) -> bool {
    data.iter().take(8192).any(|&b| b == 0)
}

fn count_lines(data: &[u8]) -> u64 {
    String::from_utf8_lossy(data).lines().count() as u64
}

fn line_delta(old: &[u8], new: &[u8]) -> (u64, u64) {
    let old_text = String::from_utf8_lossy(old);
    let new_text = String::from_utf8_lossy(new);
    let diff = TextDiff::from_lines(&*old_text, &*new_text);

    let mut added = 0;
    let mut deleted = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, deleted)
}
