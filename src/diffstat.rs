//! Parser for numeric diff summaries (`git diff --numstat` form).

use tracing::debug;

use crate::model::{ChangeRecord, Identity, LineCount};

/// Parses one commit's summary lines into change records for `author`.
///
/// Blank lines are ignored and malformed lines are dropped one at a time.
pub fn parse<I, S>(lines: I, author: &Identity) -> Vec<ChangeRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let line = line.as_ref();
            if line.trim().is_empty() {
                return None;
            }
            let parsed = parse_line(line, author);
            if parsed.is_none() {
                debug!(line, "skipping malformed diff stat line");
            }
            parsed
        })
        .collect()
}

/// Parses a single `<added>\t<deleted>\t<path>` line.
pub fn parse_line(line: &str, author: &Identity) -> Option<ChangeRecord> {
    let mut fields = line.splitn(3, '\t');
    let added = parse_count(fields.next()?)?;
    let deleted = parse_count(fields.next()?)?;
    let path = fields.next()?.trim_end_matches(['\r', '\n']);
    if path.is_empty() || path.contains('\t') {
        return None;
    }
    let path = resolve_rename(path);
    Some(ChangeRecord::new(path, added, deleted, author.clone()))
}

fn parse_count(field: &str) -> Option<LineCount> {
    let field = field.trim();
    if field == "-" {
        return Some(LineCount::Unknown);
    }
    field.parse::<u64>().ok().map(LineCount::Counted)
}

/// Resolves numstat rename notation to the destination path:
/// `old => new` and `dir/{old => new}/file`.
fn resolve_rename(path: &str) -> String {
    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        if open < close {
            let inner = &path[open + 1..close];
            if let Some((_, to)) = inner.split_once(" => ") {
                let joined = format!("{}{}{}", &path[..open], to, &path[close + 1..]);
                return joined.replace("//", "/");
            }
        }
    }
    match path.split_once(" => ") {
        Some((_, to)) => to.to_string(),
        None => path.to_string(),
    }
}
