//! Minimal GitHub REST v3 access.

mod client;

pub use client::GithubClient;

use serde_json::Value;

use crate::error::{PulseError, Result};

/// Largest page size the API accepts.
pub const PER_PAGE: usize = 100;

/// One GET against the API: endpoint path plus query pairs, returning the
/// HTTP status and the decoded JSON body (`Null` when the body is empty).
///
/// Non-success statuses are returned, not raised, so callers can treat
/// `202 Accepted` and friends as data. Transport failures and exhausted rate
/// limits are errors.
pub trait HttpAccessor: Send + Sync {
    fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<(u16, Value)>;
}

/// GET that must succeed with a 2xx status.
pub fn get_ok<H: HttpAccessor + ?Sized>(http: &H, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
    let (status, body) = http.get(endpoint, query)?;
    if !(200..300).contains(&status) {
        return Err(PulseError::Http {
            status,
            endpoint: endpoint.to_string(),
        });
    }
    Ok(body)
}

/// Follows `page=` pagination until a short page, collecting array items.
///
/// Stops early once `limit` items were collected.
pub fn get_paginated<H: HttpAccessor + ?Sized>(
    http: &H,
    endpoint: &str,
    query: &[(&str, String)],
    limit: Option<usize>,
) -> Result<Vec<Value>> {
    let per_page = limit.map_or(PER_PAGE, |l| l.clamp(1, PER_PAGE));
    let mut items = Vec::new();
    let mut page = 1usize;
    loop {
        let mut params: Vec<(&str, String)> = query.to_vec();
        params.push(("per_page", per_page.to_string()));
        params.push(("page", page.to_string()));

        let body = get_ok(http, endpoint, &params)?;
        let batch = match body {
            Value::Array(batch) => batch,
            Value::Null => Vec::new(),
            other => {
                return Err(PulseError::Malformed(format!(
                    "{endpoint}: expected a JSON array, got {}",
                    kind_of(&other)
                )))
            }
        };
        let len = batch.len();
        items.extend(batch);

        if let Some(limit) = limit {
            if items.len() >= limit {
                items.truncate(limit);
                break;
            }
        }
        if len < per_page {
            break;
        }
        page += 1;
    }
    Ok(items)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
