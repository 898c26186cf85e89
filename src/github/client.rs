use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::error::{PulseError, Result};
use crate::github::HttpAccessor;

const USER_AGENT: &str = "gitpulse";
const MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Blocking GitHub client.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl HttpAccessor for GithubClient {
    fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<(u16, Value)> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut rb = self.http.get(&url).header(ACCEPT, MEDIA_TYPE).query(query);
        if let Some(token) = &self.token {
            rb = rb.header(AUTHORIZATION, format!("token {token}"));
        }

        let resp = rb.send()?;
        let status = resp.status();
        debug!(endpoint, status = status.as_u16(), "GET");

        if is_rate_limited(status, resp.headers()) {
            return Err(PulseError::RateLimited {
                endpoint: endpoint.to_string(),
            });
        }

        let text = resp.text()?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| PulseError::Malformed(format!("{endpoint}: {e}")))?
        };
        Ok((status.as_u16(), body))
    }
}

/// 429 always; 403 only once `x-ratelimit-remaining` reads zero, since a plain
/// 403 is a permission failure.
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    let quota_spent = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && quota_spent)
}
