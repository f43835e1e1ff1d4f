//! Hooktheory API client
//!
//! Authenticates once with username/password and reuses the returned bearer
//! token (`activkey`) for every later request in the run. There is no token
//! refresh.
//!
//! Song pages are returned raw ([`RawPage`]) so that rate-limit handling and
//! shape checks live in the harvester, where they can be driven by a fake
//! [`SongSource`] in tests.

use crate::models::ChordNode;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("hooktrend/", env!("CARGO_PKG_VERSION"));
const RATE_LIMIT_REMAINING: &str = "x-rate-limit-remaining";
const RATE_LIMIT_RESET: &str = "x-rate-limit-reset";

/// Hooktheory client errors
#[derive(Debug, Error)]
pub enum HooktheoryError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication failed ({0}): {1}")]
    AuthenticationFailed(u16, String),

    #[error("Authentication response contained no activkey")]
    MissingToken,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    activkey: Option<String>,
}

/// Quota hint from `X-Rate-Limit-*` headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaHint {
    /// Requests left in the current window
    pub remaining: u32,
    /// Seconds until the window resets
    pub reset_secs: u64,
}

/// Unclassified response for one song page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub status: u16,
    /// Parsed `Retry-After` header, if present and numeric
    pub retry_after: Option<Duration>,
    pub quota: Option<QuotaHint>,
    pub body: String,
}

impl RawPage {
    /// Successful response with the given body and no rate-limit headers
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            quota: None,
            body: body.into(),
        }
    }

    /// 429 response, optionally carrying a `Retry-After` value
    pub fn too_many_requests(retry_after: Option<Duration>) -> Self {
        Self {
            status: 429,
            retry_after,
            quota: None,
            body: String::new(),
        }
    }
}

/// Source of paginated song search results
#[async_trait]
pub trait SongSource: Send + Sync {
    /// Fetch one page of songs containing `progression`
    ///
    /// Transport failures are `Err`; any HTTP response, including error
    /// statuses, is returned as a [`RawPage`].
    async fn fetch_song_page(
        &self,
        progression: &str,
        page: u32,
    ) -> Result<RawPage, HooktheoryError>;
}

/// Extract the bearer token from a `users/auth` response
///
/// Non-2xx statuses mean rejected credentials; a missing or blank
/// `activkey` is as fatal as a rejection.
fn token_from_response(status: u16, body: &str) -> Result<String, HooktheoryError> {
    if !(200..300).contains(&status) {
        return Err(HooktheoryError::AuthenticationFailed(status, body.to_string()));
    }

    let auth: AuthResponse =
        serde_json::from_str(body).map_err(|e| HooktheoryError::ParseError(e.to_string()))?;

    auth.activkey
        .filter(|key| !key.trim().is_empty())
        .ok_or(HooktheoryError::MissingToken)
}

/// Authenticated Hooktheory API client
pub struct HooktheoryClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HooktheoryClient {
    /// Exchange credentials for a bearer token
    pub async fn authenticate(
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, HooktheoryError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HooktheoryError::NetworkError(e.to_string()))?;
        let base_url = normalize_base_url(base_url);

        let url = format!("{}users/auth", base_url);
        tracing::debug!(url = %url, username = %username, "Requesting bearer token");

        let response = http_client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&AuthRequest { username, password })
            .send()
            .await
            .map_err(|e| HooktheoryError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HooktheoryError::NetworkError(e.to_string()))?;
        let token = token_from_response(status, &body)?;

        tracing::info!("Authentication successful, bearer token obtained");

        Ok(Self {
            http_client,
            base_url,
            token,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .get(format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/json")
    }

    /// Chord nodes, either base chords or those following `progression`
    pub async fn chord_nodes(
        &self,
        progression: Option<&str>,
    ) -> Result<Vec<ChordNode>, HooktheoryError> {
        let mut request = self.get("trends/nodes");
        if let Some(cp) = progression {
            request = request.query(&[("cp", cp)]);
        }

        tracing::debug!(progression = ?progression, "Querying chord nodes");

        let response = request
            .send()
            .await
            .map_err(|e| HooktheoryError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(HooktheoryError::ApiError(status.as_u16(), error_text));
        }

        let nodes: Vec<ChordNode> = response
            .json()
            .await
            .map_err(|e| HooktheoryError::ParseError(e.to_string()))?;

        tracing::info!(count = nodes.len(), "Retrieved chord nodes");
        Ok(nodes)
    }
}

#[async_trait]
impl SongSource for HooktheoryClient {
    async fn fetch_song_page(
        &self,
        progression: &str,
        page: u32,
    ) -> Result<RawPage, HooktheoryError> {
        let page_param = page.to_string();
        let response = self
            .get("trends/songs")
            .query(&[("cp", progression), ("page", page_param.as_str())])
            .send()
            .await
            .map_err(|e| HooktheoryError::NetworkError(e.to_string()))?;

        let status = response.status();
        let retry_after = header_str(response.headers(), RETRY_AFTER.as_str())
            .and_then(parse_retry_after);
        let quota = parse_quota(response.headers());

        let body = if status == StatusCode::TOO_MANY_REQUESTS {
            String::new()
        } else {
            response
                .text()
                .await
                .map_err(|e| HooktheoryError::NetworkError(e.to_string()))?
        };

        Ok(RawPage {
            status: status.as_u16(),
            retry_after,
            quota,
            body,
        })
    }
}

/// Ensure the base URL ends with a single `/` so paths can be appended
pub fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim().trim_end_matches('/'))
}

/// Parse a `Retry-After` value given in whole seconds
///
/// HTTP-date values are not supported and yield `None`, which makes the
/// caller fall back to exponential backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_quota(headers: &HeaderMap) -> Option<QuotaHint> {
    let remaining = header_str(headers, RATE_LIMIT_REMAINING)?.trim().parse().ok()?;
    let reset_secs = header_str(headers, RATE_LIMIT_RESET)?.trim().parse().ok()?;
    Some(QuotaHint {
        remaining,
        reset_secs,
    })
}
