//! Per-page fetch state machine
//!
//! Each song page moves through these states:
//!
//! ```text
//! Requesting ──429, budget left──▶ Waiting ──wait elapsed──▶ Requesting (retries + 1)
//!     │
//!     ├──songs / empty list──▶ Succeeded
//!     └──429 over budget, malformed body, request failure──▶ Abandoned
//! ```
//!
//! Transitions are pure; the harvester performs the I/O and sleeps between
//! them. The retry counter belongs to one page and starts at zero for every
//! new page.

use super::hooktheory_client::{HooktheoryError, RawPage};
use crate::models::{ApiSong, SongRecord};
use serde_json::Value;
use std::time::Duration;

/// Rate-limit retry budget and fallback backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Retries allowed for a single page
    pub max_retries: u32,
    /// Delay for the first retry when the server gives no Retry-After
    pub base_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl BackoffPolicy {
    /// Fallback delay before retry number `retries` (zero-based)
    ///
    /// Doubles with every retry: `base * 2^retries`.
    pub fn fallback_delay(&self, retries: u32) -> Duration {
        2u32.checked_pow(retries)
            .and_then(|multiplier| self.base_delay.checked_mul(multiplier))
            .unwrap_or(Duration::MAX)
    }
}

/// Classified response for one page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResponse {
    /// Non-empty song list; elements that were not song objects are dropped
    Songs(Vec<SongRecord>),
    /// Empty list, no more pages
    Empty,
    /// Quota exhausted (HTTP 429)
    RateLimited { retry_after: Option<Duration> },
    /// Body was not JSON, or not a JSON list
    Malformed(String),
    /// Transport failure or non-429 error status
    Failed(String),
}

/// Content of a successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Songs(Vec<SongRecord>),
    End,
}

/// Terminal result of one page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Fetched(PageContent),
    Abandoned(StopReason),
}

/// Why pagination stopped early for a progression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Malformed(String),
    RequestFailed(String),
    RetriesExhausted { retries: u32 },
}

/// State of a single page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Requesting { retries: u32 },
    Waiting { retries: u32, delay: Duration },
    Succeeded(PageContent),
    Abandoned(StopReason),
}

impl PageState {
    /// Initial state for a new page
    pub fn start() -> Self {
        PageState::Requesting { retries: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PageState::Succeeded(_) | PageState::Abandoned(_))
    }

    /// Apply a classified response to a `Requesting` state
    ///
    /// Any other state is returned unchanged.
    pub fn on_response(self, response: PageResponse, policy: &BackoffPolicy) -> Self {
        let retries = match self {
            PageState::Requesting { retries } => retries,
            other => return other,
        };

        match response {
            PageResponse::Songs(songs) => PageState::Succeeded(PageContent::Songs(songs)),
            PageResponse::Empty => PageState::Succeeded(PageContent::End),
            PageResponse::RateLimited { retry_after } => {
                if retries >= policy.max_retries {
                    PageState::Abandoned(StopReason::RetriesExhausted { retries })
                } else {
                    let delay = retry_after.unwrap_or_else(|| policy.fallback_delay(retries));
                    PageState::Waiting { retries, delay }
                }
            }
            PageResponse::Malformed(detail) => PageState::Abandoned(StopReason::Malformed(detail)),
            PageResponse::Failed(detail) => {
                PageState::Abandoned(StopReason::RequestFailed(detail))
            }
        }
    }

    /// Leave `Waiting` once the backoff delay has elapsed
    pub fn on_wait_elapsed(self) -> Self {
        match self {
            PageState::Waiting { retries, .. } => PageState::Requesting {
                retries: retries + 1,
            },
            other => other,
        }
    }
}

/// Classify a raw page result for `progression`
pub fn classify(progression: &str, result: Result<RawPage, HooktheoryError>) -> PageResponse {
    let page = match result {
        Ok(page) => page,
        Err(e) => return PageResponse::Failed(e.to_string()),
    };

    if page.status == 429 {
        return PageResponse::RateLimited {
            retry_after: page.retry_after,
        };
    }

    if !(200..300).contains(&page.status) {
        return PageResponse::Failed(format!("HTTP {}: {}", page.status, page.body.trim()));
    }

    let items = match serde_json::from_str::<Value>(&page.body) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            return PageResponse::Malformed(format!("expected a list, got {}", json_kind(&other)))
        }
        Err(e) => return PageResponse::Malformed(format!("invalid JSON: {}", e)),
    };

    if items.is_empty() {
        return PageResponse::Empty;
    }

    let mut songs = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            tracing::warn!(
                progression = %progression,
                item = %item,
                "Unexpected song format, skipping"
            );
            continue;
        }
        match serde_json::from_value::<ApiSong>(item) {
            Ok(song) => songs.push(SongRecord::from_api(song, progression)),
            Err(e) => {
                tracing::warn!(
                    progression = %progression,
                    error = %e,
                    "Unreadable song object, skipping"
                )
            }
        }
    }

    PageResponse::Songs(songs)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
