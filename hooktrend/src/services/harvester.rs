//! Progression song harvester
//!
//! Walks candidate progressions in order, paginates the song search for
//! each one, and merges results into a deduplicated [`SongSet`]. The run
//! stops as soon as the set reaches the target size; no further requests are
//! made after that.
//!
//! Everything is sequential. The only suspensions are the fixed pause after
//! each successful page and rate-limit backoff, both routed through a
//! [`Sleeper`] so tests can run without real delays.

use super::hooktheory_client::{QuotaHint, SongSource};
use super::page_fetch::{
    classify, BackoffPolicy, PageContent, PageOutcome, PageState, StopReason,
};
use crate::models::{SongRecord, SongSet};
use async_trait::async_trait;
use hooktrend_common::config::HarvestConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Suspends the harvest between requests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Harvest loop tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    /// Stop once this many unique songs are collected
    pub target_song_count: usize,
    /// Pause after every successful page
    pub page_delay: Duration,
    pub backoff: BackoffPolicy,
    /// Optional cap on progressions tried
    pub max_progressions: Option<usize>,
    /// Wait for the quota window to reset when remaining requests drop to this
    pub low_quota_threshold: u32,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self::from_config(&HarvestConfig::default())
    }
}

impl HarvestSettings {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            target_song_count: config.target_song_count,
            page_delay: Duration::from_secs(config.page_delay_secs),
            backoff: BackoffPolicy {
                max_retries: config.max_retries,
                base_delay: Duration::from_secs(config.backoff_base_secs),
            },
            max_progressions: config.max_progressions,
            low_quota_threshold: config.low_quota_threshold,
        }
    }

    /// Pause before the next page request
    ///
    /// Normally the fixed page delay; longer when the server reports the
    /// quota is nearly spent, in which case we wait out the reset window.
    pub fn pause_after_page(&self, quota: Option<QuotaHint>) -> Duration {
        match quota {
            Some(hint) if hint.remaining <= self.low_quota_threshold => {
                let reset = Duration::from_secs(hint.reset_secs.saturating_add(1));
                reset.max(self.page_delay)
            }
            _ => self.page_delay,
        }
    }
}

/// Songs gathered for one progression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionHarvest {
    pub progression: String,
    pub songs: Vec<SongRecord>,
    /// Pages that returned songs
    pub pages: u32,
    /// Set when pagination ended before an empty page
    pub stopped: Option<StopReason>,
}

/// Outcome of a full harvest run
#[derive(Debug)]
pub struct HarvestReport {
    pub songs: SongSet,
    pub progressions_tried: usize,
    /// Progressions whose pagination stopped early
    pub progressions_stopped: usize,
    pub target_reached: bool,
}

/// Harvest context: song source, sleeper, and settings for one run
pub struct Harvester<S, P> {
    source: S,
    sleeper: P,
    settings: HarvestSettings,
}

impl<S: SongSource, P: Sleeper> Harvester<S, P> {
    pub fn new(source: S, sleeper: P, settings: HarvestSettings) -> Self {
        Self {
            source,
            sleeper,
            settings,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sleeper(&self) -> &P {
        &self.sleeper
    }

    pub fn settings(&self) -> &HarvestSettings {
        &self.settings
    }

    /// Drive one page through the fetch state machine to a terminal state
    async fn fetch_page(&self, progression: &str, page: u32) -> (PageOutcome, Option<QuotaHint>) {
        let mut state = PageState::start();
        let mut quota = None;

        loop {
            match state {
                PageState::Requesting { .. } => {
                    let result = self.source.fetch_song_page(progression, page).await;
                    if let Ok(raw) = &result {
                        quota = raw.quota;
                    }
                    let response = classify(progression, result);
                    state = state.on_response(response, &self.settings.backoff);
                }
                PageState::Waiting { retries, delay } => {
                    warn!(
                        progression = %progression,
                        page,
                        retries,
                        wait_secs = delay.as_secs_f64(),
                        "Rate limited (429), backing off"
                    );
                    self.sleeper.sleep(delay).await;
                    state = state.on_wait_elapsed();
                }
                PageState::Succeeded(content) => return (PageOutcome::Fetched(content), quota),
                PageState::Abandoned(reason) => return (PageOutcome::Abandoned(reason), quota),
            }
        }
    }

    /// Fetch every page of songs for one progression
    ///
    /// Never fails: malformed pages, request errors, and an exhausted retry
    /// budget end pagination but keep songs from earlier pages.
    pub async fn fetch_progression(&self, progression: &str) -> ProgressionHarvest {
        let mut songs = Vec::new();
        let mut pages = 0;
        let mut page = 1;

        let stopped = loop {
            match self.fetch_page(progression, page).await {
                (PageOutcome::Fetched(PageContent::Songs(batch)), quota) => {
                    debug!(
                        progression = %progression,
                        page,
                        songs = batch.len(),
                        "Fetched song page"
                    );
                    songs.extend(batch);
                    pages += 1;
                    page += 1;
                    self.sleeper.sleep(self.settings.pause_after_page(quota)).await;
                }
                (PageOutcome::Fetched(PageContent::End), _) => break None,
                (PageOutcome::Abandoned(reason), _) => {
                    match &reason {
                        StopReason::RetriesExhausted { retries } => warn!(
                            progression = %progression,
                            page,
                            retries,
                            "Max retries reached, moving to next progression"
                        ),
                        StopReason::Malformed(detail) => warn!(
                            progression = %progression,
                            page,
                            detail = %detail,
                            "Malformed song page, ending pagination"
                        ),
                        StopReason::RequestFailed(detail) => warn!(
                            progression = %progression,
                            page,
                            error = %detail,
                            "Song page request failed, ending pagination"
                        ),
                    }
                    break Some(reason);
                }
            }
        };

        ProgressionHarvest {
            progression: progression.to_string(),
            songs,
            pages,
            stopped,
        }
    }

    /// Harvest songs across `progressions` until the target is reached
    pub async fn run<I>(&self, progressions: I) -> HarvestReport
    where
        I: IntoIterator<Item = String>,
    {
        let mut songs = SongSet::new();
        let mut progressions_tried = 0;
        let mut progressions_stopped = 0;
        let limit = self.settings.max_progressions.unwrap_or(usize::MAX);

        for progression in progressions.into_iter().take(limit) {
            progressions_tried += 1;
            info!(progression = %progression, "Searching for songs with chord progression");

            let harvest = self.fetch_progression(&progression).await;
            if harvest.stopped.is_some() {
                progressions_stopped += 1;
            }
            let added = songs.extend(harvest.songs);

            info!(
                progression = %progression,
                pages = harvest.pages,
                added,
                unique_songs = songs.len(),
                "Progression complete"
            );

            if songs.len() >= self.settings.target_song_count {
                info!(
                    target = self.settings.target_song_count,
                    progressions_tried, "Target reached"
                );
                return HarvestReport {
                    songs,
                    progressions_tried,
                    progressions_stopped,
                    target_reached: true,
                };
            }
        }

        info!(progressions_tried, "Finished trying all candidate progressions");
        HarvestReport {
            songs,
            progressions_tried,
            progressions_stopped,
            target_reached: false,
        }
    }
}
