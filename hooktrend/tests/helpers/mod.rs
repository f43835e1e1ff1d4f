//! Test Helper Utilities
//!
//! Scripted song source and recording sleeper for driving the harvester
//! without network access or real delays.

#![allow(dead_code)]

use async_trait::async_trait;
use hooktrend::services::{HooktheoryError, RawPage, Sleeper, SongSource};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Song source returning scripted responses per (progression, page)
///
/// Unscripted requests, and scripted ones whose queue is used up, get an
/// empty list.
#[derive(Default)]
pub struct FakeSongSource {
    scripted: Mutex<HashMap<(String, u32), VecDeque<Result<RawPage, HooktheoryError>>>>,
    requests: Mutex<Vec<(String, u32)>>,
}

impl FakeSongSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for one page of a progression
    pub fn respond(
        self,
        progression: &str,
        page: u32,
        response: Result<RawPage, HooktheoryError>,
    ) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry((progression.to_string(), page))
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a successful page with the given body
    pub fn page(self, progression: &str, page: u32, body: impl Into<String>) -> Self {
        self.respond(progression, page, Ok(RawPage::ok(body)))
    }

    /// Queue `count` rate-limit responses without Retry-After
    pub fn rate_limited(self, progression: &str, page: u32, count: usize) -> Self {
        (0..count).fold(self, |source, _| {
            source.respond(progression, page, Ok(RawPage::too_many_requests(None)))
        })
    }

    /// Every request made so far, in order
    pub fn requests(&self) -> Vec<(String, u32)> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests made for one progression
    pub fn requests_for(&self, progression: &str) -> Vec<u32> {
        self.requests()
            .into_iter()
            .filter(|(cp, _)| cp == progression)
            .map(|(_, page)| page)
            .collect()
    }
}

#[async_trait]
impl SongSource for FakeSongSource {
    async fn fetch_song_page(
        &self,
        progression: &str,
        page: u32,
    ) -> Result<RawPage, HooktheoryError> {
        self.requests
            .lock()
            .unwrap()
            .push((progression.to_string(), page));

        self.scripted
            .lock()
            .unwrap()
            .get_mut(&(progression.to_string(), page))
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Ok(RawPage::ok("[]")))
    }
}

/// Sleeper that records requested durations and returns immediately
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// JSON body for a page of songs given as (artist, title, section)
pub fn songs_body(songs: &[(&str, &str, &str)]) -> String {
    let items: Vec<_> = songs
        .iter()
        .map(|(artist, song, section)| {
            json!({
                "artist": artist,
                "song": song,
                "section": section,
                "url": format!("https://www.hooktheory.com/theorytab/view/{}/{}", artist, song),
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// JSON body with `count` distinct songs whose titles start with `prefix`
pub fn numbered_songs_body(prefix: &str, count: usize) -> String {
    let titles: Vec<String> = (0..count).map(|i| format!("{} {}", prefix, i)).collect();
    let songs: Vec<(&str, &str, &str)> = titles
        .iter()
        .map(|title| ("Artist", title.as_str(), "Chorus"))
        .collect();
    songs_body(&songs)
}

pub fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|s| Duration::from_secs(*s)).collect()
}
