//! Harvester Tests
//!
//! Pagination, rate-limit backoff, early stops, deduplication, and target
//! short-circuit, driven through a scripted song source.

mod helpers;

use helpers::{numbered_songs_body, secs, songs_body, FakeSongSource, RecordingSleeper};
use hooktrend::services::{
    HarvestSettings, Harvester, HooktheoryError, Progressions, QuotaHint, RawPage, StopReason,
};
use std::time::Duration;

fn harvester(source: FakeSongSource) -> Harvester<FakeSongSource, RecordingSleeper> {
    Harvester::new(source, RecordingSleeper::new(), HarvestSettings::default())
}

fn candidates(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn test_paginates_until_empty_page() {
    let source = FakeSongSource::new()
        .page("1,4,5,1", 1, songs_body(&[("Oasis", "Wonderwall", "Chorus")]))
        .page("1,4,5,1", 2, songs_body(&[("Toto", "Africa", "Verse")]))
        .page("1,4,5,1", 3, "[]");
    let harvester = harvester(source);

    let harvest = harvester.fetch_progression("1,4,5,1").await;

    assert_eq!(harvest.pages, 2);
    assert_eq!(harvest.songs.len(), 2);
    assert!(harvest.stopped.is_none());
    assert!(harvest.songs.iter().all(|s| s.chord_progression == "1,4,5,1"));
    assert_eq!(harvester.source().requests_for("1,4,5,1"), vec![1, 2, 3]);
    // Fixed delay after each page that returned songs
    assert_eq!(harvester.sleeper().sleeps(), secs(&[1, 1]));
}

#[tokio::test]
async fn test_non_song_items_are_skipped_without_ending_pagination() {
    let source = FakeSongSource::new()
        .page("1,1,1,1", 1, r#"[42, null, "text"]"#)
        .page("1,1,1,1", 2, songs_body(&[("Adele", "Hello", "Verse")]));
    let harvester = harvester(source);

    let harvest = harvester.fetch_progression("1,1,1,1").await;

    assert_eq!(harvest.songs.len(), 1);
    assert_eq!(harvester.source().requests_for("1,1,1,1"), vec![1, 2, 3]);
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_rate_limit_backoff_doubles_and_retries_same_page() {
    let source = FakeSongSource::new()
        .rate_limited("6,4,1,5", 1, 3)
        .page("6,4,1,5", 1, songs_body(&[("Journey", "Don't Stop Believin'", "Verse")]));
    let harvester = harvester(source);

    let harvest = harvester.fetch_progression("6,4,1,5").await;

    assert_eq!(harvest.songs.len(), 1);
    assert!(harvest.stopped.is_none());
    assert_eq!(harvester.source().requests_for("6,4,1,5"), vec![1, 1, 1, 1, 2]);
    // Retry N waits 2^(N+1) seconds, then the normal page delay
    assert_eq!(harvester.sleeper().sleeps(), secs(&[2, 4, 8, 1]));
}

#[tokio::test]
async fn test_retry_after_header_overrides_backoff() {
    let source = FakeSongSource::new()
        .respond(
            "1,5,6,4",
            1,
            Ok(RawPage::too_many_requests(Some(Duration::from_secs(7)))),
        )
        .page("1,5,6,4", 1, "[]");
    let harvester = harvester(source);

    harvester.fetch_progression("1,5,6,4").await;

    assert_eq!(harvester.sleeper().sleeps(), secs(&[7]));
}

#[tokio::test]
async fn test_exceeding_retry_cap_abandons_progression() {
    let source = FakeSongSource::new()
        .page("4,5,1,1", 1, songs_body(&[("Queen", "Bohemian Rhapsody", "Intro")]))
        .rate_limited("4,5,1,1", 2, 10);
    let harvester = harvester(source);

    let harvest = harvester.fetch_progression("4,5,1,1").await;

    // Songs from the earlier page are kept
    assert_eq!(harvest.songs.len(), 1);
    assert_eq!(
        harvest.stopped,
        Some(StopReason::RetriesExhausted { retries: 5 })
    );
    // One initial request plus five retries on page 2, nothing after
    assert_eq!(
        harvester.source().requests_for("4,5,1,1"),
        vec![1, 2, 2, 2, 2, 2, 2]
    );
    assert_eq!(harvester.sleeper().sleeps(), secs(&[1, 2, 4, 8, 16, 32]));
}

#[tokio::test]
async fn test_retry_counter_resets_for_each_page() {
    let source = FakeSongSource::new()
        .rate_limited("5,5,5,5", 1, 4)
        .page("5,5,5,5", 1, songs_body(&[("A", "One", "")]))
        .rate_limited("5,5,5,5", 2, 4)
        .page("5,5,5,5", 2, songs_body(&[("B", "Two", "")]));
    let harvester = harvester(source);

    let harvest = harvester.fetch_progression("5,5,5,5").await;

    assert!(harvest.stopped.is_none());
    assert_eq!(harvest.pages, 2);
    assert_eq!(
        harvester.sleeper().sleeps(),
        secs(&[2, 4, 8, 16, 1, 2, 4, 8, 16, 1])
    );
}

#[tokio::test]
async fn test_low_quota_waits_for_reset() {
    let mut page = RawPage::ok(songs_body(&[("Muse", "Uprising", "Verse")]));
    page.quota = Some(QuotaHint {
        remaining: 1,
        reset_secs: 20,
    });
    let source = FakeSongSource::new().respond("1,4,1,4", 1, Ok(page));
    let harvester = harvester(source);

    harvester.fetch_progression("1,4,1,4").await;

    assert_eq!(harvester.sleeper().sleeps(), secs(&[21]));
}

// =============================================================================
// Soft stops
// =============================================================================

#[tokio::test]
async fn test_malformed_page_keeps_earlier_songs() {
    let source = FakeSongSource::new()
        .page("1,6,4,5", 1, songs_body(&[("Oasis", "Wonderwall", "Chorus")]))
        .page("1,6,4,5", 2, "<html>Service Unavailable</html>");
    let harvester = harvester(source);

    let harvest = harvester.fetch_progression("1,6,4,5").await;

    assert_eq!(harvest.songs.len(), 1);
    assert!(matches!(harvest.stopped, Some(StopReason::Malformed(_))));
    assert_eq!(harvester.source().requests_for("1,6,4,5"), vec![1, 2]);
}

#[tokio::test]
async fn test_non_list_json_stops_pagination() {
    let source = FakeSongSource::new().page("2,5,1,1", 1, r#"{"message": "Not found"}"#);
    let harvester = harvester(source);

    let harvest = harvester.fetch_progression("2,5,1,1").await;

    assert!(harvest.songs.is_empty());
    assert!(matches!(harvest.stopped, Some(StopReason::Malformed(_))));
}

#[tokio::test]
async fn test_request_error_moves_to_next_progression() {
    let source = FakeSongSource::new()
        .respond(
            "1,1",
            1,
            Err(HooktheoryError::NetworkError("connection reset".to_string())),
        )
        .page("1,4", 1, songs_body(&[("Toto", "Africa", "Chorus")]));
    let harvester = harvester(source);

    let report = harvester
        .run(Progressions::new(&candidates(&["1", "4"]), 2))
        .await;

    assert_eq!(report.progressions_tried, 4);
    assert_eq!(report.progressions_stopped, 1);
    assert_eq!(report.songs.len(), 1);
    assert_eq!(harvester.source().requests_for("1,1"), vec![1]);
}

// =============================================================================
// Harvest loop
// =============================================================================

#[tokio::test]
async fn test_target_reached_after_first_progression_stops_harvest() {
    let source = FakeSongSource::new().page("1,1,1,1", 1, numbered_songs_body("Song", 5));
    let settings = HarvestSettings {
        target_song_count: 5,
        ..HarvestSettings::default()
    };
    let harvester = Harvester::new(source, RecordingSleeper::new(), settings);
    let progressions = Progressions::new(&candidates(&["1", "4", "5"]), 4);
    assert_eq!(progressions.total(), Some(81));

    let report = harvester.run(progressions).await;

    assert!(report.target_reached);
    assert_eq!(report.progressions_tried, 1);
    assert_eq!(report.songs.len(), 5);
    assert!(harvester
        .source()
        .requests()
        .iter()
        .all(|(cp, _)| cp == "1,1,1,1"));
}

#[tokio::test]
async fn test_all_progressions_tried_when_target_not_reached() {
    let source = FakeSongSource::new().page("4,4", 1, numbered_songs_body("Song", 3));
    let harvester = harvester(source);

    let report = harvester
        .run(Progressions::new(&candidates(&["1", "4", "5"]), 2))
        .await;

    assert!(!report.target_reached);
    assert_eq!(report.progressions_tried, 9);
    assert_eq!(report.songs.len(), 3);
    assert_eq!(harvester.source().requests().len(), 10);
}

#[tokio::test]
async fn test_duplicate_songs_across_progressions_keep_first() {
    let source = FakeSongSource::new()
        .page("1,4", 1, songs_body(&[("The Beatles", "Let It Be", "Chorus")]))
        .page("4,1", 1, songs_body(&[("THE BEATLES", "let it be", "chorus ")]))
        .page("4,4", 1, songs_body(&[("The Beatles", "Let It Be", "Verse")]));
    let harvester = harvester(source);

    let report = harvester
        .run(Progressions::new(&candidates(&["1", "4"]), 2))
        .await;

    let songs: Vec<_> = report.songs.iter().collect();
    assert_eq!(songs.len(), 2);
    assert_eq!(songs[0].chord_progression, "1,4");
    assert_eq!(songs[0].artist, "The Beatles");
    assert_eq!(songs[1].section, "Verse");
}

#[tokio::test]
async fn test_max_progressions_caps_the_run() {
    let source = FakeSongSource::new();
    let settings = HarvestSettings {
        max_progressions: Some(3),
        ..HarvestSettings::default()
    };
    let harvester = Harvester::new(source, RecordingSleeper::new(), settings);

    let report = harvester
        .run(Progressions::new(&candidates(&["1", "4", "5"]), 4))
        .await;

    assert_eq!(report.progressions_tried, 3);
    assert_eq!(
        harvester.source().requests(),
        vec![
            ("1,1,1,1".to_string(), 1),
            ("1,1,1,4".to_string(), 1),
            ("1,1,1,5".to_string(), 1),
        ]
    );
}
