//! Song records and their deduplication identity

use serde::{Deserialize, Serialize};

/// Song object as returned by `trends/songs`
///
/// Every field is optional on the wire; nulls and absences become empty
/// strings when converted into a [`SongRecord`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSong {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A harvested song, tagged with the progression that found it
///
/// Field order matches the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    pub artist: String,
    /// Song title (`song` on the wire and in CSV)
    #[serde(rename = "song")]
    pub title: String,
    pub section: String,
    pub url: String,
    pub chord_progression: String,
}

impl SongRecord {
    /// Annotate an API song with the progression that produced it
    pub fn from_api(song: ApiSong, chord_progression: &str) -> Self {
        Self {
            artist: song.artist.unwrap_or_default(),
            title: song.song.unwrap_or_default(),
            section: song.section.unwrap_or_default(),
            url: song.url.unwrap_or_default(),
            chord_progression: chord_progression.to_string(),
        }
    }

    /// Deduplication identity of this record
    pub fn key(&self) -> SongKey {
        SongKey::new(&self.artist, &self.title, &self.section)
    }
}

/// Case-normalized `(artist, title, section)` identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SongKey {
    pub artist: String,
    pub title: String,
    pub section: String,
}

impl SongKey {
    pub fn new(artist: &str, title: &str, section: &str) -> Self {
        Self {
            artist: normalize(artist),
            title: normalize(title),
            section: normalize(section),
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
