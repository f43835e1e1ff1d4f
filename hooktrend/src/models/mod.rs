//! Data models for hooktrend
//!
//! - Song records returned by the trends/songs endpoint
//! - Deduplicating result set for a harvest run
//! - Chord nodes returned by the trends/nodes endpoint

pub mod chord;
pub mod song;
pub mod song_set;

pub use chord::ChordNode;
pub use song::{ApiSong, SongKey, SongRecord};
pub use song_set::SongSet;
