//! CSV output of harvested songs
//!
//! The header row is always written, even for an empty harvest.

use crate::models::SongRecord;
use crate::Result;
use std::io::{Read, Write};
use std::path::Path;

/// Output columns, in order
pub const CSV_COLUMNS: [&str; 5] = ["artist", "song", "section", "url", "chord_progression"];

/// Write songs as CSV to any writer, returning the number of rows
pub fn write_songs<'a, W, I>(writer: W, songs: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a SongRecord>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(CSV_COLUMNS)?;
    let mut rows = 0;
    for song in songs {
        csv_writer.serialize(song)?;
        rows += 1;
    }
    csv_writer.flush()?;
    Ok(rows)
}

/// Write songs to a CSV file, replacing any existing file
pub fn write_songs_csv<'a, I>(path: &Path, songs: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a SongRecord>,
{
    let file = std::fs::File::create(path)?;
    let rows = write_songs(file, songs)?;
    tracing::info!(path = %path.display(), rows, "Song data saved");
    Ok(rows)
}

/// Read songs back from CSV produced by [`write_songs`]
pub fn read_songs<R: Read>(reader: R) -> Result<Vec<SongRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut songs = Vec::new();
    for record in csv_reader.deserialize() {
        songs.push(record?);
    }
    Ok(songs)
}

/// Read songs from a CSV file
pub fn read_songs_csv(path: &Path) -> Result<Vec<SongRecord>> {
    read_songs(std::fs::File::open(path)?)
}
