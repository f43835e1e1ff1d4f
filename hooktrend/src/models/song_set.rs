//! Deduplicated song collection for one harvest run
//!
//! Records are only ever added. The first record seen for a [`SongKey`] is
//! kept; later records with the same key are dropped regardless of which
//! progression found them.

use super::song::{SongKey, SongRecord};
use std::collections::HashSet;

/// Harvest result set keyed by [`SongKey`]
///
/// Iterates in first-insertion order so CSV output is reproducible.
#[derive(Debug, Default)]
pub struct SongSet {
    keys: HashSet<SongKey>,
    records: Vec<SongRecord>,
}

impl SongSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its key is already present
    ///
    /// Returns `true` if the record was new.
    pub fn insert(&mut self, record: SongRecord) -> bool {
        if self.keys.insert(record.key()) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    /// Merge a batch of records, returning how many were new
    pub fn extend<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = SongRecord>,
    {
        records
            .into_iter()
            .map(|record| self.insert(record))
            .filter(|inserted| *inserted)
            .count()
    }

    pub fn contains(&self, key: &SongKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SongRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<SongRecord> {
        self.records
    }
}
