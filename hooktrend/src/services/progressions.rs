//! Candidate progression generator
//!
//! Produces every ordered combination (with repetition) of the candidate
//! chord ids at a fixed length, lazily and in lexicographic order of the
//! candidates' positions: for `["1", "4"]` at length 2 the order is
//! `1,1`, `1,4`, `4,1`, `4,4`.

use itertools::{Itertools, MultiProduct};
use std::vec::IntoIter;

/// Separator between chord ids in a progression key
pub const PROGRESSION_SEPARATOR: &str = ",";

/// Lazy iterator over progression keys
pub struct Progressions {
    inner: Option<MultiProduct<IntoIter<String>>>,
    total: Option<usize>,
}

impl Progressions {
    /// Generate all `length`-chord progressions over `chord_ids`
    ///
    /// A zero length yields nothing.
    pub fn new(chord_ids: &[String], length: usize) -> Self {
        let inner = (length > 0).then(|| {
            (0..length)
                .map(|_| chord_ids.to_vec().into_iter())
                .multi_cartesian_product()
        });

        Self {
            inner,
            total: progression_count(chord_ids.len(), length),
        }
    }

    /// Number of progressions the generator produces in total
    ///
    /// `None` if the count does not fit in `usize`.
    pub fn total(&self) -> Option<usize> {
        self.total
    }
}

impl Iterator for Progressions {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner
            .as_mut()?
            .next()
            .map(|chords| chords.join(PROGRESSION_SEPARATOR))
    }
}

/// `candidates ^ length`, or `None` on overflow
pub fn progression_count(candidates: usize, length: usize) -> Option<usize> {
    if length == 0 {
        return Some(0);
    }
    u32::try_from(length)
        .ok()
        .and_then(|exp| candidates.checked_pow(exp))
}
