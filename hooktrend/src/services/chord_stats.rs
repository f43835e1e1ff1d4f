//! Chord probability statistics

use crate::models::ChordNode;

/// Shannon entropy, in bits, of the chord probability distribution
///
/// `H = -Σ p·log2(p)` over chords with `p > 0`.
pub fn entropy(nodes: &[ChordNode]) -> f64 {
    -nodes
        .iter()
        .map(|node| node.probability)
        .filter(|p| *p > 0.0)
        .map(|p| p * p.log2())
        .sum::<f64>()
}

/// The `n` most probable chords, highest first
///
/// Ties keep their API order.
pub fn top_chords(nodes: &[ChordNode], n: usize) -> Vec<ChordNode> {
    let mut sorted = nodes.to_vec();
    sorted.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    sorted.truncate(n);
    sorted
}

/// Chord ids in node order
pub fn chord_ids(nodes: &[ChordNode]) -> Vec<String> {
    nodes.iter().map(|node| node.chord_id.clone()).collect()
}
