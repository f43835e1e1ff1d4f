//! Chord nodes from the `trends/nodes` endpoint

use serde::{Deserialize, Deserializer, Serialize};

/// One chord and its probability of following the queried progression
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChordNode {
    /// Chord identifier used in progression keys (e.g. "1", "4", "56")
    #[serde(rename = "chord_ID", deserialize_with = "id_as_string")]
    pub chord_id: String,

    /// Display name, may contain HTML markup
    #[serde(rename = "chord_HTML", default)]
    pub chord_html: Option<String>,

    #[serde(default)]
    pub probability: f64,

    /// Progression key to query for chords following this one
    #[serde(default)]
    pub child_path: Option<String>,
}

impl ChordNode {
    /// Human-readable chord name, falling back to the identifier
    pub fn display_name(&self) -> String {
        match self.chord_html.as_deref().map(str::trim) {
            Some(html) if !html.is_empty() => html.to_string(),
            _ => format!("Chord {}", self.chord_id),
        }
    }
}

// The API has served chord_ID both as a string and as a bare number.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
