//! Curated word-set configuration
//!
//! Sets are read from JSON of the form
//! `{"sets": [{"id", "label", "words": [...], "info": {word: text}}]}`.
//! A default configuration is embedded at build time.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::is_alpha;

/// Embedded default word sets
static WORD_SETS_DATA: &str = include_str!("../../data/word_sets.json");

static DEFAULT_SETS: Lazy<WordSets> = Lazy::new(|| {
    WordSets::from_json(WORD_SETS_DATA).unwrap_or_else(|e| {
        log::error!("embedded word sets are invalid: {}", e);
        WordSets::default()
    })
});

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sets: Vec<RawSet>,
}

#[derive(Debug, Deserialize)]
struct RawSet {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    words: Vec<serde_json::Value>,
    #[serde(default)]
    info: HashMap<String, String>,
}

/// A named, finite word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSet {
    pub id: String,
    pub label: String,
    /// Lowercase, alphabetic, de-duplicated
    pub words: Vec<String>,
    info: HashMap<String, String>,
}

impl WordSet {
    /// Supplementary text for a word, if configured.
    pub fn info_for(&self, word: &str) -> Option<&str> {
        self.info.get(&word.to_lowercase()).map(String::as_str)
    }

    fn from_raw(raw: RawSet) -> Option<Self> {
        let mut seen = HashSet::new();
        let words: Vec<String> = raw
            .words
            .iter()
            .filter_map(|w| match w {
                serde_json::Value::String(s) => Some(s.trim().to_lowercase()),
                _ => None,
            })
            .filter(|w| is_alpha(w))
            .filter(|w| seen.insert(w.clone()))
            .collect();

        if words.is_empty() {
            return None;
        }

        let info = raw
            .info
            .into_iter()
            .map(|(word, text)| (word.trim().to_lowercase(), text))
            .collect();

        Some(WordSet {
            label: raw.label.filter(|l| !l.is_empty()).unwrap_or_else(|| raw.id.clone()),
            id: raw.id,
            words,
            info,
        })
    }
}

/// All configured sets.
#[derive(Debug, Clone, Default)]
pub struct WordSets {
    sets: Vec<WordSet>,
}

impl WordSets {
    /// The sets embedded in the binary.
    pub fn embedded() -> &'static WordSets {
        &DEFAULT_SETS
    }

    /// Parse a JSON configuration. Sets with no usable words are dropped.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawConfig = serde_json::from_str(json)?;
        let sets = raw.sets.into_iter().filter_map(WordSet::from_raw).collect();
        Ok(Self { sets })
    }

    /// Load a JSON configuration from disk.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Find a set by id, ignoring case.
    pub fn find(&self, id: &str) -> Option<&WordSet> {
        let id = id.trim().to_lowercase();
        self.sets.iter().find(|s| s.id.to_lowercase() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordSet> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }
}
