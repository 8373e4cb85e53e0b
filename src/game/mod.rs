//! Game vocabulary: words, difficulty tiers, scrambling, curated sets

pub mod queue;
pub mod scramble;
pub mod word_sets;

use rand::prelude::*;
use std::fmt;
use std::str::FromStr;

/// A playable word with its definition.
///
/// `word` is always lowercase and purely alphabetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub word: String,
    pub definition: String,
    /// Supplementary line shown for curated words
    pub info: Option<String>,
}

impl WordEntry {
    pub fn new(word: &str, definition: &str) -> Self {
        Self {
            word: word.to_lowercase(),
            definition: definition.to_string(),
            info: None,
        }
    }

    pub fn with_info(mut self, info: Option<String>) -> Self {
        self.info = info;
        self
    }
}

/// Coarse difficulty tier for randomly sourced words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn all() -> &'static [Difficulty] {
        &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Letter-count masks for the pattern lookup provider.
    pub fn masks(&self) -> &'static [&'static str] {
        match self {
            Difficulty::Easy => &["???", "????", "?????"],
            Difficulty::Medium => &["??????", "???????"],
            Difficulty::Hard => &["????????", "?????????"],
        }
    }

    /// Word lengths requested from the random-word provider.
    pub fn fallback_lengths(&self) -> &'static [usize] {
        match self {
            Difficulty::Easy => &[4, 5],
            Difficulty::Medium => &[6, 7],
            Difficulty::Hard => &[8, 9, 10],
        }
    }

    /// Pick one mask uniformly at random.
    pub fn pick_mask<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        self.masks().choose(rng).copied().unwrap_or("????")
    }

    /// Pick one fallback length uniformly at random.
    pub fn pick_length<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.fallback_lengths().choose(rng).copied().unwrap_or(5)
    }

    /// The next tier, wrapping from hard back to easy.
    pub fn next(&self) -> Difficulty {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Difficulty::all()
            .iter()
            .copied()
            .find(|d| d.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown difficulty '{}' (expected easy, medium or hard)", wanted))
    }
}

/// True when the string is non-empty and made only of ASCII letters.
pub fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}
