//! Letter scrambling with a fairness guarantee
//!
//! The scrambled order always differs from the original whenever the word has
//! at least two distinct letters. Every tile gets a fresh id so the UI never
//! confuses tiles across rounds.

use rand::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of random shuffles tried before forcing a swap
const SHUFFLE_ATTEMPTS: usize = 8;

static NEXT_TILE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique tile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(u64);

impl TileId {
    fn fresh() -> Self {
        TileId(NEXT_TILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One letter of the word being unscrambled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterTile {
    pub id: TileId,
    pub letter: char,
}

/// Scramble a word using the thread-local RNG.
pub fn scramble(word: &str) -> Vec<LetterTile> {
    scramble_with_rng(word, &mut rand::rng())
}

/// Scramble a word using a specific RNG (for testing/seeding).
pub fn scramble_with_rng<R: Rng + ?Sized>(word: &str, rng: &mut R) -> Vec<LetterTile> {
    let letters: Vec<char> = word.chars().collect();
    if letters.len() <= 1 {
        return tiles_in_order(word);
    }

    let mut order = letters.clone();
    for _ in 0..SHUFFLE_ATTEMPTS {
        order.shuffle(rng);
        if order != letters {
            return into_tiles(order);
        }
    }

    // Every attempt reproduced the word
    if has_single_letter(word) {
        order = letters.clone();
        order.rotate_left(1);
    } else if let Some((i, j)) = first_distinct_pair(&letters) {
        order = letters.clone();
        order.swap(i, j);
    }
    into_tiles(order)
}

/// Tiles spelling the word as given, with fresh ids.
pub fn tiles_in_order(word: &str) -> Vec<LetterTile> {
    into_tiles(word.chars().collect())
}

/// The letters of the tiles, in their current order.
pub fn arranged(tiles: &[LetterTile]) -> String {
    tiles.iter().map(|t| t.letter).collect()
}

/// Case-insensitive check that the tiles spell `word`.
pub fn is_arranged(tiles: &[LetterTile], word: &str) -> bool {
    arranged(tiles).to_lowercase() == word.to_lowercase()
}

/// True when no reordering of the word can differ from it.
pub fn has_single_letter(word: &str) -> bool {
    let distinct: HashSet<char> = word.chars().collect();
    distinct.len() <= 1
}

fn first_distinct_pair(letters: &[char]) -> Option<(usize, usize)> {
    for i in 0..letters.len() {
        for j in (i + 1)..letters.len() {
            if letters[i] != letters[j] {
                return Some((i, j));
            }
        }
    }
    None
}

fn into_tiles(letters: Vec<char>) -> Vec<LetterTile> {
    letters
        .into_iter()
        .map(|letter| LetterTile {
            id: TileId::fresh(),
            letter,
        })
        .collect()
}
