//! Round-robin word queue for curated sets
//!
//! Every word of a set is served exactly once per cycle; each new cycle is an
//! independent reshuffle. State lives in the session store so a restart
//! resumes mid-cycle.

use crate::storage::{KeyValueStore, StorageError};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Namespaced key for a set's queue state
pub fn queue_key(set_id: &str) -> String {
    format!("wsq_{}", set_id)
}

/// Persisted layout: `{"queue": [...], "idx": n}`
#[derive(Debug, Serialize, Deserialize)]
struct PersistedQueue {
    #[serde(default)]
    queue: Vec<String>,
    #[serde(default)]
    idx: i64,
}

/// Current position in a set's shuffled sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueState {
    pub set_id: String,
    /// A permutation of the full word set
    pub sequence: Vec<String>,
    /// Index of the next word to serve
    pub cursor: usize,
}

pub struct WordQueue {
    state: QueueState,
    store: Arc<dyn KeyValueStore>,
    rng: StdRng,
}

impl WordQueue {
    /// Restore (or start) the queue for a set and save the result.
    pub fn load(set_id: &str, words: &[String], store: Arc<dyn KeyValueStore>) -> Self {
        Self::load_with_rng(set_id, words, store, StdRng::from_rng(&mut rand::rng()))
    }

    /// Restore the queue using a specific RNG (for testing/seeding).
    pub fn load_with_rng(
        set_id: &str,
        words: &[String],
        store: Arc<dyn KeyValueStore>,
        mut rng: StdRng,
    ) -> Self {
        let persisted = match read_persisted(store.as_ref(), set_id) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("discarding unreadable queue for set {}: {}", set_id, e);
                None
            }
        };

        let state = match persisted {
            Some(p) => heal(set_id, words, p, &mut rng),
            None => fresh(set_id, words, &mut rng),
        };

        let queue = Self { state, store, rng };
        queue.save();
        queue
    }

    /// Serve the next word, reshuffling when the cycle completes.
    pub fn next(&mut self) -> Option<String> {
        let word = self.state.sequence.get(self.state.cursor)?.clone();
        self.state.cursor += 1;
        if self.state.cursor >= self.state.sequence.len() {
            self.state.sequence.shuffle(&mut self.rng);
            self.state.cursor = 0;
        }
        self.save();
        Some(word)
    }

    /// Persist the current state. Failures are logged and ignored.
    pub fn save(&self) {
        let persisted = PersistedQueue {
            queue: self.state.sequence.clone(),
            idx: self.state.cursor as i64,
        };
        let result = serde_json::to_string(&persisted)
            .map_err(StorageError::from)
            .and_then(|json| self.store.put(&queue_key(&self.state.set_id), &json));
        if let Err(e) = result {
            log::warn!("could not save queue for set {}: {}", self.state.set_id, e);
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &QueueState {
        &self.state
    }
}

fn read_persisted(
    store: &dyn KeyValueStore,
    set_id: &str,
) -> Result<Option<PersistedQueue>, StorageError> {
    match store.get(&queue_key(set_id))? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn fresh(set_id: &str, words: &[String], rng: &mut StdRng) -> QueueState {
    let mut sequence = words.to_vec();
    sequence.shuffle(rng);
    QueueState {
        set_id: set_id.to_string(),
        sequence,
        cursor: 0,
    }
}

/// Rebuild a persisted queue against the current word list.
///
/// Unknown and repeated words are dropped, the cursor is re-based onto the
/// survivors, and words missing from the old sequence are appended in random
/// order so the sequence is again a permutation of `words`.
fn heal(set_id: &str, words: &[String], persisted: PersistedQueue, rng: &mut StdRng) -> QueueState {
    let allowed: HashSet<&str> = words.iter().map(String::as_str).collect();
    let old_cursor = persisted.idx.max(0) as usize;

    let mut seen = HashSet::new();
    let mut sequence = Vec::with_capacity(words.len());
    let mut cursor = 0;
    for (i, word) in persisted.queue.into_iter().enumerate() {
        if !allowed.contains(word.as_str()) || !seen.insert(word.clone()) {
            continue;
        }
        if i < old_cursor {
            cursor += 1;
        }
        sequence.push(word);
    }

    if sequence.is_empty() {
        return fresh(set_id, words, rng);
    }

    let mut missing: Vec<String> = words.iter().filter(|w| !seen.contains(*w)).cloned().collect();
    if !missing.is_empty() {
        log::debug!("adding {} new words to queue for set {}", missing.len(), set_id);
        missing.shuffle(rng);
        sequence.extend(missing);
    }

    if cursor >= sequence.len() {
        sequence.shuffle(rng);
        cursor = 0;
    }

    QueueState {
        set_id: set_id.to_string(),
        sequence,
        cursor,
    }
}
