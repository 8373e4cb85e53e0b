//! Look-ahead buffer of ready words
//!
//! Keeps a small FIFO of entries filled by background worker threads so a
//! new round rarely waits on the network. Refills launched but not yet
//! finished count toward occupancy, so repeated `ensure_filled` calls never
//! over-fetch.

use crate::game::WordEntry;
use crate::source::SourceError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

/// Default look-ahead depth
pub const PREFETCH_AHEAD: usize = 2;

/// Words handed out recently enough to be taken back
const LENT_LIMIT: usize = 8;

/// Anything that can produce one ready word entry (possibly blocking).
pub trait Supply: Send + Sync {
    fn supply(&self) -> Result<WordEntry, SourceError>;

    /// Take back an entry that was handed out but never played.
    fn restore(&self, _entry: WordEntry) {}
}

struct Inner {
    buffer: VecDeque<WordEntry>,
    in_flight: usize,
    /// Bumped on every supply change; older refills are dropped
    generation: u64,
    /// Words served under the current generation, newest last
    lent: VecDeque<String>,
    supply: Arc<dyn Supply>,
}

struct Shared {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct Prefetcher {
    shared: Arc<Shared>,
}

impl Prefetcher {
    pub fn new(supply: Arc<dyn Supply>, capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                capacity,
                inner: Mutex::new(Inner {
                    buffer: VecDeque::with_capacity(capacity),
                    in_flight: 0,
                    generation: 0,
                    lent: VecDeque::new(),
                    supply,
                }),
            }),
        }
    }

    /// Launch enough background refills to reach capacity. Returns immediately.
    pub fn ensure_filled(&self) {
        let (need, generation, supply) = {
            let mut inner = self.shared.lock();
            let occupied = inner.buffer.len() + inner.in_flight;
            let need = self.shared.capacity.saturating_sub(occupied);
            inner.in_flight += need;
            (need, inner.generation, inner.supply.clone())
        };

        for _ in 0..need {
            let shared = Arc::clone(&self.shared);
            let supply = Arc::clone(&supply);
            thread::spawn(move || {
                let result = supply.supply();
                let mut inner = shared.lock();
                if inner.generation != generation {
                    return;
                }
                inner.in_flight = inner.in_flight.saturating_sub(1);
                match result {
                    Ok(entry) => inner.buffer.push_back(entry),
                    Err(e) => log::debug!("prefetch slot came up empty: {}", e),
                }
            });
        }
    }

    /// Oldest buffered entry, or a blocking fetch when the buffer is empty.
    /// Either way a background top-up follows.
    pub fn take(&self) -> Result<WordEntry, SourceError> {
        let (buffered, generation, supply) = {
            let mut inner = self.shared.lock();
            (inner.buffer.pop_front(), inner.generation, inner.supply.clone())
        };

        let result = match buffered {
            Some(entry) => Ok(entry),
            None => supply.supply(),
        };
        if let Ok(entry) = &result {
            self.lend(&entry.word, generation);
        }
        self.ensure_filled();
        result
    }

    fn lend(&self, word: &str, generation: u64) {
        let mut inner = self.shared.lock();
        if inner.generation != generation {
            return;
        }
        if inner.lent.len() == LENT_LIMIT {
            inner.lent.pop_front();
        }
        inner.lent.push_back(word.to_string());
    }

    /// Put an unplayed entry back at the head of the buffer. Entries served
    /// before a supply change are dropped instead.
    pub fn restore(&self, entry: WordEntry) {
        let mut inner = self.shared.lock();
        let Some(pos) = inner.lent.iter().rposition(|w| *w == entry.word) else {
            log::debug!("not restoring '{}' from a replaced supply", entry.word);
            return;
        };
        inner.lent.remove(pos);
        inner.buffer.push_front(entry);
    }

    /// Switch to a different supply, discarding buffered and in-flight words.
    pub fn replace_supply(&self, supply: Arc<dyn Supply>) {
        {
            let mut inner = self.shared.lock();
            inner.generation += 1;
            inner.buffer.clear();
            inner.lent.clear();
            inner.in_flight = 0;
            inner.supply = supply;
        }
        self.ensure_filled();
    }

    /// Number of entries ready to serve.
    pub fn buffered(&self) -> usize {
        self.shared.lock().buffer.len()
    }
}

impl Supply for Prefetcher {
    fn supply(&self) -> Result<WordEntry, SourceError> {
        self.take()
    }

    fn restore(&self, entry: WordEntry) {
        Prefetcher::restore(self, entry);
    }
}
