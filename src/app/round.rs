//! Round lifecycle: load, reveal, scramble, solve
//!
//! The controller owns every timer it schedules and tags each one, plus each
//! word acquisition, with the round token current at the time. Anything that
//! arrives under an older token belongs to a superseded round and is dropped.

use crate::app::timer::TimerQueue;
use crate::game::scramble::{self, LetterTile};
use crate::game::WordEntry;
use crate::prefetch::Supply;
use crate::source::SourceError;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Seconds the plain word stays visible before it is scrambled
pub const REVEAL_SECONDS: u32 = 10;
/// Seconds the solved board stays up before auto-advancing
pub const SUCCESS_PAUSE_SECONDS: u32 = 5;

pub const FAILURE_NOTICE: &str = "Couldn't get a word and definition. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    Loading,
    Revealing { word: String, seconds_remaining: u32 },
    Scrambling { tiles: Vec<LetterTile>, locked: bool },
    Solved { tiles: Vec<LetterTile> },
    SuccessPause { tiles: Vec<LetterTile>, seconds_remaining: u32 },
}

impl RoundState {
    /// Tiles on the board, if any are shown in this state
    pub fn tiles(&self) -> &[LetterTile] {
        match self {
            RoundState::Scrambling { tiles, .. }
            | RoundState::Solved { tiles }
            | RoundState::SuccessPause { tiles, .. } => tiles,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    RevealTick,
    RevealEnd,
    PauseTick,
    PauseEnd,
}

struct Acquired {
    token: u64,
    result: Result<WordEntry, SourceError>,
}

pub struct RoundController {
    state: RoundState,
    token: u64,
    timers: TimerQueue<(u64, TimerEvent)>,
    supply: Arc<dyn Supply>,
    acquired_tx: Sender<Acquired>,
    acquired_rx: Receiver<Acquired>,
    /// Word being played this round
    entry: Option<WordEntry>,
    /// Scrambled tiles held back until the reveal ends
    pending_tiles: Vec<LetterTile>,
    /// First half of a tap-tap move
    selected: Option<usize>,
    auto_advance: bool,
    notice: Option<String>,
}

impl RoundController {
    pub fn new(supply: Arc<dyn Supply>, auto_advance: bool) -> Self {
        let (acquired_tx, acquired_rx) = channel();
        Self {
            state: RoundState::Idle,
            token: 0,
            timers: TimerQueue::new(),
            supply,
            acquired_tx,
            acquired_rx,
            entry: None,
            pending_tiles: Vec::new(),
            selected: None,
            auto_advance,
            notice: None,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Word and definition of the current round, once acquired
    pub fn entry(&self) -> Option<&WordEntry> {
        self.entry.as_ref()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    #[cfg(test)]
    pub fn round_token(&self) -> u64 {
        self.token
    }

    /// Loading and the success pause are transitional; settings stay put
    pub fn is_busy(&self) -> bool {
        matches!(self.state, RoundState::Loading | RoundState::SuccessPause { .. })
    }

    /// Start a new round. Whatever the previous round had scheduled or
    /// requested is abandoned.
    pub fn load_new_word(&mut self) {
        self.timers.cancel_all();
        self.token += 1;
        self.selected = None;
        self.pending_tiles.clear();
        self.entry = None;
        self.notice = None;
        self.state = RoundState::Loading;

        let supply = Arc::clone(&self.supply);
        let tx = self.acquired_tx.clone();
        let token = self.token;
        thread::spawn(move || {
            let result = supply.supply();
            // The controller may be gone by now
            let _ = tx.send(Acquired { token, result });
        });
    }

    /// Apply finished acquisitions and due timers. Returns true if anything
    /// changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;

        while let Ok(acquired) = self.acquired_rx.try_recv() {
            if acquired.token != self.token || self.state != RoundState::Loading {
                log::debug!("discarding stale word result for round {}", acquired.token);
                // The word was never shown, so it goes back for a later round
                if let Ok(entry) = acquired.result {
                    self.supply.restore(entry);
                }
                continue;
            }
            match acquired.result {
                Ok(entry) => self.begin_reveal(entry, now),
                Err(e) => {
                    log::warn!("round {} could not load a word: {}", self.token, e);
                    self.state = RoundState::Idle;
                    self.notice = Some(FAILURE_NOTICE.to_string());
                }
            }
            changed = true;
        }

        for (token, event) in self.timers.pop_due(now) {
            if token != self.token {
                log::debug!("discarding stale {:?} for round {}", event, token);
                continue;
            }
            self.on_timer(event, now);
            changed = true;
        }

        changed
    }

    fn begin_reveal(&mut self, entry: WordEntry, now: Instant) {
        log::info!("round {}: '{}'", self.token, entry.word);
        self.pending_tiles = scramble::scramble(&entry.word);
        self.state = RoundState::Revealing {
            word: entry.word.clone(),
            seconds_remaining: REVEAL_SECONDS,
        };
        self.entry = Some(entry);
        self.schedule_countdown(now, REVEAL_SECONDS, TimerEvent::RevealTick, TimerEvent::RevealEnd);
    }

    /// One tick per second, then the closing event at `seconds`.
    fn schedule_countdown(&mut self, now: Instant, seconds: u32, tick: TimerEvent, end: TimerEvent) {
        for s in 1..seconds {
            let at = now + Duration::from_secs(u64::from(s));
            self.timers.schedule(at, (self.token, tick));
        }
        let at = now + Duration::from_secs(u64::from(seconds));
        self.timers.schedule(at, (self.token, end));
    }

    fn on_timer(&mut self, event: TimerEvent, now: Instant) {
        match (event, &mut self.state) {
            (TimerEvent::RevealTick, RoundState::Revealing { seconds_remaining, .. })
            | (TimerEvent::PauseTick, RoundState::SuccessPause { seconds_remaining, .. }) => {
                *seconds_remaining = seconds_remaining.saturating_sub(1);
            }
            (TimerEvent::RevealEnd, RoundState::Revealing { word, .. }) => {
                let tiles = std::mem::take(&mut self.pending_tiles);
                if scramble::has_single_letter(word) {
                    // Nothing to rearrange
                    self.finish(tiles, now);
                } else {
                    self.state = RoundState::Scrambling { tiles, locked: false };
                }
            }
            (TimerEvent::PauseEnd, RoundState::SuccessPause { .. }) => self.load_new_word(),
            (event, state) => log::debug!("ignoring {:?} in {:?}", event, state),
        }
    }

    fn finish(&mut self, tiles: Vec<LetterTile>, now: Instant) {
        self.selected = None;
        if self.auto_advance {
            self.state = RoundState::SuccessPause {
                tiles,
                seconds_remaining: SUCCESS_PAUSE_SECONDS,
            };
            self.schedule_countdown(now, SUCCESS_PAUSE_SECONDS, TimerEvent::PauseTick, TimerEvent::PauseEnd);
        } else {
            self.state = RoundState::Solved { tiles };
        }
    }

    /// Move the tile at `from` to position `to`, shifting the tiles between.
    /// Returns false when the move was ignored.
    pub fn move_tile(&mut self, from: usize, to: usize, now: Instant) -> bool {
        let RoundState::Scrambling { tiles, locked } = &mut self.state else {
            return false;
        };
        if *locked || from == to || from >= tiles.len() || to >= tiles.len() {
            return false;
        }

        let tile = tiles.remove(from);
        log::debug!("tile {:?} '{}' moved {} -> {}", tile.id, tile.letter, from, to);
        tiles.insert(to, tile);
        self.selected = None;

        let solved = self
            .entry
            .as_ref()
            .is_some_and(|entry| scramble::is_arranged(tiles, &entry.word));
        if solved {
            let tiles = std::mem::take(tiles);
            self.finish(tiles, now);
        }
        true
    }

    /// Tap-tap move: the first tap marks a tile, tapping it again clears the
    /// mark, tapping another moves the marked tile there.
    pub fn select(&mut self, index: usize, now: Instant) {
        let RoundState::Scrambling { tiles, locked } = &self.state else {
            return;
        };
        if *locked || index >= tiles.len() {
            return;
        }
        match self.selected {
            None => self.selected = Some(index),
            Some(marked) if marked == index => self.selected = None,
            Some(marked) => {
                self.move_tile(marked, index, now);
            }
        }
    }

    pub fn set_locked(&mut self, value: bool) {
        if let RoundState::Scrambling { locked, .. } = &mut self.state {
            *locked = value;
            if value {
                self.selected = None;
            }
        }
    }

    pub fn toggle_lock(&mut self) {
        if let RoundState::Scrambling { locked, .. } = self.state {
            self.set_locked(!locked);
        }
    }

    pub fn set_auto_advance(&mut self, value: bool) {
        self.auto_advance = value;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Stop everything in flight; late results and timers are ignored.
    pub fn shutdown(&mut self) {
        self.timers.cancel_all();
        self.token += 1;
        self.selected = None;
        self.state = RoundState::Idle;
    }

    /// When the next scheduled event is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Difficulty;
    use crate::prefetch::testing::{wait_until, GatedSupply, ListSupply};
    use crate::prefetch::Prefetcher;
    use crate::source::testing::{short_timeouts, Reply, ScriptedTransport};
    use crate::source::{RandomSupply, WordSource};
    use crate::storage::{DefinitionCache, MemoryStore};
    use serde_json::json;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn controller(words: &[(&str, &str)], auto_advance: bool) -> RoundController {
        RoundController::new(Arc::new(ListSupply::new(words)), auto_advance)
    }

    /// Wait for the worker thread to hand back its result.
    fn settle(controller: &mut RoundController, now: Instant) {
        assert!(wait_until(|| {
            controller.poll(now);
            controller.state() != &RoundState::Loading
        }));
    }

    /// Load a word and run the reveal to completion.
    fn scrambling(controller: &mut RoundController, start: Instant) -> Instant {
        controller.load_new_word();
        settle(controller, start);
        let after_reveal = start + secs(u64::from(REVEAL_SECONDS));
        controller.poll(after_reveal);
        after_reveal
    }

    /// Drag tiles into place one position at a time.
    fn solve(controller: &mut RoundController, word: &str, now: Instant) {
        for (i, target) in word.chars().enumerate() {
            let tiles = controller.state().tiles();
            let Some(from) = tiles.iter().skip(i).position(|t| t.letter == target).map(|p| p + i) else {
                return;
            };
            if from != i {
                controller.move_tile(from, i, now);
            }
        }
    }

    fn board(controller: &RoundController) -> String {
        scramble::arranged(controller.state().tiles())
    }

    #[test]
    fn test_reveal_counts_down_then_scrambles() {
        let start = Instant::now();
        let mut controller = controller(&[("frog", "a tailless amphibian")], false);
        controller.load_new_word();
        assert_eq!(controller.state(), &RoundState::Loading);

        settle(&mut controller, start);
        assert_eq!(
            controller.state(),
            &RoundState::Revealing {
                word: "frog".to_string(),
                seconds_remaining: 10
            }
        );
        assert_eq!(controller.entry().unwrap().definition, "a tailless amphibian");

        controller.poll(start + secs(1));
        assert!(matches!(
            controller.state(),
            RoundState::Revealing { seconds_remaining: 9, .. }
        ));

        controller.poll(start + secs(10));
        let RoundState::Scrambling { tiles, locked } = controller.state() else {
            panic!("expected scrambling, got {:?}", controller.state());
        };
        assert!(!locked);
        assert_eq!(tiles.len(), 4);
        assert_ne!(board(&controller), "frog");
    }

    #[test]
    fn test_frog_end_to_end_without_auto_advance() {
        let transport = Arc::new(ScriptedTransport::new().reply(
            "api.datamuse.com",
            Reply::Json(json!([{ "word": "frog", "defs": ["n\ta tailless amphibian"] }])),
        ));
        let cache = DefinitionCache::new(Arc::new(MemoryStore::new()));
        let source = Arc::new(WordSource::standard(transport, cache, short_timeouts()));
        let prefetcher = Arc::new(Prefetcher::new(
            Arc::new(RandomSupply::new(source, Difficulty::Easy)),
            2,
        ));
        prefetcher.ensure_filled();

        let start = Instant::now();
        let mut controller = RoundController::new(prefetcher, false);
        let now = scrambling(&mut controller, start);
        assert!(matches!(controller.state(), RoundState::Scrambling { .. }));

        solve(&mut controller, "frog", now);
        let RoundState::Solved { tiles } = controller.state() else {
            panic!("expected solved, got {:?}", controller.state());
        };
        assert_eq!(scramble::arranged(tiles), "frog");

        // No follow-up round is started without auto-advance
        let token = controller.round_token();
        assert!(!controller.poll(now + secs(60)));
        assert_eq!(controller.round_token(), token);
        assert!(matches!(controller.state(), RoundState::Solved { .. }));
    }

    #[test]
    fn test_correctness_ignores_case() {
        let now = Instant::now();
        let mut controller = controller(&[], false);
        controller.entry = Some(WordEntry::new("puzzle", "a problem to solve"));
        controller.state = RoundState::Scrambling {
            tiles: scramble::tiles_in_order("UPZZLE"),
            locked: false,
        };

        assert!(controller.move_tile(2, 3, now));
        assert!(matches!(controller.state(), RoundState::Scrambling { .. }));
        assert!(controller.move_tile(3, 2, now));
        assert!(controller.move_tile(1, 0, now));
        assert!(matches!(controller.state(), RoundState::Solved { .. }));
        assert_eq!(board(&controller), "PUZZLE");
    }

    #[test]
    fn test_stale_acquisition_is_discarded() {
        let (supply, answers) = GatedSupply::new();
        let supply = Arc::new(supply);
        let now = Instant::now();
        let mut controller = RoundController::new(supply.clone(), false);

        controller.load_new_word();
        assert!(wait_until(|| supply.calls() == 1));
        controller.load_new_word();

        // Only the first request is waiting, so this answer belongs to it
        answers.send(Ok(WordEntry::new("frog", "a tailless amphibian"))).unwrap();
        assert!(wait_until(|| supply.calls() == 2));
        controller.poll(now);
        assert_eq!(controller.state(), &RoundState::Loading);
        assert!(controller.entry().is_none());

        answers.send(Ok(WordEntry::new("toad", "a warty amphibian"))).unwrap();
        settle(&mut controller, now);
        assert!(matches!(controller.state(), RoundState::Revealing { word, .. } if word == "toad"));
    }

    #[test]
    fn test_superseded_load_returns_its_word() {
        let words = [("frog", "a"), ("toad", "b"), ("newt", "c"), ("eft", "d")];
        let prefetcher = Arc::new(Prefetcher::new(Arc::new(ListSupply::new(&words)), 2));
        prefetcher.ensure_filled();
        assert!(wait_until(|| prefetcher.buffered() == 2));

        let now = Instant::now();
        let mut controller = RoundController::new(prefetcher, false);
        controller.load_new_word();
        controller.load_new_word();

        let mut shown = Vec::new();
        for _ in 0..10 {
            settle(&mut controller, now);
            match controller.state() {
                RoundState::Revealing { word, .. } => shown.push(word.clone()),
                _ => break,
            }
            controller.load_new_word();
        }

        shown.sort();
        assert_eq!(shown, vec!["eft", "frog", "newt", "toad"]);
    }

    #[test]
    fn test_new_word_during_reveal_cancels_old_timers() {
        let start = Instant::now();
        let mut controller = controller(&[("frog", "a"), ("toad", "b")], false);
        controller.load_new_word();
        settle(&mut controller, start);

        controller.load_new_word();
        assert_eq!(controller.next_deadline(), None);
        let later = start + secs(5);
        settle(&mut controller, later);

        // The first round's reveal end would have fired here
        controller.poll(start + secs(10));
        assert!(matches!(
            controller.state(),
            RoundState::Revealing { word, seconds_remaining: 5 } if word == "toad"
        ));
        controller.poll(later + secs(10));
        assert!(matches!(controller.state(), RoundState::Scrambling { .. }));
    }

    #[test]
    fn test_failure_returns_to_idle_with_notice() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply("api.datamuse.com", Reply::Stall)
                .reply("random-word-api.herokuapp.com", Reply::Json(json!([]))),
        );
        let cache = DefinitionCache::new(Arc::new(MemoryStore::new()));
        let source = Arc::new(WordSource::standard(transport.clone(), cache, short_timeouts()));
        let supply = Arc::new(RandomSupply::new(source, Difficulty::Easy));

        let now = Instant::now();
        let mut controller = RoundController::new(supply, false);
        controller.load_new_word();
        settle(&mut controller, now);

        assert_eq!(controller.state(), &RoundState::Idle);
        assert_eq!(controller.notice(), Some(FAILURE_NOTICE));
        assert_eq!(controller.next_deadline(), None);
        assert_eq!(transport.calls("api.datamuse.com"), 1);
        assert_eq!(transport.calls("random-word-api.herokuapp.com"), 1);

        controller.dismiss_notice();
        assert_eq!(controller.notice(), None);
    }

    #[test]
    fn test_auto_advance_pauses_then_loads_next() {
        let start = Instant::now();
        let mut controller = controller(&[("frog", "a"), ("toad", "b")], true);
        let now = scrambling(&mut controller, start);
        let token = controller.round_token();

        solve(&mut controller, "frog", now);
        assert!(matches!(
            controller.state(),
            RoundState::SuccessPause { seconds_remaining: 5, .. }
        ));
        assert!(controller.is_busy());

        controller.poll(now + secs(1));
        assert!(matches!(
            controller.state(),
            RoundState::SuccessPause { seconds_remaining: 4, .. }
        ));

        controller.poll(now + secs(5));
        assert_eq!(controller.round_token(), token + 1);
        settle(&mut controller, now + secs(5));
        assert!(matches!(controller.state(), RoundState::Revealing { word, .. } if word == "toad"));
    }

    #[test]
    fn test_identical_letters_are_solved_after_reveal() {
        let start = Instant::now();
        let mut controller = controller(&[("zzz", "a sound of sleep")], false);
        scrambling(&mut controller, start);
        assert!(matches!(controller.state(), RoundState::Solved { .. }));
        assert_eq!(board(&controller), "zzz");
    }

    #[test]
    fn test_tap_tap_selection() {
        let now = Instant::now();
        let mut controller = controller(&[], false);
        controller.entry = Some(WordEntry::new("frog", "a"));
        controller.state = RoundState::Scrambling {
            tiles: scramble::tiles_in_order("gorf"),
            locked: false,
        };

        controller.select(0, now);
        assert_eq!(controller.selected(), Some(0));
        controller.select(0, now);
        assert_eq!(controller.selected(), None);

        controller.select(0, now);
        controller.select(3, now);
        assert_eq!(controller.selected(), None);
        assert_eq!(board(&controller), "orfg");

        controller.select(9, now);
        assert_eq!(controller.selected(), None);
    }

    #[test]
    fn test_moves_ignored_when_locked_or_out_of_range() {
        let now = Instant::now();
        let mut controller = controller(&[], false);
        controller.entry = Some(WordEntry::new("frog", "a"));
        controller.state = RoundState::Scrambling {
            tiles: scramble::tiles_in_order("rfog"),
            locked: false,
        };

        assert!(!controller.move_tile(0, 0, now));
        assert!(!controller.move_tile(0, 4, now));
        assert!(!controller.move_tile(7, 1, now));

        controller.select(2, now);
        controller.toggle_lock();
        assert_eq!(controller.selected(), None);
        assert!(!controller.move_tile(0, 1, now));
        controller.select(1, now);
        assert_eq!(controller.selected(), None);
        assert_eq!(board(&controller), "rfog");

        controller.set_locked(false);
        assert!(controller.move_tile(0, 1, now));
        assert!(matches!(controller.state(), RoundState::Solved { .. }));
    }

    #[test]
    fn test_moves_ignored_outside_scrambling() {
        let start = Instant::now();
        let mut controller = controller(&[("frog", "a")], false);
        controller.load_new_word();
        settle(&mut controller, start);
        assert!(!controller.move_tile(0, 1, start));
        controller.toggle_lock();
        assert!(matches!(controller.state(), RoundState::Revealing { .. }));
    }

    #[test]
    fn test_shutdown_ignores_late_results() {
        let (supply, answers) = GatedSupply::new();
        let supply = Arc::new(supply);
        let now = Instant::now();
        let mut controller = RoundController::new(supply.clone(), false);
        controller.load_new_word();
        assert!(wait_until(|| supply.calls() == 1));

        controller.shutdown();
        answers.send(Ok(WordEntry::new("frog", "a"))).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        controller.poll(now);
        assert_eq!(controller.state(), &RoundState::Idle);
        assert!(controller.entry().is_none());
    }
}
