//! Application state: the round controller plus the player's settings

use crate::app::round::{RoundController, RoundState};
use crate::game::Difficulty;
use crate::prefetch::Prefetcher;
use crate::source::{RandomSupply, WordSource};
use std::sync::Arc;
use std::time::Instant;

/// Where words come from this session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordMode {
    /// Provider words of the chosen difficulty
    Random,
    /// A curated set, by label
    Curated { label: String },
}

/// Main application state
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,
    controller: RoundController,
    prefetcher: Arc<Prefetcher>,
    source: Arc<WordSource>,
    mode: WordMode,
    difficulty: Difficulty,
    /// Keyboard cursor over the tiles
    cursor: usize,
    /// Tile under the mouse when the button went down
    drag_from: Option<usize>,
}

impl App {
    pub fn new(
        source: Arc<WordSource>,
        prefetcher: Arc<Prefetcher>,
        mode: WordMode,
        difficulty: Difficulty,
        auto_advance: bool,
    ) -> Self {
        let controller = RoundController::new(prefetcher.clone(), auto_advance);
        Self {
            should_quit: false,
            controller,
            prefetcher,
            source,
            mode,
            difficulty,
            cursor: 0,
            drag_from: None,
        }
    }

    pub fn controller(&self) -> &RoundController {
        &self.controller
    }

    pub fn mode(&self) -> &WordMode {
        &self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Signal the application to quit
    pub fn quit(&mut self) {
        self.controller.shutdown();
        self.should_quit = true;
    }

    /// Start a fresh round
    pub fn new_word(&mut self) {
        self.cursor = 0;
        self.drag_from = None;
        log::debug!("new word requested, {} ready", self.prefetcher.buffered());
        self.controller.load_new_word();
    }

    /// Step to the next difficulty and start a round with it.
    /// Only random mode has difficulties; ignored mid-transition.
    pub fn cycle_difficulty(&mut self) {
        if self.mode != WordMode::Random || self.controller.is_busy() {
            return;
        }
        self.difficulty = self.difficulty.next();
        log::info!("difficulty set to {}", self.difficulty);
        // Words buffered for the old tier no longer apply
        self.prefetcher
            .replace_supply(Arc::new(RandomSupply::new(self.source.clone(), self.difficulty)));
        self.new_word();
    }

    pub fn toggle_auto_advance(&mut self) {
        if self.controller.is_busy() {
            return;
        }
        let value = !self.controller.auto_advance();
        self.controller.set_auto_advance(value);
    }

    pub fn toggle_lock(&mut self) {
        self.controller.toggle_lock();
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let last = self.tile_count().saturating_sub(1);
        self.cursor = (self.cursor + 1).min(last);
    }

    /// Enter/Space: dismiss the notice if one is up, else tap the tile under
    /// the cursor.
    pub fn on_select(&mut self, now: Instant) {
        if self.controller.notice().is_some() {
            self.controller.dismiss_notice();
            return;
        }
        self.controller.select(self.cursor, now);
    }

    pub fn on_mouse_down(&mut self, tile: Option<usize>) {
        self.drag_from = tile;
    }

    /// Release on another tile drags there; release on the same tile taps it.
    pub fn on_mouse_up(&mut self, tile: Option<usize>, now: Instant) {
        match (self.drag_from.take(), tile) {
            (Some(from), Some(to)) if from != to => {
                if self.controller.move_tile(from, to, now) {
                    self.cursor = to;
                }
            }
            (Some(_), Some(index)) => {
                self.cursor = index;
                self.controller.select(index, now);
            }
            _ => {}
        }
    }

    /// Advance timers and pick up finished work. Returns true if the
    /// screen needs redrawing.
    pub fn tick(&mut self, now: Instant) -> bool {
        let changed = self.controller.poll(now);
        let last = self.tile_count().saturating_sub(1);
        self.cursor = self.cursor.min(last);
        changed
    }

    fn tile_count(&self) -> usize {
        match self.controller.state() {
            RoundState::Revealing { word, .. } => word.chars().count(),
            state => state.tiles().len(),
        }
    }
}
