//! Word Scramble - remember the word, then put its letters back in order
//!
//! Each round shows a word and its definition for a few seconds, scrambles
//! it, and waits for the player to rearrange the tiles.

mod app;
mod config;
mod game;
mod prefetch;
mod source;
mod storage;
mod tui;

use anyhow::{Context, Result};
use app::{App, WordMode};
use clap::Parser;
use config::{Args, Settings};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use game::queue::WordQueue;
use prefetch::{Prefetcher, Supply, PREFETCH_AHEAD};
use source::{CuratedSupply, HttpTransport, RandomSupply, SourceTimeouts, Transport, WordSource};
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::{DefinitionCache, KeyValueStore, MemoryStore, Scope, Storage};
use tui::Tui;

/// Event poll interval; timers are checked this often
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let settings = Settings::from_args(Args::parse())?;

    if settings.list_sets {
        for set in settings.word_sets.iter() {
            println!("{:<20} {} ({} words)", set.id, set.label, set.words.len());
        }
        return Ok(());
    }

    if let Some(path) = &settings.log_file {
        config::init_logging(path)?;
    }
    log::info!(
        "starting wordscramble with {} word sets (session '{}')",
        settings.word_sets.len(),
        settings.session
    );

    if let (Some(id), None) = (&settings.requested_set, &settings.word_set) {
        log::warn!("unknown word set '{}', using random words", id);
    }

    let (durable, session) = open_stores(&settings);
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new().context("failed to build the HTTP client")?);
    let source = Arc::new(WordSource::standard(
        transport,
        DefinitionCache::new(durable),
        SourceTimeouts::default(),
    ));

    let (supply, mode): (Arc<dyn Supply>, WordMode) = match &settings.word_set {
        Some(set) => {
            let queue = WordQueue::load(&set.id, &set.words, session);
            let label = set.label.clone();
            let supply = CuratedSupply::new(source.clone(), set.clone(), queue);
            (Arc::new(supply), WordMode::Curated { label })
        }
        None => (
            Arc::new(RandomSupply::new(source.clone(), settings.difficulty)),
            WordMode::Random,
        ),
    };
    let prefetcher = Arc::new(Prefetcher::new(supply, PREFETCH_AHEAD));
    prefetcher.ensure_filled();

    let mut app = App::new(source, prefetcher, mode, settings.difficulty, settings.auto_advance);
    app.new_word();

    run(&mut app)?;
    log::info!("bye");
    Ok(())
}

/// Durable and session-scoped stores. Without a usable database the game
/// still runs, it just forgets everything on exit.
fn open_stores(settings: &Settings) -> (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) {
    let opened = Storage::open(settings.data_dir.as_deref(), &settings.session);
    match opened {
        Ok(storage) => {
            let storage = Arc::new(storage);
            if settings.reset_session {
                match storage.clear_session() {
                    Ok(n) => log::info!("reset session '{}' ({} entries)", storage.session(), n),
                    Err(e) => log::warn!("could not reset session: {}", e),
                }
            }
            if let Ok(cached) = storage.durable_count() {
                log::debug!("{} definitions cached on disk", cached);
            }
            (
                Arc::new(storage.scoped(Scope::Durable)),
                Arc::new(storage.scoped(Scope::Session)),
            )
        }
        Err(e) => {
            log::warn!("storage unavailable, nothing will be saved: {}", e);
            (Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
        }
    }
}

fn run(app: &mut App) -> Result<()> {
    let mut terminal = Tui::new()?;
    terminal.enter()?;

    loop {
        terminal.draw(|frame| tui::render(frame, app))?;

        // Wake early when a round timer is due sooner than the next poll
        let timeout = app
            .controller()
            .next_deadline()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(POLL_INTERVAL)
            .min(POLL_INTERVAL);

        if event::poll(timeout)? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => app.quit(),
                    KeyCode::Char('n') => app.new_word(),
                    KeyCode::Char('a') => app.toggle_auto_advance(),
                    KeyCode::Char('d') => app.cycle_difficulty(),
                    KeyCode::Char('p') => app.toggle_lock(),
                    KeyCode::Left => app.cursor_left(),
                    KeyCode::Right => app.cursor_right(),
                    KeyCode::Enter | KeyCode::Char(' ') => app.on_select(Instant::now()),
                    _ => {}
                },
                Event::Mouse(mouse) => {
                    let count = app.controller().state().tiles().len();
                    let rects = tui::tile_rects(tui::board_area(terminal.area()?), count);
                    let tile = tui::tile_at(&rects, mouse.column, mouse.row);
                    match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => app.on_mouse_down(tile),
                        MouseEventKind::Up(MouseButton::Left) => app.on_mouse_up(tile, Instant::now()),
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    // Terminal cleanup happens automatically via Tui::drop
    Ok(())
}
