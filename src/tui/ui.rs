//! UI rendering using ratatui
//!
//! One screen, laid out top to bottom:
//! - Header: title, word mode, auto-advance
//! - Status: what the round is doing
//! - Board: the letter tiles
//! - Clues: definition, fun fact, notices
//! - Footer: key hints

use crate::app::{App, RoundState, WordMode};
use crate::game::scramble::{self, LetterTile};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

const TILE_WIDTH: u16 = 5;
const TILE_HEIGHT: u16 = 3;
const TILE_GAP: u16 = 1;

struct ScreenLayout {
    header: Rect,
    status: Rect,
    board: Rect,
    clues: Rect,
    footer: Rect,
}

fn screen_layout(area: Rect) -> ScreenLayout {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),           // Header
            Constraint::Length(2),           // Status
            Constraint::Length(TILE_HEIGHT), // Board
            Constraint::Length(1),           // Spacer
            Constraint::Min(3),              // Clues
            Constraint::Length(2),           // Footer
        ])
        .margin(1)
        .split(area);

    ScreenLayout {
        header: layout[0],
        status: layout[1],
        board: layout[2],
        clues: layout[4],
        footer: layout[5],
    }
}

/// Where the tiles are drawn within a screen of the given size.
pub fn board_area(area: Rect) -> Rect {
    screen_layout(area).board
}

/// Rectangles for `count` tiles, centred in `area`. Tiles shrink and lose
/// their gaps when the row would not fit.
pub fn tile_rects(area: Rect, count: usize) -> Vec<Rect> {
    if count == 0 || area.width == 0 {
        return Vec::new();
    }
    let n = count as u16;
    let (width, gap) = if n * TILE_WIDTH + (n - 1) * TILE_GAP <= area.width {
        (TILE_WIDTH, TILE_GAP)
    } else {
        ((area.width / n).max(1), 0)
    };

    let total = n * width + (n - 1) * gap;
    let left = area.x + area.width.saturating_sub(total) / 2;
    (0..n)
        .map(|i| Rect::new(left + i * (width + gap), area.y, width, area.height.min(TILE_HEIGHT)))
        .collect()
}

/// Index of the tile under a screen position.
pub fn tile_at(rects: &[Rect], column: u16, row: u16) -> Option<usize> {
    rects.iter().position(|r| r.contains(Position::new(column, row)))
}

/// Render the whole screen
pub fn render(frame: &mut Frame, app: &App) {
    let layout = screen_layout(frame.area());

    render_header(frame, layout.header, app);

    let (status, color) = status_line(app.controller().state());
    let status = Paragraph::new(status)
        .style(Style::default().fg(color).bold())
        .alignment(Alignment::Center);
    frame.render_widget(status, layout.status);

    render_board(frame, layout.board, app);
    render_clues(frame, layout.clues, app);

    let footer = Paragraph::new(footer_hint(app))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout.footer);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(16), // Title
            Constraint::Min(20),    // Mode
            Constraint::Length(16), // Auto-advance
        ])
        .split(inner);

    let title = Paragraph::new("WORD SCRAMBLE")
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Left);
    frame.render_widget(title, header_layout[0]);

    let mode = match app.mode() {
        WordMode::Random => format!("Random words ({})", app.difficulty()),
        WordMode::Curated { label } => format!("Word set: {}", label),
    };
    let mode = Paragraph::new(mode)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);
    frame.render_widget(mode, header_layout[1]);

    let auto = if app.controller().auto_advance() {
        "Auto: on"
    } else {
        "Auto: off"
    };
    let auto = Paragraph::new(auto)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Right);
    frame.render_widget(auto, header_layout[2]);
}

fn render_board(frame: &mut Frame, area: Rect, app: &App) {
    let controller = app.controller();
    match controller.state() {
        RoundState::Revealing { word, .. } => {
            let tiles = scramble::tiles_in_order(word);
            draw_tiles(frame, area, &tiles, Style::default().fg(Color::Cyan).bold());
        }
        RoundState::Scrambling { tiles, locked } => {
            let rects = tile_rects(area, tiles.len());
            for (i, (rect, tile)) in rects.into_iter().zip(tiles).enumerate() {
                let style = tile_style(i, app.cursor(), controller.selected(), *locked);
                draw_tile(frame, rect, tile.letter, style);
            }
        }
        RoundState::Solved { tiles } | RoundState::SuccessPause { tiles, .. } => {
            draw_tiles(frame, area, tiles, Style::default().fg(Color::Green).bold());
        }
        RoundState::Idle | RoundState::Loading => {}
    }
}

fn draw_tiles(frame: &mut Frame, area: Rect, tiles: &[LetterTile], style: Style) {
    for (rect, tile) in tile_rects(area, tiles.len()).into_iter().zip(tiles) {
        draw_tile(frame, rect, tile.letter, style);
    }
}

fn draw_tile(frame: &mut Frame, rect: Rect, letter: char, style: Style) {
    let block = Block::default().borders(Borders::ALL).border_style(style);
    let tile = Paragraph::new(letter.to_ascii_uppercase().to_string())
        .style(style)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(tile, rect);
}

fn tile_style(index: usize, cursor: usize, selected: Option<usize>, locked: bool) -> Style {
    if locked {
        return Style::default().fg(Color::DarkGray);
    }
    let style = if selected == Some(index) {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::White)
    };
    if index == cursor {
        style.reversed()
    } else {
        style
    }
}

fn render_clues(frame: &mut Frame, area: Rect, app: &App) {
    let controller = app.controller();
    let mut lines = Vec::new();

    if let Some(notice) = controller.notice() {
        lines.push(Line::styled(notice.to_string(), Style::default().fg(Color::Red).bold()));
        lines.push(Line::default());
    }

    if let Some(entry) = controller.entry() {
        lines.push(Line::from(vec![
            Span::styled("Definition: ", Style::default().fg(Color::Yellow)),
            Span::raw(entry.definition.clone()),
        ]));
        let solved = matches!(
            controller.state(),
            RoundState::Solved { .. } | RoundState::SuccessPause { .. }
        );
        if let (true, Some(info)) = (solved, entry.info.as_deref()) {
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled("Did you know? ", Style::default().fg(Color::Cyan)),
                Span::raw(info.to_string()),
            ]));
        }
    }

    let clues = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(clues, area);
}

/// Headline for each round state
fn status_line(state: &RoundState) -> (String, Color) {
    match state {
        RoundState::Idle => ("Press N for a word".to_string(), Color::White),
        RoundState::Loading => ("Finding a word...".to_string(), Color::DarkGray),
        RoundState::Revealing {
            seconds_remaining, ..
        } => (format!("Remember this word! {}s", seconds_remaining), Color::Cyan),
        RoundState::Scrambling { locked: true, .. } => ("Paused (P to resume)".to_string(), Color::DarkGray),
        RoundState::Scrambling { .. } => ("Put the letters back in order".to_string(), Color::White),
        RoundState::Solved { .. } => ("Solved! Press N for another".to_string(), Color::Green),
        RoundState::SuccessPause {
            seconds_remaining, ..
        } => (format!("Solved! Next word in {}s", seconds_remaining), Color::Green),
    }
}

fn footer_hint(app: &App) -> String {
    let mut hint = String::from("N new word | A auto-advance");
    if *app.mode() == WordMode::Random {
        hint.push_str(" | D difficulty");
    }
    if matches!(app.controller().state(), RoundState::Scrambling { .. }) {
        hint.push_str(" | ←/→ move | Enter pick | P pause | drag with mouse");
    }
    hint.push_str(" | Q quit");
    hint
}
