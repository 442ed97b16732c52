// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks, background-task events)
// - Key dispatch: form editing first, then route/global keys

pub mod app;
pub mod theme;
pub mod ui;

use crate::session::Route;
use anyhow::{Context, Result};
use app::{App, AppEvent, FormMode};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the TUI
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// when done. Blocks until the user quits.
pub async fn run_tui(mut app: App, mut event_rx: mpsc::Receiver<AppEvent>) -> Result<()> {
    // Set up terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Kick off the load probe; the UI stays behind the session-check page
    // until it resolves
    app.bootstrap();

    let result = run_event_loop(&mut terminal, &mut app, &mut event_rx).await;

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Waits on keyboard input, a periodic tick, and background-task events
/// with tokio::select!, redrawing after each.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            // Keyboard input
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    if let Ok(Event::Key(key_event)) = event::read() {
                        handle_key_event(app, key_event);
                    }
                }
            } => {}

            // Periodic tick (toast expiry, redraw)
            _ = tick_interval.tick() => {
                app.tick();
            }

            // Background-task events
            Some(app_event) = event_rx.recv() => {
                app.apply(app_event);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle keyboard input
/// Layered dispatch: active form first, then route keys, then global keys
fn handle_key_event(app: &mut App, key_event: KeyEvent) {
    if key_event.kind != KeyEventKind::Press {
        return;
    }

    // Nothing is interactive until the gate resolves
    if !app.gate.is_resolved() {
        if key_event.code == KeyCode::Char('q') {
            app.should_quit = true;
        }
        return;
    }

    if app.form_mode != FormMode::None {
        handle_form_keys(app, key_event.code);
        return;
    }

    if handle_route_keys(app, key_event.code) {
        return;
    }

    handle_global_keys(app, key_event.code);
}

/// Keys while a form owns the keyboard
fn handle_form_keys(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => {
            // The payment form is bound to its route; Esc leaves the route
            if app.form_mode == FormMode::Payment {
                app.navigate(Route::Landing);
            } else {
                app.form_cancel();
            }
        }
        KeyCode::Enter => app.form_submit(),
        KeyCode::Tab | KeyCode::Down => app.form_next(),
        KeyCode::BackTab | KeyCode::Up => app.form_prev(),
        KeyCode::Backspace => app.form_backspace(),
        KeyCode::Char(c) => app.form_input(c),
        _ => {}
    }
}

/// Route-specific keys - returns true if handled
fn handle_route_keys(app: &mut App, key: KeyCode) -> bool {
    match app.route {
        Route::Landing => match key {
            KeyCode::Char('l') => {
                app.open_form(FormMode::Login);
                true
            }
            KeyCode::Char('s') => {
                app.open_form(FormMode::Signup);
                true
            }
            _ => false,
        },
        Route::AddSources => match key {
            KeyCode::Char('/') => {
                app.open_form(FormMode::Search);
                true
            }
            KeyCode::Char('c') => {
                app.toggle_selection_context();
                true
            }
            KeyCode::Up => {
                app.sources_select_prev();
                true
            }
            KeyCode::Down => {
                app.sources_select_next();
                true
            }
            KeyCode::Enter => {
                app.select_highlighted();
                true
            }
            KeyCode::Char('x') => {
                app.deselect_current();
                true
            }
            _ => false,
        },
        _ => false,
    }
}

/// Global keys - work the same on every route
fn handle_global_keys(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('d') => app.toggle_dark_mode(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('o') => app.logout(),
        // Direct route selection; every jump goes through the gate
        KeyCode::Char('1') => app.navigate(Route::Landing),
        KeyCode::Char('2') => app.navigate(Route::Dashboard),
        KeyCode::Char('3') => app.navigate(Route::SentimentAnalysis),
        KeyCode::Char('4') => app.navigate(Route::FeatureIdentification),
        KeyCode::Char('5') => app.navigate(Route::CompetitorAnalysis),
        KeyCode::Char('6') => app.navigate(Route::AddSources),
        KeyCode::Char('7') => app.navigate(Route::CardPayment),
        _ => {}
    }
}
