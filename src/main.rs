// revdash - terminal dashboard for app-review analytics
//
// This tool is a client for a remote review-analytics service. It signs a
// user in, enforces the payment gate, manages the selected app and
// competitor, and renders per-app analytics pages in a terminal UI.
//
// Architecture:
// - API client (reqwest): cookie-based session, CSRF on unsafe calls
// - Session gate: auth/payment state machine deciding which routes render
// - Selection store: JSON key-value file surviving navigation and restarts
// - Page controllers: one fetch per mount, explicit sample/live tagging
// - TUI (ratatui): route views, forms, log panel
// - Event system: mpsc channel connects background tasks to the UI loop

mod api;
mod cli;
mod config;
mod forms;
mod logging;
mod pages;
mod session;
mod store;
mod tui;

use anyhow::{Context, Result};
use api::ApiClient;
use config::{Config, LogRotation};
use logging::{LogBuffer, TuiLogLayer};
use std::sync::Arc;
use store::SelectionStore;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --reset, --edit, --path)
    // If a command was handled, exit early
    if cli::handle_cli() {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    // Load configuration to determine TUI vs headless mode
    let config = Config::from_env();

    // Create log buffer for TUI mode
    let log_buffer = LogBuffer::new();

    // Initialize tracing/logging with conditional output
    // In TUI mode: capture logs to buffer (prevents garbling the display)
    // In headless mode: output logs to stdout
    // File logging: optionally write to rotating log files (in addition)
    //
    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("revdash={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // The guard must be kept alive for the duration of the program to
    // ensure file logs flush
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> =
        if config.logging.file_enabled {
            match std::fs::create_dir_all(&config.logging.file_dir) {
                Err(e) => {
                    eprintln!(
                        "Warning: Could not create log directory {:?}: {}",
                        config.logging.file_dir, e
                    );
                    init_without_file(&config, filter, &log_buffer);
                    None
                }
                Ok(()) => {
                    let file_appender = match config.logging.file_rotation {
                        LogRotation::Hourly => tracing_appender::rolling::hourly(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                        LogRotation::Daily => tracing_appender::rolling::daily(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                        LogRotation::Never => tracing_appender::rolling::never(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                    };

                    // Non-blocking writer: file writes happen off-thread.
                    // File layer uses JSON format for structured parsing.
                    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                    if config.enable_tui {
                        tracing_subscriber::registry()
                            .with(filter)
                            .with(TuiLogLayer::new(log_buffer.clone()))
                            .with(
                                tracing_subscriber::fmt::layer()
                                    .json()
                                    .with_writer(non_blocking)
                                    .with_ansi(false),
                            )
                            .init();
                    } else {
                        tracing_subscriber::registry()
                            .with(filter)
                            .with(tracing_subscriber::fmt::layer())
                            .with(
                                tracing_subscriber::fmt::layer()
                                    .json()
                                    .with_writer(non_blocking)
                                    .with_ansi(false),
                            )
                            .init();
                    }
                    Some(guard)
                }
            }
        } else {
            init_without_file(&config, filter, &log_buffer);
            None
        };

    tracing::debug!("Service base URL: {}", config.base_url);

    // Shared components: API client, persisted selection store
    let api = ApiClient::new(&config).context("Failed to create API client")?;
    let store = Arc::new(
        SelectionStore::open(config.store_dir.clone()).context("Failed to open selection store")?,
    );

    // Headless mode: resolve the session, print the answer, exit
    if !config.enable_tui {
        return headless_status(&config, &api, &store).await;
    }

    // Event channel connects background tasks (probes, fetches, submits)
    // to the UI loop
    let (events_tx, events_rx) = mpsc::channel(256);

    let app = tui::app::App::new(&config, api, store, log_buffer, events_tx);

    if config.demo_mode {
        tracing::info!("Running in DEMO MODE - sample data, no network");
    }

    tracing::info!("Starting TUI");
    if let Err(e) = tui::run_tui(app, events_rx).await {
        tracing::error!("TUI error: {:?}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing without a file layer
fn init_without_file(config: &Config, filter: EnvFilter, log_buffer: &LogBuffer) {
    if config.enable_tui {
        tracing_subscriber::registry()
            .with(filter)
            .with(TuiLogLayer::new(log_buffer.clone()))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Headless mode: probe the session and payment state, print, exit
///
/// The same fail-closed reading as the TUI gate: any probe failure reports
/// the negative state.
async fn headless_status(
    config: &Config,
    api: &ApiClient,
    store: &SelectionStore,
) -> Result<()> {
    let mut gate = session::SessionGate::new();
    gate.resolve_auth(api.auth_status().await);

    println!("service: {}", config.base_url);
    match gate.auth() {
        session::AuthState::Authenticated => {
            if store.payment_successful() {
                gate.record_payment();
            } else {
                gate.resolve_payment(api.payment_status().await);
            }
            println!("session: authenticated");
            println!(
                "payment: {}",
                match gate.payment() {
                    session::PaymentState::Paid => "complete",
                    _ => "incomplete",
                }
            );
            match store.current_app() {
                Some(app) => println!("selected app: {} ({})", app.name, app.id),
                None => println!("selected app: none"),
            }
        }
        _ => println!("session: not authenticated"),
    }

    Ok(())
}
