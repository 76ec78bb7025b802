//! Craft journal TUI application.
//!
//! A keyboard-driven terminal journal for handmade work across six crafts,
//! with a materials inventory, local accounts and AI image insights.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripts:
//!
//! ```bash
//! echo "entry greenware | Tall vase" | cargo run -p craft -- --headless --offline
//! ```

mod app;
mod events;
mod headless;
mod ui;

use anyhow::Context;
use clap::Parser;
use craft_core::{AppConfig, CraftMode, Journal};
use crossterm::{
    event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

/// Journal your pottery, woodwork, metalwork, weaving, glass and leather projects.
#[derive(Parser, Debug)]
#[command(name = "craft", version, about)]
struct Args {
    /// Directory holding the journal files (overrides CRAFT_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Craft mode to open, by slug or label (overrides CRAFT_MODE)
    #[arg(long, value_parser = parse_mode)]
    mode: Option<CraftMode>,

    /// Read commands from stdin instead of starting the TUI
    #[arg(long)]
    headless: bool,

    /// Never call the AI service; every analysis uses the fallback insight
    #[arg(long)]
    offline: bool,
}

fn parse_mode(value: &str) -> Result<CraftMode, String> {
    value.parse::<CraftMode>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid environment configuration")?;
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(mode) = args.mode {
        config = config.with_mode(mode);
    }
    if args.offline {
        config = config.with_offline(true);
    }

    init_tracing(&config, args.headless)?;

    let store = config
        .open_store()
        .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?;
    let mut journal = Journal::open(store, config.analyzer()).context("failed to load journal")?;
    if let Some(mode) = config.mode {
        if mode != journal.mode() {
            journal.switch_mode(mode)?;
        }
    }
    info!(
        data_dir = %config.data_dir.display(),
        mode = journal.mode().slug(),
        online = config.is_online(),
        "journal opened"
    );

    if args.headless {
        return headless::run_headless(journal).await.map_err(Into::into);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(journal);
    app.online = config.is_online();
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.context("terminal error")
}

/// Install the log subscriber. The TUI owns the screen, so it logs to a file.
fn init_tracing(config: &AppConfig, headless: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if headless {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false),
            )
            .init();
        return Ok(());
    }

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("cannot create {}", config.data_dir.display()))?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .with_context(|| format!("cannot open {}", config.log_path().display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        // Render
        terminal.draw(|f| render(f, app))?;

        // Process a queued save outside the event handler
        if let Some(action) = app.pending.take() {
            if app.journal.confirm_will_analyze() {
                app.analyzing = true;
                terminal.draw(|f| render(f, app))?;
            }
            app.run_pending(action).await;
            app.analyzing = false;

            // Drop keys typed while the request was in flight
            while event::poll(Duration::ZERO)? {
                event::read()?;
            }
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            match handle_event(app, ev) {
                EventResult::Quit => return Ok(()),
                EventResult::NeedsRedraw | EventResult::Continue => {}
            }
        }
    }
}
