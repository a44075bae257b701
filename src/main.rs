mod api;
mod app;
mod config;
mod logging;
mod mock;
mod store;
mod ui;

use crate::api::external::ExternalFetcher;
use crate::api::FinancialApi;
use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::handler;
use crate::app::state::*;
use crate::mock::MockMarket;
use crate::store::persist::{FileStorage, MemoryStorage, StateStorage, STORAGE_NAME};
use crate::store::DashboardStore;
use anyhow::{bail, Context, Result};
use crossterm::{
    event::EventStream,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct CliArgs {
    config: Option<PathBuf>,
    /// Keep the dashboard in memory only.
    ephemeral: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = CliArgs::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ephemeral" => args.ephemeral = true,
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("usage: finboard [--config <path>] [--ephemeral]");
                std::process::exit(0);
            }
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    // Load config
    let cfg = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => {
            let cfg = config::load_config()?;
            if !config::config_path().exists() {
                if let Err(e) = config::save_config(&cfg) {
                    eprintln!("Could not write default config: {:#}", e);
                }
            }
            cfg
        }
    };

    std::fs::create_dir_all(&cfg.storage.data_dir).with_context(|| {
        format!("Failed to create data directory {}", cfg.storage.data_dir.display())
    })?;
    let log_path = logging::init(&cfg.logging, &cfg.storage.data_dir);
    tracing::info!(log = ?log_path, ephemeral = args.ephemeral, "finboard starting");

    let storage: Box<dyn StateStorage> = if args.ephemeral {
        Box::new(MemoryStorage::new())
    } else {
        Box::new(FileStorage::new(&cfg.storage.data_dir, STORAGE_NAME))
    };
    let store = DashboardStore::open(storage);

    // Install panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, cfg, store).await;

    // Restore terminal
    restore_terminal()?;

    if let Err(e) = result {
        tracing::error!(error = %e, "finboard exited with an error");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    tracing::info!("finboard stopped");
    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cfg: config::AppConfig,
    store: DashboardStore,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let latency = Duration::from_millis(cfg.network.mock_latency_ms);
    let api = Arc::new(FinancialApi::new(Arc::new(MockMarket::with_latency(latency))));
    let external = Arc::new(ExternalFetcher::new(Duration::from_secs(
        cfg.network.external_timeout_secs.max(1),
    )));
    let tick_every = Duration::from_millis(cfg.refresh.tick_ms.max(10));

    let mut state = AppState::new(cfg, store);
    if state.store.layout().is_empty() {
        state.relayout();
    }

    // Spawn terminal input task
    let term_tx = event_tx.clone();
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        loop {
            match reader.next().await {
                Some(Ok(event)) => {
                    if term_tx.send(AppEvent::Terminal(event)).is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "terminal input failed");
                    break;
                }
                None => break,
            }
        }
    });

    // Spawn tick task; drives fetch scheduling and health checks
    let tick_tx = event_tx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_every);
        loop {
            interval.tick().await;
            if tick_tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });

    // Initial render
    terminal.draw(|f| ui::render(f, &state))?;

    // Main event loop
    loop {
        let event = event_rx.recv().await;
        let Some(event) = event else { break };

        let actions = handler::handle_event(&mut state, event);

        // Process actions
        for action in actions {
            match action {
                Action::Fetch(job) => {
                    let tx = event_tx.clone();
                    let api = Arc::clone(&api);
                    let external = Arc::clone(&external);
                    tokio::spawn(async move {
                        let result = job.spec.run(&api, &external).await;
                        let _ = tx.send(AppEvent::WidgetData {
                            widget_id: job.widget_id,
                            generation: job.generation,
                            result,
                        });
                    });
                }
                Action::CheckHealth => {
                    let tx = event_tx.clone();
                    let api = Arc::clone(&api);
                    tokio::spawn(async move {
                        let report = api.check_health().await;
                        let _ = tx.send(AppEvent::Health(report));
                    });
                }
                Action::ClearCache => api.clear_cache(),
                Action::ExportFile { path } => match write_export(&state, &path) {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "dashboard exported");
                        state.set_status(format!("Exported to {}", path.display()));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "export failed");
                        state.set_error(format!("Export failed: {:#}", e));
                    }
                },
                Action::ImportFile { path } => match std::fs::read_to_string(&path) {
                    Ok(raw) => {
                        state.import_from_str(&raw);
                        state.relayout();
                    }
                    Err(e) => state.set_error(format!("Cannot read {}: {}", path.display(), e)),
                },
                Action::Quit => state.should_quit = true,
            }
        }

        if state.should_quit {
            if let Err(e) = state.store.mark_saved() {
                tracing::warn!(error = %e, "final save failed");
            }
            break;
        }

        // Conditional render (only if dirty)
        if state.dirty {
            terminal.draw(|f| ui::render(f, &state))?;
            state.dirty = false;
        }
    }

    Ok(())
}

fn write_export(state: &AppState, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let raw = state.store.export_dashboard()?;
    std::fs::write(path, raw)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
