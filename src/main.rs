//! Preloader Configurator - editor for the xSE Plugin Preloader XML file
//!
//! Main entry point for the console application.
//!
//! # Overview
//!
//! This binary provides a line-oriented front end for the editor. It initializes:
//! - Application settings ([`ConfigManager`], `Preloader Configurator Data/`)
//! - Logging infrastructure (daily rolling file + optional console output)
//! - Tokio async runtime (2 worker threads for dialogs and file I/O)
//! - State management ([`StateManager`])
//! - The editor session ([`EditorSession`] - Open, Save and Save As commands)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Reads commands from stdin (blocking, synchronous)
//! - **Tokio workers**: Run file dialogs and file I/O for the commands
//! - **State listener**: Tokio task that reports events and counts notifications
//!
//! # Execution Flow
//!
//! 1. Load settings from `Preloader Configurator Data/Preloader Configurator.yaml`
//! 2. Initialize logging → logs/preloader-configurator.<date>
//! 3. Create tokio runtime with 2 worker threads
//! 4. Create StateManager and EditorSession
//! 5. Open the file given on the command line, if any
//! 6. Run the command loop until `quit` or end of input
//! 7. Save settings, log the session summary, shut down the runtime

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use preloader_configurator::config::DEFAULT_CONFIG_DIR;
use preloader_configurator::editor::console::{self, HELP};
use preloader_configurator::editor::{ConsoleCommand, ConsoleError};
use preloader_configurator::logging::{LOG_DIR, LOG_PREFIX};
use preloader_configurator::metrics::Metrics;
use preloader_configurator::services::NativeFilePicker;
use preloader_configurator::{
    APP_NAME, ConfigManager, EditorSession, StateChange, StateManager, VERSION,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

const WORKER_THREADS: usize = 2;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(DEFAULT_CONFIG_DIR)?;
    let settings = config_manager.load_settings()?;

    let _log_guard = preloader_configurator::logging::setup_logging(
        Utf8Path::new(LOG_DIR),
        LOG_PREFIX,
        settings.debug_mode,
        settings.console_logging,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(WORKER_THREADS)
        .thread_name("preloader-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    tracing::info!(
        "Tokio runtime initialized with {} worker threads",
        WORKER_THREADS
    );

    let state = StateManager::new();
    let metrics = Arc::new(Metrics::new());
    let session = EditorSession::new(
        state.clone(),
        Arc::new(NativeFilePicker),
        settings,
        Arc::clone(&metrics),
        runtime.handle().clone(),
    );

    spawn_state_listener(&runtime, &state, &metrics);

    println!("{} v{} - type 'help' for commands", APP_NAME, VERSION);

    if let Some(path) = std::env::args().nth(1) {
        wait(&runtime, session.open_file(Utf8PathBuf::from(path)));
    }

    let result = run_command_loop(&runtime, &session);

    tracing::info!("Command loop finished, shutting down");

    if let Err(e) = config_manager.save_settings(&session.settings()) {
        tracing::error!("Failed to save settings: {:#}", e);
    }

    metrics.log_summary();
    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");
    result
}

/// Report state events on the console and count property notifications
fn spawn_state_listener(runtime: &Runtime, state: &StateManager, metrics: &Arc<Metrics>) {
    let mut rx = state.subscribe();
    let metrics = Arc::clone(metrics);

    runtime.spawn(async move {
        tracing::debug!("State listener started");
        loop {
            match rx.recv().await {
                Ok(StateChange::PropertyChanged(property)) => {
                    tracing::trace!("Property changed: {:?}", property);
                    metrics.record_property_notification();
                }
                Ok(StateChange::DocumentOpened { path }) => println!("Opened {}", path),
                Ok(StateChange::DocumentSaved { path }) => println!("Saved {}", path),
                Ok(StateChange::OperationFailed { command, message }) => {
                    eprintln!("{} failed: {}", command, message);
                }
                Ok(StateChange::CommandStateChanged { command, running }) => {
                    tracing::debug!("{} running: {}", command, running);
                }
                Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("State listener lagged - {} events were skipped", skipped);
                }
            }
        }
        tracing::debug!("State listener terminated");
    });
}

/// Block until a fired command finishes; ignored invocations return at once
fn wait(runtime: &Runtime, handle: Option<JoinHandle<()>>) {
    match handle {
        Some(handle) => {
            if let Err(e) = runtime.block_on(handle) {
                tracing::error!("Command task failed: {}", e);
            }
        }
        None => println!("Command is not available right now"),
    }
}

fn run_command_loop(runtime: &Runtime, session: &EditorSession) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to write prompt")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match execute(runtime, session, command) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

enum Flow {
    Continue,
    Quit,
}

fn execute(
    runtime: &Runtime,
    session: &EditorSession,
    command: ConsoleCommand,
) -> Result<Flow, ConsoleError> {
    let state = session.state();

    match command {
        ConsoleCommand::Open(Some(path)) => wait(runtime, session.open_file(path)),
        ConsoleCommand::Open(None) => wait(runtime, session.open()),
        ConsoleCommand::Save => {
            if !state.read(|s| s.can_save()) {
                println!("No file is open, use save-as");
                return Ok(Flow::Continue);
            }
            wait(runtime, session.save());
        }
        ConsoleCommand::SaveAs => wait(runtime, session.save_as()),
        ConsoleCommand::Show => print!("{}", state.read(console::render)),
        ConsoleCommand::Set { field, value } => {
            let mut outcome = Ok(());
            state.update_config(|config| outcome = field.apply(config, &value));
            outcome?;
        }
        ConsoleCommand::Allow { process, allowed } => {
            if state.read(|s| s.config.process(&process).is_none()) {
                return Err(ConsoleError::UnknownProcess(process));
            }
            state.set_process_allowed(&process, allowed);
        }
        ConsoleCommand::Advanced(show) => {
            state.set_show_advanced_options(show);
        }
        ConsoleCommand::Help => {
            println!("{}", HELP);
            let methods: Vec<&str> = session.load_methods().iter().map(|m| m.as_str()).collect();
            println!("Load methods: {}", methods.join(", "));
        }
        ConsoleCommand::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}
