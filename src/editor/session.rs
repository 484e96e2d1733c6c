// Editor session - coordinates dialogs, file I/O and the editor state
//
// The session owns the three user commands (Open, Save, Save As). Each command
// body is an awaitable operation that is also public, so a host can await an
// operation directly or fire the command and let the single-flight guard
// ignore repeated clicks.

use super::command::{AsyncCommand, ErrorHandler};
use crate::metrics::Metrics;
use crate::models::{AppSettings, LoadMethod};
use crate::services::{
    DocumentError, DocumentService, FilePicker, OPEN_DIALOG, SAVE_DIALOG, with_default_extension,
};
use crate::state::{CommandKind, StateChange, StateManager};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

struct Commands {
    open: AsyncCommand,
    save: AsyncCommand,
    save_as: AsyncCommand,
}

/// Editor session that wires the commands to state and services
///
/// Cloning is cheap; clones share state, settings and commands.
///
/// # Example
/// ```ignore
/// let state = StateManager::new();
/// let session = EditorSession::new(
///     state.clone(),
///     Arc::new(NativeFilePicker),
///     settings,
///     Arc::new(Metrics::new()),
///     runtime.handle().clone(),
/// );
/// session.open();  // shows the dialog, loads on a worker thread
/// ```
#[derive(Clone)]
pub struct EditorSession {
    state: StateManager,
    documents: DocumentService,
    picker: Arc<dyn FilePicker>,
    settings: Arc<Mutex<AppSettings>>,
    metrics: Arc<Metrics>,
    commands: Arc<Commands>,
}

impl EditorSession {
    pub fn new(
        state: StateManager,
        picker: Arc<dyn FilePicker>,
        settings: AppSettings,
        metrics: Arc<Metrics>,
        runtime: Handle,
    ) -> Self {
        state.set_show_advanced_options(settings.show_advanced_options);

        let on_error: ErrorHandler = {
            let state = state.clone();
            Arc::new(move |command: CommandKind, error: &anyhow::Error| {
                tracing::error!("{} failed: {:#}", command, error);
                state.emit(StateChange::OperationFailed {
                    command,
                    message: format!("{error:#}"),
                });
            })
        };

        let command = |kind| {
            AsyncCommand::new(
                kind,
                state.clone(),
                Arc::clone(&metrics),
                runtime.clone(),
                Arc::clone(&on_error),
            )
        };

        let save_state = state.clone();
        let commands = Commands {
            open: command(CommandKind::Open),
            save: command(CommandKind::Save)
                .with_can_execute(move || save_state.read(|s| s.can_save())),
            save_as: command(CommandKind::SaveAs),
        };

        tracing::info!("Editor session initialized");

        Self {
            state,
            documents: DocumentService::new(),
            picker,
            settings: Arc::new(Mutex::new(settings)),
            metrics,
            commands: Arc::new(commands),
        }
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Names offered for `LoadMethod/@Name`
    pub fn load_methods(&self) -> &'static [LoadMethod] {
        &LoadMethod::ALL
    }

    /// Current settings with the view flags taken from the editor state
    pub fn settings(&self) -> AppSettings {
        let mut settings = self.lock_settings().clone();
        settings.show_advanced_options = self.state.read(|s| s.show_advanced_options);
        settings
    }

    fn lock_settings(&self) -> std::sync::MutexGuard<'_, AppSettings> {
        self.settings.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remember_file(&self, path: &Utf8Path) {
        self.lock_settings().remember_file(path);
    }

    // ===== Commands =====

    pub fn command(&self, kind: CommandKind) -> &AsyncCommand {
        match kind {
            CommandKind::Open => &self.commands.open,
            CommandKind::Save => &self.commands.save,
            CommandKind::SaveAs => &self.commands.save_as,
        }
    }

    /// Open command: pick a file and load it
    pub fn open(&self) -> Option<JoinHandle<()>> {
        let session = self.clone();
        self.commands.open.execute(async move {
            session.open_document().await?;
            Ok(())
        })
    }

    /// Open command with a known path (no dialog)
    pub fn open_file(&self, path: Utf8PathBuf) -> Option<JoinHandle<()>> {
        let session = self.clone();
        self.commands.open.execute(async move {
            session.open_path(&path).await?;
            Ok(())
        })
    }

    /// Save command: write to the current file. Disabled while no file is known.
    pub fn save(&self) -> Option<JoinHandle<()>> {
        let session = self.clone();
        self.commands.save.execute(async move {
            session.save_document().await?;
            Ok(())
        })
    }

    /// Save As command: pick a target file, make it current and save
    pub fn save_as(&self) -> Option<JoinHandle<()>> {
        let session = self.clone();
        self.commands.save_as.execute(async move {
            session.save_document_as().await?;
            Ok(())
        })
    }

    // ===== Operations =====

    /// Show the open dialog and load the chosen file.
    ///
    /// Returns `Ok(None)` when the dialog was cancelled.
    pub async fn open_document(&self) -> Result<Option<Utf8PathBuf>> {
        let picker = Arc::clone(&self.picker);
        let chosen = tokio::task::spawn_blocking(move || picker.pick_open_file(&OPEN_DIALOG))
            .await
            .context("Open dialog task failed")?;

        let Some(path) = chosen else {
            tracing::debug!("Open dialog cancelled");
            return Ok(None);
        };

        self.open_path(&path)
            .await
            .with_context(|| format!("Could not open {}", path))?;
        Ok(Some(path))
    }

    /// Load `path` and make it the active document.
    ///
    /// The state is only touched after a successful parse; on failure the
    /// previous document and path stay active.
    pub async fn open_path(&self, path: &Utf8Path) -> Result<(), DocumentError> {
        tracing::info!("Opening {}", path);
        let started = Instant::now();
        let result = self.documents.load(path).await;
        self.metrics.record_io_time(started.elapsed());

        let config = result.inspect_err(|_| self.metrics.record_load_failure())?;
        if !config.is_loaded() {
            tracing::warn!(
                "{} has no <xSE>/<PluginPreloader> section, showing defaults",
                path
            );
        }

        self.state.replace_document(path.to_path_buf(), config);
        self.remember_file(path);
        self.metrics.record_document_opened();
        tracing::info!("Opened {}", path);
        Ok(())
    }

    /// Write the active document to its current file.
    ///
    /// Returns `Ok(false)` without writing when no file is known.
    pub async fn save_document(&self) -> Result<bool, DocumentError> {
        let (path, config) = self
            .state
            .read(|s| (s.current_file_path.clone(), s.config.clone()));
        let Some(path) = path.filter(|p| !p.as_str().is_empty()) else {
            tracing::debug!("Save skipped: no current file");
            return Ok(false);
        };

        tracing::info!("Saving {}", path);
        let started = Instant::now();
        let result = self.documents.save(&path, &config).await;
        self.metrics.record_io_time(started.elapsed());
        result.inspect_err(|_| self.metrics.record_save_failure())?;

        self.remember_file(&path);
        self.metrics.record_document_saved();
        self.state.emit(StateChange::DocumentSaved { path: path.clone() });
        tracing::info!("Saved {}", path);
        Ok(true)
    }

    /// Show the save dialog, make the chosen file current and save to it.
    ///
    /// Returns `Ok(None)` when the dialog was cancelled.
    pub async fn save_document_as(&self) -> Result<Option<Utf8PathBuf>> {
        let picker = Arc::clone(&self.picker);
        let suggested = self.state.read(|s| s.current_file_path.clone());
        let chosen =
            tokio::task::spawn_blocking(move || picker.pick_save_file(&SAVE_DIALOG, suggested))
                .await
                .context("Save dialog task failed")?;

        let Some(path) = chosen else {
            tracing::debug!("Save dialog cancelled");
            return Ok(None);
        };
        let path = with_default_extension(&path, &SAVE_DIALOG);

        self.state.set_current_file_path(Some(path.clone()));
        self.save_document()
            .await
            .with_context(|| format!("Could not save {}", path))?;
        Ok(Some(path))
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("open", &self.commands.open)
            .field("save", &self.commands.save)
            .field("save_as", &self.commands.save_as)
            .finish()
    }
}
