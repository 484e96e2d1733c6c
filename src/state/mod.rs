// State management module
//
// This module provides the StateManager which wraps EditorState with thread-safe
// access using Arc<RwLock<T>>, emits change events for async listeners and calls
// the synchronous property observers used by UI bindings.

pub mod observers;

use crate::models::{EditorState, PreloaderConfig};
use camino::Utf8PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

pub use observers::{ObserverRegistry, SubscriptionId};

/// Observable properties of the editor.
///
/// One variant per bindable field. `Config` fires when the whole document is
/// replaced (open); field variants fire for individual edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Config,
    CurrentFilePath,
    ShowAdvancedOptions,
    IsLoaded,
    LoadMethod,
    OriginalLibrary,
    ImportLibrary,
    ImportFunction,
    ThreadNumber,
    InstallExceptionHandler,
    KeepExceptionHandler,
    LoadDelay,
    HookDelay,
    /// `allowed` flag of the process at this catalog index
    ProcessAllowed(usize),
}

/// Editor commands, as reported in [`StateChange`] events
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Open,
    Save,
    SaveAs,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CommandKind::Open => "Open",
            CommandKind::Save => "Save",
            CommandKind::SaveAs => "Save As",
        };
        f.write_str(name)
    }
}

/// Change events emitted when state is modified
///
/// These events are emitted to notify interested parties (primarily the UI
/// host) without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A bindable property changed value
    PropertyChanged(Property),

    /// A document was opened and is now active
    DocumentOpened { path: Utf8PathBuf },

    /// The active document was written to disk
    DocumentSaved { path: Utf8PathBuf },

    /// A command started or finished (the "can execute" state changed)
    CommandStateChanged { command: CommandKind, running: bool },

    /// A command failed; the message is ready to show to the user
    OperationFailed { command: CommandKind, message: String },
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`EditorState`] via `Arc<RwLock<T>>`
/// - Diffs state on every update and reports each changed [`Property`]
/// - Calls the synchronous observers registered in [`ObserverRegistry`]
/// - Broadcasts [`StateChange`] events via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of mutating [`EditorState`] directly:
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic notification
/// - [`observers()`](Self::observers) to bind callbacks to properties
/// - [`subscribe()`](Self::subscribe) for listening to all events
///
/// Observers are called after the write lock is released, so they may read
/// the state (but should not call `update` re-entrantly from another thread
/// while holding their own locks).
pub struct StateManager {
    /// The editor state protected by RwLock for thread-safe access
    state: Arc<RwLock<EditorState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,

    /// Per-property synchronous callbacks
    observers: Arc<ObserverRegistry>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(EditorState::default())),
            state_tx,
            observers: Arc::new(ObserverRegistry::new()),
        }
    }

    /// Get a clone of the current state
    pub fn snapshot(&self) -> EditorState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let can_save = state_manager.read(|state| state.can_save());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EditorState) -> R,
    {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }

    /// Update the state and publish what changed
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects which properties changed
    /// 4. Broadcasts one `PropertyChanged` event per property and notifies observers
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut EditorState),
    {
        let properties = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            let old_state = state.clone();
            update_fn(&mut state);
            detect_changes(&old_state, &state)
        };

        properties
            .into_iter()
            .map(|property| {
                let change = StateChange::PropertyChanged(property);
                self.emit(change.clone());
                self.observers.notify(property);
                change
            })
            .collect()
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    /// Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Registry for synchronous per-property callbacks
    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    /// Broadcast an event that is not derived from a state diff
    pub fn emit(&self, change: StateChange) {
        // Ignore send errors - it's OK if no one is listening
        let _ = self.state_tx.send(change);
    }

    // Convenience methods for common state updates

    /// Make a freshly parsed document active
    ///
    /// Path and config are swapped under one lock so observers never see a
    /// path paired with the previous document.
    pub fn replace_document(&self, path: Utf8PathBuf, config: PreloaderConfig) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.current_file_path = Some(path.clone());
            state.config = config;
        });

        // Bindings re-read the whole document even if no field value differs
        let replaced = StateChange::PropertyChanged(Property::Config);
        if !changes.contains(&replaced) {
            self.emit(replaced.clone());
            self.observers.notify(Property::Config);
            changes.push(replaced);
        }

        let opened = StateChange::DocumentOpened { path };
        self.emit(opened.clone());
        changes.push(opened);
        changes
    }

    pub fn set_current_file_path(&self, path: Option<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| state.current_file_path = path)
    }

    pub fn set_show_advanced_options(&self, show: bool) -> Vec<StateChange> {
        self.update(|state| state.show_advanced_options = show)
    }

    pub fn set_load_method(&self, method: impl Into<String>) -> Vec<StateChange> {
        let method = method.into();
        self.update(|state| state.config.load_method = method)
    }

    /// Toggle a process; unknown names change nothing
    pub fn set_process_allowed(&self, name: &str, allowed: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.config.set_process_allowed(name, allowed);
        })
    }

    /// Edit the active document
    pub fn update_config<F>(&self, config_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut PreloaderConfig),
    {
        self.update(|state| config_fn(&mut state.config))
    }
}

/// Detect which properties differ between two states
fn detect_changes(old: &EditorState, new: &EditorState) -> Vec<Property> {
    let mut changes = Vec::new();

    if old.current_file_path != new.current_file_path {
        changes.push(Property::CurrentFilePath);
    }
    if old.show_advanced_options != new.show_advanced_options {
        changes.push(Property::ShowAdvancedOptions);
    }

    let (a, b) = (&old.config, &new.config);
    if a == b {
        return changes;
    }

    // Only a parse flips the loaded flag, so this is a document replacement
    if a.is_loaded() != b.is_loaded() {
        changes.push(Property::Config);
        changes.push(Property::IsLoaded);
    }

    let fields = [
        (a.load_method != b.load_method, Property::LoadMethod),
        (a.original_library != b.original_library, Property::OriginalLibrary),
        (a.import_library != b.import_library, Property::ImportLibrary),
        (a.import_function != b.import_function, Property::ImportFunction),
        (a.thread_number != b.thread_number, Property::ThreadNumber),
        (
            a.install_exception_handler != b.install_exception_handler,
            Property::InstallExceptionHandler,
        ),
        (
            a.keep_exception_handler != b.keep_exception_handler,
            Property::KeepExceptionHandler,
        ),
        (a.load_delay != b.load_delay, Property::LoadDelay),
        (a.hook_delay != b.hook_delay, Property::HookDelay),
    ];
    changes.extend(
        fields
            .into_iter()
            .filter_map(|(changed, property)| changed.then_some(property)),
    );

    changes.extend(
        a.processes()
            .iter()
            .zip(b.processes())
            .enumerate()
            .filter(|(_, (before, after))| before.allowed != after.allowed)
            .map(|(index, _)| Property::ProcessAllowed(index)),
    );

    changes
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
            observers: Arc::clone(&self.observers),
        }
    }
}
