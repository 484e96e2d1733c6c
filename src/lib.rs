// Preloader Configurator - editor for the xSE Plugin Preloader XML file
//
// This is the library crate containing the configuration model, its XML
// mapping and the editor shell. The binary crate (main.rs) provides the
// console host.

pub mod config;
pub mod editor;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod xml;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use editor::EditorSession;
pub use models::{AppSettings, EditorState, LoadMethod, PreloaderConfig, ProcessEntry};
pub use state::{Property, StateChange, StateManager};
pub use xml::ConfigXmlError;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
