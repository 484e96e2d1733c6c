//! Data models for the Preloader Configurator.
//!
//! - [`PreloaderConfig`]: the preloader settings being edited, plus its fixed
//!   process catalog ([`ProcessEntry`], [`PROCESS_CATALOG`])
//! - [`CommentAnchor`]: documentation comments written into saved files
//! - [`EditorState`]: the open document, its file path and view flags
//! - [`AppSettings`]: the editor's own preferences from `Preloader Configurator.yaml`
//!
//! # Architecture Note
//!
//! The preloader model has no knowledge of files, logging or the UI. Parsing
//! and serialization live in [`crate::xml`]; change notification lives in
//! [`crate::state`].

pub mod docs;
pub mod editor_state;
pub mod preloader;
pub mod settings;

pub use docs::CommentAnchor;
pub use editor_state::EditorState;
pub use preloader::{LoadMethod, PROCESS_CATALOG, PreloaderConfig, ProcessEntry};
pub use settings::AppSettings;
