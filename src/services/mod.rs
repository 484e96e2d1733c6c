//! Services module - file and dialog boundaries of the editor.
//!
//! The model and XML layers never touch the file system. Everything that does
//! lives here so it can be swapped out in tests:
//!
//! - [`DocumentService`]: reads and writes preloader configuration files with
//!   tokio's async file API. A save serializes first and only then writes, so
//!   a bad document never truncates the target file.
//! - [`FilePicker`]: the open/save dialog seam, with [`NativeFilePicker`] as
//!   the `rfd`-backed implementation.
//!
//! # Usage Example
//!
//! ```ignore
//! use preloader_configurator::services::DocumentService;
//!
//! let service = DocumentService::new();
//! let config = service.load("PluginPreloader.xml".into()).await?;
//! service.save("PluginPreloader.xml".into(), &config).await?;
//! ```

pub mod document;
pub mod file_picker;

pub use document::{DocumentError, DocumentService};
pub use file_picker::{
    DialogOptions, FilePicker, NativeFilePicker, OPEN_DIALOG, SAVE_DIALOG, with_default_extension,
};
