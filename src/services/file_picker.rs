use camino::{Utf8Path, Utf8PathBuf};

/// What a file dialog should look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogOptions {
    pub title: &'static str,
    pub filter_name: &'static str,
    pub extensions: &'static [&'static str],
    /// Appended to a chosen save path that has no extension
    pub default_extension: Option<&'static str>,
}

pub const OPEN_DIALOG: DialogOptions = DialogOptions {
    title: "Open XML File",
    filter_name: "XML Files",
    extensions: &["xml"],
    default_extension: None,
};

pub const SAVE_DIALOG: DialogOptions = DialogOptions {
    title: "Save XML File As",
    filter_name: "XML Files",
    extensions: &["xml"],
    default_extension: Some("xml"),
};

/// Source of user-chosen file paths.
///
/// Returning `None` means the user cancelled, which callers treat as a normal
/// no-op. Implementations may block; the editor calls them from
/// `tokio::task::spawn_blocking`.
#[cfg_attr(test, mockall::automock)]
pub trait FilePicker: Send + Sync {
    fn pick_open_file(&self, options: &DialogOptions) -> Option<Utf8PathBuf>;

    /// `suggested` is the current document path, if any
    fn pick_save_file(
        &self,
        options: &DialogOptions,
        suggested: Option<Utf8PathBuf>,
    ) -> Option<Utf8PathBuf>;
}

/// Native dialogs via the `rfd` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFilePicker;

impl NativeFilePicker {
    fn dialog(options: &DialogOptions) -> rfd::FileDialog {
        rfd::FileDialog::new()
            .set_title(options.title)
            .add_filter(options.filter_name, options.extensions)
    }
}

impl FilePicker for NativeFilePicker {
    fn pick_open_file(&self, options: &DialogOptions) -> Option<Utf8PathBuf> {
        Self::dialog(options).pick_file().and_then(to_utf8)
    }

    fn pick_save_file(
        &self,
        options: &DialogOptions,
        suggested: Option<Utf8PathBuf>,
    ) -> Option<Utf8PathBuf> {
        let mut dialog = Self::dialog(options);

        if let Some(path) = suggested {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_str().is_empty()) {
                dialog = dialog.set_directory(dir);
            }
            if let Some(name) = path.file_name() {
                dialog = dialog.set_file_name(name);
            }
        }

        dialog.save_file().and_then(to_utf8)
    }
}

fn to_utf8(path: std::path::PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::try_from(path)
        .map_err(|e| {
            tracing::error!("Failed to convert path to UTF-8: {}", e);
            e
        })
        .ok()
}

/// Add `options.default_extension` when the chosen name has none
pub fn with_default_extension(path: &Utf8Path, options: &DialogOptions) -> Utf8PathBuf {
    match (path.extension(), options.default_extension) {
        (None, Some(extension)) => path.with_extension(extension),
        _ => path.to_path_buf(),
    }
}
