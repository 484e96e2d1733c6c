use crate::models::PreloaderConfig;
use camino::Utf8PathBuf;

/// Everything the editor knows about the open document.
///
/// # Thread Safety
///
/// `EditorState` is wrapped in `Arc<RwLock<EditorState>>` by
/// [`crate::state::StateManager`]. Go through the manager so that edits are
/// diffed and published:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorState {
    /// The active document. Replaced wholesale on open.
    pub config: PreloaderConfig,

    /// File the active document was opened from or last saved to
    pub current_file_path: Option<Utf8PathBuf>,

    /// Whether the UI shows the load-method details and delays
    pub show_advanced_options: bool,
}

impl EditorState {
    /// Save (as opposed to Save As) needs a known target file
    pub fn can_save(&self) -> bool {
        self.current_file_path
            .as_ref()
            .is_some_and(|path| !path.as_str().is_empty())
    }
}
