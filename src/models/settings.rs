use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in [`AppSettings::recent_files`]
pub const MAX_RECENT_FILES: usize = 10;

/// Application settings from `Preloader Configurator.yaml`
///
/// These are the editor's own preferences, not the preloader configuration
/// being edited. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub debug_mode: bool,

    pub console_logging: bool,

    pub show_advanced_options: bool,

    /// Empty when no file has been opened yet
    pub last_opened_file: String,

    /// Most recent first
    pub recent_files: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            console_logging: true,
            show_advanced_options: false,
            last_opened_file: String::new(),
            recent_files: Vec::new(),
        }
    }
}

impl AppSettings {
    /// Record a file as the most recently used one.
    ///
    /// Duplicates are matched case-insensitively (Windows paths) and moved to
    /// the front; the list is capped at [`MAX_RECENT_FILES`].
    pub fn remember_file(&mut self, path: &Utf8Path) {
        let path = path.as_str();
        self.recent_files
            .retain(|existing| !existing.eq_ignore_ascii_case(path));
        self.recent_files.insert(0, path.to_string());
        self.recent_files.truncate(MAX_RECENT_FILES);
        self.last_opened_file = path.to_string();
    }

    /// Last opened file, if one was recorded
    pub fn last_file(&self) -> Option<Utf8PathBuf> {
        if self.last_opened_file.is_empty() {
            None
        } else {
            Some(Utf8PathBuf::from(&self.last_opened_file))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_settings_defaults() {
        let settings = AppSettings::default();
        assert!(!settings.debug_mode);
        assert!(settings.console_logging);
        assert!(!settings.show_advanced_options);
        assert!(settings.last_file().is_none());
        assert!(settings.recent_files.is_empty());
    }

    #[test]
    fn test_remember_file_moves_duplicates_to_front() {
        let mut settings = AppSettings::default();
        settings.remember_file(Utf8Path::new("C:/Games/a.xml"));
        settings.remember_file(Utf8Path::new("C:/Games/b.xml"));
        settings.remember_file(Utf8Path::new("c:/games/A.xml"));

        assert_eq!(settings.recent_files, vec!["c:/games/A.xml", "C:/Games/b.xml"]);
        assert_eq!(settings.last_file(), Some(Utf8PathBuf::from("c:/games/A.xml")));
    }

    #[test]
    fn test_recent_files_capped() {
        let mut settings = AppSettings::default();
        for i in 0..(MAX_RECENT_FILES + 5) {
            settings.remember_file(Utf8Path::new(&format!("/tmp/{}.xml", i)));
        }
        assert_eq!(settings.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(settings.recent_files[0], format!("/tmp/{}.xml", MAX_RECENT_FILES + 4));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let settings: AppSettings = serde_yaml_ng::from_str("debug_mode: true\n").unwrap();
        assert!(settings.debug_mode);
        assert!(settings.console_logging);
        assert!(settings.recent_files.is_empty());
    }
}
