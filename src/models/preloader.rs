use std::fmt;
use std::str::FromStr;

/// Default value of [`PreloaderConfig::load_method`].
pub const DEFAULT_LOAD_METHOD: &str = "ImportAddressHook";

/// Default value of [`PreloaderConfig::import_library`].
pub const DEFAULT_IMPORT_LIBRARY: &str = "MSVCR110.dll";

/// Default value of [`PreloaderConfig::import_function`].
pub const DEFAULT_IMPORT_FUNCTION: &str = "_initterm_e";

/// Default value of [`PreloaderConfig::thread_number`].
pub const DEFAULT_THREAD_NUMBER: &str = "2";

/// Known host executables and whether each may preload plugins by default.
///
/// Order matters: it is the order of `<Item>` elements in a saved file.
pub const PROCESS_CATALOG: [(&str, bool); 11] = [
    ("Fallout3.exe", false),
    ("FalloutNV.exe", false),
    ("Fallout4.exe", true),
    ("Fallout4VR.exe", true),
    ("Morrowind.exe", false),
    ("Oblivion.exe", false),
    ("TESV.exe", true),
    ("SkyrimSE.exe", true),
    ("SkyrimVR.exe", true),
    ("TESConstructionSet.exe", false),
    ("CreationKit.exe", false),
];

/// Technique the preloader uses to load xSE plugins into the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMethod {
    ImportAddressHook,
    OnThreadAttach,
    OnProcessAttach,
}

impl LoadMethod {
    /// Selectable methods, in the order a UI should list them.
    pub const ALL: [LoadMethod; 3] = [
        LoadMethod::ImportAddressHook,
        LoadMethod::OnThreadAttach,
        LoadMethod::OnProcessAttach,
    ];

    /// Name as written in the `Name` attribute of `<LoadMethod>`
    pub fn as_str(self) -> &'static str {
        match self {
            LoadMethod::ImportAddressHook => "ImportAddressHook",
            LoadMethod::OnThreadAttach => "OnThreadAttach",
            LoadMethod::OnProcessAttach => "OnProcessAttach",
        }
    }
}

impl fmt::Display for LoadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoadMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("Unknown load method: {}", s))
    }
}

/// A host executable and whether it is allowed to preload plugins.
///
/// The name is the identity of the entry (compared case-insensitively) and
/// cannot change once the entry exists; only `allowed` is editable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    name: String,
    pub allowed: bool,
}

impl ProcessEntry {
    pub fn new(name: impl Into<String>, allowed: bool) -> Self {
        Self {
            name: name.into(),
            allowed,
        }
    }

    /// Executable file name, e.g. `SkyrimSE.exe`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive name comparison, as the preloader itself does it
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// In-memory model of a Plugin Preloader configuration file.
///
/// A freshly constructed config holds the preloader's defaults and has
/// `is_loaded() == false`. Only [`PreloaderConfig::from_xml`] produces a loaded
/// config.
///
/// # Invariants
///
/// - `processes()` always yields the eleven [`PROCESS_CATALOG`] entries in
///   catalog order. Entries cannot be added or removed; only their `allowed`
///   flag changes.
/// - `load_method` is free text. Unknown method names are kept as-is.
///
/// # Related Types
///
/// - [`crate::state::StateManager`]: owns the active config and publishes edits
/// - [`crate::xml`]: the parse and serialize implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloaderConfig {
    pub load_method: String,
    pub original_library: String,
    pub import_library: String,
    pub import_function: String,
    /// Kept as text; the preloader parses it itself
    pub thread_number: String,
    pub install_exception_handler: bool,
    pub keep_exception_handler: bool,
    /// Milliseconds
    pub load_delay: i32,
    /// Milliseconds
    pub hook_delay: i32,
    processes: Vec<ProcessEntry>,
    is_loaded: bool,
}

impl Default for PreloaderConfig {
    fn default() -> Self {
        Self {
            load_method: DEFAULT_LOAD_METHOD.to_string(),
            original_library: String::new(),
            import_library: DEFAULT_IMPORT_LIBRARY.to_string(),
            import_function: DEFAULT_IMPORT_FUNCTION.to_string(),
            thread_number: DEFAULT_THREAD_NUMBER.to_string(),
            install_exception_handler: true,
            keep_exception_handler: false,
            load_delay: 0,
            hook_delay: 0,
            processes: PROCESS_CATALOG
                .iter()
                .map(|&(name, allowed)| ProcessEntry::new(name, allowed))
                .collect(),
            is_loaded: false,
        }
    }
}

impl PreloaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// True only for configs produced by a successful parse of a recognized document
    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.is_loaded = true;
    }

    /// Process entries in catalog order
    pub fn processes(&self) -> &[ProcessEntry] {
        &self.processes
    }

    /// Look up a process entry by executable name (case-insensitive)
    pub fn process(&self, name: &str) -> Option<&ProcessEntry> {
        self.processes.iter().find(|p| p.matches(name))
    }

    /// Mutable access to a process entry by executable name (case-insensitive)
    pub fn process_mut(&mut self, name: &str) -> Option<&mut ProcessEntry> {
        self.processes.iter_mut().find(|p| p.matches(name))
    }

    /// Index of a process entry in the catalog
    pub fn process_index(&self, name: &str) -> Option<usize> {
        self.processes.iter().position(|p| p.matches(name))
    }

    /// Set the `allowed` flag of a known process.
    ///
    /// Returns `false` if the name is not in the catalog; the list is never extended.
    pub fn set_process_allowed(&mut self, name: &str, allowed: bool) -> bool {
        match self.process_mut(name) {
            Some(entry) => {
                entry.allowed = allowed;
                true
            }
            None => false,
        }
    }

    /// The selected load method, if it is one of the known names
    pub fn load_method_kind(&self) -> Option<LoadMethod> {
        self.load_method.parse().ok()
    }

    /// Compare every setting, ignoring whether either side came from a file
    pub fn same_settings(&self, other: &PreloaderConfig) -> bool {
        self.load_method == other.load_method
            && self.original_library == other.original_library
            && self.import_library == other.import_library
            && self.import_function == other.import_function
            && self.thread_number == other.thread_number
            && self.install_exception_handler == other.install_exception_handler
            && self.keep_exception_handler == other.keep_exception_handler
            && self.load_delay == other.load_delay
            && self.hook_delay == other.hook_delay
            && self.processes == other.processes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preloader_config_defaults() {
        let config = PreloaderConfig::default();
        assert_eq!(config.load_method, "ImportAddressHook");
        assert_eq!(config.original_library, "");
        assert_eq!(config.import_library, "MSVCR110.dll");
        assert_eq!(config.import_function, "_initterm_e");
        assert_eq!(config.thread_number, "2");
        assert!(config.install_exception_handler);
        assert!(!config.keep_exception_handler);
        assert_eq!(config.load_delay, 0);
        assert_eq!(config.hook_delay, 0);
        assert!(!config.is_loaded());
    }

    #[test]
    fn test_catalog_order_and_defaults() {
        let config = PreloaderConfig::default();
        let names: Vec<&str> = config.processes().iter().map(|p| p.name()).collect();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "Fallout3.exe");
        assert_eq!(names[7], "SkyrimSE.exe");
        assert_eq!(names[10], "CreationKit.exe");

        assert!(config.process("Fallout4.exe").unwrap().allowed);
        assert!(!config.process("Morrowind.exe").unwrap().allowed);
    }

    #[test]
    fn test_process_lookup_is_case_insensitive() {
        let mut config = PreloaderConfig::default();
        assert_eq!(config.process_index("skyrimse.EXE"), Some(7));
        assert!(config.set_process_allowed("FALLOUT3.EXE", true));
        assert!(config.process("Fallout3.exe").unwrap().allowed);
    }

    #[test]
    fn test_unknown_process_is_not_added() {
        let mut config = PreloaderConfig::default();
        assert!(!config.set_process_allowed("Starfield.exe", true));
        assert_eq!(config.processes().len(), 11);
        assert!(config.process("Starfield.exe").is_none());
    }

    #[test]
    fn test_load_method_kind() {
        let mut config = PreloaderConfig::default();
        assert_eq!(config.load_method_kind(), Some(LoadMethod::ImportAddressHook));

        config.load_method = "OnThreadAttach".to_string();
        assert_eq!(config.load_method_kind(), Some(LoadMethod::OnThreadAttach));

        config.load_method = "SomethingElse".to_string();
        assert_eq!(config.load_method_kind(), None);
    }

    #[test]
    fn test_same_settings_ignores_loaded_flag() {
        let default = PreloaderConfig::default();
        let mut loaded = PreloaderConfig::default();
        loaded.mark_loaded();

        assert_ne!(default, loaded);
        assert!(default.same_settings(&loaded));

        loaded.hook_delay = 10;
        assert!(!default.same_settings(&loaded));
    }
}
