// Console front end - line commands for the editor session
//
// Parsing and rendering live here so the binary only runs the read loop.

use crate::models::{EditorState, LoadMethod, PreloaderConfig};
use camino::Utf8PathBuf;
use std::fmt::Write as _;
use thiserror::Error;

/// Help text listing every console command
pub const HELP: &str = "\
Commands:
  open [path]              open a file (dialog when no path is given)
  save                     save to the current file
  save-as                  choose a file and save to it
  show                     print the current settings
  set <field> <value>      change a setting (see fields below)
  allow <exe> <true|false> allow or block preloading for a process
  advanced <true|false>    show or hide advanced settings
  help                     print this help
  quit                     exit

Fields: load-method, original-library, import-library, import-function,
        thread-number, install-exception-handler, keep-exception-handler,
        load-delay, hook-delay";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("'{value}' is not a valid value for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("'{0}' is not in the process list")]
    UnknownProcess(String),
}

/// Editable settings, addressed by their console name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LoadMethod,
    OriginalLibrary,
    ImportLibrary,
    ImportFunction,
    ThreadNumber,
    InstallExceptionHandler,
    KeepExceptionHandler,
    LoadDelay,
    HookDelay,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::LoadMethod,
        Field::OriginalLibrary,
        Field::ImportLibrary,
        Field::ImportFunction,
        Field::ThreadNumber,
        Field::InstallExceptionHandler,
        Field::KeepExceptionHandler,
        Field::LoadDelay,
        Field::HookDelay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::LoadMethod => "load-method",
            Field::OriginalLibrary => "original-library",
            Field::ImportLibrary => "import-library",
            Field::ImportFunction => "import-function",
            Field::ThreadNumber => "thread-number",
            Field::InstallExceptionHandler => "install-exception-handler",
            Field::KeepExceptionHandler => "keep-exception-handler",
            Field::LoadDelay => "load-delay",
            Field::HookDelay => "hook-delay",
        }
    }

    /// Accepts the dashed name or the underscore form
    fn parse(name: &str) -> Result<Self, ConsoleError> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        Field::ALL
            .into_iter()
            .find(|field| field.name() == normalized)
            .ok_or_else(|| ConsoleError::UnknownField(name.to_string()))
    }

    /// Write `value` into the matching config field
    pub fn apply(self, config: &mut PreloaderConfig, value: &str) -> Result<(), ConsoleError> {
        let invalid = || ConsoleError::InvalidValue {
            field: self.name(),
            value: value.to_string(),
        };

        match self {
            Field::LoadMethod => {
                let method: LoadMethod = value.trim().parse().map_err(|_| invalid())?;
                config.load_method = method.as_str().to_string();
            }
            Field::OriginalLibrary => config.original_library = value.to_string(),
            Field::ImportLibrary => config.import_library = value.to_string(),
            Field::ImportFunction => config.import_function = value.to_string(),
            Field::ThreadNumber => config.thread_number = value.to_string(),
            Field::InstallExceptionHandler => {
                config.install_exception_handler = parse_flag(value).ok_or_else(invalid)?;
            }
            Field::KeepExceptionHandler => {
                config.keep_exception_handler = parse_flag(value).ok_or_else(invalid)?;
            }
            Field::LoadDelay => config.load_delay = value.trim().parse().map_err(|_| invalid())?,
            Field::HookDelay => config.hook_delay = value.trim().parse().map_err(|_| invalid())?,
        }
        Ok(())
    }
}

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Open(Option<Utf8PathBuf>),
    Save,
    SaveAs,
    Show,
    Set { field: Field, value: String },
    Allow { process: String, allowed: bool },
    Advanced(bool),
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse a line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "open" => ConsoleCommand::Open((!rest.is_empty()).then(|| Utf8PathBuf::from(rest))),
            "save" => ConsoleCommand::Save,
            "save-as" | "saveas" => ConsoleCommand::SaveAs,
            "show" => ConsoleCommand::Show,
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(field, value)| (field, value.trim()))
                    .unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err(ConsoleError::Usage("set <field> <value>"));
                }
                ConsoleCommand::Set {
                    field: Field::parse(field)?,
                    value: value.to_string(),
                }
            }
            "allow" => {
                let (process, flag) = rest
                    .rsplit_once(char::is_whitespace)
                    .ok_or(ConsoleError::Usage("allow <exe> <true|false>"))?;
                let allowed = parse_flag(flag).ok_or(ConsoleError::Usage("allow <exe> <true|false>"))?;
                ConsoleCommand::Allow {
                    process: process.trim().to_string(),
                    allowed,
                }
            }
            "advanced" => ConsoleCommand::Advanced(
                parse_flag(rest).ok_or(ConsoleError::Usage("advanced <true|false>"))?,
            ),
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            _ => return Err(ConsoleError::UnknownCommand(verb.to_string())),
        };

        Ok(Some(command))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Human-readable view of the editor state for `show`
pub fn render(state: &EditorState) -> String {
    let config = &state.config;
    let mut out = String::new();

    let file = state
        .current_file_path
        .as_ref()
        .map(|p| p.as_str())
        .unwrap_or("(none)");
    let _ = writeln!(out, "File: {}", file);
    if !config.is_loaded() {
        let _ = writeln!(out, "(defaults, no preloader section loaded)");
    }

    let _ = writeln!(out, "Original library: {}", config.original_library);
    let _ = writeln!(
        out,
        "Exception handler: install={} keep={}",
        config.install_exception_handler, config.keep_exception_handler
    );

    if state.show_advanced_options {
        let _ = writeln!(out, "Load method: {}", config.load_method);
        let _ = writeln!(
            out,
            "  Import address hook: {}!{}",
            config.import_library, config.import_function
        );
        let _ = writeln!(out, "  Thread number: {}", config.thread_number);
        let _ = writeln!(
            out,
            "Delays: load={}ms hook={}ms",
            config.load_delay, config.hook_delay
        );
    }

    let _ = writeln!(out, "Processes:");
    for process in config.processes() {
        let mark = if process.allowed { "x" } else { " " };
        let _ = writeln!(out, "  [{}] {}", mark, process.name());
    }

    out
}
