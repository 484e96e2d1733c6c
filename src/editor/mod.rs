//! Editor shell: user commands on top of the state and services layers.
//!
//! - [`AsyncCommand`]: single-flight wrapper that ignores re-entrant
//!   invocations and routes failures to an error handler
//! - [`EditorSession`]: the Open, Save and Save As commands and the awaitable
//!   operations behind them
//! - [`console`]: line commands used by the console host

pub mod command;
pub mod console;
pub mod session;

pub use command::{AsyncCommand, ErrorHandler};
pub use console::{ConsoleCommand, ConsoleError, Field};
pub use session::EditorSession;
