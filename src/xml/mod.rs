//! XML parsing and serialization of the preloader configuration file.
//!
//! The file layout is fixed:
//!
//! ```text
//! <xSE>
//!   <PluginPreloader>
//!     <OriginalLibrary/> <LoadMethod Name=".."> .. </LoadMethod>
//!     <InstallExceptionHandler/> <KeepExceptionHandler/>
//!     <LoadDelay/> <HookDelay/>
//!     <Processes> <Item Name=".." Allow=".."/> .. </Processes>
//!   </PluginPreloader>
//! </xSE>
//! ```
//!
//! Reading is lenient about missing elements (each has a default) and strict
//! about values: a boolean or integer that does not parse aborts the whole load.
//! Writing always produces the complete layout with documentation comments.

mod dom;
mod reader;
mod writer;

use crate::models::PreloaderConfig;
use thiserror::Error;

pub use reader::parse_config;
pub use writer::{UTF8_BOM, write_config};

/// Element and attribute names of the configuration schema
pub(crate) mod names {
    pub const ROOT: &str = "xSE";
    pub const PRELOADER: &str = "PluginPreloader";
    pub const ORIGINAL_LIBRARY: &str = "OriginalLibrary";
    pub const LOAD_METHOD: &str = "LoadMethod";
    pub const NAME: &str = "Name";
    pub const IMPORT_ADDRESS_HOOK: &str = "ImportAddressHook";
    pub const LIBRARY_NAME: &str = "LibraryName";
    pub const FUNCTION_NAME: &str = "FunctionName";
    pub const ON_THREAD_ATTACH: &str = "OnThreadAttach";
    pub const THREAD_NUMBER: &str = "ThreadNumber";
    pub const ON_PROCESS_ATTACH: &str = "OnProcessAttach";
    pub const INSTALL_EXCEPTION_HANDLER: &str = "InstallExceptionHandler";
    pub const KEEP_EXCEPTION_HANDLER: &str = "KeepExceptionHandler";
    pub const LOAD_DELAY: &str = "LoadDelay";
    pub const HOOK_DELAY: &str = "HookDelay";
    pub const PROCESSES: &str = "Processes";
    pub const ITEM: &str = "Item";
    pub const ALLOW: &str = "Allow";
}

/// Errors raised while reading or writing a configuration document
#[derive(Error, Debug)]
pub enum ConfigXmlError {
    /// The input is not well-formed XML
    #[error("Malformed XML at byte {position}: {message}")]
    MalformedInput { position: u64, message: String },

    /// A boolean or integer setting holds text that cannot be converted
    #[error("Invalid value for {field}: '{text}'")]
    TypeCoercion { field: String, text: String },

    /// The document could not be written to the output buffer
    #[error("Failed to serialize configuration: {0}")]
    Serialization(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PreloaderConfig {
    /// Parse a complete configuration document.
    ///
    /// A document without an `xSE/PluginPreloader` element yields the default
    /// config with `is_loaded() == false`. See [`parse_config`].
    pub fn from_xml(xml_content: &str) -> Result<Self, ConfigXmlError> {
        parse_config(xml_content)
    }

    /// Serialize to the document text (no byte order mark). See [`write_config`].
    pub fn save_to_xml(&self) -> Result<String, ConfigXmlError> {
        write_config(self)
    }

    /// Serialize to the bytes written to disk: UTF-8 with a byte order mark
    pub fn to_xml_bytes(&self) -> Result<Vec<u8>, ConfigXmlError> {
        let text = write_config(self)?;
        let mut bytes = Vec::with_capacity(UTF8_BOM.len() + text.len());
        bytes.extend_from_slice(&UTF8_BOM);
        bytes.extend_from_slice(text.as_bytes());
        Ok(bytes)
    }
}
