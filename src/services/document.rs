use crate::models::PreloaderConfig;
use crate::xml::ConfigXmlError;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or saving a configuration file
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8 text")]
    InvalidEncoding {
        path: Utf8PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("{0}")]
    Xml(#[from] ConfigXmlError),
}

/// File boundary for preloader configuration documents
///
/// Reads and writes whole files only. A save serializes into memory first, so a
/// serialization failure never touches the target file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentService;

impl DocumentService {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a configuration file
    ///
    /// A leading byte order mark is accepted.
    pub async fn load(&self, path: &Utf8Path) -> Result<PreloaderConfig, DocumentError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DocumentError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let text = String::from_utf8(bytes).map_err(|source| DocumentError::InvalidEncoding {
            path: path.to_path_buf(),
            source,
        })?;

        let config = PreloaderConfig::from_xml(&text)?;
        tracing::debug!(
            "Parsed {} (recognized: {}, load method: {})",
            path,
            config.is_loaded(),
            config.load_method
        );
        Ok(config)
    }

    /// Serialize `config` and overwrite `path` with it
    pub async fn save(&self, path: &Utf8Path, config: &PreloaderConfig) -> Result<(), DocumentError> {
        let bytes = config.to_xml_bytes()?;

        tokio::fs::write(path, &bytes)
            .await
            .map_err(|source| DocumentError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), path);
        Ok(())
    }
}
