use crate::models::AppSettings;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

/// Default settings directory, relative to the working directory
pub const DEFAULT_CONFIG_DIR: &str = "Preloader Configurator Data";

/// Settings file name inside the settings directory
pub const SETTINGS_FILE_NAME: &str = "Preloader Configurator.yaml";

/// Prefix of environment variables that override settings,
/// e.g. `PRELOADER_CONFIGURATOR_DEBUG_MODE=true`
pub const ENV_PREFIX: &str = "PRELOADER_CONFIGURATOR";

/// Errors from loading or saving application settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to create config directory {path}: {source}")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load settings from {path}: {source}")]
    Load {
        path: Utf8PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("Failed to serialize settings to YAML: {0}")]
    Serialize(#[from] serde_yaml_ng::Error),

    #[error("Failed to write settings to {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads and saves the editor's own settings file.
///
/// Values come from `Preloader Configurator.yaml` when it exists, then from
/// `PRELOADER_CONFIGURATOR_*` environment variables. Missing keys fall back to
/// [`AppSettings::default`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self, SettingsError> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|source| SettingsError::CreateDir {
                path: config_dir.clone(),
                source,
            })?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE_NAME),
            config_dir,
        })
    }

    /// Load settings from the file and the process environment.
    pub fn load_settings(&self) -> Result<AppSettings, SettingsError> {
        self.load_settings_with_env(environment())
    }

    /// Load settings with an explicit environment source.
    ///
    /// Tests pass an `Environment` with a fixed source map here instead of
    /// touching process-wide variables.
    pub fn load_settings_with_env(
        &self,
        env: config::Environment,
    ) -> Result<AppSettings, SettingsError> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let load_error = |source: config::ConfigError| SettingsError::Load {
            path: self.settings_path.clone(),
            source,
        };

        let settings: AppSettings = config::Config::builder()
            .add_source(
                config::File::new(self.settings_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(env)
            .build()
            .map_err(load_error)?
            .try_deserialize()
            .map_err(load_error)?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save settings to the YAML file.
    pub fn save_settings(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        let yaml_string = serde_yaml_ng::to_string(settings)?;

        fs::write(&self.settings_path, yaml_string).map_err(|source| SettingsError::Write {
            path: self.settings_path.clone(),
            source,
        })?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Path of the settings file (it may not exist yet)
    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}
