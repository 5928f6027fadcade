//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate a default configuration file on first run
//! - Fill keys missing from older files and rewrite them
//! - Generate `AppBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{ConfigLoader, LoadOutcome};
//! use std::path::Path;
//!
//! match ConfigLoader::load_or_init(Path::new("chat-relay.toml")).unwrap() {
//!     LoadOutcome::Created { path } => println!("edit {} and restart", path.display()),
//!     LoadOutcome::Loaded { blueprint, .. } => println!("sinks: {}", blueprint.sinks.len()),
//! }
//! ```

mod parser;
mod upgrade;
mod validator;

pub use contracts::AppBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "chat-relay.toml";

/// Result of [`ConfigLoader::load_or_init`]
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// No file existed; a default one was written. The caller should not start.
    Created { path: PathBuf },
    /// Loaded and validated. `added_keys` lists keys filled from defaults.
    Loaded {
        blueprint: AppBlueprint,
        added_keys: Vec<String>,
    },
}

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<AppBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<AppBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Load a config file, creating or upgrading it as needed
    ///
    /// - missing file: writes the defaults and returns `Created`
    /// - file missing keys: fills them from defaults, rewrites the file and
    ///   reports the added key paths
    ///
    /// # Errors
    /// Same as [`ConfigLoader::load_from_path`], plus write failures.
    pub fn load_or_init(path: &Path) -> Result<LoadOutcome, ContractError> {
        let format = Self::detect_format(path)?;

        if !path.exists() {
            Self::write_default(path)?;
            info!(path = %path.display(), "No config file found, generated defaults");
            return Ok(LoadOutcome::Created {
                path: path.to_path_buf(),
            });
        }

        let content = Self::read_file(path)?;
        let mut value = parser::parse_value(&content, format)?;
        let defaults = serde_json::to_value(AppBlueprint::default())
            .map_err(|e| ContractError::config_parse(format!("default serialize error: {e}")))?;
        let added_keys = upgrade::fill_missing(&mut value, &defaults);

        let blueprint: AppBlueprint =
            serde_json::from_value(value).map_err(|e| ContractError::ConfigParse {
                message: format!("config structure error: {e}"),
                source: Some(Box::new(e)),
            })?;
        validator::validate(&blueprint)?;

        if !added_keys.is_empty() {
            Self::write(path, &blueprint, format)?;
            info!(
                path = %path.display(),
                added = ?added_keys,
                "Updated config with new options"
            );
        }

        Ok(LoadOutcome::Loaded {
            blueprint,
            added_keys,
        })
    }

    /// Write the default configuration to `path` (format from extension)
    pub fn write_default(path: &Path) -> Result<(), ContractError> {
        let format = Self::detect_format(path)?;
        Self::write(path, &AppBlueprint::default(), format)
    }

    /// Serialize AppBlueprint to TOML string
    pub fn to_toml(blueprint: &AppBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize AppBlueprint to JSON string
    pub fn to_json(blueprint: &AppBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(path: &Path, blueprint: &AppBlueprint, format: ConfigFormat) -> Result<(), ContractError> {
        let content = match format {
            ConfigFormat::Toml => Self::to_toml(blueprint)?,
            ConfigFormat::Json => Self::to_json(blueprint)?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<AppBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}
