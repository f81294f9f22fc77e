//! Per-context environment settings.
//!
//! Each context directory holding a component has a small TOML file at
//! `.devsync/env/env.toml` with component-level settings such as the
//! component name and debug port.

use crate::env;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Component name setting
pub const NAME: &str = "name";

/// Target namespace/project setting
pub const NAMESPACE: &str = "namespace";

/// Local debug port setting
pub const DEBUG_PORT: &str = "debugport";

/// Settings accepted by [`EnvSpecificInfo::set`].
pub const KNOWN_PARAMETERS: &[&str] = &[NAME, NAMESPACE, DEBUG_PORT];

/// Environment file errors.
#[derive(Debug, thiserror::Error)]
pub enum EnvInfoError {
    #[error("Failed to access environment file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse environment file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize environment file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Outcome of [`EnvSpecificInfo::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Value written to disk
    Updated,
    /// Key already had a value and `force` was not given; nothing written
    AlreadySet,
}

/// Environment settings for one context directory.
#[derive(Debug, Clone)]
pub struct EnvSpecificInfo {
    path: PathBuf,
    settings: BTreeMap<String, String>,
    exists: bool,
}

impl EnvSpecificInfo {
    /// Load the environment file of `context`, if there is one.
    pub fn load(context: &Path) -> Result<Self, EnvInfoError> {
        let path = env::env_file_path(context);

        if !path.is_file() {
            debug!("No environment file at {:?}", path);
            return Ok(Self {
                path,
                settings: BTreeMap::new(),
                exists: false,
            });
        }

        let content = fs::read_to_string(&path)?;
        let settings = toml::from_str(&content)?;
        Ok(Self {
            path,
            settings,
            exists: true,
        })
    }

    /// Create the environment file for a new component in `context`.
    pub fn init(context: &Path, component_name: &str) -> Result<Self, EnvInfoError> {
        let mut info = Self::load(context)?;
        info.settings
            .insert(NAME.to_string(), component_name.to_string());
        info.save()?;
        Ok(info)
    }

    /// Whether the context holds a component.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Location of the environment file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `name` has a value. Case-insensitive.
    pub fn is_set(&self, name: &str) -> bool {
        self.settings.contains_key(&name.to_lowercase())
    }

    /// Value of `name`. Case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.settings.get(&name.to_lowercase()).map(String::as_str)
    }

    /// All settings in key order.
    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    /// Set `name` to `value` and persist.
    ///
    /// Keys are stored lower-cased. An existing value is only replaced when
    /// `force` is set; otherwise [`SetOutcome::AlreadySet`] is returned and
    /// the file is left untouched.
    pub fn set(
        &mut self,
        name: &str,
        value: &str,
        force: bool,
    ) -> Result<SetOutcome, EnvInfoError> {
        let key = name.to_lowercase();
        validate(&key, value)?;

        if !force && self.is_set(&key) {
            debug!("{} is already set, not overriding", key);
            return Ok(SetOutcome::AlreadySet);
        }

        self.settings.insert(key, value.to_string());
        self.save()?;
        Ok(SetOutcome::Updated)
    }

    /// Write the settings to disk, creating directories as needed.
    pub fn save(&mut self) -> Result<(), EnvInfoError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.settings)?;
        fs::write(&self.path, content)?;
        self.exists = true;
        info!("Saved environment file {:?}", self.path);
        Ok(())
    }
}

fn validate(key: &str, value: &str) -> Result<(), EnvInfoError> {
    if !KNOWN_PARAMETERS.contains(&key) {
        return Err(EnvInfoError::UnknownParameter(key.to_string()));
    }

    if key == DEBUG_PORT && value.parse::<u16>().is_err() {
        return Err(EnvInfoError::InvalidValue {
            name: key.to_string(),
            reason: format!("{} is not a valid port", value),
        });
    }

    if value.is_empty() {
        return Err(EnvInfoError::InvalidValue {
            name: key.to_string(),
            reason: "value must not be empty".to_string(),
        });
    }

    Ok(())
}
