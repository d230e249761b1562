use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use keyflow_core::config::{Command, KeyCombo, Settings, Shortcut, Store};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use xdg::BaseDirectories;

use crate::errors::{KeyflowError, Result};

const CONFIG_FILE: &str = "config.ron";

fn default_debounce_ms() -> u64 {
    50
}

fn default_statistics() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_statistics")]
    pub statistics: bool,
    #[serde(default)]
    pub shortcuts: Vec<Shortcut>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            statistics: default_statistics(),
            shortcuts: Vec::new(),
        }
    }
}

impl keyflow_core::config::Config for Config {
    fn shortcuts(&self) -> Vec<Shortcut> {
        self.shortcuts.clone()
    }

    fn settings(&self) -> Settings {
        Settings {
            debounce: Duration::from_millis(self.debounce_ms),
            statistics: self.statistics,
        }
    }
}

impl TryFrom<String> for Config {
    type Error = KeyflowError;
    /// # Errors
    ///
    /// Errors when the contents are not a valid ron config.
    fn try_from(contents: String) -> Result<Self> {
        Ok(ron::from_str(&contents)?)
    }
}

impl Config {
    /// Appends a shortcut, replacing one already bound to the same combo.
    ///
    /// # Errors
    ///
    /// Errors when the keys do not form a valid combo.
    pub fn bind(&mut self, keys: &str, command: Command) -> Result<&Shortcut> {
        let keys: KeyCombo = keys.parse()?;
        self.shortcuts.retain(|shortcut| shortcut.keys != keys);
        self.shortcuts.push(Shortcut::new(keys, command));
        let index = self.shortcuts.len() - 1;
        Ok(&self.shortcuts[index])
    }

    /// Removes the shortcut bound to `keys`.
    ///
    /// # Errors
    ///
    /// Errors when nothing is bound to the combo.
    pub fn unbind(&mut self, keys: &str) -> Result<Shortcut> {
        let keys = KeyCombo::normalize(keys);
        let index = self
            .shortcuts
            .iter()
            .position(|shortcut| shortcut.keys == keys)
            .ok_or_else(|| KeyflowError::ShortcutNotFound(keys.to_string()))?;
        Ok(self.shortcuts.remove(index))
    }
}

/// A ron file holding a [`Config`].
#[derive(Debug, Clone)]
pub struct RonStore {
    path: PathBuf,
}

impl RonStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The store at the default location in the xdg config home.
    ///
    /// # Errors
    ///
    /// Errors when the config directory cannot be created.
    pub fn locate() -> Result<Self> {
        let path = BaseDirectories::with_prefix(keyflow_core::KEYFLOW_DIR_NAME);
        let file_name = path.place_config_file(CONFIG_FILE)?;
        Ok(Self::new(file_name))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole config file.
    ///
    /// # Errors
    ///
    /// Errors when the file is missing or cannot be parsed.
    pub fn read(&self) -> Result<Config> {
        if !self.path.exists() {
            return Err(KeyflowError::NoConfigFound);
        }
        let contents = fs::read_to_string(&self.path)?;
        Config::try_from(contents)
    }

    /// Reads the config, falling back to defaults when there is no file yet.
    ///
    /// # Errors
    ///
    /// Errors when an existing file cannot be read or parsed.
    pub fn read_or_default(&self) -> Result<Config> {
        match self.read() {
            Err(KeyflowError::NoConfigFound) => Ok(Config::default()),
            other => other,
        }
    }

    /// # Errors
    ///
    /// Errors when the file or its directory cannot be written.
    pub fn write(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = ron::ser::to_string_pretty(config, PrettyConfig::default())?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl Store for RonStore {
    fn load(&self) -> keyflow_core::errors::Result<Vec<Shortcut>> {
        match self.read_or_default() {
            Ok(config) => Ok(config.shortcuts),
            Err(err) => Err(into_core(err)),
        }
    }

    fn save(&self, shortcuts: &[Shortcut]) -> keyflow_core::errors::Error {
        let mut config = self.read_or_default().map_err(into_core)?;
        config.shortcuts = shortcuts.to_vec();
        self.write(&config).map_err(into_core)
    }
}

pub(crate) fn into_core(err: KeyflowError) -> keyflow_core::errors::KeyflowError {
    use keyflow_core::errors::{KeyflowError as CoreError, ValidationError};
    match err {
        KeyflowError::IoError(err) => CoreError::IoError(err),
        KeyflowError::RonParse(err) => CoreError::RonParse(err),
        KeyflowError::Ron(err) => CoreError::Ron(err),
        KeyflowError::Core(err) => err,
        KeyflowError::Hook(err) => CoreError::Hook(err),
        KeyflowError::Validation(err) => CoreError::Validation(err),
        KeyflowError::ShortcutNotFound(combo) => {
            CoreError::Validation(ValidationError::ActionNotFound(combo))
        }
        KeyflowError::NoConfigFound => CoreError::NoConfigFound,
    }
}

/// # Errors
///
/// Errors when no config file is found or it cannot be parsed.
pub fn load(path: Option<&Path>) -> Result<(Config, RonStore)> {
    let store = match path {
        Some(path) => RonStore::new(path),
        None => RonStore::locate()?,
    };
    let config = store.read()?;
    Ok((config, store))
}
