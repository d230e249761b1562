mod binding;
pub mod combo;
pub mod command;

use std::time::Duration;

use crate::errors::{Error, Result};

pub use binding::{Binding, Shortcut};
pub use combo::{KeyCombo, KeyId, Modifier, ModifierSet};
pub use command::{Action, BoundAction, Category, Command};

/// Duplicate presses of the same combo closer together than this are dropped.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Tunables of the dispatch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub debounce: Duration,
    pub statistics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            statistics: true,
        }
    }
}

pub trait Config {
    fn shortcuts(&self) -> Vec<Shortcut>;

    fn settings(&self) -> Settings {
        Settings::default()
    }
}

/// Where shortcuts are kept between runs.
///
/// Only called at configuration boundaries, never from the hook thread.
pub trait Store {
    /// # Errors
    ///
    /// Fails if the backing storage cannot be read or parsed.
    fn load(&self) -> Result<Vec<Shortcut>>;

    /// # Errors
    ///
    /// Fails if the backing storage cannot be written.
    fn save(&self, shortcuts: &[Shortcut]) -> Error;
}
