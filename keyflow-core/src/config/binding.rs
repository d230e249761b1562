use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::launcher::Launcher;

use super::combo::KeyCombo;
use super::command::{Action, BoundAction, Command};

/// A combo paired with the action it triggers.
#[derive(Debug, Clone)]
pub struct Binding {
    pub combo: KeyCombo,
    pub action: Option<Arc<dyn Action>>,
}

impl Binding {
    pub fn new<C: Into<KeyCombo>>(combo: C, action: Arc<dyn Action>) -> Self {
        Self {
            combo: combo.into(),
            action: Some(action),
        }
    }

    /// A binding with no action yet, as produced by a half-filled editor.
    pub fn unbound<C: Into<KeyCombo>>(combo: C) -> Self {
        Self {
            combo: combo.into(),
            action: None,
        }
    }

    /// Splits a binding into its registry entry.
    ///
    /// # Errors
    ///
    /// Fails if the combo is empty or malformed, or no action is set.
    pub fn validate(self) -> Result<(KeyCombo, Arc<dyn Action>), ValidationError> {
        self.combo.validate()?;
        match self.action {
            Some(action) => Ok((self.combo, action)),
            None => Err(ValidationError::ActionNotFound(self.combo.to_string())),
        }
    }
}

/// The persisted form of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shortcut {
    pub keys: KeyCombo,
    pub command: Command,
}

impl Shortcut {
    pub fn new<C: Into<KeyCombo>>(keys: C, command: Command) -> Self {
        Self {
            keys: keys.into(),
            command,
        }
    }

    #[must_use]
    pub fn to_binding(&self, launcher: &Arc<Launcher>) -> Binding {
        let action = BoundAction::new(self.command.clone(), Arc::clone(launcher));
        Binding::new(self.keys.clone(), Arc::new(action))
    }
}
