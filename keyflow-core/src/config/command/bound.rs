use std::sync::Arc;

use crate::errors::ActionError;
use crate::launcher::Launcher;

use super::{Action, Category, Command};

/// A [`Command`] wired to the [`Launcher`] that carries it out.
#[derive(Debug, Clone)]
pub struct BoundAction {
    command: Command,
    launcher: Arc<Launcher>,
}

impl BoundAction {
    pub fn new(command: Command, launcher: Arc<Launcher>) -> Self {
        Self { command, launcher }
    }

    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }
}

impl Action for BoundAction {
    fn execute(&self) -> Result<(), ActionError> {
        self.launcher.spawn(&self.command.invocation())
    }

    fn name(&self) -> &str {
        self.command.display_name()
    }

    fn category(&self) -> Category {
        self.command.category()
    }
}
