use std::process::Stdio;

use parking_lot::Mutex;

use crate::child::Children;
use crate::errors::ActionError;
use crate::probe::ToolProbe;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Starts the external programs behind actions.
///
/// Spawning never waits for the program to finish. Children are kept until a
/// later spawn (or an explicit [`Launcher::reap`]) sees that they exited.
#[derive(Debug, Default)]
pub struct Launcher {
    children: Mutex<Children>,
    tools: ToolProbe,
}

impl Launcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Fails when the program is not installed or could not be started.
    pub fn spawn(&self, invocation: &Invocation) -> Result<(), ActionError> {
        if !self.tools.is_available(&invocation.program) {
            return Err(ActionError::ToolUnavailable(invocation.program.clone()));
        }
        let child = std::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| ActionError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let mut children = self.children.lock();
        children.reap();
        children.insert(child);
        Ok(())
    }

    pub fn reap(&self) -> usize {
        self.children.lock().reap()
    }

    #[must_use]
    pub fn running(&self) -> usize {
        self.children.lock().len()
    }

    #[must_use]
    pub fn tools(&self) -> &ToolProbe {
        &self.tools
    }
}

#[cfg(test)]
mod tests {
    use super::{Invocation, Launcher};
    use crate::errors::ActionError;

    #[test]
    fn missing_tool_is_reported() {
        let launcher = Launcher::new();
        let result = launcher.spawn(&Invocation::new("keyflow-no-such-tool", ["x"]));
        assert!(matches!(result, Err(ActionError::ToolUnavailable(program)) if program == "keyflow-no-such-tool"));
        assert_eq!(launcher.running(), 0);
    }

    #[test]
    fn spawn_tracks_child() {
        let launcher = Launcher::new();
        launcher.spawn(&Invocation::new("sh", ["-c", "exit 0"])).unwrap();
        assert!(launcher.running() <= 1);
    }
}
