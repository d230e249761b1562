use thiserror::Error;

macro_rules! log {
    ($a: expr) => {
        match $a {
            Ok(value) => value,
            Err(err) => tracing::error!("{}", $crate::errors::KeyflowError::from(err)),
        }
    };
}

pub(crate) use log;

pub type Result<T> = std::result::Result<T, KeyflowError>;
pub type Error = std::result::Result<(), KeyflowError>;

#[derive(Debug, Error)]
pub enum KeyflowError {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),
    #[error("Nix errno: {0}.")]
    NixErrno(#[from] nix::errno::Errno),
    #[error("RON parse error: {0}.")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("RON error: {0}.")]
    Ron(#[from] ron::Error),

    #[error("Hook error: {0}")]
    Hook(#[from] HookError),
    #[error("Invalid binding: {0}")]
    Validation(#[from] ValidationError),
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Given string doesn't match with a command: {0}.")]
    UnknownCommand(String),
    #[error("Cannot read key event from `{0}`.")]
    InvalidEvent(String),
    #[error("No config file found.")]
    NoConfigFound,
}

/// Failures of the keyboard hook registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("failed to register keyboard hook: {0}")]
    Register(String),
    #[error("failed to unregister keyboard hook: {0}")]
    Unregister(String),
    #[error("hook registration already in progress")]
    RegistrationInProgress,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("empty key combination")]
    EmptyCombo,
    #[error("no key found in `{0}`")]
    KeyNotFound(String),
    #[error("more than one key in `{0}`")]
    MultipleKeys(String),
    #[error("no action bound to `{0}`")]
    ActionNotFound(String),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("`{0}` is not available on this system")]
    ToolUnavailable(String),
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Failed(String),
    #[error("action panicked: {0}")]
    Panicked(String),
}
