use thiserror::Error;

macro_rules! return_on_error {
    ($a: expr) => {
        match $a {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(
                    "Returning due to error: {}",
                    $crate::errors::KeyflowError::from(err)
                );
                return;
            }
        }
    };
}

macro_rules! exit_on_error {
    ($a: expr) => {
        match $a {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(
                    "Exiting due to error: {}",
                    $crate::errors::KeyflowError::from(err)
                );
                std::process::exit(1);
            }
        }
    };
}

pub(crate) use exit_on_error;
pub(crate) use return_on_error;

pub type Result<T> = std::result::Result<T, KeyflowError>;
pub type Error = std::result::Result<(), KeyflowError>;

#[derive(Debug, Error)]
pub enum KeyflowError {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),
    #[error("Ron parse error: {0}.")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("Ron error: {0}.")]
    Ron(#[from] ron::Error),
    #[error(transparent)]
    Core(#[from] keyflow_core::errors::KeyflowError),
    #[error("Hook error: {0}.")]
    Hook(#[from] keyflow_core::errors::HookError),
    #[error("Invalid shortcut: {0}.")]
    Validation(#[from] keyflow_core::errors::ValidationError),

    #[error("No shortcut bound to {0}.")]
    ShortcutNotFound(String),
    #[error("No config file found.")]
    NoConfigFound,
}
