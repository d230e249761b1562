
pub mod child;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod errors;
pub mod hook;
pub mod ipc;
pub mod launcher;
pub mod probe;
pub mod registry;
pub mod service;
pub mod stats;

/// The directory name for xdg
pub const KEYFLOW_DIR_NAME: &str = "keyflow";
