//! Global constants for the coralseg application

pub use coralseg_ui::DEFAULT_HISTORY_CAPACITY;

/// Environment variable holding an `env_logger` filter for native binaries
pub const LOG_ENV_VAR: &str = "CORALSEG_LOG";

/// DOM attribute marking elements whose key presses must not trigger shortcuts
pub const NO_SHORTCUTS_ATTRIBUTE: &str = "no-shortcuts";
