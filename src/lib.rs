//! coralseg - interactive coral reef segmentation editor
//!
//! The browser front end of a point-prompted segmentation tool: masks come
//! from a backend, the user selects, labels and deletes them, places prompt
//! points for new masks, and can undo any edit. [`Workbench`] wires the
//! annotation session to the keyboard/click dispatcher; the native binary
//! replays recorded sessions headlessly.

pub mod app;
pub mod config;
pub mod constants;
pub mod keybindings;
pub mod mode;
pub mod model;
pub mod record;
pub mod script;
pub mod session;

pub use app::Workbench;
pub use config::{AppConfig, ConfigError};
pub use keybindings::{KeyBindings, ShortcutAction, ShortcutBinding};
pub use mode::InteractionState;
pub use record::Record;
pub use session::{AnnotationSession, SessionError};

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
