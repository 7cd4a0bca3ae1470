//! coralseg_ui - interaction primitives for the coralseg annotation front end
//!
//! This crate provides the two stateful pieces every panel shares: a bounded
//! undo/redo [`HistoryStore`] and a state-scoped [`ShortcutDispatcher`] for
//! keyboard shortcuts and canvas clicks.

mod constants;
mod error;
mod event;
mod history;
mod shortcut;

pub use constants::{DEFAULT_HISTORY_CAPACITY, KEY_COMBO_SEPARATOR};
pub use error::{HistoryError, ShortcutError};
pub use event::{EventId, EventIdSource, Key, KeyCombo, KeyEvent, KeyModifiers, MouseButton};
pub use history::{HistoryStore, Snapshot};
pub use shortcut::{
    ClickHandler, DispatchOutcome, DispatchState, ShortcutDispatcher, ShortcutHandler,
    StateHandle,
};
