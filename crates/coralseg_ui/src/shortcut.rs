//! State-scoped keyboard and click shortcut dispatch.
//!
//! A [`ShortcutDispatcher`] is a small finite state machine: shortcuts and
//! click handlers are registered per interaction state, and only the handlers
//! of the current state are eligible. Several independent listeners may see
//! the same key event; the per-event claim guard makes sure exactly one of
//! them dispatches it.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::event::{EventId, KeyCombo, KeyEvent, MouseButton};

/// Handler invoked for a matched key combination.
pub type ShortcutHandler = Box<dyn FnMut(&KeyEvent)>;

/// Handler invoked for a click on an image pixel `(x, y)`.
pub type ClickHandler = Box<dyn FnMut(u32, u32)>;

/// Bounds required for an interaction state type.
pub trait DispatchState: Copy + Eq + Hash + fmt::Debug + 'static {}

impl<T: Copy + Eq + Hash + fmt::Debug + 'static> DispatchState for T {}

/// What happened to a key event offered to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler for the current state ran.
    Handled,
    /// The combination is bound in another state but not the current one.
    Unbound,
    /// The combination is not bound in any state.
    Unregistered,
    /// The event target opted out of shortcuts.
    Suppressed,
    /// Another listener already dispatched this event.
    AlreadyClaimed,
}

impl DispatchOutcome {
    /// Whether the host should prevent the browser's default action.
    ///
    /// Combinations the editor uses somewhere are consumed even when the
    /// current state ignores them. Everything else keeps its browser meaning.
    pub fn prevent_default(self) -> bool {
        matches!(self, DispatchOutcome::Handled | DispatchOutcome::Unbound)
    }
}

/// Shared view of the dispatcher's current state.
///
/// Handlers capture a handle to switch modes (e.g. entering mask creation)
/// without borrowing the dispatcher. A switch made inside a handler applies to
/// the next event.
#[derive(Debug, Clone)]
pub struct StateHandle<S: DispatchState> {
    current: Rc<Cell<S>>,
}

impl<S: DispatchState> StateHandle<S> {
    /// The active interaction state.
    pub fn get(&self) -> S {
        self.current.get()
    }

    /// Switch the active interaction state. Invokes no handler.
    pub fn set(&self, state: S) {
        let previous = self.current.replace(state);
        if previous != state {
            log::debug!("🔀 Shortcut state: {:?} -> {:?}", previous, state);
        }
    }
}

/// Keyboard/click shortcut registry scoped by interaction state.
///
/// At most one handler exists per `(state, combo)`; registering again replaces
/// the previous handler. Changing state never drops registrations.
pub struct ShortcutDispatcher<S: DispatchState> {
    state: StateHandle<S>,
    shortcuts: HashMap<(S, KeyCombo), ShortcutHandler>,
    clicks: HashMap<(S, MouseButton), ClickHandler>,
    /// Highest event id claimed by a listener so far
    last_claimed: Option<EventId>,
}

impl<S: DispatchState> fmt::Debug for ShortcutDispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutDispatcher")
            .field("state", &self.state.get())
            .field("shortcuts", &self.shortcuts.len())
            .field("clicks", &self.clicks.len())
            .field("last_claimed", &self.last_claimed)
            .finish()
    }
}

impl<S: DispatchState> ShortcutDispatcher<S> {
    /// Create a dispatcher starting in `initial` with no registrations.
    pub fn new(initial: S) -> Self {
        Self {
            state: StateHandle {
                current: Rc::new(Cell::new(initial)),
            },
            shortcuts: HashMap::new(),
            clicks: HashMap::new(),
            last_claimed: None,
        }
    }

    /// The active interaction state.
    pub fn state(&self) -> S {
        self.state.get()
    }

    /// Switch the active interaction state. Invokes no handler.
    pub fn set_state(&mut self, state: S) {
        self.state.set(state);
    }

    /// A handle that can switch states from inside handlers.
    pub fn state_handle(&self) -> StateHandle<S> {
        self.state.clone()
    }

    /// Install or replace the handler for `(state, combo)`.
    pub fn register_shortcut<F>(&mut self, state: S, combo: KeyCombo, handler: F)
    where
        F: FnMut(&KeyEvent) + 'static,
    {
        if self
            .shortcuts
            .insert((state, combo), Box::new(handler))
            .is_some()
        {
            log::debug!("Shortcut '{}' in {:?} replaced", combo, state);
        } else {
            log::debug!("Shortcut '{}' registered in {:?}", combo, state);
        }
    }

    /// Whether a handler exists for `(state, combo)`.
    pub fn is_registered(&self, state: S, combo: &KeyCombo) -> bool {
        self.shortcuts.contains_key(&(state, *combo))
    }

    /// Whether `combo` is bound in any state.
    pub fn is_known_combo(&self, combo: &KeyCombo) -> bool {
        self.shortcuts.keys().any(|(_, bound)| bound == combo)
    }

    /// Number of registered shortcuts across all states.
    pub fn shortcut_count(&self) -> usize {
        self.shortcuts.len()
    }

    /// Run the handler bound to `combo` in the current state, if any.
    ///
    /// Combinations without a handler in this state are ignored. Events from targets that opted out of
    /// shortcuts never run a handler.
    pub fn handle_shortcut(&mut self, combo: &KeyCombo, event: &KeyEvent) -> DispatchOutcome {
        if event.suppress_shortcuts {
            log::trace!("Shortcut '{}' suppressed by event target", combo);
            return DispatchOutcome::Suppressed;
        }

        let state = self.state.get();
        if let Some(handler) = self.shortcuts.get_mut(&(state, *combo)) {
            log::debug!("⌨️ Shortcut '{}' in {:?}", combo, state);
            handler(event);
            return DispatchOutcome::Handled;
        }

        if self.is_known_combo(combo) {
            log::trace!("No shortcut '{}' in {:?}", combo, state);
            DispatchOutcome::Unbound
        } else {
            DispatchOutcome::Unregistered
        }
    }

    /// Whether some listener already dispatched `event`.
    ///
    /// Event ids increase with every physical key press, so anything at or
    /// below the last claimed id belongs to a press that was already handled.
    pub fn have_registered_document_event(&self, event: &KeyEvent) -> bool {
        self.last_claimed.is_some_and(|claimed| event.id <= claimed)
    }

    /// Claim `event` so that other listeners skip it.
    ///
    /// Only the latest claim is kept; claiming a newer event releases the
    /// previous one.
    pub fn add_registered_document_event(&mut self, event: &KeyEvent) {
        if self.last_claimed.is_none_or(|claimed| event.id > claimed) {
            self.last_claimed = Some(event.id);
        }
    }

    /// Listener body: skip claimed events, otherwise dispatch `combo` and claim.
    pub fn handle_unclaimed(&mut self, combo: &KeyCombo, event: &KeyEvent) -> DispatchOutcome {
        if self.have_registered_document_event(event) {
            return DispatchOutcome::AlreadyClaimed;
        }
        let outcome = self.handle_shortcut(combo, event);
        self.add_registered_document_event(event);
        outcome
    }

    /// Single document-level entry point: claim the event and dispatch its own
    /// key combination.
    pub fn dispatch(&mut self, event: &KeyEvent) -> DispatchOutcome {
        self.handle_unclaimed(&event.combo(), event)
    }

    /// Install or replace the click handler for `(state, button)`.
    pub fn register_click<F>(&mut self, state: S, button: MouseButton, handler: F)
    where
        F: FnMut(u32, u32) + 'static,
    {
        self.clicks.insert((state, button), Box::new(handler));
        log::debug!("Click route {:?} registered in {:?}", button, state);
    }

    /// Route a click on pixel `(x, y)` to the current state's handler.
    ///
    /// Returns false when the current state has no handler for `button`.
    pub fn click_pixel(&mut self, button: MouseButton, x: u32, y: u32) -> bool {
        let state = self.state.get();
        match self.clicks.get_mut(&(state, button)) {
            Some(handler) => {
                log::debug!("🖱️ {:?} click at ({}, {}) in {:?}", button, x, y, state);
                handler(x, y);
                true
            }
            None => false,
        }
    }
}
