//! Application wiring: the one place where the session and the shortcut
//! dispatcher are constructed and connected.
//!
//! Startup order in [`Workbench::new`]:
//! 1. the annotation session (with the configured history capacity)
//! 2. the shortcut dispatcher, in [`InteractionState::MaskSelection`]
//! 3. canvas click routes for every mode
//! 4. the configured shortcut bindings
//!
//! Actions the session cannot carry out itself (image navigation, prompt
//! confirmation, the category selector) are queued as host requests; the host
//! drains them with [`Workbench::take_requests`] after each input.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use coralseg_ui::{
    DispatchOutcome, EventIdSource, Key, KeyCombo, KeyEvent, KeyModifiers, MouseButton,
    ShortcutDispatcher, StateHandle,
};

use crate::config::AppConfig;
use crate::keybindings::{KeyBindings, ShortcutAction};
use crate::mode::InteractionState;
use crate::model::{AnnotationData, CategoryInfo, Polarity};
use crate::session::{AnnotationSession, SessionError};

/// The editor: one session plus the dispatcher routing input into it.
pub struct Workbench {
    session: Rc<RefCell<AnnotationSession>>,
    dispatcher: ShortcutDispatcher<InteractionState>,
    event_ids: EventIdSource,
    bindings: KeyBindings,
    requests: Rc<RefCell<Vec<ShortcutAction>>>,
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("state", &self.dispatcher.state())
            .field("dispatcher", &self.dispatcher)
            .field("bindings", &self.bindings.bindings().len())
            .field("requests", &self.requests.borrow())
            .finish_non_exhaustive()
    }
}

impl Workbench {
    /// Construct and wire every component.
    pub fn new(
        config: &AppConfig,
        data: AnnotationData,
        categories: CategoryInfo,
    ) -> Result<Self, SessionError> {
        let session = Rc::new(RefCell::new(AnnotationSession::new(
            data,
            categories,
            config.preferences.history_capacity,
        )?));

        let mut dispatcher = ShortcutDispatcher::new(InteractionState::default());
        register_click_routes(&mut dispatcher, &session);

        let requests = Rc::new(RefCell::new(Vec::new()));
        let bindings = config.keybindings();
        for binding in bindings.bindings() {
            let session = Rc::clone(&session);
            let state = dispatcher.state_handle();
            let requests = Rc::clone(&requests);
            let action = binding.action;
            dispatcher.register_shortcut(binding.state, binding.combo, move |_| {
                run_action(&session, &state, &requests, action);
            });
        }

        log::info!(
            "Workbench ready: {} shortcuts, history capacity {}",
            dispatcher.shortcut_count(),
            config.preferences.history_capacity
        );

        Ok(Self {
            session,
            dispatcher,
            event_ids: EventIdSource::new(),
            bindings,
            requests,
        })
    }

    /// Read access to the session.
    pub fn session(&self) -> Ref<'_, AnnotationSession> {
        self.session.borrow()
    }

    /// Write access to the session, for edits made outside shortcuts.
    pub fn session_mut(&self) -> RefMut<'_, AnnotationSession> {
        self.session.borrow_mut()
    }

    pub fn state(&self) -> InteractionState {
        self.dispatcher.state()
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Action `combo` triggers in the current mode, if any.
    pub fn shortcut_for(&self, combo: &KeyCombo) -> Option<ShortcutAction> {
        self.bindings.action_for(self.state(), combo)
    }

    /// Drain the host requests queued since the last call, oldest first.
    pub fn take_requests(&mut self) -> Vec<ShortcutAction> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    /// Build the event for a new physical key press.
    pub fn key_event(&mut self, key: Key, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(self.event_ids.next_id(), key, modifiers)
    }

    /// Handle a physical key press.
    pub fn key_down(&mut self, key: Key, modifiers: KeyModifiers) -> DispatchOutcome {
        let event = self.key_event(key, modifiers);
        self.dispatch(&event)
    }

    /// Dispatch an already-built key event. Re-dispatching the same event is
    /// a no-op.
    pub fn dispatch(&mut self, event: &KeyEvent) -> DispatchOutcome {
        self.dispatcher.dispatch(event)
    }

    /// Route a canvas click on image pixel `(x, y)`.
    pub fn click(&mut self, button: MouseButton, x: u32, y: u32) -> bool {
        self.dispatcher.click_pixel(button, x, y)
    }

    /// Switch to another image, back in the default mode.
    pub fn open_image(&mut self, data: AnnotationData) {
        self.dispatcher.set_state(InteractionState::default());
        self.session.borrow_mut().open_image(data);
    }

    /// Switch to another image and the category list that comes with it.
    pub fn open_image_with_categories(&mut self, data: AnnotationData, categories: CategoryInfo) {
        self.dispatcher.set_state(InteractionState::default());
        self.session
            .borrow_mut()
            .open_image_with_categories(data, categories);
    }

    /// Run an action directly, as a toolbar button would.
    pub fn perform(&mut self, action: ShortcutAction) {
        run_action(
            &self.session,
            &self.dispatcher.state_handle(),
            &self.requests,
            action,
        );
    }
}

fn register_click_routes(
    dispatcher: &mut ShortcutDispatcher<InteractionState>,
    session: &Rc<RefCell<AnnotationSession>>,
) {
    let select = Rc::clone(session);
    dispatcher.register_click(
        InteractionState::MaskSelection,
        MouseButton::Left,
        move |x, y| {
            select.borrow_mut().toggle_mask_at(x, y);
        },
    );

    let positive = Rc::clone(session);
    dispatcher.register_click(
        InteractionState::MaskCreation,
        MouseButton::Left,
        move |x, y| positive.borrow_mut().add_prompt(x, y, Polarity::Positive),
    );

    let negative = Rc::clone(session);
    dispatcher.register_click(
        InteractionState::MaskCreation,
        MouseButton::Right,
        move |x, y| negative.borrow_mut().add_prompt(x, y, Polarity::Negative),
    );
}

fn run_action(
    session: &RefCell<AnnotationSession>,
    state: &StateHandle<InteractionState>,
    requests: &RefCell<Vec<ShortcutAction>>,
    action: ShortcutAction,
) {
    let mut session = session.borrow_mut();
    let result = match action {
        ShortcutAction::Undo => session.undo().map(|_| ()),
        ShortcutAction::Redo => {
            session.redo();
            Ok(())
        }
        ShortcutAction::RemoveSelected => session.remove_selected_masks().map(|_| ()),
        ShortcutAction::ClearSelection => {
            session.clear_selection();
            Ok(())
        }
        ShortcutAction::EnterMaskCreation => {
            session.clear_selection();
            state.set(InteractionState::MaskCreation);
            Ok(())
        }
        ShortcutAction::ExitMaskCreation => {
            session.clear_prompts();
            session.clear_selection();
            state.set(InteractionState::MaskSelection);
            Ok(())
        }
        ShortcutAction::UndoPrompt => {
            session.undo_prompt();
            Ok(())
        }
        ShortcutAction::ResetPrompts => {
            session.clear_prompts();
            Ok(())
        }
        ShortcutAction::ConfirmPrompt if session.prompts().is_empty() => {
            log::debug!("No prompt points to confirm");
            Ok(())
        }
        ShortcutAction::ConfirmPrompt
        | ShortcutAction::NextImage
        | ShortcutAction::PrevImage
        | ShortcutAction::ToggleCategorySelector => {
            log::debug!("Host request: {}", action.description());
            requests.borrow_mut().push(action);
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("{} failed: {}", action.description(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybindings::ShortcutBinding;
    use crate::model::{CategoryEntry, Mask};

    fn workbench(config: &AppConfig) -> Workbench {
        let mut data = AnnotationData {
            image_name: "reef.jpg".to_string(),
            image_width: 4,
            image_height: 2,
            ..Default::default()
        };
        data.add_mask(Mask::from_rle(0, 0, 4, 2, vec![0, 2, 2, 2, 2]));
        data.add_mask(Mask::from_rle(0, 0, 4, 2, vec![2, 2, 2, 2]));
        let categories = CategoryInfo::from(vec![CategoryEntry::new(0, "coral")]);
        Workbench::new(config, data, categories).unwrap()
    }

    fn ch(c: char) -> Key {
        Key::Char(c)
    }

    #[test]
    fn test_click_select_remove_undo_redo() {
        let mut wb = workbench(&AppConfig::new());

        assert!(wb.click(MouseButton::Left, 0, 0));
        assert_eq!(wb.session().selected_masks(), vec![0]);

        assert_eq!(wb.key_down(ch('r'), KeyModifiers::NONE), DispatchOutcome::Handled);
        assert_eq!(wb.session().data().masks.len(), 1);

        wb.key_down(ch('z'), KeyModifiers::CTRL);
        assert_eq!(wb.session().data().masks.len(), 2);

        wb.key_down(ch('y'), KeyModifiers::CTRL);
        assert_eq!(wb.session().data().masks.len(), 1);
    }

    #[test]
    fn test_mask_creation_mode_routing() {
        let mut wb = workbench(&AppConfig::new());

        wb.key_down(ch('w'), KeyModifiers::NONE);
        assert_eq!(wb.state(), InteractionState::MaskCreation);

        wb.click(MouseButton::Left, 1, 1);
        wb.click(MouseButton::Right, 2, 1);
        wb.click(MouseButton::Left, 3, 0);
        assert_eq!(wb.session().prompts().len(), 3);
        assert!(wb.session().selected_masks().is_empty());

        // In creation mode ctrl+z removes a prompt instead of undoing history
        wb.key_down(ch('z'), KeyModifiers::CTRL);
        assert_eq!(wb.session().prompts().len(), 2);
        assert_eq!(wb.session().prompts()[1].polarity, Polarity::Negative);

        // "r" resets prompts here rather than deleting masks
        wb.key_down(ch('r'), KeyModifiers::NONE);
        assert!(wb.session().prompts().is_empty());
        assert_eq!(wb.session().data().masks.len(), 2);

        wb.click(MouseButton::Left, 0, 0);
        wb.key_down(ch('w'), KeyModifiers::NONE);
        assert_eq!(wb.state(), InteractionState::MaskSelection);
        assert!(wb.session().prompts().is_empty());
    }

    #[test]
    fn test_unbound_and_suppressed_keys() {
        let mut wb = workbench(&AppConfig::new());
        assert_eq!(wb.key_down(ch('q'), KeyModifiers::NONE), DispatchOutcome::Unregistered);
        assert!(!wb.click(MouseButton::Middle, 0, 0));

        wb.click(MouseButton::Left, 0, 0);
        let typing = wb
            .key_event(ch('r'), KeyModifiers::NONE)
            .from_shortcut_free_target();
        assert_eq!(wb.dispatch(&typing), DispatchOutcome::Suppressed);
        assert_eq!(wb.session().data().masks.len(), 2);
    }

    #[test]
    fn test_same_event_dispatched_once() {
        let mut wb = workbench(&AppConfig::new());
        wb.click(MouseButton::Left, 0, 0);
        wb.session_mut().record_data().unwrap();
        wb.session_mut().remove_selected_masks().unwrap();
        assert_eq!(wb.session().history().undo_count(), 2);

        let undo = wb.key_event(ch('z'), KeyModifiers::CTRL);
        assert_eq!(wb.dispatch(&undo), DispatchOutcome::Handled);
        assert_eq!(wb.dispatch(&undo), DispatchOutcome::AlreadyClaimed);
        assert_eq!(wb.session().history().undo_count(), 1);
    }

    #[test]
    fn test_configured_bindings_override_defaults() {
        let mut config = AppConfig::new();
        config.shortcuts.push(ShortcutBinding::new(
            InteractionState::MaskSelection,
            KeyCombo::key(ch('r')),
            ShortcutAction::ClearSelection,
        ));
        let mut wb = workbench(&config);

        wb.click(MouseButton::Left, 0, 0);
        wb.key_down(ch('r'), KeyModifiers::NONE);
        assert_eq!(wb.session().data().masks.len(), 2);
        assert!(wb.session().selected_masks().is_empty());
    }

    #[test]
    fn test_perform_matches_shortcut() {
        let mut wb = workbench(&AppConfig::new());
        wb.perform(ShortcutAction::EnterMaskCreation);
        assert_eq!(wb.state(), InteractionState::MaskCreation);
        wb.perform(ShortcutAction::ExitMaskCreation);
        assert_eq!(wb.state(), InteractionState::MaskSelection);

        // Nothing to undo is not an error
        wb.perform(ShortcutAction::Undo);
        assert!(!wb.session().can_redo());
    }

    #[test]
    fn test_host_requests_are_queued() {
        let mut wb = workbench(&AppConfig::new());
        assert_eq!(wb.key_down(ch('d'), KeyModifiers::NONE), DispatchOutcome::Handled);
        assert_eq!(wb.key_down(ch('c'), KeyModifiers::NONE), DispatchOutcome::Handled);
        assert_eq!(
            wb.take_requests(),
            vec![ShortcutAction::NextImage, ShortcutAction::ToggleCategorySelector]
        );
        assert!(wb.take_requests().is_empty());

        // Space only matters in creation mode, and only with prompts placed
        assert_eq!(wb.key_down(Key::Space, KeyModifiers::NONE), DispatchOutcome::Unbound);
        wb.key_down(ch('w'), KeyModifiers::NONE);
        wb.key_down(Key::Space, KeyModifiers::NONE);
        assert!(wb.take_requests().is_empty());

        wb.click(MouseButton::Left, 1, 1);
        wb.key_down(Key::Space, KeyModifiers::NONE);
        wb.key_down(ch('a'), KeyModifiers::NONE);
        assert_eq!(
            wb.take_requests(),
            vec![ShortcutAction::ConfirmPrompt, ShortcutAction::PrevImage]
        );
        // Prompts stay until the backend answers with a mask
        assert_eq!(wb.session().prompts().len(), 1);
    }

    #[test]
    fn test_shortcut_for_follows_mode() {
        let mut wb = workbench(&AppConfig::new());
        let r = KeyCombo::key(ch('r'));
        assert_eq!(wb.shortcut_for(&r), Some(ShortcutAction::RemoveSelected));
        wb.key_down(ch('w'), KeyModifiers::NONE);
        assert_eq!(wb.shortcut_for(&r), Some(ShortcutAction::ResetPrompts));
        assert_eq!(wb.shortcut_for(&KeyCombo::key(ch('q'))), None);
    }

    #[test]
    fn test_unknown_category_at_startup_is_unlabelled() {
        let mut data = AnnotationData::default();
        data.add_mask(Mask::from_rle(0, 5, 4, 2, vec![0, 2, 2, 2, 2]));
        let mut wb = Workbench::new(&AppConfig::new(), data, CategoryInfo::default()).unwrap();
        assert!(wb.session().data().masks[0].is_unlabelled());

        wb.click(MouseButton::Left, 0, 0);
        wb.key_down(ch('r'), KeyModifiers::NONE);
        assert!(wb.session().data().masks.is_empty());
        wb.key_down(ch('z'), KeyModifiers::CTRL);
        assert_eq!(wb.session().data().masks.len(), 1);
    }

    #[test]
    fn test_open_image_resets_mode_and_history() {
        let mut wb = workbench(&AppConfig::new());
        wb.click(MouseButton::Left, 0, 0);
        wb.key_down(ch('r'), KeyModifiers::NONE);
        wb.key_down(ch('w'), KeyModifiers::NONE);
        assert!(wb.session().can_undo());

        wb.open_image(AnnotationData {
            image_name: "next.jpg".to_string(),
            ..Default::default()
        });
        assert_eq!(wb.state(), InteractionState::MaskSelection);
        assert!(!wb.session().can_undo());
        assert!(wb.session().data().masks.is_empty());
    }
}
