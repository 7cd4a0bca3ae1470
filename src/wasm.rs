//! Browser entry point.
//!
//! One document-level `keydown` listener feeds every key press into the
//! workbench. Elements carrying the `no-shortcuts` attribute (text inputs,
//! label editors) keep their key presses to themselves.
//!
//! Shortcuts the page itself must act on (image navigation, prompt
//! confirmation, the category selector) are collected as requests; the page
//! drains them with `take_requests` after each key press or click.

use std::cell::RefCell;

use coralseg_ui::{DispatchOutcome, Key, KeyCombo, KeyModifiers, MouseButton};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::app::Workbench;
use crate::config::AppConfig;
use crate::constants::NO_SHORTCUTS_ATTRIBUTE;
use crate::keybindings::ShortcutAction;
use crate::model::{AnnotationData, CategoryInfo};

thread_local! {
    static WORKBENCH: RefCell<Option<Workbench>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let config = AppConfig::load_from_local_storage().unwrap_or_default();
    let level = config
        .preferences
        .log_level
        .to_level()
        .unwrap_or(log::Level::Error);
    if let Err(e) = console_log::init_with_level(level) {
        web_sys::console::log_1(&format!("Logger already set: {}", e).into());
    }

    let workbench = Workbench::new(&config, AnnotationData::default(), CategoryInfo::default())
        .map_err(to_js_error)?;
    WORKBENCH.with(|slot| *slot.borrow_mut() = Some(workbench));

    install_keydown_listener()?;
    log::info!("coralseg started");
    Ok(())
}

fn install_keydown_listener() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("No document available"))?;

    let listener = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(on_keydown);
    document.add_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref())?;
    // The listener lives as long as the page.
    listener.forget();
    Ok(())
}

fn on_keydown(event: web_sys::KeyboardEvent) {
    let Some(key) = Key::from_dom_key(&event.key()) else {
        return;
    };
    let modifiers = KeyModifiers {
        shift: event.shift_key(),
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        meta: event.meta_key(),
    };
    let suppressed = event
        .target()
        .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
        .is_some_and(|element| element.has_attribute(NO_SHORTCUTS_ATTRIBUTE));

    let outcome = with_workbench(|workbench| {
        let mut key_event = workbench.key_event(key, modifiers);
        if suppressed {
            key_event = key_event.from_shortcut_free_target();
        }
        workbench.dispatch(&key_event)
    });

    if outcome.is_some_and(DispatchOutcome::prevent_default) {
        event.prevent_default();
    }
}

fn with_workbench<R>(f: impl FnOnce(&mut Workbench) -> R) -> Option<R> {
    WORKBENCH.with(|slot| slot.borrow_mut().as_mut().map(f))
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn not_started() -> JsValue {
    JsValue::from_str("coralseg has not been started")
}

/// Open an image from the backend's image payload, optionally together with
/// the category list its masks use.
#[wasm_bindgen]
pub fn open_image(response_json: &str, categories_json: Option<String>) -> Result<(), JsValue> {
    let data = AnnotationData::from_response(response_json).map_err(to_js_error)?;
    let categories = categories_json
        .map(|json| serde_json::from_str::<CategoryInfo>(&json))
        .transpose()
        .map_err(to_js_error)?;
    with_workbench(|workbench| match categories {
        Some(categories) => workbench.open_image_with_categories(data, categories),
        None => workbench.open_image(data),
    })
    .ok_or_else(not_started)
}

/// Requests raised since the last call, as a JSON array of action names.
#[wasm_bindgen]
pub fn take_requests() -> Result<String, JsValue> {
    let requests = with_workbench(|workbench| workbench.take_requests()).unwrap_or_default();
    serde_json::to_string(&requests).map_err(to_js_error)
}

/// Description of what `combo` does in the current mode, for tooltips.
#[wasm_bindgen]
pub fn shortcut_description(combo: &str) -> Result<Option<String>, JsValue> {
    let combo = KeyCombo::parse(combo).map_err(to_js_error)?;
    Ok(with_workbench(|workbench| workbench.shortcut_for(&combo))
        .flatten()
        .map(|action| action.description().to_string()))
}

/// Replace the category list. This is an undoable edit.
#[wasm_bindgen]
pub fn set_categories(categories_json: &str) -> Result<(), JsValue> {
    let categories: CategoryInfo = serde_json::from_str(categories_json).map_err(to_js_error)?;
    with_workbench(|workbench| workbench.session_mut().replace_categories(categories))
        .ok_or_else(not_started)?
        .map_err(to_js_error)
}

/// Route a canvas click. `button` follows `MouseEvent.button`.
#[wasm_bindgen]
pub fn click(button: i16, x: u32, y: u32) -> bool {
    let button = match button {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => return false,
    };
    with_workbench(|workbench| workbench.click(button, x, y)).unwrap_or(false)
}

/// Run a toolbar action such as `"undo"` or `"remove_selected"`.
#[wasm_bindgen]
pub fn perform(action: &str) -> Result<(), JsValue> {
    let action: ShortcutAction =
        serde_json::from_value(serde_json::Value::String(action.to_string()))
            .map_err(to_js_error)?;
    with_workbench(|workbench| workbench.perform(action)).ok_or_else(not_started)
}

/// Assign a category to the selected masks.
#[wasm_bindgen]
pub fn label_selected(category_id: i64) -> Result<(), JsValue> {
    with_workbench(|workbench| workbench.session_mut().set_category_for_selected(category_id))
        .ok_or_else(not_started)?
        .map(|_| ())
        .map_err(to_js_error)
}

/// Add a mask to the selection, e.g. from the mask list panel.
#[wasm_bindgen]
pub fn select_mask(id: u64) -> Result<(), JsValue> {
    with_workbench(|workbench| workbench.session_mut().select_mask(id))
        .ok_or_else(not_started)?
        .map_err(to_js_error)
}

/// Category list ordered by id, as JSON.
#[wasm_bindgen]
pub fn categories() -> Result<String, JsValue> {
    with_workbench(|workbench| serde_json::to_string(&workbench.session().categories().to_list()))
        .ok_or_else(not_started)?
        .map_err(to_js_error)
}

/// Current interaction mode tag.
#[wasm_bindgen]
pub fn current_state() -> String {
    with_workbench(|workbench| workbench.state().tag().to_string()).unwrap_or_default()
}

/// COCO annotations of the open image.
#[wasm_bindgen]
pub fn export_coco() -> Result<String, JsValue> {
    with_workbench(|workbench| serde_json::to_string(&workbench.session().data().to_coco()))
        .ok_or_else(not_started)?
        .map_err(to_js_error)
}

/// Persist the configuration to localStorage.
#[wasm_bindgen]
pub fn save_config(config_json: &str) -> Result<(), JsValue> {
    let config = AppConfig::from_json(config_json).map_err(to_js_error)?;
    config.save_to_local_storage().map_err(to_js_error)
}
