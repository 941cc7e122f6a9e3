use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, PointerEvent, Storage, Window};

use traceboard_shared::{normalize_point, Point, Viewport};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1")
        || search.contains("debug=true")
        || search.contains("log=1")
        || search.contains("log=true")
}

pub fn set_pressed(button: &Element, active: bool) {
    let pressed = if active { "true" } else { "false" };
    let _ = button.set_attribute("aria-pressed", pressed);
}

pub fn set_hidden(element: &Element, hidden: bool) {
    let _ = element.class_list().toggle_with_force("hidden", hidden);
}

pub fn is_hidden(element: &Element) -> bool {
    element.class_list().contains("hidden")
}

pub fn set_status(status_el: &Element, state: &str, text: &str) {
    let _ = status_el.set_attribute("data-state", state);
    status_el.set_text_content(Some(text));
    set_hidden(status_el, text.is_empty());
}

pub fn viewport_of(canvas: &HtmlCanvasElement) -> Viewport {
    let rect = canvas.get_bounding_client_rect();
    Viewport::new(rect.width(), rect.height())
}

pub fn event_to_point(canvas: &HtmlCanvasElement, event: &PointerEvent) -> Option<Point> {
    let rect = canvas.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    normalize_point(Point::new(
        event.client_x() as f64 - rect.left(),
        event.client_y() as f64 - rect.top(),
    ))
}

pub fn session_storage(window: &Window) -> Option<Storage> {
    window.session_storage().ok().flatten()
}

pub fn local_storage(window: &Window) -> Option<Storage> {
    window.local_storage().ok().flatten()
}

pub fn stored_item(window: &Window, key: &str) -> Option<String> {
    [session_storage(window), local_storage(window)]
        .into_iter()
        .flatten()
        .find_map(|storage| storage.get_item(key).ok().flatten())
}

pub fn store_item(window: &Window, key: &str, value: &str) {
    for storage in [session_storage(window), local_storage(window)]
        .into_iter()
        .flatten()
    {
        if let Err(error) = storage.set_item(key, value) {
            tracing::warn!(key, ?error, "failed to persist item");
        }
    }
}

pub fn remove_item(window: &Window, key: &str) {
    for storage in [session_storage(window), local_storage(window)]
        .into_iter()
        .flatten()
    {
        let _ = storage.remove_item(key);
    }
}
