use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlElement, HtmlInputElement, Window};

use traceboard_shared::settings::ALL_SETTINGS;
use traceboard_shared::{CameraDevice, Setting, TransformState};

use crate::dom::{get_element, set_hidden};

pub const CONTROLS_HIDE_MS: i32 = 3000;

struct SliderRow {
    setting: Setting,
    input: HtmlInputElement,
    label: Element,
}

pub struct SettingsPanel {
    rows: Vec<SliderRow>,
}

impl SettingsPanel {
    pub fn new(document: &Document) -> Result<Self, JsValue> {
        let mut rows = Vec::with_capacity(ALL_SETTINGS.len());
        for setting in ALL_SETTINGS {
            let input: HtmlInputElement =
                get_element(document, &format!("setting-{}", setting.name()))?;
            let label: Element =
                get_element(document, &format!("setting-{}-label", setting.name()))?;
            let range = setting.slider();
            input.set_min(&range.min.to_string());
            input.set_max(&range.max.to_string());
            input.set_step(&range.step.to_string());
            let _ = input.set_attribute("data-setting", setting.name());
            rows.push(SliderRow {
                setting,
                input,
                label,
            });
        }
        Ok(Self { rows })
    }

    pub fn sync(&self, state: &TransformState) {
        for row in &self.rows {
            let value = row.setting.read(state);
            row.input.set_value(&value.to_string());
            row.label
                .set_text_content(Some(&row.setting.label(state)));
        }
    }
}

pub fn setting_from_event(event: &Event) -> Option<(Setting, f64)> {
    let input = event
        .target()
        .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())?;
    let name = input.get_attribute("data-setting")?;
    let parsed = name
        .parse::<Setting>()
        .and_then(|setting| Ok((setting, setting.parse_value(&input.value())?)));
    match parsed {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            tracing::debug!(%error, "slider input ignored");
            None
        }
    }
}

pub fn render_camera_list(
    document: &Document,
    list_el: &HtmlElement,
    devices: &[CameraDevice],
    current: Option<&str>,
) {
    list_el.set_inner_html("");
    for (index, device) in devices.iter().enumerate() {
        let Ok(element) = document.create_element("button") else {
            continue;
        };
        let Ok(button) = element.dyn_into::<HtmlButtonElement>() else {
            continue;
        };
        let _ = button.set_attribute("type", "button");
        let _ = button.set_attribute("data-device-id", &device.device_id);
        let class_name = if current == Some(device.device_id.as_str()) {
            "camera-option active"
        } else {
            "camera-option"
        };
        let _ = button.set_attribute("class", class_name);
        let label = if device.label.is_empty() {
            format!("Camera {}", index + 1)
        } else {
            device.label.clone()
        };
        button.set_text_content(Some(&label));
        let _ = list_el.append_child(&button);
    }
}

pub fn device_from_event(event: &Event) -> Option<String> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if let Some(device_id) = element.get_attribute("data-device-id") {
            return Some(device_id);
        }
        current = element.parent_element();
    }
    None
}

pub struct ControlsVisibility {
    window: Window,
    controls: HtmlElement,
    timer: Rc<Cell<Option<i32>>>,
    on_timeout: Closure<dyn FnMut()>,
}

impl ControlsVisibility {
    pub fn new(window: Window, controls: HtmlElement) -> Self {
        let timer = Rc::new(Cell::new(None));
        let hide_timer = timer.clone();
        let hide_controls = controls.clone();
        let on_timeout = Closure::<dyn FnMut()>::new(move || {
            hide_timer.set(None);
            set_hidden(&hide_controls, true);
        });
        Self {
            window,
            controls,
            timer,
            on_timeout,
        }
    }

    pub fn show(&self) {
        set_hidden(&self.controls, false);
        self.cancel();
        match self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            self.on_timeout.as_ref().unchecked_ref(),
            CONTROLS_HIDE_MS,
        ) {
            Ok(handle) => self.timer.set(Some(handle)),
            Err(error) => tracing::warn!(?error, "controls timer failed"),
        }
    }

    pub fn cancel(&self) {
        if let Some(handle) = self.timer.take() {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

impl Drop for ControlsVisibility {
    fn drop(&mut self) {
        self.cancel();
    }
}
