use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlButtonElement, HtmlCanvasElement, HtmlElement,
    HtmlInputElement, HtmlVideoElement, MediaStream, PointerEvent, WheelEvent, Window,
};

use traceboard_shared::{
    CameraError, CameraRequest, CameraSession, CameraStatus, ContactEvent, ContactKind,
    ContactPhase, GestureState, ImageError, ImageSource, OverlaySession, Point, Surface,
};

use crate::camera::{
    attach_stream, detach_stream, enumerate_cameras, open_stream, stop_stream, StreamResult,
};
use crate::controls::{
    device_from_event, render_camera_list, setting_from_event, ControlsVisibility, SettingsPanel,
};
use crate::dom::{
    debug_enabled, event_to_point, get_element, is_hidden, set_hidden, set_pressed, set_status,
    viewport_of,
};
use crate::frame_loop::AnimationLoop;
use crate::image::{clear_source, decode, read_upload, store_source, stored_source};
use crate::listeners::ListenerGuard;
use crate::logging;
use crate::surface::{CanvasSurface, OverlayBitmap};

const TRACE_HASH: &str = "#trace";

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

struct Elements {
    document: Document,
    picker: HtmlElement,
    upload_input: HtmlInputElement,
    trace_view: HtmlElement,
    video: HtmlVideoElement,
    canvas: HtmlCanvasElement,
    controls: HtmlElement,
    settings_button: HtmlButtonElement,
    settings_panel: HtmlElement,
    camera_button: HtmlButtonElement,
    flip_button: HtmlButtonElement,
    devices_button: HtmlButtonElement,
    device_list: HtmlElement,
    replace_input: HtmlInputElement,
    reset_button: HtmlButtonElement,
    exit_button: HtmlButtonElement,
    status: Element,
}

impl Elements {
    fn lookup(document: &Document) -> Result<Self, JsValue> {
        Ok(Self {
            document: document.clone(),
            picker: get_element(document, "picker")?,
            upload_input: get_element(document, "image-upload")?,
            trace_view: get_element(document, "trace-view")?,
            video: get_element(document, "camera-feed")?,
            canvas: get_element(document, "overlay-canvas")?,
            controls: get_element(document, "controls")?,
            settings_button: get_element(document, "settings-button")?,
            settings_panel: get_element(document, "settings-panel")?,
            camera_button: get_element(document, "camera-button")?,
            flip_button: get_element(document, "flip-button")?,
            devices_button: get_element(document, "devices-button")?,
            device_list: get_element(document, "device-list")?,
            replace_input: get_element(document, "replace-upload")?,
            reset_button: get_element(document, "reset-button")?,
            exit_button: get_element(document, "exit-button")?,
            status: get_element(document, "status")?,
        })
    }

    fn show_picker(&self) {
        set_hidden(&self.trace_view, true);
        set_hidden(&self.picker, false);
    }

    fn show_trace_view(&self) {
        set_hidden(&self.picker, true);
        set_hidden(&self.trace_view, false);
    }

    fn sync_camera_buttons(&self, camera: &CameraSession) {
        let active = camera.is_active();
        set_pressed(&self.camera_button, active);
        self.flip_button.set_disabled(!active);
        self.devices_button.set_disabled(camera.devices().is_empty());
    }
}

struct Tracer {
    session: OverlaySession<OverlayBitmap>,
    surface: CanvasSurface,
    panel: SettingsPanel,
    camera: CameraSession,
    stream: Option<MediaStream>,
    camera_generation: u32,
}

impl Tracer {
    fn sync_panel(&self) {
        self.panel.sync(self.session.transform());
    }

    fn release_stream(&mut self, video: &HtmlVideoElement) {
        if let Some(stream) = self.stream.take() {
            stop_stream(&stream);
            detach_stream(video);
        }
    }
}

/// Drives the camera of a mounted view. Completions that arrive after the
/// view was torn down, or after a newer request, stop their stream at once.
#[derive(Clone)]
struct CameraHandle {
    window: Window,
    elements: Rc<Elements>,
    tracer: Weak<RefCell<Tracer>>,
    frames: AnimationLoop,
}

impl CameraHandle {
    fn start(&self, request: CameraRequest) {
        let Some(tracer) = self.tracer.upgrade() else {
            return;
        };
        let generation = {
            let mut tracer = tracer.borrow_mut();
            tracer.release_stream(&self.elements.video);
            tracer.camera_generation = tracer.camera_generation.wrapping_add(1);
            tracer.camera.starting();
            tracer.session.set_camera_active(false);
            self.elements.sync_camera_buttons(&tracer.camera);
            tracer.camera_generation
        };
        set_status(&self.elements.status, "busy", "Starting camera...");
        self.frames.request();

        let handle = self.clone();
        open_stream(&self.window, request, move |result| {
            handle.on_stream(generation, result);
        });
    }

    fn on_stream(&self, generation: u32, result: StreamResult) {
        let tracer = match self.tracer.upgrade() {
            Some(tracer) if tracer.borrow().camera_generation == generation => tracer,
            _ => {
                if let Ok((stream, _)) = &result {
                    tracing::debug!("discarding stale camera stream");
                    stop_stream(stream);
                }
                return;
            }
        };
        let (stream, granted) = match result {
            Ok(opened) => opened,
            Err(error) => return self.on_failure(generation, error),
        };
        {
            let mut tracer = tracer.borrow_mut();
            tracer.stream = Some(stream.clone());
            tracer.camera.started(&granted);
            tracer.session.set_camera_active(true);
            self.elements.sync_camera_buttons(&tracer.camera);
        }
        set_status(&self.elements.status, "ready", "");
        self.frames.request();

        let failed = self.clone();
        attach_stream(&self.elements.video, &stream, move |error| {
            failed.on_failure(generation, error);
        });
        self.refresh_devices();
    }

    fn on_failure(&self, generation: u32, error: CameraError) {
        let Some(tracer) = self.tracer.upgrade() else {
            return;
        };
        {
            let mut tracer = tracer.borrow_mut();
            if tracer.camera_generation != generation {
                return;
            }
            tracer.release_stream(&self.elements.video);
            tracer.camera.failed(error.clone());
            tracer.session.set_camera_active(false);
            self.elements.sync_camera_buttons(&tracer.camera);
        }
        set_status(&self.elements.status, "error", &error.to_string());
        self.frames.request();
    }

    fn stop(&self) {
        let Some(tracer) = self.tracer.upgrade() else {
            return;
        };
        let mut tracer = tracer.borrow_mut();
        tracer.camera_generation = tracer.camera_generation.wrapping_add(1);
        tracer.release_stream(&self.elements.video);
        tracer.camera.stopped();
        tracer.session.set_camera_active(false);
        self.elements.sync_camera_buttons(&tracer.camera);
        drop(tracer);
        set_status(&self.elements.status, "ready", "");
        self.frames.request();
    }

    fn refresh_devices(&self) {
        let handle = self.clone();
        enumerate_cameras(&self.window, move |devices| {
            let Some(tracer) = handle.tracer.upgrade() else {
                return;
            };
            let mut tracer = tracer.borrow_mut();
            tracer.camera.set_devices(devices);
            render_camera_list(
                &handle.elements.document,
                &handle.elements.device_list,
                tracer.camera.devices(),
                tracer.camera.current_device_id(),
            );
            handle.elements.sync_camera_buttons(&tracer.camera);
        });
    }

    /// Enumerates first so a labelled rear camera can be picked directly.
    fn start_preferred(&self) {
        let handle = self.clone();
        enumerate_cameras(&self.window, move |devices| {
            let Some(tracer) = handle.tracer.upgrade() else {
                return;
            };
            let request = {
                let mut tracer = tracer.borrow_mut();
                tracer.camera.set_devices(devices);
                tracer.camera.initial_request()
            };
            handle.start(request);
        });
    }
}

struct Host {
    tracer: Rc<RefCell<Tracer>>,
    frames: AnimationLoop,
    camera: CameraHandle,
    visibility: Rc<ControlsVisibility>,
    listeners: ListenerGuard,
}

type HostSlot = Rc<RefCell<Option<Host>>>;

impl Host {
    fn mount(
        window: &Window,
        elements: &Rc<Elements>,
        slot: &HostSlot,
        image: OverlayBitmap,
    ) -> Result<Self, JsValue> {
        elements.show_trace_view();
        let _ = window.location().set_hash(TRACE_HASH);

        let viewport = viewport_of(&elements.canvas);
        let surface = CanvasSurface::new(elements.canvas.clone(), window.device_pixel_ratio())?;
        let panel = SettingsPanel::new(&elements.document)?;
        let mut session = OverlaySession::new(viewport);
        session.load_image(image);
        let tracer = Rc::new(RefCell::new(Tracer {
            session,
            surface,
            panel,
            camera: CameraSession::new(),
            stream: None,
            camera_generation: 0,
        }));
        tracer.borrow().sync_panel();

        let frames = AnimationLoop::new(window.clone());
        let tick_tracer = tracer.clone();
        frames.set_tick(move || {
            let mut tracer = tick_tracer.borrow_mut();
            let Tracer {
                session, surface, ..
            } = &mut *tracer;
            let _ = session.render_tick(surface);
            session.wants_frame()
        });

        let camera = CameraHandle {
            window: window.clone(),
            elements: elements.clone(),
            tracer: Rc::downgrade(&tracer),
            frames: frames.clone(),
        };
        let visibility = Rc::new(ControlsVisibility::new(
            window.clone(),
            elements.controls.clone(),
        ));

        let mut host = Host {
            tracer,
            frames,
            camera,
            visibility,
            listeners: ListenerGuard::new(),
        };
        host.wire(window, elements, slot)?;
        tracing::info!(listeners = host.listeners.len(), "tracing view mounted");

        set_hidden(&elements.settings_panel, true);
        set_hidden(&elements.device_list, true);
        host.visibility.show();
        host.frames.request();
        host.camera.start_preferred();
        Ok(host)
    }

    fn wire(
        &mut self,
        window: &Window,
        elements: &Rc<Elements>,
        slot: &HostSlot,
    ) -> Result<(), JsValue> {
        let canvas = &elements.canvas;

        {
            let tracer = self.tracer.clone();
            let frames = self.frames.clone();
            let visibility = self.visibility.clone();
            let canvas_cb = canvas.clone();
            self.listeners
                .listen_active(canvas, "pointerdown", move |event: Event| {
                    let Ok(event) = event.dyn_into::<PointerEvent>() else {
                        return;
                    };
                    let kind = ContactKind::from_pointer_type(&event.pointer_type());
                    if kind == ContactKind::Mouse && event.button() != 0 {
                        return;
                    }
                    event.prevent_default();
                    visibility.show();
                    let Some(point) = event_to_point(&canvas_cb, &event) else {
                        return;
                    };
                    let _ = canvas_cb.set_pointer_capture(event.pointer_id());
                    let contact =
                        ContactEvent::new(ContactPhase::Start, event.pointer_id(), kind, point);
                    dispatch_contact(&tracer, &frames, contact);
                })?;
        }

        {
            let tracer = self.tracer.clone();
            let frames = self.frames.clone();
            let canvas_cb = canvas.clone();
            self.listeners
                .listen_active(canvas, "pointermove", move |event: Event| {
                    let Ok(event) = event.dyn_into::<PointerEvent>() else {
                        return;
                    };
                    if *tracer.borrow().session.gesture() == GestureState::Idle {
                        return;
                    }
                    event.prevent_default();
                    let Some(point) = event_to_point(&canvas_cb, &event) else {
                        return;
                    };
                    let kind = ContactKind::from_pointer_type(&event.pointer_type());
                    let contact =
                        ContactEvent::new(ContactPhase::Move, event.pointer_id(), kind, point);
                    dispatch_contact(&tracer, &frames, contact);
                })?;
        }

        for (kind_name, phase) in [
            ("pointerup", ContactPhase::End),
            ("pointercancel", ContactPhase::Cancel),
            ("lostpointercapture", ContactPhase::Cancel),
        ] {
            let tracer = self.tracer.clone();
            let frames = self.frames.clone();
            let canvas_cb = canvas.clone();
            self.listeners.listen(canvas, kind_name, move |event: Event| {
                let Ok(event) = event.dyn_into::<PointerEvent>() else {
                    return;
                };
                let point =
                    event_to_point(&canvas_cb, &event).unwrap_or_else(|| Point::new(0.0, 0.0));
                let kind = ContactKind::from_pointer_type(&event.pointer_type());
                let contact = ContactEvent::new(phase, event.pointer_id(), kind, point);
                dispatch_contact(&tracer, &frames, contact);
            })?;
        }

        {
            let tracer = self.tracer.clone();
            let frames = self.frames.clone();
            self.listeners
                .listen_active(canvas, "wheel", move |event: Event| {
                    let Ok(event) = event.dyn_into::<WheelEvent>() else {
                        return;
                    };
                    event.prevent_default();
                    let mut tracer = tracer.borrow_mut();
                    if tracer.session.handle_wheel(event.delta_y()) {
                        tracer.sync_panel();
                        drop(tracer);
                        frames.request();
                    }
                })?;
        }

        {
            let tracer = self.tracer.clone();
            let frames = self.frames.clone();
            let canvas_cb = canvas.clone();
            let window_cb = window.clone();
            self.listeners.listen(window, "resize", move |_| {
                let mut tracer = tracer.borrow_mut();
                tracer
                    .surface
                    .set_device_pixel_ratio(window_cb.device_pixel_ratio());
                tracer.session.resize(viewport_of(&canvas_cb));
                drop(tracer);
                frames.request();
            })?;
        }

        {
            let tracer = self.tracer.clone();
            let frames = self.frames.clone();
            self.listeners
                .listen(&elements.settings_panel, "input", move |event: Event| {
                    let Some((setting, value)) = setting_from_event(&event) else {
                        return;
                    };
                    let mut tracer = tracer.borrow_mut();
                    tracer.session.apply_setting(setting, value);
                    tracer.sync_panel();
                    drop(tracer);
                    frames.request();
                })?;
        }

        {
            let panel = elements.settings_panel.clone();
            let button = elements.settings_button.clone();
            self.listeners
                .listen(&elements.settings_button, "click", move |_| {
                    let open = is_hidden(&panel);
                    set_hidden(&panel, !open);
                    set_pressed(&button, open);
                })?;
        }

        {
            let tracer = self.tracer.clone();
            let frames = self.frames.clone();
            self.listeners
                .listen(&elements.reset_button, "click", move |_| {
                    let mut tracer = tracer.borrow_mut();
                    tracer.session.cancel_gesture();
                    tracer.session.reset();
                    tracer.sync_panel();
                    drop(tracer);
                    frames.request();
                })?;
        }

        {
            let tracer = self.tracer.clone();
            let camera = self.camera.clone();
            self.listeners
                .listen(&elements.camera_button, "click", move |_| {
                    let running = {
                        let tracer = tracer.borrow();
                        !matches!(
                            tracer.camera.status(),
                            CameraStatus::Inactive | CameraStatus::Failed(_)
                        )
                    };
                    if running {
                        camera.stop();
                    } else {
                        let request = tracer.borrow().camera.initial_request();
                        camera.start(request);
                    }
                })?;
        }

        {
            let tracer = self.tracer.clone();
            let camera = self.camera.clone();
            self.listeners
                .listen(&elements.flip_button, "click", move |_| {
                    let request = tracer.borrow_mut().camera.switch_request();
                    tracing::info!(?request, "switching camera");
                    camera.start(request);
                })?;
        }

        {
            let list = elements.device_list.clone();
            self.listeners
                .listen(&elements.devices_button, "click", move |_| {
                    let open = is_hidden(&list);
                    set_hidden(&list, !open);
                })?;
        }

        {
            let camera = self.camera.clone();
            let list = elements.device_list.clone();
            self.listeners
                .listen(&elements.device_list, "click", move |event: Event| {
                    let Some(device_id) = device_from_event(&event) else {
                        return;
                    };
                    set_hidden(&list, true);
                    camera.start(CameraRequest::Device(device_id));
                })?;
        }

        {
            let slot_weak = Rc::downgrade(slot);
            let window_cb = window.clone();
            let elements_cb = elements.clone();
            self.listeners
                .listen(&elements.replace_input, "change", move |_| {
                    let slot = slot_weak.clone();
                    let window = window_cb.clone();
                    let elements = elements_cb.clone();
                    take_upload(
                        &window_cb,
                        &elements_cb,
                        &elements_cb.replace_input,
                        move |image| {
                            if let Some(slot) = slot.upgrade() {
                                mount_or_replace(&window, &elements, &slot, image);
                            }
                        },
                    );
                })?;
        }

        {
            let slot = Rc::downgrade(slot);
            let window_cb = window.clone();
            let elements_cb = elements.clone();
            self.listeners
                .listen(&elements.exit_button, "click", move |_| {
                    let slot = slot.clone();
                    let elements = elements_cb.clone();
                    let window = window_cb.clone();
                    // the click listener itself is released by the teardown
                    let teardown = Closure::once_into_js(move || {
                        if let Some(slot) = slot.upgrade() {
                            exit_trace(&window, &elements, &slot);
                        }
                    });
                    let _ = window_cb.set_timeout_with_callback_and_timeout_and_arguments_0(
                        teardown.unchecked_ref(),
                        0,
                    );
                })?;
        }

        Ok(())
    }

    fn replace_image(&self, image: OverlayBitmap) {
        let mut tracer = self.tracer.borrow_mut();
        tracer.session.load_image(image);
        tracer.sync_panel();
        drop(tracer);
        self.frames.request();
    }

    fn teardown(mut self) {
        self.frames.stop();
        self.camera.stop();
        self.visibility.cancel();
        self.listeners.release();
        let mut tracer = self.tracer.borrow_mut();
        tracer.session.cancel_gesture();
        let _ = tracer.session.take_image();
        tracer.surface.clear();
        tracing::info!("tracing view closed");
    }
}

fn dispatch_contact(tracer: &Rc<RefCell<Tracer>>, frames: &AnimationLoop, contact: ContactEvent) {
    let mut tracer = tracer.borrow_mut();
    if tracer.session.handle_contact(contact) {
        tracer.sync_panel();
        drop(tracer);
        frames.request();
    }
}

fn exit_trace(window: &Window, elements: &Rc<Elements>, slot: &HostSlot) {
    let host = slot.borrow_mut().take();
    if let Some(host) = host {
        host.teardown();
    }
    let _ = window.location().set_hash("");
    set_status(&elements.status, "ready", "");
    elements.show_picker();
}

fn take_upload<F>(window: &Window, elements: &Rc<Elements>, input: &HtmlInputElement, on_image: F)
where
    F: FnOnce(OverlayBitmap) + 'static,
{
    let Some(file) = input.files().and_then(|files| files.get(0)) else {
        return;
    };
    input.set_value("");
    set_status(&elements.status, "busy", "Loading image...");

    let window_cb = window.clone();
    let elements_cb = elements.clone();
    let started = read_upload(&file, move |result| {
        let data_url = match result {
            Ok(data_url) => data_url,
            Err(error) => {
                set_status(&elements_cb.status, "error", &error.to_string());
                return;
            }
        };
        let window = window_cb.clone();
        let elements = elements_cb.clone();
        let source = ImageSource::DataUrl(data_url.clone());
        let decoded = decode(&source, move |result| match result {
            Ok(image) => {
                store_source(&window, &data_url);
                set_status(&elements.status, "ready", "");
                on_image(image);
            }
            Err(error) => set_status(&elements.status, "error", &error.to_string()),
        });
        if let Err(error) = decoded {
            tracing::error!(?error, "image element unavailable");
        }
    });
    if let Err(error) = started {
        tracing::error!(?error, "file reader unavailable");
        set_status(&elements.status, "error", &ImageError::ReadFailed.to_string());
    }
}

fn mount_or_replace(window: &Window, elements: &Rc<Elements>, slot: &HostSlot, image: OverlayBitmap) {
    if let Some(host) = slot.borrow().as_ref() {
        host.replace_image(image);
        return;
    }
    match Host::mount(window, elements, slot, image) {
        Ok(host) => {
            *slot.borrow_mut() = Some(host);
        }
        Err(error) => {
            web_sys::console::error_1(&error);
            set_status(&elements.status, "error", "Failed to open the tracing view");
            elements.show_picker();
        }
    }
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    logging::init(debug_enabled(&window));
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let elements = Rc::new(Elements::lookup(&document)?);
    let slot: HostSlot = Rc::new(RefCell::new(None));

    {
        let window_cb = window.clone();
        let elements_cb = elements.clone();
        let slot_cb = slot.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            let window = window_cb.clone();
            let elements = elements_cb.clone();
            let slot = slot_cb.clone();
            take_upload(
                &window_cb,
                &elements_cb,
                &elements_cb.upload_input,
                move |image| mount_or_replace(&window, &elements, &slot, image),
            );
        });
        elements
            .upload_input
            .add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    let wants_trace = window.location().hash().ok().as_deref() == Some(TRACE_HASH);
    match stored_source(&window).filter(|_| wants_trace) {
        Some(source) => {
            tracing::info!("restoring stored overlay");
            set_status(&elements.status, "busy", "Loading image...");
            let window_cb = window.clone();
            let elements_cb = elements.clone();
            let slot_cb = slot.clone();
            decode(&source, move |result| match result {
                Ok(image) => {
                    set_status(&elements_cb.status, "ready", "");
                    mount_or_replace(&window_cb, &elements_cb, &slot_cb, image);
                }
                Err(error) => {
                    tracing::warn!(%error, "stored overlay could not be decoded");
                    clear_source(&window_cb);
                    set_status(&elements_cb.status, "error", &error.to_string());
                    let _ = window_cb.location().set_hash("");
                    elements_cb.show_picker();
                }
            })?;
        }
        None => elements.show_picker(),
    }

    tracing::debug!("traceboard ready");
    Ok(())
}
