use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    DomException, HtmlVideoElement, MediaDeviceInfo, MediaDeviceKind, MediaDevices, MediaStream,
    MediaStreamConstraints, MediaStreamTrack, Window,
};

use traceboard_shared::{CameraDevice, CameraError, CameraRequest};

pub type StreamResult = Result<(MediaStream, CameraRequest), CameraError>;

fn media_devices(window: &Window) -> Result<MediaDevices, CameraError> {
    let navigator = window.navigator();
    let present = Reflect::get(navigator.as_ref(), &JsValue::from_str("mediaDevices"))
        .map(|value| !value.is_undefined() && !value.is_null())
        .unwrap_or(false);
    if !present {
        return Err(CameraError::Unsupported);
    }
    navigator
        .media_devices()
        .map_err(|_| CameraError::Unsupported)
}

pub fn classify_error(error: &JsValue) -> CameraError {
    if let Some(exception) = error.dyn_ref::<DomException>() {
        return CameraError::from_dom_name(&exception.name(), &exception.message());
    }
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return CameraError::from_dom_name(
            &String::from(error.name()),
            &String::from(error.message()),
        );
    }
    CameraError::from_dom_name("", &error.as_string().unwrap_or_default())
}

fn build_constraints(request: &CameraRequest) -> Result<MediaStreamConstraints, CameraError> {
    let json = serde_json::to_string(&request.constraints())
        .map_err(|error| CameraError::Other(error.to_string()))?;
    let value = js_sys::JSON::parse(&json)
        .map_err(|_| CameraError::Other("Invalid camera constraints".to_string()))?;
    Ok(value.unchecked_into::<MediaStreamConstraints>())
}

/// Opens a stream for `request`, retrying with the request's fallback when
/// the browser rejects it. `on_done` runs exactly once.
pub fn open_stream<F>(window: &Window, request: CameraRequest, on_done: F)
where
    F: FnOnce(StreamResult) + 'static,
{
    let on_done: Rc<RefCell<Option<Box<dyn FnOnce(StreamResult)>>>> =
        Rc::new(RefCell::new(Some(Box::new(on_done))));
    request_stream(window.clone(), request, on_done);
}

fn finish(on_done: &Rc<RefCell<Option<Box<dyn FnOnce(StreamResult)>>>>, result: StreamResult) {
    if let Some(callback) = on_done.borrow_mut().take() {
        callback(result);
    }
}

fn request_stream(
    window: Window,
    request: CameraRequest,
    on_done: Rc<RefCell<Option<Box<dyn FnOnce(StreamResult)>>>>,
) {
    let devices = match media_devices(&window) {
        Ok(devices) => devices,
        Err(error) => return finish(&on_done, Err(error)),
    };
    let constraints = match build_constraints(&request) {
        Ok(constraints) => constraints,
        Err(error) => return finish(&on_done, Err(error)),
    };
    tracing::debug!(?request, "requesting camera stream");
    let promise = match devices.get_user_media_with_constraints(&constraints) {
        Ok(promise) => promise,
        Err(error) => return finish(&on_done, Err(classify_error(&error))),
    };

    let ok_done = on_done.clone();
    let granted = request.clone();
    let on_ok = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
        match value.dyn_into::<MediaStream>() {
            Ok(stream) => finish(&ok_done, Ok((stream, granted.clone()))),
            Err(_) => finish(
                &ok_done,
                Err(CameraError::Other("Camera returned no stream".to_string())),
            ),
        }
    });

    let err_done = on_done;
    let on_err = Closure::<dyn FnMut(JsValue)>::new(move |error: JsValue| {
        let classified = classify_error(&error);
        match request.fallback() {
            Some(fallback) if classified != CameraError::PermissionDenied => {
                tracing::info!(%classified, ?fallback, "camera request rejected, retrying");
                request_stream(window.clone(), fallback, err_done.clone());
            }
            _ => finish(&err_done, Err(classified)),
        }
    });

    let _ = promise.then2(&on_ok, &on_err);
    on_ok.forget();
    on_err.forget();
}

/// Lists video inputs. Labels stay empty until camera permission is granted.
pub fn enumerate_cameras<F>(window: &Window, on_done: F)
where
    F: FnOnce(Vec<CameraDevice>) + 'static,
{
    let promise = match media_devices(window).map(|devices| devices.enumerate_devices()) {
        Ok(Ok(promise)) => promise,
        _ => return on_done(Vec::new()),
    };
    let on_done: Rc<RefCell<Option<F>>> = Rc::new(RefCell::new(Some(on_done)));

    let ok_done = on_done.clone();
    let on_ok = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
        let cameras = Array::from(&value)
            .iter()
            .filter_map(|entry| entry.dyn_into::<MediaDeviceInfo>().ok())
            .filter(|info| info.kind() == MediaDeviceKind::Videoinput)
            .map(|info| CameraDevice::new(info.device_id(), info.label()))
            .collect::<Vec<_>>();
        tracing::debug!(count = cameras.len(), "cameras enumerated");
        if let Some(callback) = ok_done.borrow_mut().take() {
            callback(cameras);
        }
    });

    let on_err = Closure::<dyn FnMut(JsValue)>::new(move |error: JsValue| {
        tracing::warn!(?error, "camera enumeration failed");
        if let Some(callback) = on_done.borrow_mut().take() {
            callback(Vec::new());
        }
    });

    let _ = promise.then2(&on_ok, &on_err);
    on_ok.forget();
    on_err.forget();
}

pub fn stop_stream(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

pub fn attach_stream<F>(video: &HtmlVideoElement, stream: &MediaStream, on_error: F)
where
    F: FnOnce(CameraError) + 'static,
{
    video.set_src_object(Some(stream));
    let promise = match video.play() {
        Ok(promise) => promise,
        Err(error) => {
            tracing::warn!(?error, "video playback failed");
            return on_error(CameraError::Playback);
        }
    };
    let on_ok = Closure::<dyn FnMut(JsValue)>::new(|_| {});
    let mut on_error = Some(on_error);
    let on_err = Closure::<dyn FnMut(JsValue)>::new(move |error: JsValue| {
        tracing::warn!(?error, "video playback rejected");
        if let Some(callback) = on_error.take() {
            callback(CameraError::Playback);
        }
    });
    let _ = promise.then2(&on_ok, &on_err);
    on_ok.forget();
    on_err.forget();
}

pub fn detach_stream(video: &HtmlVideoElement) {
    let _ = video.pause();
    video.set_src_object(None);
}
