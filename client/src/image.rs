use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, File, FileReader, HtmlImageElement, ProgressEvent, Window};

use traceboard_shared::image_source::{IMAGE_DATA_KEY, IMAGE_URL_KEY};
use traceboard_shared::{check_dimensions, check_file, ImageError, ImageSource};

use crate::dom::{remove_item, store_item, stored_item};
use crate::surface::OverlayBitmap;

pub fn stored_source(window: &Window) -> Option<ImageSource> {
    let url = stored_item(window, IMAGE_URL_KEY);
    let data = stored_item(window, IMAGE_DATA_KEY);
    let source = ImageSource::resolve(url.as_deref(), data.as_deref());
    if source.is_none() && url.is_some() {
        tracing::warn!(?url, "stored overlay url is not usable");
    }
    source
}

pub fn store_source(window: &Window, data_url: &str) {
    remove_item(window, IMAGE_URL_KEY);
    remove_item(window, IMAGE_DATA_KEY);
    store_item(window, IMAGE_DATA_KEY, data_url);
}

pub fn clear_source(window: &Window) {
    remove_item(window, IMAGE_URL_KEY);
    remove_item(window, IMAGE_DATA_KEY);
}

/// Decodes `source` into an `<img>` and checks its natural size. `on_done`
/// runs once, on load or on error.
pub fn decode<F>(source: &ImageSource, on_done: F) -> Result<(), JsValue>
where
    F: FnOnce(Result<OverlayBitmap, ImageError>) + 'static,
{
    let element = HtmlImageElement::new()?;
    let on_done: Rc<RefCell<Option<F>>> = Rc::new(RefCell::new(Some(on_done)));

    let loaded = element.clone();
    let load_done = on_done.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        loaded.set_onload(None);
        loaded.set_onerror(None);
        if let Some(callback) = load_done.borrow_mut().take() {
            let checked = check_dimensions(
                loaded.natural_width() as f64,
                loaded.natural_height() as f64,
            );
            callback(checked.map(|()| OverlayBitmap {
                element: loaded.clone(),
            }));
        }
    });

    let failed = element.clone();
    let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
        failed.set_onload(None);
        failed.set_onerror(None);
        if let Some(callback) = on_done.borrow_mut().take() {
            callback(Err(ImageError::Unreadable));
        }
    });

    element.set_onload(Some(onload.as_ref().unchecked_ref()));
    element.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onload.forget();
    onerror.forget();
    element.set_src(source.src());
    Ok(())
}

pub fn read_upload<F>(file: &File, on_done: F) -> Result<(), JsValue>
where
    F: FnOnce(Result<String, ImageError>) + 'static,
{
    if let Err(error) = check_file(&file.type_(), file.size()) {
        tracing::info!(mime = %file.type_(), size = file.size(), "upload rejected");
        on_done(Err(error));
        return Ok(());
    }

    let reader = FileReader::new()?;
    let mut on_done = Some(on_done);
    let onloadend = Closure::<dyn FnMut(ProgressEvent)>::new(move |event: ProgressEvent| {
        let Some(callback) = on_done.take() else {
            return;
        };
        let result = event
            .target()
            .and_then(|target| target.dyn_into::<FileReader>().ok())
            .and_then(|reader| reader.result().ok())
            .and_then(|value| value.as_string())
            .filter(|data| !data.is_empty());
        callback(result.ok_or(ImageError::ReadFailed));
    });
    reader.set_onloadend(Some(onloadend.as_ref().unchecked_ref()));
    onloadend.forget();
    reader.read_as_data_url(file)?;
    Ok(())
}
