use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

struct LoopInner {
    window: Window,
    handle: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

/// A self-rescheduling `requestAnimationFrame` loop.
///
/// The tick returns whether another frame is wanted; the loop goes idle when
/// it returns `false` and is woken again with `request`.
#[derive(Clone)]
pub struct AnimationLoop {
    inner: Rc<LoopInner>,
}

impl AnimationLoop {
    pub fn new(window: Window) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                window,
                handle: Cell::new(None),
                callback: RefCell::new(None),
            }),
        }
    }

    pub fn set_tick<F>(&self, mut tick: F)
    where
        F: FnMut() -> bool + 'static,
    {
        let weak: Weak<LoopInner> = Rc::downgrade(&self.inner);
        let callback = Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.handle.set(None);
            if tick() {
                request_frame(&inner);
            }
        });
        self.cancel();
        *self.inner.callback.borrow_mut() = Some(callback);
    }

    pub fn request(&self) {
        request_frame(&self.inner);
    }

    pub fn cancel(&self) {
        if let Some(handle) = self.inner.handle.take() {
            let _ = self.inner.window.cancel_animation_frame(handle);
        }
    }

    pub fn stop(&self) {
        self.cancel();
        self.inner.callback.borrow_mut().take();
    }
}

fn request_frame(inner: &LoopInner) {
    if inner.handle.get().is_some() {
        return;
    }
    let callback = inner.callback.borrow();
    let Some(callback) = callback.as_ref() else {
        return;
    };
    match inner
        .window
        .request_animation_frame(callback.as_ref().unchecked_ref())
    {
        Ok(handle) => inner.handle.set(Some(handle)),
        Err(error) => tracing::warn!(?error, "requestAnimationFrame failed"),
    }
}
