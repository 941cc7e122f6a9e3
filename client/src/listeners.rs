use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

#[derive(Default)]
pub struct ListenerGuard {
    listeners: Vec<Listener>,
}

impl ListenerGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn listen<T, F>(&mut self, target: &T, kind: &'static str, handler: F) -> Result<(), JsValue>
    where
        T: AsRef<EventTarget>,
        F: FnMut(Event) + 'static,
    {
        let target = target.as_ref().clone();
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        self.listeners.push(Listener {
            target,
            kind,
            callback,
        });
        Ok(())
    }

    /// Like `listen`, but non-passive so the handler may call `preventDefault`
    /// on touch and wheel input.
    pub fn listen_active<T, F>(
        &mut self,
        target: &T,
        kind: &'static str,
        handler: F,
    ) -> Result<(), JsValue>
    where
        T: AsRef<EventTarget>,
        F: FnMut(Event) + 'static,
    {
        let target = target.as_ref().clone();
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        self.listeners.push(Listener {
            target,
            kind,
            callback,
        });
        Ok(())
    }

    pub fn release(&mut self) {
        let count = self.listeners.len();
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
        if count > 0 {
            tracing::debug!(count, "listeners released");
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.release();
    }
}
