use crate::gesture::{apply_wheel, ContactEvent, GestureInterpreter, GestureState};
use crate::redraw::RedrawTracker;
use crate::render::{render_frame, FrameOutcome, OverlayImage, Surface, Viewport};
use crate::settings::Setting;
use crate::transform::TransformState;

/// Gesture and slider input both end up in the same `TransformState` setters,
/// so whichever source wrote last wins.
pub struct OverlaySession<I> {
    transform: TransformState,
    gestures: GestureInterpreter,
    image: Option<I>,
    viewport: Viewport,
    redraw: RedrawTracker,
}

impl<I: OverlayImage> OverlaySession<I> {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            transform: TransformState::default(),
            gestures: GestureInterpreter::new(),
            image: None,
            viewport,
            redraw: RedrawTracker::new(),
        }
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn opacity(&self) -> f64 {
        self.transform.opacity()
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale()
    }

    pub fn rotation(&self) -> f64 {
        self.transform.rotation_degrees()
    }

    pub fn position_x(&self) -> f64 {
        self.transform.position_x()
    }

    pub fn position_y(&self) -> f64 {
        self.transform.position_y()
    }

    pub fn gesture(&self) -> &GestureState {
        self.gestures.state()
    }

    pub fn set_opacity(&mut self, value: f64) {
        self.transform.set_opacity(value);
        self.redraw.mark_dirty();
    }

    pub fn set_scale(&mut self, value: f64) {
        self.transform.set_scale(value);
        self.redraw.mark_dirty();
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.transform.set_rotation(degrees);
        self.redraw.mark_dirty();
    }

    pub fn set_position_x(&mut self, value: f64) {
        self.transform.set_position_x(value);
        self.redraw.mark_dirty();
    }

    pub fn set_position_y(&mut self, value: f64) {
        self.transform.set_position_y(value);
        self.redraw.mark_dirty();
    }

    pub fn apply_setting(&mut self, setting: Setting, value: f64) {
        setting.apply(&mut self.transform, value);
        self.redraw.mark_dirty();
    }

    pub fn reset(&mut self) {
        match &self.image {
            Some(image) => self.transform.reset_to_fit(
                image.width(),
                image.height(),
                self.viewport.width,
                self.viewport.height,
            ),
            None => self.transform = TransformState::default(),
        }
        tracing::debug!(transform = ?self.transform, "overlay reset");
        self.redraw.mark_dirty();
    }

    /// Installs a decoded overlay. Only the first overlay of a session is
    /// fitted; later ones keep the current transform.
    pub fn load_image(&mut self, image: I) {
        let first = self.image.is_none();
        tracing::info!(
            width = image.width(),
            height = image.height(),
            first,
            "overlay loaded"
        );
        self.image = Some(image);
        if first {
            self.reset();
        }
        self.redraw.mark_dirty();
    }

    pub fn take_image(&mut self) -> Option<I> {
        self.redraw.mark_dirty();
        self.image.take()
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.redraw.mark_dirty();
        }
    }

    pub fn handle_contact(&mut self, event: ContactEvent) -> bool {
        let changed = self.gestures.handle(event, &mut self.transform);
        if changed {
            self.redraw.mark_dirty();
        }
        changed
    }

    pub fn handle_wheel(&mut self, delta_y: f64) -> bool {
        let changed = apply_wheel(delta_y, &mut self.transform);
        if changed {
            self.redraw.mark_dirty();
        }
        changed
    }

    pub fn cancel_gesture(&mut self) {
        self.gestures.cancel();
    }

    pub fn set_camera_active(&mut self, active: bool) {
        self.redraw.set_continuous(active);
    }

    pub fn wants_frame(&self) -> bool {
        self.redraw.wants_frame()
    }

    pub fn render_tick<S>(&mut self, surface: &mut S) -> Option<FrameOutcome>
    where
        S: Surface<Image = I>,
    {
        if !self.redraw.take_frame() {
            return None;
        }
        Some(self.render_now(surface))
    }

    pub fn render_now<S>(&self, surface: &mut S) -> FrameOutcome
    where
        S: Surface<Image = I>,
    {
        render_frame(surface, self.viewport, self.image.as_ref(), &self.transform)
    }
}
