use crate::error::SurfaceError;
use crate::transform::TransformState;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

pub trait OverlayImage {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
}

pub trait Surface {
    type Image: OverlayImage + ?Sized;

    fn viewport(&self) -> Viewport;
    fn resize(&mut self, viewport: Viewport);
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64) -> Result<(), SurfaceError>;
    fn rotate(&mut self, radians: f64) -> Result<(), SurfaceError>;
    fn set_global_alpha(&mut self, alpha: f64);
    fn draw_image(
        &mut self,
        image: &Self::Image,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), SurfaceError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPlacement {
    pub origin_x: f64,
    pub origin_y: f64,
    pub rotation_radians: f64,
    pub alpha: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayPlacement {
    pub fn compute(
        viewport: Viewport,
        image_width: f64,
        image_height: f64,
        transform: &TransformState,
    ) -> Self {
        let (center_x, center_y) = viewport.center();
        Self {
            origin_x: center_x + transform.position_x(),
            origin_y: center_y + transform.position_y(),
            rotation_radians: transform.rotation_degrees().to_radians(),
            alpha: transform.opacity(),
            width: image_width * transform.scale(),
            height: image_height * transform.scale(),
        }
    }

    pub fn draw_offset(&self) -> (f64, f64) {
        (-self.width / 2.0, -self.height / 2.0)
    }
}

/// Paints one frame. Never panics on surface failures: they are logged and
/// reported as `FrameOutcome::Failed` so the caller's loop keeps running.
pub fn render_frame<S: Surface>(
    surface: &mut S,
    viewport: Viewport,
    image: Option<&S::Image>,
    transform: &TransformState,
) -> FrameOutcome {
    if surface.viewport() != viewport {
        surface.resize(viewport);
    }
    surface.clear();

    let Some(image) = image else {
        return FrameOutcome::Empty;
    };
    let (width, height) = (image.width(), image.height());
    if !(width > 0.0 && height > 0.0) || viewport.is_empty() {
        return FrameOutcome::Empty;
    }

    let placement = OverlayPlacement::compute(viewport, width, height, transform);
    surface.save();
    let result = draw_placed(surface, image, &placement);
    surface.restore();

    match result {
        Ok(()) => FrameOutcome::Drawn(placement),
        Err(error) => {
            tracing::warn!(%error, "overlay frame skipped");
            FrameOutcome::Failed(error)
        }
    }
}

fn draw_placed<S: Surface>(
    surface: &mut S,
    image: &S::Image,
    placement: &OverlayPlacement,
) -> Result<(), SurfaceError> {
    surface.translate(placement.origin_x, placement.origin_y)?;
    surface.rotate(placement.rotation_radians)?;
    surface.set_global_alpha(placement.alpha);
    let (x, y) = placement.draw_offset();
    surface.draw_image(image, x, y, placement.width, placement.height)
}
