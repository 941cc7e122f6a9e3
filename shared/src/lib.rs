pub mod camera;
pub mod error;
pub mod gesture;
pub mod image_source;
pub mod redraw;
pub mod render;
pub mod session;
pub mod settings;
pub mod transform;

pub use camera::{CameraDevice, CameraRequest, CameraSession, CameraStatus, FacingMode};
pub use error::{CameraError, ImageError, SettingError, SurfaceError};
pub use gesture::{ContactEvent, ContactKind, ContactPhase, GestureInterpreter, GestureState};
pub use image_source::{check_dimensions, check_file, ImageSource};
pub use redraw::RedrawTracker;
pub use render::{render_frame, FrameOutcome, OverlayImage, OverlayPlacement, Surface, Viewport};
pub use session::OverlaySession;
pub use settings::{Setting, SliderSpec};
pub use transform::TransformState;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn angle_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x).to_degrees()
    }
}

pub fn normalize_point(point: Point) -> Option<Point> {
    if !point.is_finite() {
        return None;
    }
    Some(point)
}
