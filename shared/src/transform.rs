use serde::Serialize;

pub const SCALE_MIN: f64 = 0.1;
pub const SCALE_MAX: f64 = 3.0;
pub const OPACITY_MIN: f64 = 0.0;
pub const OPACITY_MAX: f64 = 1.0;
pub const DEFAULT_OPACITY: f64 = 0.5;
pub const DEFAULT_SCALE: f64 = 1.0;
pub const FIT_MARGIN: f64 = 0.8;

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransformState {
    opacity: f64,
    scale: f64,
    rotation_degrees: f64,
    position_x: f64,
    position_y: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_OPACITY,
            scale: DEFAULT_SCALE,
            rotation_degrees: 0.0,
            position_x: 0.0,
            position_y: 0.0,
        }
    }
}

pub fn clamp_scale(value: f64) -> f64 {
    value.clamp(SCALE_MIN, SCALE_MAX)
}

pub fn clamp_opacity(value: f64) -> f64 {
    value.clamp(OPACITY_MIN, OPACITY_MAX)
}

pub fn fit_scale(image_width: f64, image_height: f64, canvas_width: f64, canvas_height: f64) -> f64 {
    let dims = [image_width, image_height, canvas_width, canvas_height];
    if dims.iter().any(|value| !value.is_finite() || *value <= 0.0) {
        return DEFAULT_SCALE;
    }
    let scale_x = canvas_width / image_width;
    let scale_y = canvas_height / image_height;
    clamp_scale(scale_x.min(scale_y) * FIT_MARGIN)
}

impl TransformState {
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    pub fn position_x(&self) -> f64 {
        self.position_x
    }

    pub fn position_y(&self) -> f64 {
        self.position_y
    }

    pub fn display_rotation(&self) -> f64 {
        let folded = self.rotation_degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if folded >= 360.0 {
            0.0
        } else {
            folded
        }
    }

    pub fn set_opacity(&mut self, value: f64) {
        if value.is_finite() {
            self.opacity = clamp_opacity(value);
        }
    }

    pub fn set_scale(&mut self, value: f64) {
        if value.is_finite() {
            self.scale = clamp_scale(value);
        }
    }

    pub fn scale_by(&mut self, factor: f64) {
        self.set_scale(self.scale * factor);
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.rotation_degrees = degrees;
        }
    }

    pub fn rotate_by(&mut self, delta_degrees: f64) {
        self.set_rotation(self.rotation_degrees + delta_degrees);
    }

    pub fn set_position_x(&mut self, value: f64) {
        if value.is_finite() {
            self.position_x = value;
        }
    }

    pub fn set_position_y(&mut self, value: f64) {
        if value.is_finite() {
            self.position_y = value;
        }
    }

    pub fn translate(&mut self, delta_x: f64, delta_y: f64) {
        self.set_position_x(self.position_x + delta_x);
        self.set_position_y(self.position_y + delta_y);
    }

    pub fn reset_to_fit(
        &mut self,
        image_width: f64,
        image_height: f64,
        canvas_width: f64,
        canvas_height: f64,
    ) {
        *self = Self {
            scale: fit_scale(image_width, image_height, canvas_width, canvas_height),
            ..Self::default()
        };
    }
}
