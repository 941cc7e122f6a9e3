use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use traceboard_shared::{OverlayImage, Surface, SurfaceError, Viewport};

pub struct OverlayBitmap {
    pub element: HtmlImageElement,
}

impl OverlayImage for OverlayBitmap {
    fn width(&self) -> f64 {
        self.element.natural_width() as f64
    }

    fn height(&self) -> f64 {
        self.element.natural_height() as f64
    }
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    viewport: Viewport,
    device_pixel_ratio: f64,
}

fn describe(error: &JsValue) -> String {
    error
        .as_string()
        .or_else(|| {
            error
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{error:?}"))
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, device_pixel_ratio: f64) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            viewport: Viewport::default(),
            device_pixel_ratio: if device_pixel_ratio > 0.0 {
                device_pixel_ratio
            } else {
                1.0
            },
        })
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        if ratio > 0.0 && ratio != self.device_pixel_ratio {
            self.device_pixel_ratio = ratio;
            // force reallocation on the next frame
            self.viewport = Viewport::default();
        }
    }
}

impl Surface for CanvasSurface {
    type Image = OverlayBitmap;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) {
        let dpr = self.device_pixel_ratio;
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            dpr,
            "resizing overlay canvas"
        );
        self.canvas.set_width((viewport.width * dpr).round() as u32);
        self.canvas.set_height((viewport.height * dpr).round() as u32);
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        self.viewport = viewport;
    }

    fn clear(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), SurfaceError> {
        self.ctx
            .translate(x, y)
            .map_err(|error| SurfaceError::transform(describe(&error)))
    }

    fn rotate(&mut self, radians: f64) -> Result<(), SurfaceError> {
        self.ctx
            .rotate(radians)
            .map_err(|error| SurfaceError::transform(describe(&error)))
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn draw_image(
        &mut self,
        image: &OverlayBitmap,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), SurfaceError> {
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(&image.element, x, y, width, height)
            .map_err(|error| SurfaceError::draw(describe(&error)))
    }
}
