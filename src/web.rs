//! Browser backend: a [`Surface`] over [`web_sys::CanvasRenderingContext2d`].
//!
//! This module is the only place that touches the Canvas2D API. All fallible
//! calls propagate errors via `Result<(), JsValue>`; the caller
//! ([`crate::engine::Engine::render`]) handles the result.

use std::f64::consts::TAU;

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::loader::{ImageSurface, LoadTicket, LoadedImage};
use crate::render::{Stroke, Surface};
use crate::viewport::{Point, Rect, Size};

/// Fetch the 2D context of a canvas element.
///
/// # Errors
///
/// Returns `Err` if the browser refuses the context or it is not a `CanvasRenderingContext2d`.
pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

/// Offscreen copy of the loaded raster, rebuilt only when the load ticket changes.
///
/// `putImageData` ignores transforms, so the RGBA bytes are uploaded once into
/// an offscreen canvas which is then drawn scaled with `drawImage`.
#[derive(Default)]
pub struct ImageCache {
    entry: Option<(LoadTicket, HtmlCanvasElement)>,
}

impl ImageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached raster.
    pub fn clear(&mut self) {
        self.entry = None;
    }

    fn canvas_for(&mut self, image: &LoadedImage) -> Result<&HtmlCanvasElement, JsValue> {
        let cached = matches!(&self.entry, Some((ticket, _)) if *ticket == image.ticket);
        if !cached {
            let canvas = upload(&image.surface)?;
            self.entry = Some((image.ticket.clone(), canvas));
        }
        match &self.entry {
            Some((_, canvas)) => Ok(canvas),
            None => Err(JsValue::from_str("image cache empty")),
        }
    }
}

fn upload(surface: &ImageSurface) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document unavailable"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(JsValue::from)?;
    canvas.set_width(surface.width);
    canvas.set_height(surface.height);

    let ctx = context_2d(&canvas)?;
    let data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(surface.pixels.as_slice()), surface.width, surface.height)?;
    ctx.put_image_data(&data, 0.0, 0.0)?;
    Ok(canvas)
}

/// A [`Surface`] drawing into a browser canvas.
pub struct WebSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    dpr: f64,
    images: &'a mut ImageCache,
}

impl<'a> WebSurface<'a> {
    /// `dpr` is the device pixel ratio; drawing coordinates stay in CSS pixels.
    #[must_use]
    pub fn new(ctx: &'a CanvasRenderingContext2d, dpr: f64, images: &'a mut ImageCache) -> Self {
        Self { ctx, dpr, images }
    }

    fn apply_stroke(&self, stroke: Stroke<'_>) -> Result<(), JsValue> {
        self.ctx.set_stroke_style_str(stroke.color);
        self.ctx.set_line_width(stroke.width);
        let dash = js_sys::Array::new();
        for segment in stroke.dash {
            dash.push(&JsValue::from_f64(*segment));
        }
        self.ctx.set_line_dash(&dash)
    }
}

impl Surface for WebSurface<'_> {
    type Error = JsValue;

    fn clear(&mut self, size: Size) -> Result<(), JsValue> {
        self.ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0)?;
        self.ctx.clear_rect(0.0, 0.0, size.width, size.height);
        Ok(())
    }

    fn draw_image(&mut self, image: &LoadedImage, dest: Rect) -> Result<(), JsValue> {
        let canvas = self.images.canvas_for(image)?;
        self.ctx
            .draw_image_with_html_canvas_element_and_dw_and_dh(canvas, dest.x, dest.y, dest.width, dest.height)
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke<'_>) -> Result<(), JsValue> {
        self.apply_stroke(stroke)?;
        self.ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: Stroke<'_>) -> Result<(), JsValue> {
        self.apply_stroke(stroke)?;
        self.ctx.begin_path();
        self.ctx.arc(center.x, center.y, radius, 0.0, TAU)?;
        self.ctx.stroke();
        Ok(())
    }

    fn fill_text(&mut self, text: &str, at: Point, color: &str, font: &str) -> Result<(), JsValue> {
        self.ctx.set_fill_style_str(color);
        self.ctx.set_font(font);
        self.ctx.fill_text(text, at.x, at.y)
    }
}
