#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};

/// A point in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle. `width`/`height` may be negative when it was
/// built from a drag that went left or up; see [`Rect::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The same area with a top-left origin and non-negative extents.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            x: self.x.min(self.x + self.width),
            y: self.y.min(self.y + self.height),
            width: self.width.abs(),
            height: self.height.abs(),
        }
    }

    /// Center point. Sign-correct for negative extents.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Zoom/pan state for the active slide.
///
/// `pan_x` / `pan_y` are in canvas pixels and are applied after the image has
/// been centered. `zoom` is a scale factor kept within
/// [`MIN_ZOOM`]..=[`MAX_ZOOM`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { zoom: 1.0, pan_x: 0.0, pan_y: 0.0 }
    }
}

impl Viewport {
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Back to `zoom = 1`, `pan = (0, 0)`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Shift the pan offset. Pan is unbounded.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Set the pan offset directly (pan-tool drag).
    pub fn pan_to(&mut self, pan: Point) {
        self.pan_x = pan.x;
        self.pan_y = pan.y;
    }

    /// Current pan offset as a point.
    #[must_use]
    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    /// Zoom as a rounded percentage for toolbar display (1.0 -> 100).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Where the image is drawn on a canvas of size `canvas`.
    ///
    /// The scaled image is centered in the canvas and then shifted by the pan
    /// offset. This is the only placement rule; rendering goes through it.
    #[must_use]
    pub fn image_rect(&self, canvas: Size, image: Size) -> Rect {
        let width = image.width * self.zoom;
        let height = image.height * self.zoom;
        Rect {
            x: (canvas.width - width) / 2.0 + self.pan_x,
            y: (canvas.height - height) / 2.0 + self.pan_y,
            width,
            height,
        }
    }
}
