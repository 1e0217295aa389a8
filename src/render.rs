//! Rendering: draws the full scene onto a [`Surface`].
//!
//! This module decides *what* is drawn and in which order. It receives
//! read-only views of the viewport, the loaded image, the annotation store and
//! the draft, and issues drawing calls. It never mutates application state.
//! How pixels are produced is up to the surface:
//! [`crate::web::WebSurface`] targets a browser canvas and
//! [`crate::display_list::DisplayList`] records the calls.
//!
//! Layer order is fixed: clear, base image, annotations in store order, draft.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::annotation::{Annotation, AnnotationKind, AnnotationStore, Draft};
use crate::consts::{
    ANNOTATION_STROKE_WIDTH, DRAFT_COLOR, DRAFT_DASH, LABEL_FONT, LABEL_OFFSET_Y, POINT_MARKER_RADIUS,
};
use crate::input::ShapeKind;
use crate::loader::LoadedImage;
use crate::viewport::{Point, Rect, Size, Viewport};

/// Outline style for a stroked primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke<'a> {
    /// CSS color string.
    pub color: &'a str,
    /// Line width in canvas pixels.
    pub width: f64,
    /// Dash pattern (on, off, ...). Empty for a solid line.
    pub dash: &'a [f64],
}

impl<'a> Stroke<'a> {
    /// Solid outline used for finalized annotations.
    #[must_use]
    pub fn annotation(color: &'a str) -> Self {
        Self { color, width: ANNOTATION_STROKE_WIDTH, dash: &[] }
    }

    /// Dashed outline used for the in-progress draft.
    #[must_use]
    pub fn draft() -> Self {
        Self { color: DRAFT_COLOR, width: ANNOTATION_STROKE_WIDTH, dash: &DRAFT_DASH }
    }
}

/// Drawing primitives the render pipeline needs from a backend.
///
/// Rectangles passed to a surface are always normalized (non-negative extents).
pub trait Surface {
    type Error;

    /// Clear the whole canvas.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the surface cannot be reset.
    fn clear(&mut self, size: Size) -> Result<(), Self::Error>;

    /// Draw `image` scaled into `dest`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the image cannot be drawn.
    fn draw_image(&mut self, image: &LoadedImage, dest: Rect) -> Result<(), Self::Error>;

    /// Outline a rectangle.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the stroke cannot be applied.
    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke<'_>) -> Result<(), Self::Error>;

    /// Outline a circle.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the path cannot be built or stroked.
    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: Stroke<'_>) -> Result<(), Self::Error>;

    /// Fill `text` with its baseline starting at `at`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the text cannot be drawn.
    fn fill_text(&mut self, text: &str, at: Point, color: &str, font: &str) -> Result<(), Self::Error>;
}

/// Everything one frame needs, borrowed from the engine.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    /// Canvas size in CSS pixels.
    pub canvas: Size,
    pub viewport: &'a Viewport,
    /// Base image, if one has loaded for the active slide.
    pub image: Option<&'a LoadedImage>,
    pub annotations: &'a AnnotationStore,
    /// In-progress draft, if a rectangle/circle drag is active.
    pub draft: Option<(ShapeKind, &'a Draft)>,
}

/// Draw the full scene.
///
/// # Errors
///
/// Returns `Err` if any surface call fails; drawing stops at the first failure.
pub fn draw<S: Surface>(surface: &mut S, scene: &Scene<'_>) -> Result<(), S::Error> {
    // Layer 1: clear.
    surface.clear(scene.canvas)?;

    // Layer 2: base image, centered then panned.
    if let Some(image) = scene.image {
        let dest = scene.viewport.image_rect(scene.canvas, image.surface.size());
        surface.draw_image(image, dest)?;
    }

    // Layer 3: annotations in insertion order (later on top).
    for annotation in scene.annotations.iter() {
        draw_annotation(surface, annotation)?;
    }

    // Layer 4: draft, always last.
    if let Some((shape, draft)) = scene.draft {
        draw_shape(surface, shape.into(), draft.bounds(), Stroke::draft())?;
    }

    Ok(())
}

// =============================================================
// Annotation dispatch
// =============================================================

fn draw_annotation<S: Surface>(surface: &mut S, annotation: &Annotation) -> Result<(), S::Error> {
    let stroke = Stroke::annotation(&annotation.color);
    draw_shape(surface, annotation.kind, annotation.bounds(), stroke)?;

    if let Some(label) = annotation.label.as_deref().filter(|l| !l.is_empty()) {
        surface.fill_text(label, label_origin(annotation.bounds()), &annotation.color, LABEL_FONT)?;
    }
    Ok(())
}

/// Draw one shape from its anchor/extent box (extents may be negative).
fn draw_shape<S: Surface>(surface: &mut S, kind: AnnotationKind, bounds: Rect, stroke: Stroke<'_>) -> Result<(), S::Error> {
    match kind {
        AnnotationKind::Point => surface.stroke_circle(Point::new(bounds.x, bounds.y), POINT_MARKER_RADIUS, stroke),
        AnnotationKind::Rectangle => surface.stroke_rect(bounds.normalized(), stroke),
        AnnotationKind::Circle => surface.stroke_circle(bounds.center(), circle_radius(bounds), stroke),
    }
}

/// Radius of the circle inscribed in a drag box: half the shorter side.
#[must_use]
pub fn circle_radius(bounds: Rect) -> f64 {
    bounds.width.abs().min(bounds.height.abs()) / 2.0
}

/// Labels sit just above the top-left corner of the shape's normalized box.
fn label_origin(bounds: Rect) -> Point {
    let r = bounds.normalized();
    Point::new(r.x, r.y - LABEL_OFFSET_Y)
}
