//! Annotation model: finalized markers, the in-progress draft, and the store.
//!
//! An [`Annotation`] is created exactly once, by the gesture state machine,
//! and never edited afterwards. The [`AnnotationStore`] keeps them in insertion
//! order, which is also the draw order. The renderer reads the store through
//! [`AnnotationStore::iter`]; nothing outside the engine mutates it.
//!
//! Coordinates are canvas pixels at the time of creation. They are not
//! re-projected when the viewport later zooms or pans.

#[cfg(test)]
#[path = "annotation_test.rs"]
mod annotation_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::viewport::{Point, Rect};

/// Unique identifier for an annotation.
pub type AnnotationId = Uuid;

/// The geometric kind of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Zero-size marker at the anchor.
    Point,
    /// Rectangle spanning anchor to anchor + (width, height).
    Rectangle,
    /// Circle inscribed in the anchor/extent box, using the shorter side.
    Circle,
}

/// A finalized annotation, as stored and as sent to the annotation consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Unique identifier for this annotation.
    pub id: AnnotationId,
    /// Point, rectangle or circle.
    pub kind: AnnotationKind,
    /// Drag start (or click position) x, in canvas pixels.
    pub anchor_x: f64,
    /// Drag start (or click position) y, in canvas pixels.
    pub anchor_y: f64,
    /// Signed horizontal extent; negative when the drag went left. 0 for points.
    pub width: f64,
    /// Signed vertical extent; negative when the drag went up. 0 for points.
    pub height: f64,
    /// Stroke and label color as a CSS color string.
    pub color: String,
    /// Optional text drawn next to the annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Annotation {
    /// A zero-size point annotation at `at`.
    #[must_use]
    pub fn point(at: Point, color: &str, label: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: AnnotationKind::Point,
            anchor_x: at.x,
            anchor_y: at.y,
            width: 0.0,
            height: 0.0,
            color: color.to_owned(),
            label,
        }
    }

    /// Promote a draft to a finalized annotation, keeping its signed extents.
    #[must_use]
    pub fn from_draft(kind: AnnotationKind, draft: &Draft, color: &str, label: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            anchor_x: draft.start.x,
            anchor_y: draft.start.y,
            width: draft.width,
            height: draft.height,
            color: color.to_owned(),
            label,
        }
    }

    /// The anchor point.
    #[must_use]
    pub fn anchor(&self) -> Point {
        Point::new(self.anchor_x, self.anchor_y)
    }

    /// Anchor/extent box as dragged (possibly with negative extents).
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.anchor_x, self.anchor_y, self.width, self.height)
    }
}

/// A rectangle or circle being dragged out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draft {
    /// Pointer position at pointer-down.
    pub start: Point,
    /// Signed `pointer.x - start.x` at the latest move.
    pub width: f64,
    /// Signed `pointer.y - start.y` at the latest move.
    pub height: f64,
}

impl Draft {
    /// A zero-size draft anchored at `start`.
    #[must_use]
    pub fn new(start: Point) -> Self {
        Self { start, width: 0.0, height: 0.0 }
    }

    /// Stretch the draft so its far corner sits under `pointer`.
    pub fn drag_to(&mut self, pointer: Point) {
        self.width = pointer.x - self.start.x;
        self.height = pointer.y - self.start.y;
    }

    /// Anchor/extent box as dragged.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.start.x, self.start.y, self.width, self.height)
    }
}

/// Append-only, ordered collection of finalized annotations.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { annotations: Vec::new() }
    }

    /// Append an annotation. It draws above everything added before it.
    pub fn add(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Remove every annotation.
    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    /// Annotations in insertion (draw) order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// Annotations in insertion (draw) order, as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Number of annotations currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Returns `true` if the store contains no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
