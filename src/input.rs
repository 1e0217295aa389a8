//! Input model: tools, persistent UI state, and the gesture state machine.
//!
//! `Tool` captures how pointer events are interpreted. `InputState` is the
//! gesture being tracked between pointer-down and pointer-up (or
//! pointer-leave), carrying the context needed to update the viewport or the
//! draft on each move.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::annotation::{AnnotationKind, Draft};
use crate::consts::DEFAULT_ANNOTATION_COLOR;
use crate::viewport::Point;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Drag to pan the slide (default).
    #[default]
    Pan,
    /// Click to drop a point marker.
    Point,
    /// Drag out a rectangle.
    Rectangle,
    /// Drag out a circle.
    Circle,
}

impl Tool {
    /// CSS cursor shown over the canvas while this tool is idle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Pan => "grab",
            Self::Point | Self::Rectangle | Self::Circle => "crosshair",
        }
    }
}

/// Shapes that are drawn with a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
}

impl From<ShapeKind> for AnnotationKind {
    fn from(shape: ShapeKind) -> Self {
        match shape {
            ShapeKind::Rectangle => Self::Rectangle,
            ShapeKind::Circle => Self::Circle,
        }
    }
}

/// Persistent UI state visible to the renderer and applied to new annotations.
#[derive(Debug, Clone)]
pub struct UiState {
    /// Currently active tool.
    pub tool: Tool,
    /// Color given to annotations finalized from now on.
    pub color: String,
    /// Label given to annotations finalized from now on, if any.
    pub label: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self { tool: Tool::default(), color: DEFAULT_ANNOTATION_COLOR.to_owned(), label: None }
    }
}

/// Internal state for the gesture state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is dragging the viewport with the pan tool.
    Panning {
        /// `pointer - pan` at pointer-down. The pan follows `pointer - drag_origin`.
        drag_origin: Point,
    },
    /// The user is dragging out a rectangle or circle.
    Drawing {
        /// Shape the draft will become on pointer-up.
        shape: ShapeKind,
        /// The in-progress draft.
        draft: Draft,
    },
}

impl InputState {
    /// The draft being drawn, if any.
    #[must_use]
    pub fn draft(&self) -> Option<(ShapeKind, &Draft)> {
        match self {
            Self::Drawing { shape, draft } => Some((*shape, draft)),
            Self::Idle | Self::Panning { .. } => None,
        }
    }

    /// Whether a pointer gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}
