//! Shared numeric and style constants for the viewer engine.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 10.0;

/// Multiplier applied by a single zoom-in step (and divided out by zoom-out).
pub const ZOOM_STEP: f64 = 1.5;

// ── Annotations ─────────────────────────────────────────────────

/// Color given to new annotations when nothing else is configured.
pub const DEFAULT_ANNOTATION_COLOR: &str = "#ff0000";

/// Stroke width for finalized annotations and the draft, in canvas pixels.
pub const ANNOTATION_STROKE_WIDTH: f64 = 2.0;

/// Radius of the marker circle drawn for a point annotation.
pub const POINT_MARKER_RADIUS: f64 = 5.0;

/// Font used for annotation labels.
pub const LABEL_FONT: &str = "12px sans-serif";

/// Vertical gap between a label's baseline and the top of its annotation.
pub const LABEL_OFFSET_Y: f64 = 5.0;

// ── Draft ───────────────────────────────────────────────────────

/// Stroke color of the in-progress draft. Independent of annotation colors.
pub const DRAFT_COLOR: &str = "#00ff00";

/// Dash pattern (on, off) of the in-progress draft outline.
pub const DRAFT_DASH: [f64; 2] = [5.0, 5.0];
