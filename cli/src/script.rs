//! JSON-lines gesture scripts for `replay`.
//!
//! One step per line, tagged by `op`:
//!
//! ```text
//! {"op":"tool","tool":"rectangle"}
//! {"op":"down","x":10,"y":10}
//! {"op":"move","x":50,"y":40}
//! {"op":"up","x":50,"y":40}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use serde::Deserialize;
use slideview::config::ConfigError;
use slideview::engine::{Action, EngineCore};
use slideview::input::Tool;
use slideview::viewport::Point;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Tool { tool: Tool },
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Leave,
    Pan { dx: f64, dy: f64 },
    ZoomIn,
    ZoomOut,
    Reset,
    Clear,
    Label {
        #[serde(default)]
        text: Option<String>,
    },
    Color { color: String },
}

#[derive(Debug, thiserror::Error)]
#[error("script line {line}: {source}")]
pub struct ScriptError {
    pub line: usize,
    #[source]
    pub source: serde_json::Error,
}

/// Parse a whole script.
///
/// # Errors
///
/// Returns the 1-based line of the first step that isn't valid JSON or names an unknown op.
pub fn parse(text: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let step = serde_json::from_str(trimmed).map_err(|source| ScriptError { line: idx + 1, source })?;
        steps.push(step);
    }
    Ok(steps)
}

/// Feed one step to the engine.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for a `color` step with an unusable color.
pub fn apply(core: &mut EngineCore, step: &ScriptStep) -> Result<Vec<Action>, ConfigError> {
    let actions = match step {
        ScriptStep::Tool { tool } => core.set_tool(*tool),
        ScriptStep::Down { x, y } => core.on_pointer_down(Point::new(*x, *y)),
        ScriptStep::Move { x, y } => core.on_pointer_move(Point::new(*x, *y)),
        ScriptStep::Up { x, y } => core.on_pointer_up(Point::new(*x, *y)),
        ScriptStep::Leave => core.on_pointer_leave(),
        ScriptStep::Pan { dx, dy } => core.pan_by(*dx, *dy),
        ScriptStep::ZoomIn => core.zoom_in(),
        ScriptStep::ZoomOut => core.zoom_out(),
        ScriptStep::Reset => core.reset(),
        ScriptStep::Clear => core.clear_annotations(),
        ScriptStep::Label { text } => {
            core.set_label(text.clone());
            Vec::new()
        }
        ScriptStep::Color { color } => {
            core.set_annotation_color(color)?;
            Vec::new()
        }
    };
    Ok(actions)
}
