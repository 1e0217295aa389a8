//! Recording surface: captures render calls as data instead of pixels.
//!
//! Used for headless rendering (the CLI prints the final frame) and to check
//! draw order and geometry in tests.

use std::convert::Infallible;

use serde::Serialize;

use crate::loader::{LoadedImage, SlideId};
use crate::render::{Stroke, Surface};
use crate::viewport::{Point, Rect, Size};

/// Owned copy of a [`Stroke`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f64>,
}

impl From<Stroke<'_>> for StrokeStyle {
    fn from(stroke: Stroke<'_>) -> Self {
        Self { color: stroke.color.to_owned(), width: stroke.width, dash: stroke.dash.to_vec() }
    }
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear { size: Size },
    Image { slide: SlideId, width: u32, height: u32, dest: Rect },
    StrokeRect { rect: Rect, stroke: StrokeStyle },
    StrokeCircle { center: Point, radius: f64, stroke: StrokeStyle },
    FillText { text: String, at: Point, color: String, font: String },
}

/// A [`Surface`] that appends every call to a list.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for DisplayList {
    type Error = Infallible;

    fn clear(&mut self, size: Size) -> Result<(), Infallible> {
        self.commands.push(DrawCommand::Clear { size });
        Ok(())
    }

    fn draw_image(&mut self, image: &LoadedImage, dest: Rect) -> Result<(), Infallible> {
        self.commands.push(DrawCommand::Image {
            slide: image.ticket.slide.clone(),
            width: image.surface.width,
            height: image.surface.height,
            dest,
        });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke<'_>) -> Result<(), Infallible> {
        self.commands.push(DrawCommand::StrokeRect { rect, stroke: stroke.into() });
        Ok(())
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: Stroke<'_>) -> Result<(), Infallible> {
        self.commands.push(DrawCommand::StrokeCircle { center, radius, stroke: stroke.into() });
        Ok(())
    }

    fn fill_text(&mut self, text: &str, at: Point, color: &str, font: &str) -> Result<(), Infallible> {
        self.commands.push(DrawCommand::FillText {
            text: text.to_owned(),
            at,
            color: color.to_owned(),
            font: font.to_owned(),
        });
        Ok(())
    }
}
