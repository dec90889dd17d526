//! Recorded draw commands.
//!
//! The browser host already holds the decoded `<img>`, so rather than
//! shipping pixels across the WASM boundary every frame it replays these
//! commands on its own 2D canvas context.

use super::{Color, PreviewSurface, Stroke};
use crate::decode::SourceImage;
use crate::geometry::Rect;
use crate::Point;
use serde::{Deserialize, Serialize};

/// One immediate-mode drawing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    /// Draw the source image scaled into `rect`
    DrawImage { rect: Rect },
    FillEvenOdd { outer: Rect, hole: Rect, color: Color },
    StrokeLine { from: Point, to: Point, stroke: Stroke },
    StrokeRect { rect: Rect, stroke: Stroke },
}

/// A [`PreviewSurface`] that records instead of drawing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayList {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }
}

impl PreviewSurface for DisplayList {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear {
            width: self.width,
            height: self.height,
        });
    }

    fn draw_image(&mut self, _image: &SourceImage, dest: Rect) {
        self.commands.push(DrawCommand::DrawImage { rect: dest });
    }

    fn fill_even_odd(&mut self, outer: Rect, hole: Rect, color: Color) {
        self.commands
            .push(DrawCommand::FillEvenOdd { outer, hole, color });
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            stroke: stroke.clone(),
        });
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokeRect {
            rect,
            stroke: stroke.clone(),
        });
    }
}
