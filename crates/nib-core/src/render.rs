//! The backend-agnostic rendering protocol.
//!
//! Backends receive canvas-space coordinates and are responsible for
//! converting to their native space (usually through a `Viewport`). The
//! provided `draw_path` drives the primitive calls in a fixed order, so a
//! backend only implements the primitives and can rely on `begin_path` /
//! `end_path` pairing.

use crate::path::{Path, PathCmd};
use crate::rect::Rect;
use crate::style::PathStyle;
use crate::vec::Vec2;

pub trait Renderer {
    /// Wipe the surface.
    fn clear(&mut self);

    /// Open a new path at `start`.
    fn begin_path(&mut self, start: Vec2);

    /// Reposition without drawing (paths admit mid-path `MoveTo`).
    fn move_to(&mut self, to: Vec2);

    fn line_to(&mut self, to: Vec2);

    fn trace_quadratic_bezier(&mut self, ctrl: Vec2, end: Vec2);

    fn trace_cubic_bezier(&mut self, c1: Vec2, c2: Vec2, end: Vec2);

    /// Close out the current path and paint it.
    fn end_path(&mut self, style: &PathStyle);

    /// Debug overlay: mark the given canvas-space points.
    fn draw_points(&mut self, points: &[Vec2]);

    /// Draw a full path through the primitive protocol.
    fn draw_path(&mut self, path: &Path, style: &PathStyle) {
        self.begin_path(path.start());
        for cmd in path.commands() {
            match *cmd {
                PathCmd::MoveTo(to) => self.move_to(to),
                PathCmd::LineTo(to) => self.line_to(to),
                PathCmd::QuadTo { ctrl, end } => self.trace_quadratic_bezier(ctrl, end),
                PathCmd::CubicTo { c1, c2, end } => self.trace_cubic_bezier(c1, c2, end),
            }
        }
        self.end_path(style);
    }

    /// Opaque imported content. Backends that can embed foreign markup
    /// return `true`; the default reports the content as unsupported.
    fn draw_raw_markup(&mut self, _markup: &str, _bbox: Rect) -> bool {
        false
    }
}
