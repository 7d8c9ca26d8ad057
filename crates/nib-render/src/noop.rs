//! The operation-counting test surface.
//!
//! Draws nothing; counts every protocol call so tests can make
//! deterministic assertions about what would have been painted.

use nib_core::rect::Rect;
use nib_core::render::Renderer;
use nib_core::style::PathStyle;
use nib_core::vec::Vec2;

#[derive(Debug, Default)]
pub struct NoopRenderer {
    pub clear_calls: usize,
    pub begin_path_calls: usize,
    pub move_to_calls: usize,
    pub line_to_calls: usize,
    pub quadratic_calls: usize,
    pub cubic_calls: usize,
    pub end_path_calls: usize,
    pub point_calls: usize,
    pub raw_markup_calls: usize,
    /// Paths completed since the last `clear`.
    rendered_paths: usize,
}

impl NoopRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of paths fully drawn since the surface was last cleared.
    pub fn rendered_path_count(&self) -> usize {
        self.rendered_paths
    }
}

impl Renderer for NoopRenderer {
    fn clear(&mut self) {
        self.clear_calls += 1;
        self.rendered_paths = 0;
    }

    fn begin_path(&mut self, _start: Vec2) {
        self.begin_path_calls += 1;
    }

    fn move_to(&mut self, _to: Vec2) {
        self.move_to_calls += 1;
    }

    fn line_to(&mut self, _to: Vec2) {
        self.line_to_calls += 1;
    }

    fn trace_quadratic_bezier(&mut self, _ctrl: Vec2, _end: Vec2) {
        self.quadratic_calls += 1;
    }

    fn trace_cubic_bezier(&mut self, _c1: Vec2, _c2: Vec2, _end: Vec2) {
        self.cubic_calls += 1;
    }

    fn end_path(&mut self, _style: &PathStyle) {
        self.end_path_calls += 1;
        self.rendered_paths += 1;
    }

    fn draw_points(&mut self, points: &[Vec2]) {
        self.point_calls += points.len();
    }

    fn draw_raw_markup(&mut self, _markup: &str, _bbox: Rect) -> bool {
        self.raw_markup_calls += 1;
        true
    }
}
