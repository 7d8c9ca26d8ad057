//! The software bitmap backend.
//!
//! Owns an RGBA8 pixel buffer. Incoming canvas-space coordinates are
//! converted to screen space through the viewport transform the surface
//! was built with. Curves whose screen-space control polygon is shorter
//! than `CURVE_FLATTEN_PX` collapse to a single chord; longer ones are
//! sampled proportionally to their length. Fills use even-odd scanline
//! coverage; strokes are drawn as per-segment quads.

use nib_core::bezier::{CubicBezier, QuadBezier};
use nib_core::mat::Mat33;
use nib_core::rect::Rect;
use nib_core::render::Renderer;
use nib_core::style::{Color, PathStyle};
use nib_core::vec::Vec2;
use nib_core::viewport::Viewport;

/// Control polygons shorter than this many pixels draw as one chord.
const CURVE_FLATTEN_PX: f64 = 3.0;
/// Upper bound on flattening subdivisions per curve.
const MAX_FLATTEN_STEPS: usize = 64;
/// Side length of a debug point marker, in pixels.
const POINT_SIZE: f64 = 3.0;

pub struct BitmapRenderer {
    width: usize,
    height: usize,
    /// RGBA8, row-major.
    pixels: Vec<u8>,
    canvas_to_screen: Mat33,
    /// Flattened screen-space subpaths of the open path.
    subpaths: Vec<Vec<Vec2>>,
}

impl BitmapRenderer {
    pub fn new(width: usize, height: usize, canvas_to_screen: Mat33) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
            canvas_to_screen,
            subpaths: Vec::new(),
        }
    }

    /// A surface matching a viewport's screen rectangle and transform.
    pub fn for_viewport(viewport: &Viewport) -> Self {
        let rect = viewport.screen_rect();
        Self::new(
            rect.w.ceil().max(0.0) as usize,
            rect.h.ceil().max(0.0) as usize,
            *viewport.transform(),
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    fn to_screen(&self, canvas: Vec2) -> Vec2 {
        self.canvas_to_screen.transform_point(canvas)
    }

    /// Screen-space length of one canvas unit.
    fn screen_scale(&self) -> f64 {
        self.canvas_to_screen.transform_vec(Vec2::UNIT_X).magnitude()
    }

    fn current_subpath(&mut self) -> &mut Vec<Vec2> {
        if self.subpaths.is_empty() {
            self.subpaths.push(Vec::new());
        }
        let last = self.subpaths.len() - 1;
        &mut self.subpaths[last]
    }

    fn cursor(&self) -> Vec2 {
        self.subpaths
            .last()
            .and_then(|sp| sp.last())
            .copied()
            .unwrap_or(Vec2::ZERO)
    }

    /// Append a flattened curve given its screen-space control points.
    fn flatten_curve(&mut self, control_polygon_len: f64, at: impl Fn(f64) -> Vec2) {
        let steps = if control_polygon_len < CURVE_FLATTEN_PX {
            1
        } else {
            ((control_polygon_len / CURVE_FLATTEN_PX).ceil() as usize).min(MAX_FLATTEN_STEPS)
        };
        let subpath = self.current_subpath();
        for i in 1..=steps {
            subpath.push(at(i as f64 / steps as f64));
        }
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let sa = color[3] as u32;
        if sa == 0 {
            return;
        }
        for c in 0..3 {
            let dst = self.pixels[i + c] as u32;
            self.pixels[i + c] = ((color[c] as u32 * sa + dst * (255 - sa)) / 255) as u8;
        }
        let da = self.pixels[i + 3] as u32;
        self.pixels[i + 3] = (sa + da * (255 - sa) / 255) as u8;
    }

    /// Even-odd scanline fill over a set of closed screen-space polygons.
    fn fill_polygons(&mut self, polygons: &[Vec<Vec2>], color: Color) {
        let rgba = color.to_rgba8();
        if rgba[3] == 0 {
            return;
        }
        let bbox = Rect::bbox_of(polygons.iter().flatten().copied(), 0.0);
        let y_min = bbox.y.floor().max(0.0) as i64;
        let y_max = bbox.bottom_right().y.ceil().min(self.height as f64) as i64;

        let mut crossings: Vec<f64> = Vec::new();
        for y in y_min..y_max {
            let scan_y = y as f64 + 0.5;
            crossings.clear();
            for poly in polygons {
                if poly.len() < 2 {
                    continue;
                }
                for i in 0..poly.len() {
                    let a = poly[i];
                    let b = poly[(i + 1) % poly.len()];
                    if (a.y <= scan_y) != (b.y <= scan_y) {
                        crossings.push(a.x + (scan_y - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
            }
            crossings.sort_by(f64::total_cmp);
            for pair in crossings.chunks_exact(2) {
                let x_start = (pair[0] - 0.5).ceil().max(0.0) as i64;
                let x_end = (pair[1] - 0.5).floor().min(self.width as f64 - 1.0) as i64;
                for x in x_start..=x_end {
                    self.blend_pixel(x, y, rgba);
                }
            }
        }
    }

    /// Stroke an open polyline with a quad per segment.
    fn stroke_polyline(&mut self, points: &[Vec2], width_px: f64, color: Color) {
        let half = (width_px * 0.5).max(0.5);
        for pair in points.windows(2) {
            let Some(dir) = (pair[1] - pair[0]).normalized() else {
                continue;
            };
            let normal = dir.orthogonal() * half;
            let quad = vec![
                pair[0] + normal,
                pair[1] + normal,
                pair[1] - normal,
                pair[0] - normal,
            ];
            self.fill_polygons(std::slice::from_ref(&quad), color);
        }
    }
}

impl Renderer for BitmapRenderer {
    fn clear(&mut self) {
        self.pixels.fill(0);
        self.subpaths.clear();
    }

    fn begin_path(&mut self, start: Vec2) {
        let p = self.to_screen(start);
        self.subpaths.clear();
        self.subpaths.push(vec![p]);
    }

    fn move_to(&mut self, to: Vec2) {
        let p = self.to_screen(to);
        self.subpaths.push(vec![p]);
    }

    fn line_to(&mut self, to: Vec2) {
        let p = self.to_screen(to);
        self.current_subpath().push(p);
    }

    fn trace_quadratic_bezier(&mut self, ctrl: Vec2, end: Vec2) {
        let p0 = self.cursor();
        let p1 = self.to_screen(ctrl);
        let p2 = self.to_screen(end);
        let len = (p1 - p0).magnitude() + (p2 - p1).magnitude();
        let curve = QuadBezier::new(p0, p1, p2);
        self.flatten_curve(len, |t| curve.at(t));
    }

    fn trace_cubic_bezier(&mut self, c1: Vec2, c2: Vec2, end: Vec2) {
        let p0 = self.cursor();
        let p1 = self.to_screen(c1);
        let p2 = self.to_screen(c2);
        let p3 = self.to_screen(end);
        let len = (p1 - p0).magnitude() + (p2 - p1).magnitude() + (p3 - p2).magnitude();
        let curve = CubicBezier::new(p0, p1, p2, p3);
        self.flatten_curve(len, |t| curve.at(t));
    }

    fn end_path(&mut self, style: &PathStyle) {
        let subpaths = std::mem::take(&mut self.subpaths);
        self.fill_polygons(&subpaths, style.fill);
        if let Some(pen) = style.stroke {
            let width_px = pen.width * self.screen_scale();
            for subpath in &subpaths {
                self.stroke_polyline(subpath, width_px, pen.color);
            }
        }
    }

    fn draw_points(&mut self, points: &[Vec2]) {
        let marker = Color::rgba(1.0, 0.0, 0.0, 1.0);
        for &p in points {
            let s = self.to_screen(p);
            let half = POINT_SIZE * 0.5;
            let square = vec![
                s + Vec2::new(-half, -half),
                s + Vec2::new(half, -half),
                s + Vec2::new(half, half),
                s + Vec2::new(-half, half),
            ];
            self.fill_polygons(std::slice::from_ref(&square), marker);
        }
    }
}
