//! The SVG tree backend.
//!
//! Accumulates each `draw_path` into a single serializable `<path>`
//! element and emits a complete SVG document on demand. Coordinates stay
//! in canvas space; the document's `viewBox` maps them for viewers.
//! Imported raw markup is passed through verbatim — this is the "capable"
//! backend for opaque elements.

use nib_core::path_text::format_coord;
use nib_core::rect::Rect;
use nib_core::render::Renderer;
use nib_core::style::PathStyle;
use nib_core::vec::Vec2;
use std::fmt::Write;

#[derive(Debug, Clone)]
enum SvgElement {
    Path { d: String, style: PathStyle },
    Points(Vec<Vec2>),
    Raw(String),
}

pub struct SvgRenderer {
    view_box: Rect,
    elements: Vec<SvgElement>,
    /// `d` attribute of the path being accumulated between
    /// `begin_path` and `end_path`.
    pending: Option<String>,
}

fn coord_pair(p: Vec2) -> String {
    format!("{},{}", format_coord(p.x), format_coord(p.y))
}

impl SvgRenderer {
    pub fn new(view_box: Rect) -> Self {
        Self { view_box, elements: Vec::new(), pending: None }
    }

    /// Serialize everything drawn so far into an SVG document.
    pub fn to_svg_document(&self) -> String {
        let mut out = String::with_capacity(256 + self.elements.len() * 64);
        let _ = write!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\">",
            format_coord(self.view_box.x),
            format_coord(self.view_box.y),
            format_coord(self.view_box.w),
            format_coord(self.view_box.h),
        );
        for element in &self.elements {
            out.push('\n');
            match element {
                SvgElement::Path { d, style } => {
                    let _ = write!(out, "<path d=\"{d}\" fill=\"{}\"", style.fill.to_hex());
                    match &style.stroke {
                        Some(pen) => {
                            let _ = write!(
                                out,
                                " stroke=\"{}\" stroke-width=\"{}\"/>",
                                pen.color.to_hex(),
                                format_coord(pen.width),
                            );
                        }
                        None => out.push_str("/>"),
                    }
                }
                SvgElement::Points(points) => {
                    for p in points {
                        let _ = write!(
                            out,
                            "<circle cx=\"{}\" cy=\"{}\" r=\"1\" fill=\"red\"/>",
                            format_coord(p.x),
                            format_coord(p.y),
                        );
                    }
                }
                SvgElement::Raw(markup) => out.push_str(markup),
            }
        }
        out.push_str("\n</svg>");
        out
    }

    /// Serialized `d` attributes of all accumulated paths, in draw order.
    /// This is what the host's serialized-path consumer reads.
    pub fn path_data(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                SvgElement::Path { d, .. } => Some(d.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn rendered_path_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, SvgElement::Path { .. }))
            .count()
    }
}

impl Renderer for SvgRenderer {
    fn clear(&mut self) {
        self.elements.clear();
        self.pending = None;
    }

    fn begin_path(&mut self, start: Vec2) {
        if self.pending.is_some() {
            log::warn!("begin_path while a path was already open; dropping it");
        }
        self.pending = Some(format!("M{}", coord_pair(start)));
    }

    fn move_to(&mut self, to: Vec2) {
        if let Some(d) = &mut self.pending {
            let _ = write!(d, " M{}", coord_pair(to));
        }
    }

    fn line_to(&mut self, to: Vec2) {
        if let Some(d) = &mut self.pending {
            let _ = write!(d, " L{}", coord_pair(to));
        }
    }

    fn trace_quadratic_bezier(&mut self, ctrl: Vec2, end: Vec2) {
        if let Some(d) = &mut self.pending {
            let _ = write!(d, " Q{} {}", coord_pair(ctrl), coord_pair(end));
        }
    }

    fn trace_cubic_bezier(&mut self, c1: Vec2, c2: Vec2, end: Vec2) {
        if let Some(d) = &mut self.pending {
            let _ = write!(d, " C{} {} {}", coord_pair(c1), coord_pair(c2), coord_pair(end));
        }
    }

    fn end_path(&mut self, style: &PathStyle) {
        if let Some(d) = self.pending.take() {
            self.elements.push(SvgElement::Path { d, style: *style });
        }
    }

    fn draw_points(&mut self, points: &[Vec2]) {
        self.elements.push(SvgElement::Points(points.to_vec()));
    }

    fn draw_raw_markup(&mut self, markup: &str, _bbox: Rect) -> bool {
        self.elements.push(SvgElement::Raw(markup.to_string()));
        true
    }
}
