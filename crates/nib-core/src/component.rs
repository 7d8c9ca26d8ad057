//! Drawable document components.
//!
//! A component is either a freehand stroke or an opaque imported element.
//! Components are owned by exactly one spatial-index leaf at a time; their
//! id and z-index are assigned by the owning `Document`, never by a global
//! counter.

use crate::line::LineSegment;
use crate::mat::Mat33;
use crate::path::Path;
use crate::rect::Rect;
use crate::render::Renderer;
use crate::style::PathStyle;
use crate::vec::Vec2;
use std::fmt;

/// Dense identifier assigned by the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One painted outline of a stroke: a closed path and its paint.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSegment {
    pub path: Path,
    pub style: PathStyle,
}

impl StrokeSegment {
    pub fn new(path: Path, style: PathStyle) -> Self {
        Self { path, style }
    }
}

/// A freehand stroke: an ordered list of renderable path segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub segments: Vec<StrokeSegment>,
}

impl Stroke {
    pub fn new(segments: Vec<StrokeSegment>) -> Self {
        Self { segments }
    }

    /// Union of all segment bounding boxes.
    fn bbox(&self) -> Rect {
        let mut iter = self.segments.iter();
        let Some(first) = iter.next() else {
            return Rect::EMPTY;
        };
        iter.fold(first.path.bbox(), |acc, seg| acc.union(&seg.path.bbox()))
    }
}

/// Foreign markup the engine cannot interpret, kept opaque. Only capable
/// backends can draw it; everything else skips it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedElement {
    pub markup: String,
    /// Bounds as declared by the source document, pre-transform.
    pub declared_bbox: Rect,
    /// Accumulated transform applied since import.
    pub transform: Mat33,
}

impl ImportedElement {
    pub fn new(markup: String, declared_bbox: Rect) -> Self {
        Self { markup, declared_bbox, transform: Mat33::IDENTITY }
    }

    fn bbox(&self) -> Rect {
        self.declared_bbox.transformed_bbox(&self.transform)
    }
}

/// The closed set of component variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    Stroke(Stroke),
    Imported(ImportedElement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    id: ComponentId,
    z_index: u64,
    kind: ComponentKind,
    bbox: Rect,
}

impl Component {
    /// Built by `Document::create_component`; not public so ids and
    /// z-indices always come from a document's counters.
    pub(crate) fn new(id: ComponentId, z_index: u64, kind: ComponentKind) -> Self {
        let bbox = Self::kind_bbox(&kind);
        Self { id, z_index, kind, bbox }
    }

    fn kind_bbox(kind: &ComponentKind) -> Rect {
        match kind {
            ComponentKind::Stroke(s) => s.bbox(),
            ComponentKind::Imported(e) => e.bbox(),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Paint order: higher draws later.
    pub fn z_index(&self) -> u64 {
        self.z_index
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Cached bounding box; recomputed whenever the geometry mutates.
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// Draw through the rendering protocol, skipping entirely when the
    /// component cannot be visible.
    pub fn render(&self, renderer: &mut dyn Renderer, visible_rect: &Rect) {
        if !self.bbox.intersects(visible_rect) {
            return;
        }
        match &self.kind {
            ComponentKind::Stroke(stroke) => {
                for seg in &stroke.segments {
                    renderer.draw_path(&seg.path, &seg.style);
                }
            }
            ComponentKind::Imported(elem) => {
                if !renderer.draw_raw_markup(&elem.markup, self.bbox) {
                    log::debug!("renderer cannot draw imported element {}", self.id);
                }
            }
        }
    }

    /// Geometric hit test against a line segment (eraser / selection).
    /// Imported elements test against their bounding box edges.
    pub fn intersects(&self, seg: &LineSegment) -> bool {
        if !self.bbox.intersects(&seg.bbox()) {
            return false;
        }
        match &self.kind {
            ComponentKind::Stroke(stroke) => stroke
                .segments
                .iter()
                .any(|s| s.path.intersects_line(seg)),
            ComponentKind::Imported(_) => self
                .bbox
                .edges()
                .iter()
                .any(|&(a, b)| LineSegment::new(a, b).intersection(seg).is_some()),
        }
    }

    /// Mutate geometry in place by an affine transform, recomputing the
    /// cached bounding box. The owning document must reinsert the
    /// component afterwards, since its tree placement changes.
    pub fn transform(&mut self, transform: &Mat33) {
        match &mut self.kind {
            ComponentKind::Stroke(stroke) => {
                for seg in &mut stroke.segments {
                    seg.path = seg.path.transformed(transform);
                    if let Some(pen) = &mut seg.style.stroke {
                        pen.width *= transform.transform_vec(Vec2::UNIT_X).magnitude();
                    }
                }
            }
            ComponentKind::Imported(elem) => {
                elem.transform = *transform * elem.transform;
            }
        }
        self.bbox = Self::kind_bbox(&self.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathCmd;
    use crate::style::Color;
    use crate::vec::Vec2;

    fn stroke_component(id: u64) -> Component {
        let path = Path::new(
            Vec2::ZERO,
            vec![
                PathCmd::LineTo(Vec2::new(1.0, 0.0)),
                PathCmd::LineTo(Vec2::new(1.0, 1.0)),
                PathCmd::LineTo(Vec2::new(0.0, 1.0)),
                PathCmd::LineTo(Vec2::ZERO),
            ],
        );
        let seg = StrokeSegment::new(path, PathStyle::filled(Color::BLACK));
        Component::new(ComponentId(id), id, ComponentKind::Stroke(Stroke::new(vec![seg])))
    }

    #[test]
    fn stroke_bbox_is_union_of_segments() {
        let c = stroke_component(1);
        assert!(c.bbox().eq_approx(&Rect::UNIT, 1e-12));
    }

    #[test]
    fn line_hit_test() {
        let c = stroke_component(1);
        let crossing = LineSegment::new(Vec2::new(-1.0, 0.5), Vec2::new(2.0, 0.5));
        assert!(c.intersects(&crossing));

        let miss = LineSegment::new(Vec2::new(-1.0, 5.0), Vec2::new(2.0, 5.0));
        assert!(!c.intersects(&miss));

        // Fully inside an open stroke outline region but not crossing it.
        let inside = LineSegment::new(Vec2::new(0.4, 0.5), Vec2::new(0.6, 0.5));
        assert!(!c.intersects(&inside));
    }

    #[test]
    fn transform_updates_cached_bbox() {
        let mut c = stroke_component(1);
        c.transform(&Mat33::translation(Vec2::new(5.0, 5.0)));
        assert!(c.bbox().eq_approx(&Rect::new(5.0, 5.0, 1.0, 1.0), 1e-12));

        c.transform(&Mat33::scaling(2.0, Vec2::new(5.0, 5.0)));
        assert!(c.bbox().eq_approx(&Rect::new(5.0, 5.0, 2.0, 2.0), 1e-12));
    }

    #[test]
    fn imported_element_hit_tests_bbox_edges() {
        let c = Component::new(
            ComponentId(7),
            7,
            ComponentKind::Imported(ImportedElement::new(
                "<image/>".to_string(),
                Rect::new(0.0, 0.0, 2.0, 2.0),
            )),
        );
        assert!(c.intersects(&LineSegment::new(Vec2::new(-1.0, 1.0), Vec2::new(1.0, 1.0))));
        assert!(!c.intersects(&LineSegment::new(Vec2::new(0.5, 0.5), Vec2::new(1.5, 1.5))));
    }
}
