//! Integration tests: spatial index properties over whole insertion and
//! removal sequences.

use nib_core::component::{ComponentId, ComponentKind, Stroke, StrokeSegment};
use nib_core::document::Document;
use nib_core::path::{Path, PathCmd};
use nib_core::rect::Rect;
use nib_core::style::{Color, PathStyle};
use nib_core::vec::Vec2;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn add_stroke(doc: &mut Document, rect: Rect) -> ComponentId {
    let path = Path::new(
        rect.top_left(),
        vec![
            PathCmd::LineTo(rect.top_left() + Vec2::new(rect.w, 0.0)),
            PathCmd::LineTo(rect.bottom_right()),
            PathCmd::LineTo(rect.top_left() + Vec2::new(0.0, rect.h)),
            PathCmd::LineTo(rect.top_left()),
        ],
    );
    let seg = StrokeSegment::new(path, PathStyle::filled(Color::BLACK));
    let component = doc.create_component(ComponentKind::Stroke(Stroke::new(vec![seg])));
    let id = component.id();
    doc.insert(component);
    id
}

/// A deterministic but scattered sequence of rectangles: varying sizes,
/// positions, plenty of overlap and containment.
fn scattered_rects(count: usize) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(count);
    let mut seed: u64 = 0x5DEECE66D;
    let mut next = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 33) % 1000) as f64 / 10.0
    };
    for _ in 0..count {
        let x = next();
        let y = next();
        let w = next() * 0.2 + 0.1;
        let h = next() * 0.2 + 0.1;
        rects.push(Rect::new(x, y, w, h));
    }
    rects
}

// ─── Properties ──────────────────────────────────────────────────────────

#[test]
fn every_component_findable_after_bulk_insertion() {
    let mut doc = Document::new();
    let ids: Vec<_> = scattered_rects(120)
        .into_iter()
        .map(|r| add_stroke(&mut doc, r))
        .collect();

    assert!(doc.is_consistent());
    for id in ids {
        let bbox = doc.get(id).unwrap().bbox();
        let found = doc.leaves_in_region(&bbox, None);
        assert!(found.iter().any(|c| c.id() == id), "{id} lost after insertion");
    }
}

#[test]
fn removal_keeps_remaining_components_findable() {
    let mut doc = Document::new();
    let ids: Vec<_> = scattered_rects(60)
        .into_iter()
        .map(|r| add_stroke(&mut doc, r))
        .collect();

    // Remove every other component.
    for (i, id) in ids.iter().enumerate() {
        if i % 2 == 0 {
            let bbox = doc.get(*id).unwrap().bbox();
            doc.remove(*id).expect("component was present");
            assert!(
                !doc.leaves_in_region(&bbox, None).iter().any(|c| c.id() == *id),
                "{id} still findable after removal"
            );
        }
    }

    assert!(doc.is_consistent(), "ancestor bboxes must equal descendant unions");
    for (i, id) in ids.iter().enumerate() {
        if i % 2 == 1 {
            let bbox = doc.get(*id).unwrap().bbox();
            assert!(doc.leaves_in_region(&bbox, None).iter().any(|c| c.id() == *id));
        }
    }
}

#[test]
fn interleaved_insert_remove_stays_consistent() {
    let mut doc = Document::new();
    let rects = scattered_rects(80);
    let mut live = Vec::new();
    for (i, rect) in rects.into_iter().enumerate() {
        live.push(add_stroke(&mut doc, rect));
        if i % 3 == 2 {
            let id = live.remove(0);
            doc.remove(id).unwrap();
        }
        assert!(doc.is_consistent(), "invariants broken at step {i}");
    }
    assert_eq!(doc.component_count(), live.len());
}

#[test]
fn document_bbox_shrinks_back_to_empty() {
    let mut doc = Document::new();
    let ids: Vec<_> = scattered_rects(25)
        .into_iter()
        .map(|r| add_stroke(&mut doc, r))
        .collect();
    for id in ids {
        doc.remove(id).unwrap();
    }
    assert_eq!(doc.component_count(), 0);
    assert!(doc.bbox().eq_approx(&Rect::EMPTY, 1e-12));
    assert!(doc.is_consistent());
}

#[test]
fn unit_stroke_scenario() {
    // Adding a stroke with bbox (0,0)-(1,1): find_parent returns a node
    // whose bounding box is exactly that rectangle.
    let mut doc = Document::new();
    let id = add_stroke(&mut doc, Rect::new(0.0, 0.0, 1.0, 1.0));

    let node_idx = doc.find_parent(id).expect("stroke must have a parent node");
    let node = doc.node(node_idx).unwrap();
    assert!(node.bbox().eq_approx(&Rect::new(0.0, 0.0, 1.0, 1.0), 1e-12));
}
