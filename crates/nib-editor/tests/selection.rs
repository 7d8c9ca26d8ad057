//! Integration tests: the selection tool's marquee resolution, handle
//! drags, and rotation snapping.

use nib_core::component::{Component, ComponentKind, Stroke, StrokeSegment};
use nib_core::path::{Path, PathCmd};
use nib_core::rect::Rect;
use nib_core::style::{Color, PathStyle};
use nib_core::vec::Vec2;
use nib_editor::tools::{SelectionTool, Tool, ToolContext};
use nib_editor::{EditorState, Pointer, UndoRedoHistory};

const SCREEN: Rect = Rect { x: 0.0, y: 0.0, w: 800.0, h: 600.0 };
/// Matches the tool's screen-space minimum handle padding.
const MIN_PAD: f64 = 10.0;

fn make_state() -> EditorState {
    EditorState::new(SCREEN)
}

fn add_unit_stroke(state: &mut EditorState, origin: Vec2) -> Component {
    let path = Path::new(
        origin,
        vec![
            PathCmd::LineTo(origin + Vec2::new(1.0, 0.0)),
            PathCmd::LineTo(origin + Vec2::new(1.0, 1.0)),
            PathCmd::LineTo(origin + Vec2::new(0.0, 1.0)),
            PathCmd::LineTo(origin),
        ],
    );
    let seg = StrokeSegment::new(path, PathStyle::filled(Color::BLACK));
    state
        .document
        .create_component(ComponentKind::Stroke(Stroke::new(vec![seg])))
}

/// Run a full marquee gesture over the given screen rectangle.
fn select_rect(
    tool: &mut SelectionTool,
    state: &mut EditorState,
    history: &mut UndoRedoHistory,
    from: Vec2,
    to: Vec2,
) {
    let down = Pointer::down(from, &state.viewport, 0.0);
    let mut ctx = ToolContext { state, history };
    assert!(tool.on_pointer_down(&mut ctx, &down, &[down]));

    let moved = down.moved_to(to, &ctx.state.viewport, 10.0);
    tool.on_pointer_move(&mut ctx, &moved, &[moved]);
    tool.on_pointer_up(&mut ctx, &moved.lifted(20.0), &[]);
}

#[test]
fn selection_region_is_union_plus_padding() {
    // Scenario: selecting strokes with bboxes (0,0,1,1) and (5,5,1,1)
    // yields their union grown by at least the minimum handle padding.
    let mut state = make_state();
    let mut history = UndoRedoHistory::new();
    let a = add_unit_stroke(&mut state, Vec2::ZERO);
    let b = add_unit_stroke(&mut state, Vec2::new(5.0, 5.0));
    let (ida, idb) = (a.id(), b.id());
    state.document.insert(a);
    state.document.insert(b);

    let mut tool = SelectionTool::new();
    tool.set_enabled(true);
    select_rect(
        &mut tool,
        &mut state,
        &mut history,
        Vec2::new(-2.0, -2.0),
        Vec2::new(8.0, 8.0),
    );

    let selection = tool.selection.as_ref().expect("two strokes selected");
    assert_eq!(selection.ids.len(), 2);
    assert!(selection.ids.contains(&ida) && selection.ids.contains(&idb));

    let union = Rect::new(0.0, 0.0, 6.0, 6.0);
    assert!(selection.region.contains_rect(&union));
    assert!(union.x - selection.region.x >= MIN_PAD - 1e-9);
    assert!(union.y - selection.region.y >= MIN_PAD - 1e-9);
    assert!(selection.region.bottom_right().x - union.bottom_right().x >= MIN_PAD - 1e-9);
    assert!(selection.region.bottom_right().y - union.bottom_right().y >= MIN_PAD - 1e-9);
}

#[test]
fn edge_intersecting_components_are_selected() {
    // A marquee that only clips the corner of a stroke still selects it.
    let mut state = make_state();
    let mut history = UndoRedoHistory::new();
    let c = add_unit_stroke(&mut state, Vec2::new(10.0, 10.0));
    let id = c.id();
    state.document.insert(c);

    let mut tool = SelectionTool::new();
    tool.set_enabled(true);
    select_rect(
        &mut tool,
        &mut state,
        &mut history,
        Vec2::new(5.0, 5.0),
        Vec2::new(10.5, 10.5),
    );

    let selection = tool.selection.as_ref().expect("corner clip selects");
    assert_eq!(selection.ids, vec![id]);
}

#[test]
fn empty_marquee_clears_selection() {
    let mut state = make_state();
    let mut history = UndoRedoHistory::new();
    let c = add_unit_stroke(&mut state, Vec2::new(10.0, 10.0));
    state.document.insert(c);

    let mut tool = SelectionTool::new();
    tool.set_enabled(true);
    select_rect(
        &mut tool,
        &mut state,
        &mut history,
        Vec2::new(100.0, 100.0),
        Vec2::new(120.0, 120.0),
    );
    assert!(tool.selection.is_none());
}

#[test]
fn move_drag_commits_one_undoable_transform() {
    let mut state = make_state();
    let mut history = UndoRedoHistory::new();
    let c = add_unit_stroke(&mut state, Vec2::new(2.0, 2.0));
    let id = c.id();
    state.document.insert(c);

    let mut tool = SelectionTool::new();
    tool.set_enabled(true);
    select_rect(
        &mut tool,
        &mut state,
        &mut history,
        Vec2::new(0.0, 0.0),
        Vec2::new(5.0, 5.0),
    );
    assert!(tool.selection.is_some());
    let commands_after_select = history.undo_len();
    let before = state.document.get(id).unwrap().bbox();

    // Grab the middle of the selection (auto-scroll may have shifted the
    // viewport, so map through it) and drag 50px right.
    let region = tool.selection.as_ref().unwrap().region;
    let grab = state.viewport.canvas_to_screen(region.center());
    let down = Pointer::down(grab, &state.viewport, 100.0);
    let mut ctx = ToolContext { state: &mut state, history: &mut history };
    assert!(tool.on_pointer_down(&mut ctx, &down, &[down]));

    let moved = down.moved_to(grab + Vec2::new(50.0, 0.0), &ctx.state.viewport, 110.0);
    tool.on_pointer_move(&mut ctx, &moved, &[moved]);
    tool.on_pointer_up(&mut ctx, &moved.lifted(120.0), &[]);

    let moved_bbox = state.document.get(id).unwrap().bbox();
    assert!((moved_bbox.x - before.x - 50.0).abs() < 1e-6, "moved by the drag distance");
    assert_eq!(history.undo_len(), commands_after_select + 1, "one command per drag");

    history.undo(&mut state);
    let restored = state.document.get(id).unwrap().bbox();
    assert!(restored.eq_approx(&before, 1e-6));
}

#[test]
fn tiny_rotation_snaps_to_zero_and_commits_nothing() {
    let mut state = make_state();
    let mut history = UndoRedoHistory::new();
    let c = add_unit_stroke(&mut state, Vec2::new(2.0, 2.0));
    let id = c.id();
    state.document.insert(c);

    let mut tool = SelectionTool::new();
    tool.set_enabled(true);
    select_rect(
        &mut tool,
        &mut state,
        &mut history,
        Vec2::new(0.0, 0.0),
        Vec2::new(5.0, 5.0),
    );
    let commands_after_select = history.undo_len();
    let before = state.document.get(id).unwrap().bbox();

    // Grab the rotate handle above the selection and nudge it a few
    // degrees — below the snap increment.
    let region = tool.selection.as_ref().unwrap().region;
    let top_center = state
        .viewport
        .canvas_to_screen(Vec2::new(region.center().x, region.y));
    let handle = top_center + Vec2::new(0.0, -24.0);
    let down = Pointer::down(handle, &state.viewport, 100.0);
    let mut ctx = ToolContext { state: &mut state, history: &mut history };
    assert!(tool.on_pointer_down(&mut ctx, &down, &[down]));

    let moved = down.moved_to(handle + Vec2::new(4.0, 0.0), &ctx.state.viewport, 110.0);
    tool.on_pointer_move(&mut ctx, &moved, &[moved]);
    tool.on_pointer_up(&mut ctx, &moved.lifted(120.0), &[]);

    assert_eq!(history.undo_len(), commands_after_select, "sub-snap rotation is a no-op");
    let after = state.document.get(id).unwrap().bbox();
    assert!(after.eq_approx(&before, 1e-9));
}

#[test]
fn delete_key_erases_the_selection() {
    let mut state = make_state();
    let mut history = UndoRedoHistory::new();
    let c = add_unit_stroke(&mut state, Vec2::new(2.0, 2.0));
    let id = c.id();
    state.document.insert(c);

    let mut tool = SelectionTool::new();
    tool.set_enabled(true);
    select_rect(
        &mut tool,
        &mut state,
        &mut history,
        Vec2::new(0.0, 0.0),
        Vec2::new(5.0, 5.0),
    );

    let mut ctx = ToolContext { state: &mut state, history: &mut history };
    assert!(tool.on_key_press(&mut ctx, "Delete"));
    assert!(state.document.get(id).is_none());

    history.undo(&mut state);
    assert!(state.document.get(id).is_some());
}
