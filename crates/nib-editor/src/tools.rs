//! The pointer-driven tool system.
//!
//! Each gesture runs a small state machine: idle → (pointer-down accepted
//! by exactly one tool) → active → (pointer-up | cancel) → idle. On
//! pointer-down the controller tries tools in a fixed priority order; the
//! first one whose `on_pointer_down` returns true captures the gesture
//! and receives every move/up event until it ends. Primary tools are
//! mutually exclusive; the pan/zoom tool rides along independently and
//! picks up gestures the primary tools refuse (e.g. a second touch).

use crate::commands::{
    AddComponent, Command, EditorState, EraseComponents, TransformComponents, ViewportChange,
};
use crate::events::{EventChannel, ToolEvent};
use crate::history::UndoRedoHistory;
use crate::input::{InputEvent, Pointer};
use crate::stroke_builder::{StrokeBuilder, StrokeSample};
use nib_core::component::{ComponentId, ComponentKind};
use nib_core::line::LineSegment;
use nib_core::mat::Mat33;
use nib_core::path::{Path, PathCmd};
use nib_core::rect::Rect;
use nib_core::render::Renderer;
use nib_core::style::{Color, PathStyle, StrokePen};
use nib_core::vec::Vec2;

/// Everything a tool may touch while handling an event. All mutation
/// still funnels through commands on `history` or live previews that are
/// committed as commands on release.
pub struct ToolContext<'a> {
    pub state: &'a mut EditorState,
    pub history: &'a mut UndoRedoHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Pen,
    Eraser,
    Selection,
    PanZoom,
}

/// Mutual-exclusion grouping: enabling one `Primary` tool disables its
/// siblings; `Independent` tools stay enabled alongside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolGroup {
    Primary,
    Independent,
}

#[allow(unused_variables)]
pub trait Tool {
    fn kind(&self) -> ToolKind;

    fn group(&self) -> ToolGroup {
        ToolGroup::Primary
    }

    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Return true to capture the gesture.
    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        all_pointers: &[Pointer],
    ) -> bool;

    fn on_pointer_move(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        all_pointers: &[Pointer],
    );

    fn on_pointer_up(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        all_pointers: &[Pointer],
    );

    /// Revert any not-yet-committed preview state.
    fn on_gesture_cancel(&mut self, ctx: &mut ToolContext<'_>);

    /// Return true if the wheel event was consumed.
    fn on_wheel(&mut self, ctx: &mut ToolContext<'_>, screen_pos: Vec2, delta: Vec2) -> bool {
        false
    }

    /// Return true if the key was consumed.
    fn on_key_press(&mut self, ctx: &mut ToolContext<'_>, key: &str) -> bool {
        false
    }

    /// Draw transient state (live stroke, marquee, handles).
    fn render_preview(&self, renderer: &mut dyn Renderer) {}
}

// ─── Controller ──────────────────────────────────────────────────────────

/// Fixed dispatch priority.
const PRIORITY: [ToolKind; 4] = [
    ToolKind::Pen,
    ToolKind::Eraser,
    ToolKind::Selection,
    ToolKind::PanZoom,
];

pub struct ToolController {
    pub pen: PenTool,
    pub eraser: EraserTool,
    pub selection: SelectionTool,
    pub pan_zoom: PanZoomTool,
    active: Option<ToolKind>,
    pub events: EventChannel<ToolEvent>,
}

impl ToolController {
    pub fn new() -> Self {
        Self {
            pen: PenTool::new(),
            eraser: EraserTool::new(),
            selection: SelectionTool::new(),
            pan_zoom: PanZoomTool::new(),
            active: None,
            events: EventChannel::new(),
        }
    }

    fn tool_mut(&mut self, kind: ToolKind) -> &mut dyn Tool {
        match kind {
            ToolKind::Pen => &mut self.pen,
            ToolKind::Eraser => &mut self.eraser,
            ToolKind::Selection => &mut self.selection,
            ToolKind::PanZoom => &mut self.pan_zoom,
        }
    }

    fn tool(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::Pen => &self.pen,
            ToolKind::Eraser => &self.eraser,
            ToolKind::Selection => &self.selection,
            ToolKind::PanZoom => &self.pan_zoom,
        }
    }

    pub fn active_tool(&self) -> Option<ToolKind> {
        self.active
    }

    pub fn is_enabled(&self, kind: ToolKind) -> bool {
        self.tool(kind).enabled()
    }

    /// Enable or disable a tool. Enabling a primary tool disables its
    /// exclusion-group siblings. Disabling the active tool cancels its
    /// gesture first.
    pub fn set_tool_enabled(&mut self, ctx: &mut ToolContext<'_>, kind: ToolKind, enabled: bool) {
        if enabled && self.tool(kind).group() == ToolGroup::Primary {
            for other in PRIORITY {
                if other != kind
                    && self.tool(other).group() == ToolGroup::Primary
                    && self.tool(other).enabled()
                {
                    self.tool_mut(other).set_enabled(false);
                    self.events.emit(&ToolEvent::Disabled(other));
                }
            }
        }
        if !enabled && self.active == Some(kind) {
            self.tool_mut(kind).on_gesture_cancel(ctx);
            self.active = None;
        }
        self.tool_mut(kind).set_enabled(enabled);
        self.events.emit(&if enabled {
            ToolEvent::Enabled(kind)
        } else {
            ToolEvent::Disabled(kind)
        });
    }

    /// Route one input event per the capture rules.
    pub fn dispatch(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) {
        match event {
            InputEvent::PointerDown { pointer, all_pointers } => {
                // The capturing tool gets first claim on further contacts.
                if let Some(active) = self.active
                    && self.tool_mut(active).on_pointer_down(ctx, pointer, all_pointers)
                {
                    return;
                }
                for kind in PRIORITY {
                    if Some(kind) == self.active || !self.tool(kind).enabled() {
                        continue;
                    }
                    if self.tool_mut(kind).on_pointer_down(ctx, pointer, all_pointers) {
                        if let Some(previous) = self.active.replace(kind)
                            && previous != kind
                        {
                            self.tool_mut(previous).on_gesture_cancel(ctx);
                        }
                        return;
                    }
                }
            }
            InputEvent::PointerMove { pointer, all_pointers } => {
                if let Some(active) = self.active {
                    self.tool_mut(active).on_pointer_move(ctx, pointer, all_pointers);
                }
            }
            InputEvent::PointerUp { pointer, all_pointers } => {
                if let Some(active) = self.active {
                    self.tool_mut(active).on_pointer_up(ctx, pointer, all_pointers);
                    if all_pointers.is_empty() {
                        self.active = None;
                    }
                }
            }
            InputEvent::GestureCancel => {
                if let Some(active) = self.active.take() {
                    self.tool_mut(active).on_gesture_cancel(ctx);
                }
            }
            InputEvent::Wheel { screen_pos, delta } => {
                for kind in PRIORITY {
                    if self.tool(kind).enabled()
                        && self.tool_mut(kind).on_wheel(ctx, *screen_pos, *delta)
                    {
                        return;
                    }
                }
            }
            InputEvent::KeyPress { key } => {
                for kind in PRIORITY {
                    if self.tool(kind).enabled() && self.tool_mut(kind).on_key_press(ctx, key) {
                        return;
                    }
                }
            }
        }
    }

    /// Paint the active tool's transient state.
    pub fn render_previews(&self, renderer: &mut dyn Renderer) {
        if let Some(active) = self.active {
            self.tool(active).render_preview(renderer);
        } else if self.selection.enabled() {
            // A resolved selection stays visible between gestures.
            self.selection.render_preview(renderer);
        }
    }

    // Property setters live here so they can fire tool-updated events.

    pub fn set_pen_color(&mut self, color: Color) {
        self.pen.color = color;
        self.events.emit(&ToolEvent::Updated(ToolKind::Pen));
    }

    pub fn set_pen_thickness(&mut self, thickness: f64) {
        self.pen.thickness = thickness;
        self.events.emit(&ToolEvent::Updated(ToolKind::Pen));
    }

    pub fn set_eraser_thickness(&mut self, thickness: f64) {
        self.eraser.thickness = thickness;
        self.events.emit(&ToolEvent::Updated(ToolKind::Eraser));
    }
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Pen ─────────────────────────────────────────────────────────────────

/// Screen-space smoothing band, divided by the zoom so visual smoothing
/// is resolution-independent.
const PEN_MIN_FIT_PX: f64 = 0.7;
const PEN_MAX_FIT_PX: f64 = 8.0;

pub struct PenTool {
    enabled: bool,
    pub color: Color,
    /// Base stroke width in canvas units.
    pub thickness: f64,
    builder: Option<StrokeBuilder>,
}

impl PenTool {
    pub fn new() -> Self {
        Self {
            enabled: true,
            color: Color::BLACK,
            thickness: 4.0,
            builder: None,
        }
    }

    fn sample_from(&self, pointer: &Pointer) -> StrokeSample {
        StrokeSample {
            pos: pointer.canvas_pos,
            width: self.thickness * pointer.pressure.unwrap_or(1.0),
            time_ms: pointer.time_ms,
        }
    }
}

impl Default for PenTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for PenTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pen
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        all_pointers: &[Pointer],
    ) -> bool {
        // A second contact is a pinch, not a stroke — give it up so the
        // pan/zoom tool can claim the gesture.
        if !pointer.is_primary || all_pointers.len() > 1 {
            return false;
        }
        let scale = ctx.state.viewport.scale_factor();
        self.builder = Some(StrokeBuilder::new(
            self.sample_from(pointer),
            self.color,
            PEN_MIN_FIT_PX / scale,
            PEN_MAX_FIT_PX / scale,
        ));
        true
    }

    fn on_pointer_move(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        _all_pointers: &[Pointer],
    ) {
        if let Some(builder) = &mut self.builder {
            builder.add_sample(StrokeSample {
                pos: pointer.canvas_pos,
                width: self.thickness * pointer.pressure.unwrap_or(1.0),
                time_ms: pointer.time_ms,
            });
            // The live preview repaints on a transient surface.
            ctx.state.request_repaint();
        }
    }

    fn on_pointer_up(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        _all_pointers: &[Pointer],
    ) {
        let Some(mut builder) = self.builder.take() else {
            return;
        };
        builder.add_sample(self.sample_from(pointer));
        let stroke = builder.build();
        let component = ctx
            .state
            .document
            .create_component(ComponentKind::Stroke(stroke));
        // The preview already painted this stroke, so the first apply
        // skips the re-render ("flatten" optimization).
        let command = AddComponent::with_flatten(component, true);
        ctx.history.push(Box::new(command), ctx.state, true);
    }

    fn on_gesture_cancel(&mut self, ctx: &mut ToolContext<'_>) {
        self.builder = None;
        ctx.state.request_repaint();
    }

    fn render_preview(&self, renderer: &mut dyn Renderer) {
        if let Some(builder) = &self.builder {
            for segment in builder.preview() {
                renderer.draw_path(&segment.path, &segment.style);
            }
        }
    }
}

// ─── Eraser ──────────────────────────────────────────────────────────────

pub struct EraserTool {
    enabled: bool,
    /// Query tolerance in screen pixels.
    pub thickness: f64,
    last_canvas_pos: Option<Vec2>,
    pending: Option<EraseComponents>,
}

impl EraserTool {
    pub fn new() -> Self {
        Self {
            enabled: false,
            thickness: 10.0,
            last_canvas_pos: None,
            pending: None,
        }
    }
}

impl Default for EraserTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for EraserTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Eraser
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        all_pointers: &[Pointer],
    ) -> bool {
        if !pointer.is_primary || all_pointers.len() > 1 {
            return false;
        }
        self.last_canvas_pos = Some(pointer.canvas_pos);
        let mut pending = EraseComponents::empty();
        pending.apply(ctx.state);
        self.pending = Some(pending);
        true
    }

    fn on_pointer_move(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        _all_pointers: &[Pointer],
    ) {
        let current = pointer.canvas_pos;
        let previous = self.last_canvas_pos.replace(current).unwrap_or(current);
        let Some(pending) = &mut self.pending else {
            return;
        };

        let sweep = LineSegment::new(previous, current);
        let tolerance = self.thickness / ctx.state.viewport.scale_factor();
        let query = sweep.bbox().grown(tolerance);

        let hits: Vec<ComponentId> = ctx
            .state
            .document
            .leaves_in_region(&query, None)
            .into_iter()
            .filter(|c| c.intersects(&sweep))
            .map(|c| c.id())
            .filter(|id| !pending.contains(*id))
            .collect();
        if hits.is_empty() {
            return;
        }

        // Extend the live command: rewind it, grow it, replay it.
        pending.unapply(ctx.state);
        pending.extend(hits);
        pending.apply(ctx.state);
    }

    fn on_pointer_up(
        &mut self,
        ctx: &mut ToolContext<'_>,
        _pointer: &Pointer,
        _all_pointers: &[Pointer],
    ) {
        self.last_canvas_pos = None;
        let Some(pending) = self.pending.take() else {
            return;
        };
        // Only a gesture that actually removed something becomes undoable.
        if !pending.is_empty() {
            ctx.history.push(Box::new(pending), ctx.state, false);
        }
    }

    fn on_gesture_cancel(&mut self, ctx: &mut ToolContext<'_>) {
        self.last_canvas_pos = None;
        if let Some(mut pending) = self.pending.take()
            && !pending.is_empty()
        {
            pending.unapply(ctx.state);
        }
    }
}

// ─── Selection ───────────────────────────────────────────────────────────

/// Minimum padding around the selection, in screen pixels.
const HANDLE_PAD_PX: f64 = 10.0;
/// Hit radius of the resize/rotate handles, in screen pixels.
const HANDLE_SIZE_PX: f64 = 14.0;
/// Distance of the rotate handle above the selection top edge.
const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;
/// Rotation snaps to multiples of this angle.
const ROTATION_SNAP: f64 = std::f64::consts::PI / 12.0;

/// Normalize an angle to (-π, π].
fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::PI;
    angle %= 2.0 * PI;
    if angle > PI {
        angle -= 2.0 * PI;
    } else if angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Snap an accumulated rotation delta to fixed increments, stepping in
/// the direction of the delta's sign.
fn snap_rotation(delta: f64, step: f64) -> f64 {
    step * (delta.abs() / step).floor() * delta.signum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionHandle {
    Move,
    Resize,
    Rotate,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub ids: Vec<ComponentId>,
    /// Union bbox of the selected components plus handle padding, in
    /// canvas units.
    pub region: Rect,
}

struct DragState {
    handle: SelectionHandle,
    last_canvas_pos: Vec2,
    /// Product of every live-preview transform applied so far.
    total: Mat33,
    /// Raw and snapped rotation accumulators for the rotate handle.
    raw_rotation: f64,
    applied_rotation: f64,
}

pub struct SelectionTool {
    enabled: bool,
    marquee_anchor: Option<Vec2>,
    pub marquee: Option<Rect>,
    pub selection: Option<Selection>,
    drag: Option<DragState>,
}

impl SelectionTool {
    pub fn new() -> Self {
        Self {
            enabled: false,
            marquee_anchor: None,
            marquee: None,
            selection: None,
            drag: None,
        }
    }

    fn hit_handle(&self, ctx: &ToolContext<'_>, screen_pos: Vec2) -> Option<SelectionHandle> {
        let selection = self.selection.as_ref()?;
        let viewport = &ctx.state.viewport;
        let region = selection.region.transformed_bbox(viewport.transform());

        let rotate_center =
            Vec2::new(region.center().x, region.y - ROTATE_HANDLE_OFFSET_PX);
        if (screen_pos - rotate_center).magnitude() <= HANDLE_SIZE_PX {
            return Some(SelectionHandle::Rotate);
        }
        if (screen_pos - region.bottom_right()).magnitude() <= HANDLE_SIZE_PX {
            return Some(SelectionHandle::Resize);
        }
        if region.contains_point(screen_pos) {
            return Some(SelectionHandle::Move);
        }
        None
    }

    /// Apply one live-preview transform step to the selected components.
    fn apply_preview(&mut self, ctx: &mut ToolContext<'_>, step: Mat33) {
        let Some(selection) = &mut self.selection else {
            return;
        };
        for &id in &selection.ids {
            ctx.state.document.transform_component(id, &step);
        }
        selection.region = selection.region.transformed_bbox(&step);
        if let Some(drag) = &mut self.drag {
            drag.total = step * drag.total;
        }
        ctx.state.request_repaint();
    }

    /// Resolve the marquee to a selection: components fully contained in
    /// the rectangle or crossed by one of its edges.
    fn resolve_marquee(&mut self, ctx: &mut ToolContext<'_>, marquee: Rect) {
        let document = &ctx.state.document;
        let candidates = document.leaves_in_region(&marquee.grown(1.0), None);
        let edges = marquee.edges();
        let ids: Vec<ComponentId> = candidates
            .into_iter()
            .filter(|c| {
                marquee.contains_rect(&c.bbox())
                    || edges
                        .iter()
                        .any(|&(a, b)| c.intersects(&LineSegment::new(a, b)))
            })
            .map(|c| c.id())
            .collect();
        if ids.is_empty() {
            self.selection = None;
            return;
        }

        let mut union: Option<Rect> = None;
        for &id in &ids {
            if let Some(c) = document.get(id) {
                let b = c.bbox();
                union = Some(match union {
                    Some(u) => u.union(&b),
                    None => b,
                });
            }
        }
        let Some(union) = union else {
            self.selection = None;
            return;
        };

        let pad = HANDLE_PAD_PX / ctx.state.viewport.scale_factor();
        self.selection = Some(Selection { ids, region: union.grown(pad) });
        self.scroll_selection_into_view(ctx);
    }

    /// Nudge the viewport so the selection sits inside the comfortable
    /// central region of the screen. Committed as an undoable command.
    fn scroll_selection_into_view(&mut self, ctx: &mut ToolContext<'_>) {
        let Some(selection) = &self.selection else {
            return;
        };
        let visible = ctx.state.viewport.visible_rect();
        let comfort = Rect::new(
            visible.x + visible.w * 0.25,
            visible.y + visible.h * 0.25,
            visible.w * 0.5,
            visible.h * 0.5,
        );
        if comfort.contains_point(selection.region.center()) || visible.contains_rect(&selection.region)
        {
            return;
        }
        let shift = visible.center() - selection.region.center();
        let new_transform = *ctx.state.viewport.transform() * Mat33::translation(shift);
        let command = ViewportChange::new(new_transform);
        ctx.history.push(Box::new(command), ctx.state, true);
    }

    fn rect_outline_style() -> PathStyle {
        PathStyle {
            fill: Color::TRANSPARENT,
            stroke: Some(StrokePen {
                color: Color::rgba(0.25, 0.45, 0.9, 0.9),
                width: 1.0,
            }),
        }
    }

    fn rect_path(rect: &Rect) -> Path {
        let corners = rect.corners();
        Path::new(
            corners[0],
            vec![
                PathCmd::LineTo(corners[1]),
                PathCmd::LineTo(corners[2]),
                PathCmd::LineTo(corners[3]),
                PathCmd::LineTo(corners[0]),
            ],
        )
    }
}

impl Default for SelectionTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SelectionTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Selection
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.selection = None;
            self.marquee = None;
            self.marquee_anchor = None;
        }
    }

    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        all_pointers: &[Pointer],
    ) -> bool {
        if !pointer.is_primary || all_pointers.len() > 1 {
            return false;
        }
        if let Some(handle) = self.hit_handle(ctx, pointer.screen_pos) {
            self.drag = Some(DragState {
                handle,
                last_canvas_pos: pointer.canvas_pos,
                total: Mat33::IDENTITY,
                raw_rotation: 0.0,
                applied_rotation: 0.0,
            });
            return true;
        }
        self.selection = None;
        self.marquee_anchor = Some(pointer.canvas_pos);
        self.marquee = Some(Rect::new(pointer.canvas_pos.x, pointer.canvas_pos.y, 0.0, 0.0));
        ctx.state.request_repaint();
        true
    }

    fn on_pointer_move(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        _all_pointers: &[Pointer],
    ) {
        let current = pointer.canvas_pos;

        let step = if let Some(drag) = &mut self.drag {
            let region = match &self.selection {
                Some(s) => s.region,
                None => return,
            };
            let last = drag.last_canvas_pos;
            let step = match drag.handle {
                SelectionHandle::Move => Mat33::translation(current - last),
                SelectionHandle::Resize => {
                    let anchor = region.top_left();
                    let before = (last - anchor).magnitude();
                    let after = (current - anchor).magnitude();
                    if before <= f64::EPSILON {
                        Mat33::IDENTITY
                    } else {
                        Mat33::scaling(after / before, anchor)
                    }
                }
                SelectionHandle::Rotate => {
                    let center = region.center();
                    let delta =
                        normalize_angle((current - center).angle() - (last - center).angle());
                    drag.raw_rotation += delta;
                    let snapped = snap_rotation(drag.raw_rotation, ROTATION_SNAP);
                    let to_apply = snapped - drag.applied_rotation;
                    drag.applied_rotation = snapped;
                    Mat33::rotation(to_apply, center)
                }
            };
            drag.last_canvas_pos = current;
            Some(step)
        } else {
            None
        };
        if let Some(step) = step {
            if !step.eq_approx(&Mat33::IDENTITY, 0.0) {
                self.apply_preview(ctx, step);
            }
            return;
        }

        if let Some(anchor) = self.marquee_anchor {
            self.marquee = Some(Rect::from_corners(anchor, current));
            ctx.state.request_repaint();
        }
    }

    fn on_pointer_up(
        &mut self,
        ctx: &mut ToolContext<'_>,
        _pointer: &Pointer,
        _all_pointers: &[Pointer],
    ) {
        if let Some(drag) = self.drag.take() {
            if let Some(selection) = &self.selection
                && !drag.total.eq_approx(&Mat33::IDENTITY, 1e-12)
            {
                // The preview already moved the components; record the
                // accumulated transform as one undoable step.
                let command =
                    TransformComponents::new_applied(selection.ids.clone(), drag.total);
                ctx.history.push(Box::new(command), ctx.state, false);
            }
            return;
        }

        self.marquee_anchor = None;
        if let Some(marquee) = self.marquee.take() {
            self.resolve_marquee(ctx, marquee);
            ctx.state.request_repaint();
        }
    }

    fn on_gesture_cancel(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(drag) = self.drag.take()
            && let Some(selection) = &mut self.selection
            && !drag.total.eq_approx(&Mat33::IDENTITY, 1e-12)
        {
            // Rewind the uncommitted preview.
            let inverse = drag.total.inverse_or_identity();
            for &id in &selection.ids {
                ctx.state.document.transform_component(id, &inverse);
            }
            selection.region = selection.region.transformed_bbox(&inverse);
        }
        self.marquee_anchor = None;
        self.marquee = None;
        ctx.state.request_repaint();
    }

    fn on_key_press(&mut self, ctx: &mut ToolContext<'_>, key: &str) -> bool {
        if !matches!(key, "Delete" | "Backspace") {
            return false;
        }
        let Some(selection) = self.selection.take() else {
            return false;
        };
        let command = EraseComponents::new(selection.ids);
        ctx.history.push(Box::new(command), ctx.state, true);
        true
    }

    fn render_preview(&self, renderer: &mut dyn Renderer) {
        let style = Self::rect_outline_style();
        if let Some(marquee) = &self.marquee {
            renderer.draw_path(&Self::rect_path(marquee), &style);
        }
        if let Some(selection) = &self.selection {
            renderer.draw_path(&Self::rect_path(&selection.region), &style);
            renderer.draw_points(&selection.region.corners());
        }
    }
}

// ─── Pan / Zoom ──────────────────────────────────────────────────────────

/// Wheel zoom speed: factor per scroll unit.
const WHEEL_ZOOM_RATE: f64 = 0.01;

struct PanZoomGesture {
    start_transform: Mat33,
    last_pointers: Vec<Pointer>,
}

pub struct PanZoomTool {
    enabled: bool,
    gesture: Option<PanZoomGesture>,
}

impl PanZoomTool {
    pub fn new() -> Self {
        Self { enabled: true, gesture: None }
    }

    /// Screen-space transform taking the previous pointer pair onto the
    /// current one: scale by the distance ratio and rotate by the angle
    /// delta about the moving pinch center.
    fn pinch_transform(prev: (&Pointer, &Pointer), current: (&Pointer, &Pointer)) -> Mat33 {
        let center_prev = (prev.0.screen_pos + prev.1.screen_pos) * 0.5;
        let center_now = (current.0.screen_pos + current.1.screen_pos) * 0.5;
        let span_prev = prev.1.screen_pos - prev.0.screen_pos;
        let span_now = current.1.screen_pos - current.0.screen_pos;

        let dist_prev = span_prev.magnitude();
        let scale = if dist_prev <= f64::EPSILON {
            1.0
        } else {
            span_now.magnitude() / dist_prev
        };
        let angle = normalize_angle(span_now.angle() - span_prev.angle());

        Mat33::translation(center_now)
            * Mat33::rotation(angle, Vec2::ZERO)
            * Mat33::scaling(scale, Vec2::ZERO)
            * Mat33::translation(-center_prev)
    }

    fn pointer_pair(pointers: &[Pointer]) -> Option<(&Pointer, &Pointer)> {
        match pointers {
            [a, b, ..] => Some((a, b)),
            _ => None,
        }
    }
}

impl Default for PanZoomTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for PanZoomTool {
    fn kind(&self) -> ToolKind {
        ToolKind::PanZoom
    }

    fn group(&self) -> ToolGroup {
        ToolGroup::Independent
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        _pointer: &Pointer,
        all_pointers: &[Pointer],
    ) -> bool {
        match &mut self.gesture {
            Some(gesture) => {
                // Another finger joined the gesture already in progress.
                gesture.last_pointers = all_pointers.to_vec();
            }
            None => {
                self.gesture = Some(PanZoomGesture {
                    start_transform: *ctx.state.viewport.transform(),
                    last_pointers: all_pointers.to_vec(),
                });
            }
        }
        true
    }

    fn on_pointer_move(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pointer: &Pointer,
        all_pointers: &[Pointer],
    ) {
        let Some(gesture) = &mut self.gesture else {
            return;
        };

        let screen_step = match (
            Self::pointer_pair(&gesture.last_pointers),
            Self::pointer_pair(all_pointers),
        ) {
            (Some(prev), Some(current)) => Self::pinch_transform(prev, current),
            _ => {
                // Single-pointer pan.
                let prev = gesture
                    .last_pointers
                    .iter()
                    .find(|p| p.id == pointer.id)
                    .map(|p| p.screen_pos)
                    .unwrap_or(pointer.screen_pos);
                Mat33::translation(pointer.screen_pos - prev)
            }
        };

        let new_transform = screen_step * *ctx.state.viewport.transform();
        ctx.state.viewport.update_transform(new_transform);
        gesture.last_pointers = all_pointers.to_vec();
        ctx.state.request_repaint();
    }

    fn on_pointer_up(
        &mut self,
        ctx: &mut ToolContext<'_>,
        _pointer: &Pointer,
        all_pointers: &[Pointer],
    ) {
        let Some(gesture) = &mut self.gesture else {
            return;
        };
        if !all_pointers.is_empty() {
            gesture.last_pointers = all_pointers.to_vec();
            return;
        }
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        let current = *ctx.state.viewport.transform();
        if !current.eq_approx(&gesture.start_transform, 1e-12) {
            // The whole gesture commits as one undoable step.
            let command = ViewportChange::already_applied(current, gesture.start_transform);
            ctx.history.push(Box::new(command), ctx.state, false);
        }
    }

    fn on_gesture_cancel(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(gesture) = self.gesture.take() {
            ctx.state.viewport.update_transform(gesture.start_transform);
            ctx.state.request_repaint();
        }
    }

    fn on_wheel(&mut self, ctx: &mut ToolContext<'_>, screen_pos: Vec2, delta: Vec2) -> bool {
        if delta.y == 0.0 {
            return false;
        }
        let factor = (-delta.y * WHEEL_ZOOM_RATE).exp();
        let new_transform = Mat33::scaling(factor, screen_pos) * *ctx.state.viewport.transform();
        let command = ViewportChange::new(new_transform);
        ctx.history.push(Box::new(command), ctx.state, true);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_snap_properties() {
        let step = ROTATION_SNAP;
        for i in -40..=40 {
            let delta = i as f64 * 0.083;
            let snapped = snap_rotation(delta, step);
            // Always a whole number of steps.
            let steps = snapped / step;
            assert!((steps - steps.round()).abs() < 1e-9, "not a multiple at {delta}");
            // Never overshoots the input…
            assert!(snapped.abs() <= delta.abs() + 1e-12);
            // …and never flips direction.
            assert!(snapped == 0.0 || snapped.signum() == delta.signum());
        }
    }

    #[test]
    fn angle_normalization_wraps() {
        use std::f64::consts::PI;
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-12);
        assert!((normalize_angle(2.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn pinch_transform_scales_about_center() {
        let vp = nib_core::viewport::Viewport::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mk = |x: f64, y: f64, id: u32| {
            Pointer::new(
                Vec2::new(x, y),
                &vp,
                None,
                crate::input::PointerDevice::Touch,
                id,
                true,
                id == 0,
                0.0,
            )
        };
        // Fingers spread from 2 apart to 4 apart around (50, 50).
        let prev = (mk(49.0, 50.0, 0), mk(51.0, 50.0, 1));
        let now = (mk(48.0, 50.0, 0), mk(52.0, 50.0, 1));
        let t = PanZoomTool::pinch_transform((&prev.0, &prev.1), (&now.0, &now.1));

        // The pinch center stays fixed; outward points double their
        // distance from it.
        assert!(t.transform_point(Vec2::new(50.0, 50.0)).eq_approx(Vec2::new(50.0, 50.0), 1e-9));
        assert!(t.transform_point(Vec2::new(51.0, 50.0)).eq_approx(Vec2::new(52.0, 50.0), 1e-9));
    }
}
