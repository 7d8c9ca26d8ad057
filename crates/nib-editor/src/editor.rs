//! The editor facade.
//!
//! Owns the document, viewport, undo history, and tool controller, and is
//! the single entry point hosts talk to: pointer events in, rendered
//! frames and serialized paths out. Nothing outside this type mutates the
//! document or viewport directly.

use crate::commands::{Command, EditorState};
use crate::events::{HistoryEvent, SubscriptionId, ToolEvent};
use crate::history::UndoRedoHistory;
use crate::importer::{ImportError, ImportProgress, import_svg};
use crate::input::InputEvent;
use crate::tools::{ToolContext, ToolController, ToolKind};
use nib_core::document::Document;
use nib_core::rect::Rect;
use nib_core::render::Renderer;
use nib_core::style::Color;
use nib_core::viewport::Viewport;
use nib_render::SvgRenderer;

pub struct Editor {
    state: EditorState,
    history: UndoRedoHistory,
    tools: ToolController,
}

impl Editor {
    pub fn new(screen_rect: Rect) -> Self {
        Self {
            state: EditorState::new(screen_rect),
            history: UndoRedoHistory::new(),
            tools: ToolController::new(),
        }
    }

    // ─── Host event entry points ─────────────────────────────────────────

    /// Feed one pointer/gesture event from the host UI.
    pub fn handle_event(&mut self, event: &InputEvent) {
        let mut ctx = ToolContext { state: &mut self.state, history: &mut self.history };
        self.tools.dispatch(&mut ctx, event);
    }

    /// Render-surface resize notification.
    pub fn resize(&mut self, screen_rect: Rect) {
        self.state.viewport.set_screen_rect(screen_rect);
        self.state.request_repaint();
    }

    /// Whether anything changed since the host last asked.
    pub fn take_repaint_needed(&mut self) -> bool {
        self.state.take_repaint_needed()
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Paint the visible document plus the active tool's transient state.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        renderer.clear();
        let visible = self.state.viewport.visible_rect();
        self.state.document.render(renderer, &visible);
        self.tools.render_previews(renderer);
    }

    /// Serialize the whole document as SVG, independent of the current
    /// viewport.
    pub fn to_svg(&self) -> String {
        let bounds = self.state.document.bbox().grown(8.0);
        let mut renderer = SvgRenderer::new(bounds);
        self.state.document.render(&mut renderer, &bounds);
        renderer.to_svg_document()
    }

    // ─── Undo / redo ─────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Option<String> {
        self.history.undo(&mut self.state)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.history.redo(&mut self.state)
    }

    /// Apply and record an externally built command.
    pub fn dispatch_command(&mut self, command: Box<dyn Command>) {
        self.history.push(command, &mut self.state, true);
    }

    // ─── Tool properties ─────────────────────────────────────────────────

    pub fn set_tool_enabled(&mut self, kind: ToolKind, enabled: bool) {
        let mut ctx = ToolContext { state: &mut self.state, history: &mut self.history };
        self.tools.set_tool_enabled(&mut ctx, kind, enabled);
    }

    pub fn set_pen_color(&mut self, color: Color) {
        self.tools.set_pen_color(color);
    }

    pub fn set_pen_thickness(&mut self, thickness: f64) {
        self.tools.set_pen_thickness(thickness);
    }

    pub fn subscribe_tool_events(
        &mut self,
        listener: impl FnMut(&ToolEvent) + 'static,
    ) -> SubscriptionId {
        self.tools.events.subscribe(listener)
    }

    pub fn subscribe_history_events(
        &mut self,
        listener: impl FnMut(&HistoryEvent) + 'static,
    ) -> SubscriptionId {
        self.history.events.subscribe(listener)
    }

    // ─── Import ──────────────────────────────────────────────────────────

    /// Import SVG markup, yielding to `on_progress` after each node.
    pub fn import_svg(
        &mut self,
        source: &str,
        on_progress: impl FnMut(&ImportProgress),
    ) -> Result<usize, ImportError> {
        import_svg(&mut self.state, source, on_progress)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn viewport(&self) -> &Viewport {
        &self.state.viewport
    }

    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
