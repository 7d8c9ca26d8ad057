//! Reversible editor commands.
//!
//! Every mutation of the document or viewport is a `Command`: an explicit
//! struct holding exactly the values its `apply`/`unapply` need — no
//! captured closures, no hidden aliasing. Commands funnel through one
//! `EditorState`, which is the engine's single serialization point.
//!
//! `unapply` without a prior matching `apply` is a guarded no-op: the
//! undo/redo stacks structurally prevent it, but the checks stay.

use nib_core::component::{Component, ComponentId};
use nib_core::document::Document;
use nib_core::mat::Mat33;
use nib_core::rect::Rect;
use nib_core::viewport::Viewport;

/// The mutable world commands operate on. Owned by the `Editor`; tools
/// and the importer never touch the document or viewport around it.
pub struct EditorState {
    pub document: Document,
    pub viewport: Viewport,
    repaint_needed: bool,
}

impl EditorState {
    pub fn new(screen_rect: Rect) -> Self {
        Self {
            document: Document::new(),
            viewport: Viewport::new(screen_rect),
            repaint_needed: false,
        }
    }

    pub fn request_repaint(&mut self) {
        self.repaint_needed = true;
    }

    /// Read and reset the repaint flag; hosts poll this once per frame.
    pub fn take_repaint_needed(&mut self) -> bool {
        std::mem::take(&mut self.repaint_needed)
    }
}

pub trait Command {
    fn description(&self) -> String;

    fn apply(&mut self, state: &mut EditorState);

    /// Reverse the side effects of `apply`, in exactly the opposite order
    /// they were performed.
    fn unapply(&mut self, state: &mut EditorState);
}

// ─── Add component ───────────────────────────────────────────────────────

/// Inserts one component. The component is held by value while detached
/// from the document (before `apply`, after `unapply`).
pub struct AddComponent {
    component: Option<Component>,
    id: ComponentId,
    /// Skip the repaint request on the first application — the "flatten"
    /// optimization for strokes whose preview is already on screen.
    skip_first_repaint: bool,
    first_application: bool,
    applied: bool,
}

impl AddComponent {
    pub fn new(component: Component) -> Self {
        Self::with_flatten(component, false)
    }

    /// `flatten = true` marks the first application as already painted.
    pub fn with_flatten(component: Component, flatten: bool) -> Self {
        Self {
            id: component.id(),
            component: Some(component),
            skip_first_repaint: flatten,
            first_application: true,
            applied: false,
        }
    }

    pub fn component_id(&self) -> ComponentId {
        self.id
    }
}

impl Command for AddComponent {
    fn description(&self) -> String {
        format!("add component {}", self.id)
    }

    fn apply(&mut self, state: &mut EditorState) {
        let Some(component) = self.component.take() else {
            log::warn!("AddComponent::apply called twice");
            return;
        };
        state.document.insert(component);
        self.applied = true;
        if !(self.skip_first_repaint && self.first_application) {
            state.request_repaint();
        }
        self.first_application = false;
    }

    fn unapply(&mut self, state: &mut EditorState) {
        if !self.applied {
            log::warn!("AddComponent::unapply without apply; ignoring");
            return;
        }
        self.component = state.document.remove(self.id);
        self.applied = false;
        state.request_repaint();
    }
}

// ─── Erase components ────────────────────────────────────────────────────

/// Removes a set of components, holding them by value for undo. The
/// eraser grows one of these live: unapply, extend, reapply.
pub struct EraseComponents {
    ids: Vec<ComponentId>,
    removed: Vec<Component>,
    applied: bool,
}

impl EraseComponents {
    pub fn new(ids: Vec<ComponentId>) -> Self {
        Self { ids, removed: Vec::new(), applied: false }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[ComponentId] {
        &self.ids
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.ids.contains(&id)
    }

    /// Add more targets. Only legal while unapplied.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = ComponentId>) {
        debug_assert!(!self.applied, "extend an EraseComponents only while unapplied");
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }
}

impl Command for EraseComponents {
    fn description(&self) -> String {
        format!("erase {} component(s)", self.ids.len())
    }

    fn apply(&mut self, state: &mut EditorState) {
        if self.applied {
            log::warn!("EraseComponents::apply called twice");
            return;
        }
        self.removed = self
            .ids
            .iter()
            .filter_map(|&id| state.document.remove(id))
            .collect();
        self.applied = true;
        state.request_repaint();
    }

    fn unapply(&mut self, state: &mut EditorState) {
        if !self.applied {
            log::warn!("EraseComponents::unapply without apply; ignoring");
            return;
        }
        // Reinsert in reverse removal order.
        for component in self.removed.drain(..).rev() {
            state.document.insert(component);
        }
        self.applied = false;
        state.request_repaint();
    }
}

// ─── Transform components ────────────────────────────────────────────────

/// Applies an affine transform to a set of components, each removed,
/// mutated in place, and reinserted (their tree placement changes with
/// their bounding box).
pub struct TransformComponents {
    ids: Vec<ComponentId>,
    transform: Mat33,
    inverse: Mat33,
    applied: bool,
}

impl TransformComponents {
    /// The transform must be invertible; a singular one degrades to the
    /// identity (logged) per the matrix-fallback contract.
    pub fn new(ids: Vec<ComponentId>, transform: Mat33) -> Self {
        Self {
            ids,
            transform,
            inverse: transform.inverse_or_identity(),
            applied: false,
        }
    }

    /// For gestures that already previewed the transform directly: the
    /// command starts in the applied state and is pushed without apply.
    pub fn new_applied(ids: Vec<ComponentId>, transform: Mat33) -> Self {
        Self { applied: true, ..Self::new(ids, transform) }
    }

    /// Apply in bounded chunks, calling `between` after each chunk so the
    /// host can re-render between them. Equivalent to `apply` once the
    /// final chunk lands.
    pub fn apply_chunked(
        &mut self,
        state: &mut EditorState,
        chunk_size: usize,
        mut between: impl FnMut(&mut EditorState),
    ) {
        if self.applied {
            log::warn!("TransformComponents::apply called twice");
            return;
        }
        let chunk_size = chunk_size.max(1);
        let mut chunks = self.ids.chunks(chunk_size).peekable();
        while let Some(chunk) = chunks.next() {
            for &id in chunk {
                state.document.transform_component(id, &self.transform);
            }
            state.request_repaint();
            if chunks.peek().is_some() {
                between(state);
            }
        }
        self.applied = true;
    }
}

impl Command for TransformComponents {
    fn description(&self) -> String {
        format!("transform {} component(s)", self.ids.len())
    }

    fn apply(&mut self, state: &mut EditorState) {
        if self.applied {
            log::warn!("TransformComponents::apply called twice");
            return;
        }
        for &id in &self.ids {
            state.document.transform_component(id, &self.transform);
        }
        self.applied = true;
        state.request_repaint();
    }

    fn unapply(&mut self, state: &mut EditorState) {
        if !self.applied {
            log::warn!("TransformComponents::unapply without apply; ignoring");
            return;
        }
        for &id in self.ids.iter().rev() {
            state.document.transform_component(id, &self.inverse);
        }
        self.applied = false;
        state.request_repaint();
    }
}

// ─── Viewport change ─────────────────────────────────────────────────────

/// Replaces the viewport transform, remembering the transform it
/// displaced. Pan/zoom is undoable through this.
pub struct ViewportChange {
    new_transform: Mat33,
    old_transform: Option<Mat33>,
    applied: bool,
}

impl ViewportChange {
    pub fn new(transform: Mat33) -> Self {
        Self { new_transform: transform, old_transform: None, applied: false }
    }

    /// For gestures that already drove the viewport live: records the
    /// pre-gesture transform and starts applied.
    pub fn already_applied(new_transform: Mat33, old_transform: Mat33) -> Self {
        Self {
            new_transform,
            old_transform: Some(old_transform),
            applied: true,
        }
    }
}

impl Command for ViewportChange {
    fn description(&self) -> String {
        "viewport change".to_string()
    }

    fn apply(&mut self, state: &mut EditorState) {
        if self.applied {
            log::warn!("ViewportChange::apply called twice");
            return;
        }
        self.old_transform = Some(*state.viewport.transform());
        state.viewport.update_transform(self.new_transform);
        self.applied = true;
        state.request_repaint();
    }

    fn unapply(&mut self, state: &mut EditorState) {
        if !self.applied {
            log::warn!("ViewportChange::unapply without apply; ignoring");
            return;
        }
        if let Some(old) = self.old_transform {
            state.viewport.update_transform(old);
        }
        self.applied = false;
        state.request_repaint();
    }
}

// ─── Composite ───────────────────────────────────────────────────────────

/// Runs child commands in order; `unapply` reverses them in exactly the
/// opposite order.
pub struct Composite {
    commands: Vec<Box<dyn Command>>,
    description: String,
}

impl Composite {
    pub fn new(description: impl Into<String>, commands: Vec<Box<dyn Command>>) -> Self {
        Self { commands, description: description.into() }
    }
}

impl Command for Composite {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn apply(&mut self, state: &mut EditorState) {
        for cmd in &mut self.commands {
            cmd.apply(state);
        }
    }

    fn unapply(&mut self, state: &mut EditorState) {
        for cmd in self.commands.iter_mut().rev() {
            cmd.unapply(state);
        }
    }
}
