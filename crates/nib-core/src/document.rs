//! The document: a bounding-box tree of drawable components.
//!
//! Nodes live in a `StableDiGraph` arena — parent is the incoming
//! neighbor, children are outgoing neighbors, so there are no owning
//! back-references. A node either holds one component (leaf) or children
//! (internal), never both. Every node's bounding box is the union of its
//! content's or children's boxes; mutations restore that invariant by
//! recomputing up the ancestor chain before returning.
//!
//! Paint order is independent of tree shape: queries sort by z-index,
//! which the document assigns from its own monotonic counter.

use crate::component::{Component, ComponentId, ComponentKind};
use crate::mat::Mat33;
use crate::rect::Rect;
use crate::render::Renderer;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::{SmallVec, smallvec};
use std::collections::HashMap;

/// Child count at which insertion starts descending into a containing
/// child instead of widening the current node.
pub const DEFAULT_FANOUT: usize = 30;

#[derive(Debug)]
pub struct SpatialNode {
    bbox: Rect,
    content: Option<Component>,
}

impl SpatialNode {
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    pub fn content(&self) -> Option<&Component> {
        self.content.as_ref()
    }
}

pub struct Document {
    tree: StableDiGraph<SpatialNode, ()>,
    root: NodeIndex,
    /// Component id → owning leaf, kept synchronized with the tree.
    id_index: HashMap<ComponentId, NodeIndex>,
    fanout: usize,
    next_component_id: u64,
    next_z_index: u64,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::with_fanout(DEFAULT_FANOUT)
    }

    pub fn with_fanout(fanout: usize) -> Self {
        let mut tree = StableDiGraph::new();
        let root = tree.add_node(SpatialNode { bbox: Rect::EMPTY, content: None });
        Self {
            tree,
            root,
            id_index: HashMap::new(),
            fanout: fanout.max(1),
            next_component_id: 0,
            next_z_index: 0,
        }
    }

    /// Build a component with a fresh id and the next z-index. The
    /// component is not yet part of the document; pass it to `insert`.
    pub fn create_component(&mut self, kind: ComponentKind) -> Component {
        let id = ComponentId(self.next_component_id);
        self.next_component_id += 1;
        let z = self.next_z_index;
        self.next_z_index += 1;
        Component::new(id, z, kind)
    }

    // ─── Tree navigation ─────────────────────────────────────────────────

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&SpatialNode> {
        self.tree.node_weight(idx)
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.tree.neighbors_directed(idx, Direction::Incoming).next()
    }

    /// Children sorted by index so iteration order is deterministic.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> =
            self.tree.neighbors_directed(idx, Direction::Outgoing).collect();
        children.sort();
        children
    }

    /// The leaf node owning a component.
    pub fn find_parent(&self, id: ComponentId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.id_index
            .get(&id)
            .and_then(|idx| self.tree[*idx].content.as_ref())
    }

    pub fn component_count(&self) -> usize {
        self.id_index.len()
    }

    pub fn component_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.id_index.keys().copied()
    }

    /// Bounding box of the whole document.
    pub fn bbox(&self) -> Rect {
        self.tree[self.root].bbox
    }

    // ─── Insertion ───────────────────────────────────────────────────────

    /// Insert a component built by `create_component` (or returned by a
    /// prior `remove`).
    pub fn insert(&mut self, component: Component) {
        debug_assert!(
            !self.id_index.contains_key(&component.id()),
            "component inserted twice"
        );
        self.add_leaf(self.root, component);
    }

    fn add_leaf(&mut self, idx: NodeIndex, component: Component) -> NodeIndex {
        // An empty node becomes the leaf.
        if self.tree[idx].content.is_none() && self.children(idx).is_empty() {
            let id = component.id();
            let bbox = component.bbox();
            let node = &mut self.tree[idx];
            node.content = Some(component);
            node.bbox = bbox;
            self.id_index.insert(id, idx);
            self.recompute_bbox_chain(idx);
            return idx;
        }

        // A leaf first demotes its content into a child of its own.
        if let Some(content) = self.tree[idx].content.take() {
            let id = content.id();
            let bbox = content.bbox();
            let child = self.tree.add_node(SpatialNode { bbox, content: Some(content) });
            self.tree.add_edge(idx, child, ());
            self.id_index.insert(id, child);
        }

        // A component wider than this whole subtree displaces it: existing
        // children move down one level so the new leaf ends up nearer the
        // root, keeping hit precedence over everything older beneath it.
        let node_bbox = self.tree[idx].bbox;
        if component.bbox().contains_rect(&node_bbox) {
            let absorbed = self.tree.add_node(SpatialNode { bbox: node_bbox, content: None });
            for child in self.children(idx) {
                if let Some(edge) = self.tree.find_edge(idx, child) {
                    self.tree.remove_edge(edge);
                }
                self.tree.add_edge(absorbed, child, ());
            }
            self.tree.add_edge(idx, absorbed, ());
            return self.attach_new_leaf(idx, component);
        }

        // At the fan-out target, descend into the smallest child that
        // fully contains the new bounding box.
        let children = self.children(idx);
        if children.len() >= self.fanout {
            let target = children
                .into_iter()
                .filter(|&c| self.tree[c].bbox.contains_rect(&component.bbox()))
                .min_by(|&a, &b| {
                    self.tree[a]
                        .bbox
                        .area()
                        .total_cmp(&self.tree[b].bbox.area())
                });
            if let Some(target) = target {
                return self.add_leaf(target, component);
            }
        }

        self.attach_new_leaf(idx, component)
    }

    fn attach_new_leaf(&mut self, parent: NodeIndex, component: Component) -> NodeIndex {
        let id = component.id();
        let bbox = component.bbox();
        let leaf = self.tree.add_node(SpatialNode { bbox, content: Some(component) });
        self.tree.add_edge(parent, leaf, ());
        self.id_index.insert(id, leaf);
        self.recompute_bbox_chain(leaf);
        leaf
    }

    // ─── Removal ─────────────────────────────────────────────────────────

    /// Detach a component, rebalancing the tree around the vacated leaf.
    /// Returns the component so callers (undo) can reinsert it later.
    pub fn remove(&mut self, id: ComponentId) -> Option<Component> {
        let leaf = self.id_index.remove(&id)?;
        let component = self.tree[leaf].content.take();
        let parent = self.parent(leaf);
        if let Some(parent) = parent {
            self.tree.remove_node(leaf);
            self.rebalance(parent);
        } else {
            // The root itself was the leaf.
            self.tree[leaf].bbox = Rect::EMPTY;
        }
        component
    }

    fn rebalance(&mut self, idx: NodeIndex) {
        let children = self.children(idx);

        if idx == self.root {
            // An internal root with a single child absorbs it.
            if children.len() == 1 {
                self.absorb_child(idx, children[0]);
            }
            self.recompute_bbox_chain(idx);
            return;
        }

        match children.len() {
            0 if self.tree[idx].content.is_none() => {
                let parent = self.parent(idx);
                self.tree.remove_node(idx);
                if let Some(parent) = parent {
                    self.rebalance(parent);
                }
            }
            1 => {
                // A pass-through node collapses into its parent.
                let child = children[0];
                let parent = self.parent(idx);
                self.tree.remove_node(idx);
                if let Some(parent) = parent {
                    self.tree.add_edge(parent, child, ());
                    self.recompute_bbox_chain(child);
                }
            }
            _ => self.recompute_bbox_chain(idx),
        }
    }

    /// Merge `child` into `parent`: content and grandchildren move up.
    fn absorb_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        for grandchild in self.children(child) {
            if let Some(edge) = self.tree.find_edge(child, grandchild) {
                self.tree.remove_edge(edge);
            }
            self.tree.add_edge(parent, grandchild, ());
        }
        if let Some(content) = self.tree[child].content.take() {
            let id = content.id();
            self.tree[parent].content = Some(content);
            self.id_index.insert(id, parent);
        }
        self.tree.remove_node(child);
    }

    fn recompute_bbox_chain(&mut self, mut idx: NodeIndex) {
        loop {
            self.tree[idx].bbox = self.local_bbox(idx);
            match self.parent(idx) {
                Some(parent) => idx = parent,
                None => break,
            }
        }
    }

    /// A node's bbox from its own content or children (not the cache).
    fn local_bbox(&self, idx: NodeIndex) -> Rect {
        if let Some(content) = &self.tree[idx].content {
            return content.bbox();
        }
        let mut children = self.tree.neighbors_directed(idx, Direction::Outgoing);
        let Some(first) = children.next() else {
            return Rect::EMPTY;
        };
        children.fold(self.tree[first].bbox, |acc, c| acc.union(&self.tree[c].bbox))
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Depth-first region query, pruned by bounding-box intersection.
    ///
    /// With `min_fraction` set, subtrees whose bbox's largest dimension is
    /// below that fraction of the region's largest dimension are culled —
    /// the level-of-detail policy for zoomed-out rendering.
    pub fn leaves_in_region(&self, region: &Rect, min_fraction: Option<f64>) -> Vec<&Component> {
        let mut out = Vec::new();
        let mut stack: SmallVec<[NodeIndex; 32]> = smallvec![self.root];
        while let Some(idx) = stack.pop() {
            let node = &self.tree[idx];
            if !node.bbox.intersects(region) {
                continue;
            }
            if let Some(fraction) = min_fraction
                && node.bbox.max_dimension() < fraction * region.max_dimension()
            {
                continue;
            }
            if let Some(content) = &node.content {
                out.push(content);
            }
            stack.extend(self.tree.neighbors_directed(idx, Direction::Outgoing));
        }
        out
    }

    /// Region query in paint order (ascending z-index).
    pub fn components_in_region(&self, region: &Rect) -> Vec<&Component> {
        let mut components = self.leaves_in_region(region, None);
        components.sort_by_key(|c| c.z_index());
        components
    }

    /// Remove, mutate in place, and reinsert — a transformed component's
    /// bounding box (and therefore tree placement) changes.
    pub fn transform_component(&mut self, id: ComponentId, transform: &Mat33) -> bool {
        let Some(mut component) = self.remove(id) else {
            log::warn!("transform requested for unknown component {id}");
            return false;
        };
        component.transform(transform);
        self.insert(component);
        true
    }

    /// Paint every component intersecting `visible_rect`, back to front.
    pub fn render(&self, renderer: &mut dyn Renderer, visible_rect: &Rect) {
        for component in self.components_in_region(visible_rect) {
            component.render(renderer, visible_rect);
        }
    }

    // ─── Invariant checking (used by the test suites) ────────────────────

    /// Verify structural invariants: leaf xor internal, bbox caches equal
    /// to the union of descendants, id index consistent.
    pub fn is_consistent(&self) -> bool {
        for idx in self.tree.node_indices() {
            let node = &self.tree[idx];
            let child_count = self.children(idx).len();
            if node.content.is_some() && child_count > 0 {
                return false;
            }
            if !node.bbox.eq_approx(&self.local_bbox(idx), 1e-9) {
                return false;
            }
            if idx != self.root && self.parent(idx).is_none() {
                return false;
            }
            if let Some(content) = &node.content
                && self.id_index.get(&content.id()) != Some(&idx)
            {
                return false;
            }
        }
        self.id_index.len()
            == self
                .tree
                .node_indices()
                .filter(|&i| self.tree[i].content.is_some())
                .count()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Stroke, StrokeSegment};
    use crate::path::{Path, PathCmd};
    use crate::style::{Color, PathStyle};
    use crate::vec::Vec2;

    fn rect_stroke(doc: &mut Document, rect: Rect) -> ComponentId {
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

    #[test]
    fn first_insert_makes_root_a_leaf() {
        let mut doc = Document::new();
        let id = rect_stroke(&mut doc, Rect::UNIT);
        assert_eq!(doc.find_parent(id), Some(doc.root()));
        assert!(doc.bbox().eq_approx(&Rect::UNIT, 1e-12));
        assert!(doc.is_consistent());
    }

    #[test]
    fn find_parent_bbox_matches_component() {
        let mut doc = Document::new();
        let id = rect_stroke(&mut doc, Rect::new(0.0, 0.0, 1.0, 1.0));
        rect_stroke(&mut doc, Rect::new(5.0, 5.0, 1.0, 1.0));

        let node = doc.node(doc.find_parent(id).unwrap()).unwrap();
        assert!(node.bbox().eq_approx(&Rect::new(0.0, 0.0, 1.0, 1.0), 1e-12));
    }

    #[test]
    fn every_inserted_component_is_findable() {
        let mut doc = Document::new();
        let mut ids = Vec::new();
        for i in 0..40 {
            let offset = (i % 7) as f64 * 3.0;
            ids.push(rect_stroke(
                &mut doc,
                Rect::new(offset, (i / 7) as f64 * 2.0, 1.5, 1.0),
            ));
        }
        assert!(doc.is_consistent());
        for id in ids {
            let bbox = doc.get(id).unwrap().bbox();
            let found = doc.leaves_in_region(&bbox, None);
            assert!(found.iter().any(|c| c.id() == id), "{id} not findable");
        }
    }

    #[test]
    fn removal_unfinds_and_keeps_invariants() {
        let mut doc = Document::new();
        let a = rect_stroke(&mut doc, Rect::new(0.0, 0.0, 1.0, 1.0));
        let b = rect_stroke(&mut doc, Rect::new(2.0, 0.0, 1.0, 1.0));
        let c = rect_stroke(&mut doc, Rect::new(4.0, 0.0, 1.0, 1.0));

        let removed = doc.remove(b).expect("b existed");
        assert_eq!(removed.id(), b);
        assert!(doc.leaves_in_region(&Rect::new(2.0, 0.0, 1.0, 1.0), None).is_empty());
        assert!(doc.is_consistent());
        assert_eq!(doc.component_count(), 2);

        doc.remove(a);
        doc.remove(c);
        assert!(doc.is_consistent());
        assert_eq!(doc.component_count(), 0);
        assert!(doc.bbox().eq_approx(&Rect::EMPTY, 1e-12));
    }

    #[test]
    fn removed_component_can_be_reinserted() {
        let mut doc = Document::new();
        let a = rect_stroke(&mut doc, Rect::new(0.0, 0.0, 1.0, 1.0));
        rect_stroke(&mut doc, Rect::new(3.0, 3.0, 1.0, 1.0));

        let taken = doc.remove(a).unwrap();
        doc.insert(taken);
        assert!(doc.is_consistent());
        assert!(doc.get(a).is_some());
    }

    #[test]
    fn containing_component_displaces_subtree() {
        let mut doc = Document::new();
        rect_stroke(&mut doc, Rect::new(2.0, 2.0, 1.0, 1.0));
        rect_stroke(&mut doc, Rect::new(4.0, 2.0, 1.0, 1.0));
        // Much larger than everything present.
        let big = rect_stroke(&mut doc, Rect::new(0.0, 0.0, 20.0, 20.0));

        assert!(doc.is_consistent());
        // The big component's leaf hangs directly off the root.
        let leaf = doc.find_parent(big).unwrap();
        assert_eq!(doc.parent(leaf), Some(doc.root()));
    }

    #[test]
    fn z_order_is_insertion_order() {
        let mut doc = Document::new();
        let a = rect_stroke(&mut doc, Rect::new(0.0, 0.0, 2.0, 2.0));
        let b = rect_stroke(&mut doc, Rect::new(1.0, 1.0, 2.0, 2.0));
        let sorted = doc.components_in_region(&Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted[0].id(), a);
        assert_eq!(sorted[1].id(), b);
    }

    #[test]
    fn lod_cutoff_skips_small_subtrees() {
        let mut doc = Document::new();
        rect_stroke(&mut doc, Rect::new(0.0, 0.0, 100.0, 100.0));
        let tiny = rect_stroke(&mut doc, Rect::new(50.0, 50.0, 0.1, 0.1));

        let region = Rect::new(0.0, 0.0, 200.0, 200.0);
        let all = doc.leaves_in_region(&region, None);
        assert_eq!(all.len(), 2);

        let culled = doc.leaves_in_region(&region, Some(0.01));
        assert_eq!(culled.len(), 1);
        assert!(culled.iter().all(|c| c.id() != tiny));
    }

    #[test]
    fn fanout_descends_into_containing_child() {
        let mut doc = Document::with_fanout(4);
        // Parents big enough to contain later children.
        for i in 0..4 {
            rect_stroke(&mut doc, Rect::new(i as f64 * 10.0, 0.0, 10.0, 10.0));
        }
        // Now inside the first cell — must descend, not widen the root.
        let inner = rect_stroke(&mut doc, Rect::new(2.0, 2.0, 1.0, 1.0));
        assert!(doc.is_consistent());
        let bbox = doc.get(inner).unwrap().bbox();
        assert!(doc.leaves_in_region(&bbox, None).iter().any(|c| c.id() == inner));
    }
}
