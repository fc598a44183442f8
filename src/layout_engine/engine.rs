use regex::Regex;

use super::drop::DockKind;
use crate::common::geometry::{Point, Rect};
use crate::model::tree::{
    ChangeLog, LayoutTree, NodeId, NodeKind, TreeEvent, props,
};

/// Split children thinner than this are unusable; size writes clamp to it.
pub const MIN_PANEL_SIZE: f64 = 5.0;

pub const DEFAULT_LAYOUT_NAME: &str = "Current Layout";

/// The layout document and every operation on it.
///
/// The tree is exclusively owned here; UI layers funnel all mutation through
/// these operations and resynchronize from the drained change events. Bad
/// ids and structurally nonsensical requests are silent no-ops: a live,
/// interactively driven layout must never fault mid-gesture.
pub struct DockLayout {
    pub(super) tree: LayoutTree<ChangeLog>,
    pub(super) root: NodeId,
}

impl Default for DockLayout {
    fn default() -> Self { Self::new() }
}

impl DockLayout {
    pub fn new() -> Self {
        let mut tree = LayoutTree::with_observer(ChangeLog::default());
        let root = tree.mk_node(NodeKind::RootCollection);
        tree.set_prop(root, props::NAME, DEFAULT_LAYOUT_NAME);
        let mut layout = DockLayout { tree, root };
        layout.assign_id(root);
        layout.drain_events();
        layout
    }

    pub(super) fn assign_id(&mut self, node: NodeId) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.tree.set_prop(node, props::ID, id.clone());
        id
    }

    /// Resolves a public id. Preorder scan; layouts are interactively small.
    pub fn node(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.tree
            .preorder(self.root)
            .find(|&n| self.tree.str_prop(n, props::ID) == id)
    }

    pub fn id_of(&self, node: NodeId) -> &str { self.tree.str_prop(node, props::ID) }

    pub fn root(&self) -> NodeId { self.root }

    pub fn tree(&self) -> &LayoutTree<ChangeLog> { &self.tree }

    /// Buffered structural changes since the last drain.
    pub fn drain_events(&mut self) -> Vec<TreeEvent> { self.tree.observer.drain() }

    pub fn has_pending_events(&self) -> bool { !self.tree.observer.is_empty() }

    // ------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------

    /// Creates a window plus its single root container. Empty bounds leave
    /// the geometry unset for the host to decide.
    pub fn add_new_window(&mut self, name: &str, bounds: Rect) -> (String, String) {
        let window = self.tree.mk_node(NodeKind::Window);
        let window_id = self.assign_id(window);
        if !name.is_empty() {
            self.tree.set_prop(window, props::NAME, name);
        }
        if !bounds.is_empty() {
            self.set_bounds_node(window, bounds);
        }
        self.tree.insert_child(self.root, window, None);

        let area = self.tree.mk_node(NodeKind::Container);
        let area_id = self.assign_id(area);
        self.tree.insert_child(window, area, None);
        (window_id, area_id)
    }

    pub fn remove_window(&mut self, window_id: &str) {
        let Some(window) = self.node(window_id) else { return };
        if self.tree.kind(window) != Some(NodeKind::Window) {
            return;
        }
        self.tree.remove_subtree(window);
    }

    pub fn clear_windows(&mut self) {
        let windows: Vec<NodeId> = self.tree.children(self.root).collect();
        for window in windows {
            self.tree.remove_subtree(window);
        }
    }

    pub fn window_count(&self) -> usize { self.tree.child_count(self.root) }

    pub(super) fn first_window(&self) -> Option<NodeId> {
        self.tree.children(self.root).next()
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub(super) fn new_view(&mut self, name: &str, dock: DockKind) -> NodeId {
        let view = self.tree.mk_node(NodeKind::View);
        self.assign_id(view);
        if !name.is_empty() {
            self.tree.set_prop(view, props::NAME, name);
        }
        if dock != DockKind::None {
            self.set_dock_kind_node(view, dock);
        }
        view
    }

    pub(super) fn new_container(&mut self, dock: DockKind) -> NodeId {
        let container = self.tree.mk_node(NodeKind::Container);
        self.assign_id(container);
        self.set_dock_kind_node(container, dock);
        container
    }

    /// Appends a view to an existing container. Windows are not valid
    /// targets (their single child is the root container) and neither is
    /// the root collection.
    pub fn add_view(&mut self, to: &str, view_name: &str, dock: DockKind) -> String {
        let Some(target) = self.node(to) else { return String::new() };
        if matches!(
            self.tree.kind(target),
            Some(NodeKind::Window) | Some(NodeKind::RootCollection)
        ) {
            return String::new();
        }
        let view = self.new_view(view_name, dock);
        let id = self.id_of(view).to_owned();
        self.tree.insert_child(target, view, None);
        id
    }

    pub fn remove_view(&mut self, view_id: &str) {
        let Some(view) = self.node(view_id) else { return };
        if self.tree.kind(view) != Some(NodeKind::View) {
            return;
        }
        self.detach_with_selection(view);
        self.tree.remove_subtree(view);
        self.cleanup();
    }

    /// As [`remove_view`], for views acting as containers for nested
    /// content: the whole subtree goes.
    ///
    /// [`remove_view`]: DockLayout::remove_view
    pub fn remove_view_and_children(&mut self, view_id: &str) {
        let Some(view) = self.node(view_id) else { return };
        if self.tree.kind(view) != Some(NodeKind::View) {
            return;
        }
        let children: Vec<NodeId> = self.tree.children(view).collect();
        for child in children {
            self.tree.remove_subtree(child);
        }
        self.detach_with_selection(view);
        self.tree.remove_subtree(view);
        self.cleanup();
    }

    /// Brings the first view with this name to the front of its tab stack.
    /// Views hosted anywhere else are already visible; returns false.
    pub fn show_view(&mut self, view_name: &str) -> bool {
        let Some(view) = self.find_by_name(view_name) else { return false };
        let Some(parent) = self.tree.parent(view) else { return false };
        if self.dock_kind_of(parent) != DockKind::Tabs {
            return false;
        }
        let id = self.id_of(view).to_owned();
        self.tree.set_prop(parent, props::SELECTED, id);
        true
    }

    /// Unlinks a node, handing tab selection to the first remaining sibling
    /// (or clearing it when none remain).
    pub(super) fn detach_with_selection(&mut self, node: NodeId) {
        let Some(parent) = self.tree.parent(node) else { return };
        let node_id = self.id_of(node).to_owned();
        self.tree.detach(node);
        if self.dock_kind_of(parent) == DockKind::Tabs
            && self.tree.str_prop(parent, props::SELECTED) == node_id
        {
            match self.tree.first_child(parent) {
                Some(first) => {
                    let first_id = self.id_of(first).to_owned();
                    self.tree.set_prop(parent, props::SELECTED, first_id);
                }
                None => self.tree.remove_prop(parent, props::SELECTED),
            }
        }
    }

    // ------------------------------------------------------------------
    // Find
    // ------------------------------------------------------------------

    pub(super) fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.tree.preorder(self.root).find(|&n| {
            self.tree.has_prop(n, props::NAME) && self.tree.str_prop(n, props::NAME) == name
        })
    }

    pub(super) fn find_matching(&self, re: &Regex) -> Option<NodeId> {
        self.tree.preorder(self.root).find(|&n| {
            self.tree.has_prop(n, props::NAME) && re.is_match(self.tree.str_prop(n, props::NAME))
        })
    }

    /// The container acting as a window's content area, i.e. the direct
    /// child of a Window node on this node's ancestor path.
    pub(super) fn window_root_of(&self, node: NodeId) -> Option<NodeId> {
        if self.tree.kind(node) == Some(NodeKind::Window) {
            return self.tree.first_child(node);
        }
        self.tree.ancestors(node).find(|&n| self.is_window_root(n))
    }

    pub(super) fn window_of(&self, node: NodeId) -> Option<NodeId> {
        self.tree.ancestors(node).find(|&n| self.tree.kind(n) == Some(NodeKind::Window))
    }

    pub fn is_window_root(&self, node: NodeId) -> bool {
        self.tree
            .parent(node)
            .is_some_and(|p| self.tree.kind(p) == Some(NodeKind::Window))
    }

    /// True when the reference has an ancestor split of this orientation,
    /// the condition for parent-tier drops to be meaningful.
    pub fn has_split_ancestor(&self, id: &str, kind: DockKind) -> bool {
        self.node(id)
            .and_then(|n| self.find_split_ancestor(n, kind))
            .is_some()
    }

    /// Nearest ancestor of `target` (stopping below the Window) arranging
    /// children as `kind`, along with the ancestor's child on the path down
    /// to `target`.
    pub(super) fn find_split_ancestor(
        &self,
        target: NodeId,
        kind: DockKind,
    ) -> Option<(NodeId, NodeId)> {
        let mut branch = target;
        for ancestor in self.tree.ancestors(target).skip(1) {
            match self.tree.kind(ancestor) {
                Some(NodeKind::Window) | Some(NodeKind::RootCollection) | None => return None,
                _ => {}
            }
            if self.dock_kind_of(ancestor) == kind {
                return Some((ancestor, branch));
            }
            branch = ancestor;
        }
        None
    }

    // ------------------------------------------------------------------
    // Getters / setters
    // ------------------------------------------------------------------

    pub fn layout_name(&self) -> &str { self.tree.str_prop(self.root, props::NAME) }

    pub fn set_layout_name(&mut self, name: &str) {
        self.tree.set_prop(self.root, props::NAME, name);
    }

    pub fn name(&self, id: &str) -> String {
        self.node(id)
            .map(|n| self.tree.str_prop(n, props::NAME).to_owned())
            .unwrap_or_default()
    }

    pub fn set_name(&mut self, id: &str, name: &str) {
        if let Some(node) = self.node(id) {
            self.tree.set_prop(node, props::NAME, name);
        }
    }

    pub fn dock_kind(&self, id: &str) -> DockKind {
        self.node(id).map(|n| self.dock_kind_of(n)).unwrap_or_default()
    }

    pub(super) fn dock_kind_of(&self, node: NodeId) -> DockKind {
        self.tree.str_prop(node, props::DOCK_TYPE).parse().unwrap_or_default()
    }

    pub fn set_dock_kind(&mut self, id: &str, kind: DockKind) {
        if let Some(node) = self.node(id) {
            self.set_dock_kind_node(node, kind);
        }
    }

    pub(super) fn set_dock_kind_node(&mut self, node: NodeId, kind: DockKind) {
        self.tree.set_prop(node, props::DOCK_TYPE, kind.to_string());
    }

    pub fn bounds(&self, id: &str) -> Rect {
        self.node(id).map(|n| self.bounds_node(n)).unwrap_or_default()
    }

    pub(super) fn bounds_node(&self, node: NodeId) -> Rect {
        Rect::new(
            self.tree.num_prop(node, props::X),
            self.tree.num_prop(node, props::Y),
            self.tree.num_prop(node, props::WIDTH),
            self.tree.num_prop(node, props::HEIGHT),
        )
    }

    pub fn set_bounds(&mut self, id: &str, bounds: Rect) {
        if let Some(node) = self.node(id) {
            self.set_bounds_node(node, bounds);
        }
    }

    pub(super) fn set_bounds_node(&mut self, node: NodeId, bounds: Rect) {
        self.tree.set_prop(node, props::X, bounds.x);
        self.tree.set_prop(node, props::Y, bounds.y);
        self.set_size_node(node, bounds.width, bounds.height);
    }

    pub fn position(&self, id: &str) -> Point { self.bounds(id).origin() }

    pub fn set_position(&mut self, id: &str, position: Point) {
        if let Some(node) = self.node(id) {
            self.tree.set_prop(node, props::X, position.x);
            self.tree.set_prop(node, props::Y, position.y);
        }
    }

    pub fn width(&self, id: &str) -> f64 { self.bounds(id).width }

    pub fn height(&self, id: &str) -> f64 { self.bounds(id).height }

    pub fn set_width(&mut self, id: &str, width: f64) {
        if let Some(node) = self.node(id) {
            self.tree.set_prop(node, props::WIDTH, width.max(MIN_PANEL_SIZE));
        }
    }

    pub fn set_height(&mut self, id: &str, height: f64) {
        if let Some(node) = self.node(id) {
            self.tree.set_prop(node, props::HEIGHT, height.max(MIN_PANEL_SIZE));
        }
    }

    pub(super) fn set_size_node(&mut self, node: NodeId, width: f64, height: f64) {
        self.tree.set_prop(node, props::WIDTH, width.max(MIN_PANEL_SIZE));
        self.tree.set_prop(node, props::HEIGHT, height.max(MIN_PANEL_SIZE));
    }

    /// Active tab id of a Tabs container; empty otherwise.
    pub fn selected_id(&self, id: &str) -> String {
        self.node(id)
            .map(|n| self.tree.str_prop(n, props::SELECTED).to_owned())
            .unwrap_or_default()
    }

    pub fn set_selected(&mut self, container_id: &str, child_id: &str) {
        let (Some(container), Some(child)) = (self.node(container_id), self.node(child_id))
        else {
            return;
        };
        if self.tree.parent(child) != Some(container) {
            return;
        }
        self.tree.set_prop(container, props::SELECTED, child_id);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        let Some(node) = self.node(id) else { return false };
        let Some(parent) = self.tree.parent(node) else { return false };
        self.tree.str_prop(parent, props::SELECTED) == id
    }

    pub fn set_window_minimized(&mut self, window_id: &str, minimized: bool) {
        self.set_window_flag(window_id, props::MINIMIZED, minimized);
    }

    pub fn set_window_maximized(&mut self, window_id: &str, maximized: bool) {
        self.set_window_flag(window_id, props::MAXIMIZED, maximized);
    }

    pub fn set_window_locked(&mut self, window_id: &str, locked: bool) {
        self.set_window_flag(window_id, props::LOCKED, locked);
    }

    fn set_window_flag(&mut self, window_id: &str, key: &str, value: bool) {
        let Some(window) = self.node(window_id) else { return };
        if self.tree.kind(window) != Some(NodeKind::Window) {
            return;
        }
        self.tree.set_prop(window, key, value);
    }

    /// Locked state of the window owning this node.
    pub fn is_window_locked(&self, id: &str) -> bool {
        let Some(node) = self.node(id) else { return false };
        let Some(window) = self.window_of(node) else { return false };
        self.tree.bool_prop(window, props::LOCKED)
    }

    pub fn is_window(&self, id: &str) -> bool {
        self.node(id).and_then(|n| self.tree.kind(n)) == Some(NodeKind::Window)
    }

    pub fn is_view(&self, id: &str) -> bool {
        self.node(id).and_then(|n| self.tree.kind(n)) == Some(NodeKind::View)
    }

    pub fn is_container(&self, id: &str) -> bool {
        self.node(id).and_then(|n| self.tree.kind(n)) == Some(NodeKind::Container)
    }

    // ------------------------------------------------------------------
    // Bounds propagation
    // ------------------------------------------------------------------

    /// Distributes each window's area over its subtree: splits share the
    /// axis evenly, tab stacks hand the full area to every child. A layer
    /// for hosts that want rough rects without doing their own math; real
    /// resize handling stays in the UI.
    pub fn propagate_bounds(&mut self) {
        let windows: Vec<NodeId> = self.tree.children(self.root).collect();
        for window in windows {
            let bounds = self.bounds_node(window);
            if bounds.is_empty() {
                continue;
            }
            if let Some(area) = self.tree.first_child(window) {
                self.set_bounds_node(area, Rect::new(0.0, 0.0, bounds.width, bounds.height));
                self.spread_bounds(area);
            }
        }
    }

    fn spread_bounds(&mut self, node: NodeId) {
        let children: Vec<NodeId> = self.tree.children(node).collect();
        if children.is_empty() {
            return;
        }
        let kind = self.dock_kind_of(node);
        let full = self.bounds_node(node).with_origin(Point::default());
        let count = children.len() as f64;
        let mut cursor = full.origin();
        for child in children {
            let slice = match kind {
                DockKind::Vertical => {
                    let r = Rect::new(cursor.x, cursor.y, full.width, full.height / count);
                    cursor.y += r.height;
                    r
                }
                DockKind::Horizontal => {
                    let r = Rect::new(cursor.x, cursor.y, full.width / count, full.height);
                    cursor.x += r.width;
                    r
                }
                _ => full,
            };
            self.set_bounds_node(child, slice);
            self.spread_bounds(child);
        }
    }

    /// All laid-out rects keyed by node id, after a propagation pass.
    pub fn view_rects(&mut self) -> Vec<(String, Rect)> {
        self.propagate_bounds();
        self.tree
            .preorder(self.root)
            .filter(|&n| !self.bounds_node(n).is_empty())
            .map(|n| (self.id_of(n).to_owned(), self.bounds_node(n)))
            .collect()
    }

    // ------------------------------------------------------------------
    // Debug
    // ------------------------------------------------------------------

    /// Ascii rendering of the whole layout, for logs and tests.
    pub fn dump(&self) -> String {
        fn subtree(layout: &DockLayout, node: NodeId) -> ascii_tree::Tree {
            let label = layout.node_label(node);
            let children: Vec<ascii_tree::Tree> =
                layout.tree.children(node).map(|c| subtree(layout, c)).collect();
            if children.is_empty() {
                ascii_tree::Tree::Leaf(vec![label])
            } else {
                ascii_tree::Tree::Node(label, children)
            }
        }
        let mut out = String::new();
        let _ = ascii_tree::write_tree(&mut out, &subtree(self, self.root));
        out
    }

    fn node_label(&self, node: NodeId) -> String {
        let kind = self.tree.kind(node).map(NodeKind::tag).unwrap_or("?");
        let name = self.tree.str_prop(node, props::NAME);
        let dock = self.dock_kind_of(node);
        if name.is_empty() {
            format!("{kind} [{dock}]")
        } else {
            format!("{kind} '{name}' [{dock}]")
        }
    }
}
