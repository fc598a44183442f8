use regex::Regex;
use tracing::{debug, warn};

use super::drop::{DockKind, DropLocation};
use super::engine::DockLayout;
use crate::common::geometry::{Point, Rect};
use crate::model::tree::{NodeId, NodeKind, PropValue, props};

/// The placement cascade. A drop gesture is reported relative to where the
/// pointer is, not to the logical tree shape; the same gesture must reuse a
/// compatible split nearby, promote one, fall back to the window root, or
/// open a whole new window. Each strategy has a crisp win condition; the
/// first that succeeds wins, and orphan cleanup runs after any success.
impl DockLayout {
    /// Docking policy hook. Nothing is refused today; hosts wanting
    /// lock-aware policy layer it above the manager.
    pub fn can_dock(&self, _target_id: &str, _location: DropLocation) -> bool { true }

    /// Creates a fresh view and places it relative to `target_id`. Returns
    /// the new view's id, or an empty string when nothing could be placed.
    pub fn dock_new_view(&mut self, target_id: &str, location: DropLocation, name: &str) -> String {
        if !self.can_dock(target_id, location) {
            return String::new();
        }
        let target = self.resolve_target(self.node(target_id), location);
        let view = self.new_view(name, DockKind::None);
        let id = self.id_of(view).to_owned();
        debug!(location = location.label(), name, "docking new view");
        if self.dock_node(view, target, location, None, None) {
            id
        } else {
            self.tree.remove_subtree(view);
            String::new()
        }
    }

    /// Re-docks an existing node relative to `target_id`. No-op when source
    /// and target coincide or the target sits inside the source subtree.
    pub fn dock_view(
        &mut self,
        view_id: &str,
        target_id: &str,
        location: DropLocation,
        drop_position: Point,
        tab_index: Option<usize>,
    ) {
        if view_id == target_id || !self.can_dock(target_id, location) {
            return;
        }
        let Some(view) = self.node(view_id) else { return };
        let target = self.node(target_id);
        if let Some(target) = target {
            if self.tree.is_in_subtree(view, target) {
                return;
            }
        }
        let target = self.resolve_target(target, location);
        debug!(location = location.label(), view = view_id, "docking view");
        self.detach_with_selection(view);
        if !self.dock_node(view, target, location, tab_index, Some(drop_position)) {
            warn!(view = view_id, target = target_id, "could not dock view anywhere");
        }
    }

    /// Moves an existing node into a brand-new floating window at
    /// `position`.
    pub fn open_in_new_window(&mut self, id: &str, position: Point) {
        let Some(node) = self.node(id) else { return };
        match self.tree.kind(node) {
            Some(NodeKind::Container) | Some(NodeKind::View) => {}
            _ => return,
        }
        self.detach_with_selection(node);
        if self.dock_in_new_window(node, Some(position), Rect::default()) {
            self.cleanup();
        }
    }

    /// Creates a named view directly in a new floating window.
    pub fn create_in_new_window(&mut self, view_name: &str, bounds: Rect) {
        let view = self.new_view(view_name, DockKind::None);
        if self.dock_in_new_window(view, None, bounds) {
            self.cleanup();
        }
    }

    /// Opens `view_name` as a tab next to the first node whose name matches
    /// `pattern` (full match). Without a match the view docks at
    /// `fallback` relative to the first window's root; without any window a
    /// new one opens.
    pub fn open_view_as_new_tab(
        &mut self,
        view_name: &str,
        pattern: &str,
        fallback: DropLocation,
    ) {
        let target = Regex::new(&format!("^(?:{pattern})$"))
            .ok()
            .and_then(|re| self.find_matching(&re));
        if let Some(found) = target {
            let id = self.id_of(found).to_owned();
            self.dock_new_view(&id, DropLocation::Tabs, view_name);
            return;
        }
        match self.first_window().and_then(|w| self.tree.first_child(w)) {
            Some(area) => {
                let id = self.id_of(area).to_owned();
                self.dock_new_view(&id, fallback, view_name);
            }
            None => {
                let view = self.new_view(view_name, DockKind::None);
                if self.dock_in_new_window(view, None, Rect::default()) {
                    self.cleanup();
                }
            }
        }
    }

    /// Root-tier gestures always aim at the window's content area, no
    /// matter how deeply the pointer was nested.
    fn resolve_target(&self, target: Option<NodeId>, location: DropLocation) -> Option<NodeId> {
        let target = target?;
        if location.is_root_tier() {
            self.window_root_of(target)
        } else {
            Some(target)
        }
    }

    pub(super) fn dock_node(
        &mut self,
        node: NodeId,
        target: Option<NodeId>,
        location: DropLocation,
        tab_index: Option<usize>,
        drop_at: Option<Point>,
    ) -> bool {
        let placed = self.dock_in_view(node, target, location, tab_index)
            || self.dock_in_parent(node, target, location, tab_index)
            || self.dock_in_root(node, target, location)
            || self.dock_in_new_window(node, drop_at, Rect::default());
        if placed {
            self.cleanup();
        }
        placed
    }

    /// Strategy 1: the reference's surroundings already fit. Directional
    /// drops need the reference's parent to be a split of the matching
    /// orientation; tab drops need a tab stack at (or directly above) the
    /// reference.
    fn dock_in_view(
        &mut self,
        node: NodeId,
        target: Option<NodeId>,
        location: DropLocation,
        tab_index: Option<usize>,
    ) -> bool {
        let Some(target) = target else { return false };
        if location.is_root_tier() || location.is_parent_tier() || location == DropLocation::None {
            return false;
        }
        if location == DropLocation::Tabs {
            if self.tree.kind(target) != Some(NodeKind::Window)
                && self.dock_kind_of(target) == DockKind::Tabs
            {
                self.place_in(target, node, tab_index);
                return true;
            }
            if let Some(parent) = self.tree.parent(target) {
                if self.dock_kind_of(parent) == DockKind::Tabs {
                    let index = tab_index.or_else(|| self.tree.index_of(target).map(|i| i + 1));
                    self.place_in(parent, node, index);
                    return true;
                }
            }
            return false;
        }
        if self.is_window_root(target) {
            return false;
        }
        let Some(parent) = self.tree.parent(target) else { return false };
        if self.dock_kind_of(parent) != location.dock_kind() {
            return false;
        }
        let index = self.tree.index_of(target).unwrap_or(0) + location.sibling_offset();
        self.place_in(parent, node, Some(index));
        true
    }

    /// Strategy 2: make the surroundings fit. Parent-tier drops walk up for
    /// a matching split and otherwise promote one around the reference;
    /// view-tier drops promote in place (the window root adopts the
    /// orientation instead of growing a wrapper when it only holds the
    /// reference); tab drops wrap the reference into a fresh stack.
    fn dock_in_parent(
        &mut self,
        node: NodeId,
        target: Option<NodeId>,
        location: DropLocation,
        tab_index: Option<usize>,
    ) -> bool {
        let Some(target) = target else { return false };
        if location.is_root_tier() || location == DropLocation::None {
            return false;
        }
        match self.tree.kind(target) {
            Some(NodeKind::Container) | Some(NodeKind::View) => {}
            _ => return false,
        }
        if self.is_window_root(target) || self.tree.parent(target).is_none() {
            return false;
        }
        let needed = location.dock_kind();

        if location == DropLocation::Tabs {
            let Some(stack) = self.wrap_in_container(target, DockKind::Tabs) else {
                return false;
            };
            self.place_in(stack, node, tab_index);
            return true;
        }

        if location.is_parent_tier() {
            if let Some((host, branch)) = self.find_split_ancestor(target, needed) {
                let index = self.tree.index_of(branch).unwrap_or(0) + location.sibling_offset();
                self.place_in(host, node, Some(index));
                return true;
            }
            let Some(wrapper) = self.wrap_in_container(target, needed) else { return false };
            self.place_in(wrapper, node, location.container_index());
            return true;
        }

        // View tier with a mismatched parent.
        let parent = self.tree.parent(target).expect("checked above");
        if self.is_window_root(parent) && self.tree.child_count(parent) == 1 {
            self.set_dock_kind_node(parent, needed);
            let index = self.tree.index_of(target).unwrap_or(0) + location.sibling_offset();
            self.place_in(parent, node, Some(index));
            return true;
        }
        let Some(wrapper) = self.wrap_in_container(target, needed) else { return false };
        self.place_in(wrapper, node, location.container_index());
        true
    }

    /// Strategy 3: split the window's whole content area.
    fn dock_in_root(
        &mut self,
        node: NodeId,
        target: Option<NodeId>,
        location: DropLocation,
    ) -> bool {
        let Some(target) = target else { return false };
        if location == DropLocation::None {
            return false;
        }
        let targets_root = location.is_root_tier()
            || self.is_window_root(target)
            || self.tree.kind(target) == Some(NodeKind::Window);
        if !targets_root {
            return false;
        }
        let Some(area) = self.window_root_of(target) else { return false };
        let needed = location.dock_kind();
        let index = location.container_index();

        if self.dock_kind_of(area) == needed {
            self.place_in(area, node, index);
            return true;
        }
        match self.tree.first_child(area) {
            None => {
                let holder = self.new_container(needed);
                self.tree.insert_child(area, holder, None);
                self.place_in(holder, node, index);
            }
            Some(first) if self.dock_kind_of(area) == DockKind::None => {
                if self.dock_kind_of(first) == needed {
                    self.place_in(first, node, index);
                } else {
                    let Some(holder) = self.wrap_in_container(first, needed) else {
                        return false;
                    };
                    self.place_in(holder, node, index);
                }
            }
            Some(_) => {
                // The root already arranges children another way: push its
                // whole content down one level and adopt the new axis.
                let old_kind = self.dock_kind_of(area);
                let holder = self.new_container(old_kind);
                if let Some(selected) = self.tree.prop(area, props::SELECTED).cloned() {
                    if let PropValue::Str(selected) = selected {
                        self.tree.set_prop(holder, props::SELECTED, selected);
                    }
                    self.tree.remove_prop(area, props::SELECTED);
                }
                let children: Vec<NodeId> = self.tree.children(area).collect();
                for child in children {
                    self.tree.reparent(child, holder, None);
                }
                self.set_dock_kind_node(area, needed);
                self.tree.insert_child(area, holder, None);
                self.place_in(area, node, index);
            }
        }
        true
    }

    /// Strategy 4: last resort. A brand-new floating window around the
    /// node, horizontally centered on the drop point.
    pub(super) fn dock_in_new_window(
        &mut self,
        node: NodeId,
        drop_at: Option<Point>,
        bounds: Rect,
    ) -> bool {
        if !self.tree.contains(node) {
            return false;
        }
        let (window_id, area_id) = self.add_new_window("New Window", bounds);
        let Some(area) = self.node(&area_id) else { return false };
        self.tree.insert_child(area, node, None);
        if let Some(drop_at) = drop_at {
            let window = self.node(&window_id).expect("window was just created");
            let width = self.bounds_node(window).width;
            self.tree.set_prop(window, props::X, drop_at.x - width / 2.0);
            self.tree.set_prop(window, props::Y, drop_at.y);
        }
        true
    }

    /// Inserts into a container, keeping tab selection on the newcomer.
    fn place_in(&mut self, container: NodeId, node: NodeId, index: Option<usize>) {
        self.tree.insert_child(container, node, index);
        if self.dock_kind_of(container) == DockKind::Tabs {
            let id = self.id_of(node).to_owned();
            self.tree.set_prop(container, props::SELECTED, id);
        }
    }

    /// Promotes a split: a fresh container of `kind` takes the node's slot
    /// and the node moves down into it. Tree depth grows by one exactly
    /// here. A tab-stack parent that had the node selected selects the
    /// wrapper instead, keeping its selection on a direct child.
    pub(super) fn wrap_in_container(&mut self, node: NodeId, kind: DockKind) -> Option<NodeId> {
        let parent = self.tree.parent(node)?;
        let index = self.tree.index_of(node)?;
        let node_id = self.id_of(node).to_owned();
        let container = self.new_container(kind);
        self.tree.reparent(node, container, None);
        self.tree.insert_child(parent, container, Some(index));
        if self.dock_kind_of(parent) == DockKind::Tabs
            && self.tree.str_prop(parent, props::SELECTED) == node_id
        {
            let container_id = self.id_of(container).to_owned();
            self.tree.set_prop(parent, props::SELECTED, container_id);
        }
        Some(container)
    }

    // ------------------------------------------------------------------
    // Orphan cleanup
    // ------------------------------------------------------------------

    /// Repairs the tree after wrap/unwrap churn, to a fixpoint: an unnamed
    /// container holding a single child dissolves into its parent, a tab
    /// stack with nothing left to select disappears, and a window whose
    /// content area emptied out closes. Window root containers are exempt
    /// from dissolution.
    pub(super) fn cleanup(&mut self) {
        while let Some(orphan) = self.find_orphan() {
            self.dissolve(orphan);
        }
        self.sweep_empty_windows();
    }

    fn find_orphan(&self) -> Option<NodeId> {
        self.tree.preorder(self.root).find(|&n| {
            if self.tree.kind(n) != Some(NodeKind::Container) || self.is_window_root(n) {
                return false;
            }
            let children = self.tree.child_count(n);
            (children == 1 && self.tree.str_prop(n, props::NAME).is_empty())
                || (children == 0 && self.dock_kind_of(n) == DockKind::Tabs)
        })
    }

    fn dissolve(&mut self, container: NodeId) {
        let Some(parent) = self.tree.parent(container) else {
            self.tree.remove_subtree(container);
            return;
        };
        if let Some(child) = self.tree.first_child(container) {
            let index = self.tree.index_of(container).unwrap_or(0);
            let container_id = self.id_of(container).to_owned();
            let width = self.tree.prop(container, props::WIDTH).cloned();
            let height = self.tree.prop(container, props::HEIGHT).cloned();
            self.tree.reparent(child, parent, Some(index));
            // An explicit size hint on the dissolved split carries over.
            if let Some(width) = width {
                self.tree.set_prop(child, props::WIDTH, width);
            }
            if let Some(height) = height {
                self.tree.set_prop(child, props::HEIGHT, height);
            }
            if self.dock_kind_of(parent) == DockKind::Tabs
                && self.tree.str_prop(parent, props::SELECTED) == container_id
            {
                let child_id = self.id_of(child).to_owned();
                self.tree.set_prop(parent, props::SELECTED, child_id);
            }
        }
        self.tree.remove_subtree(container);
    }

    fn sweep_empty_windows(&mut self) {
        let windows: Vec<NodeId> = self.tree.children(self.root).collect();
        for window in windows {
            let empty = match self.tree.first_child(window) {
                None => true,
                Some(area) => self.tree.first_child(area).is_none(),
            };
            if empty {
                debug!(window = self.id_of(window), "removing emptied window");
                self.tree.remove_subtree(window);
            }
        }
    }
}
