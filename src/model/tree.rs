use std::collections::BTreeMap;
use std::ops::Index;

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to a node somewhere in the layout tree.
    pub struct NodeId;
}

/// What a node *is*. The kind is fixed at creation and doubles as the
/// element tag in the serialized form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    RootCollection,
    Window,
    Container,
    View,
}

impl NodeKind {
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::RootCollection => "root",
            NodeKind::Window => "window",
            NodeKind::Container => "container",
            NodeKind::View => "view",
        }
    }

    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        match tag {
            "root" => Some(NodeKind::RootCollection),
            "window" => Some(NodeKind::Window),
            "container" => Some(NodeKind::Container),
            "view" => Some(NodeKind::View),
            _ => None,
        }
    }
}

/// Property keys used by the docking layers. The bag itself is open; any
/// key round-trips through serialization untouched.
pub mod props {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const DOCK_TYPE: &str = "dockType";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const SELECTED: &str = "selected";
    pub const LOCKED: &str = "locked";
    pub const MINIMIZED: &str = "minimized";
    pub const MAXIMIZED: &str = "maximized";
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl PropValue {
    /// Zero-values stand in for missing or differently-typed properties;
    /// property reads never fail.
    pub fn as_str(&self) -> &str {
        match self {
            PropValue::Str(s) => s,
            _ => "",
        }
    }

    pub fn as_num(&self) -> f64 {
        match self {
            PropValue::Num(n) => *n,
            _ => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            PropValue::Bool(b) => *b,
            _ => false,
        }
    }

    /// Attribute text for the serialized form.
    pub fn to_attr(&self) -> String {
        match self {
            PropValue::Str(s) => s.clone(),
            PropValue::Num(n) => format!("{n}"),
            PropValue::Bool(b) => format!("{b}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self { PropValue::Str(s.to_owned()) }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self { PropValue::Str(s) }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self { PropValue::Num(n) }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self { PropValue::Bool(b) }
}

/// One element of the tree: sibling links plus the typed payload.
#[derive(Debug)]
pub struct Node {
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    kind: NodeKind,
    props: BTreeMap<String, PropValue>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Node {
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            first_child: None,
            last_child: None,
            kind,
            props: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> NodeKind { self.kind }

    pub fn prop(&self, key: &str) -> Option<&PropValue> { self.props.get(key) }

    pub fn str_prop(&self, key: &str) -> &str {
        self.props.get(key).map(PropValue::as_str).unwrap_or("")
    }

    /// Properties in sorted key order.
    pub fn props(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Arena holding every node. Detached subtrees live in the same map until
/// they are reattached or discarded.
#[derive(Default)]
pub struct NodeMap {
    slots: SlotMap<NodeId, Node>,
}

impl NodeMap {
    pub fn contains(&self, id: NodeId) -> bool { self.slots.contains_key(id) }

    pub fn get(&self, id: NodeId) -> Option<&Node> { self.slots.get(id) }

    pub fn len(&self) -> usize { self.slots.len() }

    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    fn link_last(&mut self, child: NodeId, parent: NodeId) {
        if child == parent || !self.contains(child) || !self.contains(parent) {
            return;
        }
        let prev = {
            let parent_node = &mut self.slots[parent];
            parent_node.first_child.get_or_insert(child);
            parent_node.last_child.replace(child)
        };
        self.slots[child].parent = Some(parent);
        if let Some(prev) = prev {
            self.slots[child].prev_sibling = Some(prev);
            self.slots[prev].next_sibling = Some(child);
        }
    }

    fn link_before(&mut self, child: NodeId, sibling: NodeId) {
        if child == sibling || !self.contains(child) || !self.contains(sibling) {
            return;
        }
        let Some(parent) = self.slots[sibling].parent else { return };
        let prev = self.slots[sibling].prev_sibling;
        self.slots[child].parent = Some(parent);
        self.slots[child].next_sibling = Some(sibling);
        self.slots[child].prev_sibling = prev;
        self.slots[sibling].prev_sibling = Some(child);
        match prev {
            Some(prev) => self.slots[prev].next_sibling = Some(child),
            None => self.slots[parent].first_child = Some(child),
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let Some((parent, prev, next)) =
            self.slots.get(id).map(|n| (n.parent, n.prev_sibling, n.next_sibling))
        else {
            return;
        };
        if let Some(prev) = prev {
            self.slots[prev].next_sibling = next;
        }
        if let Some(next) = next {
            self.slots[next].prev_sibling = prev;
        }
        if let Some(parent) = parent {
            let parent_node = &mut self.slots[parent];
            if parent_node.first_child == Some(id) {
                parent_node.first_child = next;
            }
            if parent_node.last_child == Some(id) {
                parent_node.last_child = prev;
            }
        }
        let node = &mut self.slots[id];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }
}

impl Index<NodeId> for NodeMap {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output { &self.slots[index] }
}

/// Structural-change callbacks, dispatched synchronously after each primitive
/// edit completes. Observers may inspect the map freely; re-entrant mutation
/// goes back through the owning engine.
#[allow(unused_variables)]
pub trait TreeObserver: Sized {
    fn child_added(&mut self, map: &NodeMap, parent: NodeId, child: NodeId) {}
    fn child_removed(&mut self, map: &NodeMap, parent: NodeId, child: NodeId) {}
    fn child_moved(&mut self, map: &NodeMap, parent: NodeId, child: NodeId) {}
    fn parent_changed(&mut self, map: &NodeMap, node: NodeId) {}
    fn property_changed(&mut self, map: &NodeMap, node: NodeId, key: &str) {}
    /// The node has left the map for good. `data` is its final payload, so
    /// id-keyed caches can evict.
    fn node_discarded(&mut self, node: NodeId, data: &Node) {}
}

impl TreeObserver for () {}

#[derive(Clone, Debug, PartialEq)]
pub enum TreeEvent {
    ChildAdded { parent: NodeId, child: NodeId },
    ChildRemoved { parent: NodeId, child: NodeId },
    ChildMoved { parent: NodeId, child: NodeId },
    ParentChanged { node: NodeId },
    PropertyChanged { node: NodeId, key: String },
    NodeDiscarded { id: String },
}

/// Recording observer: buffers events for whoever drains them next.
#[derive(Default)]
pub struct ChangeLog {
    events: Vec<TreeEvent>,
}

impl ChangeLog {
    pub fn drain(&mut self) -> Vec<TreeEvent> { std::mem::take(&mut self.events) }

    pub fn is_empty(&self) -> bool { self.events.is_empty() }
}

impl TreeObserver for ChangeLog {
    fn child_added(&mut self, _map: &NodeMap, parent: NodeId, child: NodeId) {
        self.events.push(TreeEvent::ChildAdded { parent, child });
    }

    fn child_removed(&mut self, _map: &NodeMap, parent: NodeId, child: NodeId) {
        self.events.push(TreeEvent::ChildRemoved { parent, child });
    }

    fn child_moved(&mut self, _map: &NodeMap, parent: NodeId, child: NodeId) {
        self.events.push(TreeEvent::ChildMoved { parent, child });
    }

    fn parent_changed(&mut self, _map: &NodeMap, node: NodeId) {
        self.events.push(TreeEvent::ParentChanged { node });
    }

    fn property_changed(&mut self, _map: &NodeMap, node: NodeId, key: &str) {
        self.events.push(TreeEvent::PropertyChanged { node, key: key.to_owned() });
    }

    fn node_discarded(&mut self, _node: NodeId, data: &Node) {
        self.events.push(TreeEvent::NodeDiscarded { id: data.str_prop(props::ID).to_owned() });
    }
}

/// N-ary ordered tree with typed nodes and an observer.
pub struct LayoutTree<O = ()> {
    map: NodeMap,
    pub observer: O,
}

impl LayoutTree<()> {
    pub fn new() -> Self { Self::with_observer(()) }
}

impl Default for LayoutTree<()> {
    fn default() -> Self { Self::new() }
}

impl<O: TreeObserver> LayoutTree<O> {
    pub fn with_observer(observer: O) -> Self {
        LayoutTree { map: NodeMap::default(), observer }
    }

    pub fn map(&self) -> &NodeMap { &self.map }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains(id) }

    /// Creates a detached node. It joins the tree via [`insert_child`].
    ///
    /// [`insert_child`]: LayoutTree::insert_child
    pub fn mk_node(&mut self, kind: NodeKind) -> NodeId {
        self.map.slots.insert(Node::new(kind))
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.map.get(id).map(Node::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.map.get(id).and_then(|n| n.parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.map.get(id).and_then(|n| n.first_child)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = self.map.get(id).and_then(|n| n.first_child);
        std::iter::from_fn(move || {
            let node = cur?;
            cur = self.map.get(node).and_then(|n| n.next_sibling);
            Some(node)
        })
    }

    pub fn child_count(&self, id: NodeId) -> usize { self.children(id).count() }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).nth(index)
    }

    /// Position of `id` among its siblings.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).position(|c| c == id)
    }

    /// All ancestors of `id`, starting with `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.map.contains(id).then_some(id);
        std::iter::from_fn(move || {
            let node = next?;
            next = self.map.get(node).and_then(|n| n.parent);
            Some(node)
        })
    }

    /// Depth-first traversal of the subtree rooted at `id`.
    pub fn preorder(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = self.map.contains(id).then_some(id);
        std::iter::from_fn(move || {
            let node = cur?;
            if let Some(child) = self.first_child(node) {
                cur = Some(child);
            } else {
                cur = None;
                for ancestor in self.ancestors(node) {
                    if ancestor == id {
                        break;
                    }
                    if let Some(sibling) = self.map.get(ancestor).and_then(|n| n.next_sibling) {
                        cur = Some(sibling);
                        break;
                    }
                }
            }
            Some(node)
        })
    }

    /// True when `other` lies in the subtree rooted at `node`.
    pub fn is_in_subtree(&self, node: NodeId, other: NodeId) -> bool {
        self.ancestors(other).any(|a| a == node)
    }

    /// Attaches a detached node under `parent`. `index` of `None` (or past
    /// the end) appends. No-op when `child` already has a parent or the
    /// attachment would close a cycle.
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        if parent == child || !self.map.contains(parent) || !self.map.contains(child) {
            return;
        }
        if self.map[child].parent.is_some() || self.is_in_subtree(child, parent) {
            return;
        }
        self.attach(parent, child, index);
        self.observer.child_added(&self.map, parent, child);
        self.observer.parent_changed(&self.map, child);
    }

    /// Unlinks `child` from its parent. The subtree stays alive in the map
    /// until reattached or discarded.
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else { return };
        self.map.unlink(child);
        self.observer.child_removed(&self.map, parent, child);
        self.observer.parent_changed(&self.map, child);
    }

    /// Moves `child` under `new_parent` as one logical step; observers never
    /// see the node dangling in between. Within the same parent this is a
    /// reorder, and `index` counts siblings with `child` already removed.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId, index: Option<usize>) {
        if child == new_parent || !self.map.contains(child) || !self.map.contains(new_parent) {
            return;
        }
        if self.is_in_subtree(child, new_parent) {
            return;
        }
        let old_parent = self.parent(child);
        self.map.unlink(child);
        self.attach(new_parent, child, index);
        match old_parent {
            Some(old) if old == new_parent => {
                self.observer.child_moved(&self.map, new_parent, child);
            }
            Some(old) => {
                self.observer.child_removed(&self.map, old, child);
                self.observer.child_added(&self.map, new_parent, child);
                self.observer.parent_changed(&self.map, child);
            }
            None => {
                self.observer.child_added(&self.map, new_parent, child);
                self.observer.parent_changed(&self.map, child);
            }
        }
    }

    /// Detaches `id` and discards its entire subtree.
    pub fn remove_subtree(&mut self, id: NodeId) {
        if !self.map.contains(id) {
            return;
        }
        self.detach(id);
        let doomed: Vec<NodeId> = self.preorder(id).collect();
        for node in doomed {
            if let Some(data) = self.map.slots.remove(node) {
                self.observer.node_discarded(node, &data);
            }
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        match index {
            Some(i) if i < self.child_count(parent) => {
                let at = self.child_at(parent, i).expect("indexed child must exist");
                self.map.link_before(child, at);
            }
            _ => self.map.link_last(child, parent),
        }
    }

    pub fn prop(&self, id: NodeId, key: &str) -> Option<&PropValue> {
        self.map.get(id).and_then(|n| n.props.get(key))
    }

    pub fn has_prop(&self, id: NodeId, key: &str) -> bool {
        self.prop(id, key).is_some()
    }

    pub fn str_prop(&self, id: NodeId, key: &str) -> &str {
        self.prop(id, key).map(PropValue::as_str).unwrap_or("")
    }

    pub fn num_prop(&self, id: NodeId, key: &str) -> f64 {
        self.prop(id, key).map(PropValue::as_num).unwrap_or(0.0)
    }

    pub fn bool_prop(&self, id: NodeId, key: &str) -> bool {
        self.prop(id, key).map(PropValue::as_bool).unwrap_or(false)
    }

    pub fn set_prop(&mut self, id: NodeId, key: &str, value: impl Into<PropValue>) {
        let value = value.into();
        let Some(node) = self.map.slots.get_mut(id) else { return };
        if node.props.get(key) == Some(&value) {
            return;
        }
        node.props.insert(key.to_owned(), value);
        self.observer.property_changed(&self.map, id, key);
    }

    pub fn remove_prop(&mut self, id: NodeId, key: &str) {
        let Some(node) = self.map.slots.get_mut(id) else { return };
        if node.props.remove(key).is_some() {
            self.observer.property_changed(&self.map, id, key);
        }
    }
}
