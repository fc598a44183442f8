use std::collections::HashSet;

use pretty_assertions::assert_eq;

use super::drop::{DockKind, DropLocation};
use super::engine::DockLayout;
use crate::common::geometry::{Point, Rect};
use crate::model::tree::{NodeId, NodeKind, props};

fn names_of(layout: &DockLayout, parent: NodeId) -> Vec<String> {
    layout
        .tree()
        .children(parent)
        .map(|c| layout.tree().str_prop(c, props::NAME).to_owned())
        .collect()
}

fn window_area(layout: &DockLayout, window_id: &str) -> NodeId {
    let window = layout.node(window_id).expect("window exists");
    layout.tree().first_child(window).expect("window has a root container")
}

/// One window holding a single plain view named "A".
fn single_view_window(layout: &mut DockLayout) -> (String, String, String) {
    let (window_id, root_id) = layout.add_new_window("Main", Rect::default());
    let a = layout.add_view(&root_id, "A", DockKind::None);
    assert!(!a.is_empty());
    (window_id, root_id, a)
}

/// The §-invariants every mutation must preserve: tree shape, unique ids,
/// live tab selection, and no orphan containers.
#[track_caller]
fn assert_invariants(layout: &DockLayout) {
    let tree = layout.tree();
    let root = layout.root();
    assert_eq!(Some(NodeKind::RootCollection), tree.kind(root));

    let mut seen_ids = HashSet::new();
    for node in tree.preorder(root) {
        let id = tree.str_prop(node, props::ID);
        if !id.is_empty() {
            assert!(seen_ids.insert(id.to_owned()), "duplicate id {id}");
        }

        let dock: DockKind = tree.str_prop(node, props::DOCK_TYPE).parse().unwrap_or_default();
        match tree.kind(node).expect("traversed node exists") {
            NodeKind::RootCollection => {
                assert_eq!(root, node, "nested root collection");
                for window in tree.children(node) {
                    assert_eq!(Some(NodeKind::Window), tree.kind(window));
                }
            }
            NodeKind::Window => {
                assert_eq!(1, tree.child_count(node), "window must hold exactly one container");
                let area = tree.first_child(node).unwrap();
                assert_eq!(Some(NodeKind::Container), tree.kind(area));
            }
            NodeKind::Container => {
                let children = tree.child_count(node);
                if !layout.is_window_root(node) {
                    assert!(
                        children != 1 || !tree.str_prop(node, props::NAME).is_empty(),
                        "orphan single-child container survived cleanup"
                    );
                    assert!(
                        children > 0 || dock != DockKind::Tabs,
                        "empty tabs container survived cleanup"
                    );
                }
            }
            NodeKind::View => {}
        }

        // A tab stack with children always selects one of them.
        if dock == DockKind::Tabs && tree.child_count(node) > 0 {
            let selected = tree.str_prop(node, props::SELECTED);
            assert!(!selected.is_empty(), "tab stack has no selection");
            assert!(
                tree.children(node).any(|c| tree.str_prop(c, props::ID) == selected),
                "tab selection {selected} names a missing child"
            );
        }
    }
}

mod windows {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_window_with_bounds() {
        let mut layout = DockLayout::new();
        let (window_id, root_id) = layout.add_new_window("Chris", Rect::new(32.0, 43.0, 123.0, 534.0));
        assert!(layout.is_window(&window_id));
        assert!(layout.is_container(&root_id));
        assert_eq!(Rect::new(32.0, 43.0, 123.0, 534.0), layout.bounds(&window_id));
        assert_eq!("Chris", layout.name(&window_id));
        assert_eq!(1, layout.window_count());
        assert_invariants(&layout);
    }

    #[test]
    fn add_window_without_bounds_leaves_geometry_unset() {
        let mut layout = DockLayout::new();
        let (window_id, _) = layout.add_new_window("Chris", Rect::default());
        let window = layout.node(&window_id).unwrap();
        assert!(!layout.tree().has_prop(window, props::X));
        assert!(!layout.tree().has_prop(window, props::WIDTH));
        assert_eq!(Rect::default(), layout.bounds(&window_id));
    }

    #[test]
    fn remove_window() {
        let mut layout = DockLayout::new();
        let (window_id, _) = layout.add_new_window("Chris", Rect::default());
        layout.remove_window(&window_id);
        assert_eq!(0, layout.window_count());
        assert!(layout.node(&window_id).is_none());
    }

    #[test]
    fn remove_window_ignores_non_window_ids() {
        let mut layout = DockLayout::new();
        let (_, root_id) = layout.add_new_window("Chris", Rect::default());
        layout.remove_window(&root_id);
        layout.remove_window("not-an-id");
        assert_eq!(1, layout.window_count());
    }

    #[test]
    fn clear_windows() {
        let mut layout = DockLayout::new();
        layout.add_new_window("One", Rect::default());
        layout.add_new_window("Two", Rect::default());
        layout.add_new_window("Three", Rect::default());
        assert_eq!(3, layout.window_count());
        layout.clear_windows();
        assert_eq!(0, layout.window_count());
    }

    #[test]
    fn window_flags() {
        let mut layout = DockLayout::new();
        let (window_id, root_id) = layout.add_new_window("Main", Rect::default());
        let view = layout.add_view(&root_id, "A", DockKind::None);
        layout.set_window_locked(&window_id, true);
        layout.set_window_minimized(&window_id, true);
        layout.set_window_maximized(&window_id, false);
        assert!(layout.is_window_locked(&view), "lock state reaches nested nodes");
        // Flag setters only apply to windows.
        layout.set_window_locked(&view, true);
        let node = layout.node(&view).unwrap();
        assert!(!layout.tree().has_prop(node, props::LOCKED));
    }
}

mod views {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_view_appends() {
        let mut layout = DockLayout::new();
        let (_, root_id) = layout.add_new_window("Main", Rect::default());
        let view = layout.add_view(&root_id, "Test View", DockKind::Tabs);
        assert!(!view.is_empty());
        assert!(layout.is_view(&view));
        assert_eq!("Test View", layout.name(&view));
        assert_eq!(DockKind::Tabs, layout.dock_kind(&view));
        let node = layout.node(&view).unwrap();
        assert_eq!(layout.node(&root_id), layout.tree().parent(node));
    }

    #[test]
    fn add_view_rejects_windows_and_root() {
        let mut layout = DockLayout::new();
        let (window_id, _) = layout.add_new_window("Main", Rect::default());
        let root_id = layout.id_of(layout.root()).to_owned();
        assert_eq!("", layout.add_view(&window_id, "X", DockKind::Tabs));
        assert_eq!("", layout.add_view(&root_id, "X", DockKind::Tabs));
        assert_eq!("", layout.add_view("missing", "X", DockKind::Tabs));
    }

    #[test]
    fn remove_last_view_closes_the_window() {
        let mut layout = DockLayout::new();
        let (_, _, a) = single_view_window(&mut layout);
        layout.remove_view(&a);
        assert_eq!(0, layout.window_count());
        assert_invariants(&layout);
    }

    #[test]
    fn remove_view_ignores_bogus_ids() {
        let mut layout = DockLayout::new();
        let (_, _, _a) = single_view_window(&mut layout);
        layout.remove_view("bogus");
        assert_eq!(1, layout.window_count());
    }

    #[test]
    fn remove_view_and_children_discards_nested_content() {
        let mut layout = DockLayout::new();
        let (_, root_id, a) = single_view_window(&mut layout);
        let b = layout.add_view(&root_id, "B", DockKind::None);
        let nested = layout.add_view(&a, "Nested", DockKind::Tabs);
        layout.remove_view_and_children(&a);
        assert!(layout.node(&a).is_none());
        assert!(layout.node(&nested).is_none());
        assert!(layout.node(&b).is_some());
        assert_invariants(&layout);
    }

    #[test]
    fn show_view_selects_in_tab_stack() {
        let mut layout = DockLayout::new();
        let (_, root_id) = layout.add_new_window("Main", Rect::default());
        let stack = layout.add_view(&root_id, "Stack", DockKind::Tabs);
        let x = layout.dock_new_view(&stack, DropLocation::Tabs, "X");
        let y = layout.dock_new_view(&stack, DropLocation::Tabs, "Y");
        assert_eq!(layout.selected_id(&stack), y);

        assert!(layout.show_view("X"));
        assert_eq!(layout.selected_id(&stack), x);
    }

    #[test]
    fn show_view_outside_tabs_returns_false() {
        let mut layout = DockLayout::new();
        let (_, _, _a) = single_view_window(&mut layout);
        assert!(!layout.show_view("A"));
        assert!(!layout.show_view("missing"));
    }
}

mod docking_cascade {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn view_right_on_sole_view_adopts_the_root_container() {
        let mut layout = DockLayout::new();
        let (window_id, root_id, a) = single_view_window(&mut layout);
        let b = layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        assert!(!b.is_empty());

        let area = window_area(&layout, &window_id);
        assert_eq!(DockKind::Horizontal, layout.dock_kind(&root_id));
        assert_eq!(vec!["A", "B"], names_of(&layout, area));
        // No wrapper container in between.
        for child in layout.tree().children(area) {
            assert_eq!(Some(NodeKind::View), layout.tree().kind(child));
        }
        assert_invariants(&layout);
    }

    #[test]
    fn view_left_inserts_before_the_reference() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        layout.dock_new_view(&a, DropLocation::ViewLeft, "C");
        let area = window_area(&layout, &window_id);
        assert_eq!(vec!["C", "A", "B"], names_of(&layout, area));
        assert_invariants(&layout);
    }

    #[test]
    fn view_top_promotes_a_vertical_split() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        layout.dock_new_view(&a, DropLocation::ViewTop, "C");

        let area = window_area(&layout, &window_id);
        let children: Vec<NodeId> = layout.tree().children(area).collect();
        assert_eq!(2, children.len());
        let wrapper = children[0];
        assert_eq!(Some(NodeKind::Container), layout.tree().kind(wrapper));
        assert_eq!(DockKind::Vertical, layout.dock_kind(layout.id_of(wrapper)));
        assert_eq!(vec!["C", "A"], names_of(&layout, wrapper));
        assert_eq!("B", layout.tree().str_prop(children[1], props::NAME));
        assert_invariants(&layout);
    }

    #[test]
    fn parent_bottom_promotes_around_the_reference() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        layout.dock_new_view(&a, DropLocation::ParentBottom, "C");

        let area = window_area(&layout, &window_id);
        let children: Vec<NodeId> = layout.tree().children(area).collect();
        assert_eq!(2, children.len());
        let wrapper = children[0];
        assert_eq!(DockKind::Vertical, layout.dock_kind(layout.id_of(wrapper)));
        assert_eq!(vec!["A", "C"], names_of(&layout, wrapper));
        assert_eq!("B", layout.tree().str_prop(children[1], props::NAME));
        assert_invariants(&layout);
    }

    #[test]
    fn parent_right_reuses_the_matching_ancestor() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        layout.dock_new_view(&a, DropLocation::ParentRight, "C");
        let area = window_area(&layout, &window_id);
        assert_eq!(vec!["A", "C", "B"], names_of(&layout, area));
        assert_invariants(&layout);
    }

    #[test]
    fn parent_right_from_inside_a_nested_split() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        layout.dock_new_view(&a, DropLocation::ViewTop, "C");
        // Tree: area H [ V[C, A], B ]. Parent-right from A walks past the
        // vertical split to the horizontal ancestor.
        layout.dock_new_view(&a, DropLocation::ParentRight, "D");

        let area = window_area(&layout, &window_id);
        let children: Vec<NodeId> = layout.tree().children(area).collect();
        assert_eq!(3, children.len());
        assert_eq!("D", layout.tree().str_prop(children[1], props::NAME));
        assert_eq!("B", layout.tree().str_prop(children[2], props::NAME));
        assert_invariants(&layout);
    }

    #[test]
    fn tab_insert_at_index_updates_selection() {
        let mut layout = DockLayout::new();
        let (_, root_id) = layout.add_new_window("Main", Rect::default());
        let stack = layout.add_view(&root_id, "Stack", DockKind::Tabs);
        let x = layout.dock_new_view(&stack, DropLocation::Tabs, "X");
        layout.dock_new_view(&stack, DropLocation::Tabs, "Y");
        layout.set_selected(&stack, &x);

        let z = layout.dock_new_view(&stack, DropLocation::Tabs, "Z");
        let stack_node = layout.node(&stack).unwrap();
        assert_eq!(vec!["X", "Y", "Z"], names_of(&layout, stack_node));
        layout.dock_view(&z, &stack, DropLocation::Tabs, Point::default(), Some(1));
        assert_eq!(vec!["X", "Z", "Y"], names_of(&layout, stack_node));
        assert_eq!(z, layout.selected_id(&stack));
        assert_invariants(&layout);
    }

    #[test]
    fn tabs_on_a_plain_view_wraps_it_into_a_stack() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        let b = layout.dock_new_view(&a, DropLocation::Tabs, "B");

        let area = window_area(&layout, &window_id);
        let stack = layout.tree().first_child(area).unwrap();
        assert_eq!(Some(NodeKind::Container), layout.tree().kind(stack));
        assert_eq!(DockKind::Tabs, layout.dock_kind(layout.id_of(stack)));
        assert_eq!(vec!["A", "B"], names_of(&layout, stack));
        assert_eq!(b, layout.selected_id(layout.id_of(stack)));
        assert_invariants(&layout);
    }

    #[test]
    fn removal_dissolves_a_two_child_split() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        let c = layout.dock_new_view(&a, DropLocation::ViewTop, "C");
        // area H [ V[C, A], B ]; removing C leaves V with a single child,
        // which must splice A back up into the horizontal split.
        layout.remove_view(&c);

        let area = window_area(&layout, &window_id);
        assert_eq!(vec!["A", "B"], names_of(&layout, area));
        for child in layout.tree().children(area) {
            assert_eq!(Some(NodeKind::View), layout.tree().kind(child));
        }
        assert_invariants(&layout);
    }

    #[test]
    fn dissolved_split_passes_its_size_hint_down() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        let c = layout.dock_new_view(&a, DropLocation::ViewTop, "C");

        let area = window_area(&layout, &window_id);
        let wrapper = layout.tree().first_child(area).unwrap();
        let wrapper_id = layout.id_of(wrapper).to_owned();
        layout.set_width(&wrapper_id, 240.0);
        layout.remove_view(&c);

        assert_eq!(240.0, layout.width(&a));
        assert_invariants(&layout);
    }

    #[test]
    fn removing_selected_tab_falls_to_first_sibling() {
        let mut layout = DockLayout::new();
        let (_, root_id) = layout.add_new_window("Main", Rect::default());
        let stack = layout.add_view(&root_id, "Stack", DockKind::Tabs);
        let x = layout.dock_new_view(&stack, DropLocation::Tabs, "X");
        let y = layout.dock_new_view(&stack, DropLocation::Tabs, "Y");
        layout.dock_new_view(&stack, DropLocation::Tabs, "Z");
        layout.set_selected(&stack, &x);

        layout.remove_view(&x);
        assert_eq!(y, layout.selected_id(&stack));
        assert_invariants(&layout);
    }

    #[test]
    fn emptying_a_named_stack_clears_selection() {
        let mut layout = DockLayout::new();
        let (_, root_id) = layout.add_new_window("Main", Rect::default());
        layout.add_view(&root_id, "Keep", DockKind::None);
        let stack = layout.add_view(&root_id, "Stack", DockKind::Tabs);
        let x = layout.dock_new_view(&stack, DropLocation::Tabs, "X");
        layout.remove_view(&x);
        assert_eq!("", layout.selected_id(&stack));
        assert_invariants(&layout);
    }

    #[test]
    fn location_none_always_opens_a_new_window() {
        let mut layout = DockLayout::new();
        let (_, _, a) = single_view_window(&mut layout);
        let f = layout.dock_new_view(&a, DropLocation::None, "F");
        assert!(!f.is_empty());
        assert_eq!(2, layout.window_count());

        let window = layout.window_count();
        let g = layout.dock_new_view("no-such-target", DropLocation::ViewLeft, "G");
        assert!(!g.is_empty());
        assert_eq!(window + 1, layout.window_count());
        assert_invariants(&layout);
    }

    #[test]
    fn dock_view_moves_between_windows() {
        let mut layout = DockLayout::new();
        let (_w1, _, a) = single_view_window(&mut layout);
        let (w2, root2) = layout.add_new_window("Second", Rect::default());
        let b = layout.add_view(&root2, "B", DockKind::None);

        layout.dock_view(&a, &b, DropLocation::ViewBottom, Point::default(), None);
        // The first window emptied out and closed.
        assert_eq!(1, layout.window_count());
        let area = window_area(&layout, &w2);
        assert_eq!(vec!["B", "A"], names_of(&layout, area));
        assert_eq!(DockKind::Vertical, layout.dock_kind(layout.id_of(area)));
        assert_invariants(&layout);
    }

    #[test]
    fn dock_view_onto_itself_is_a_noop() {
        let mut layout = DockLayout::new();
        let (_, _, a) = single_view_window(&mut layout);
        let before = layout.to_xml();
        layout.dock_view(&a, &a, DropLocation::ViewRight, Point::default(), None);
        assert_eq!(before, layout.to_xml());
    }

    #[test]
    fn dock_view_into_own_subtree_is_a_noop() {
        let mut layout = DockLayout::new();
        let (_, _, a) = single_view_window(&mut layout);
        let nested = layout.add_view(&a, "Nested", DockKind::Tabs);
        let before = layout.to_xml();
        layout.dock_view(&a, &nested, DropLocation::Tabs, Point::default(), None);
        assert_eq!(before, layout.to_xml());
        assert_invariants(&layout);
    }

    #[test]
    fn root_right_appends_a_column() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        // Root-tier ignores how deeply the reference is nested.
        layout.dock_new_view(&a, DropLocation::RootRight, "C");
        let area = window_area(&layout, &window_id);
        assert_eq!(vec!["A", "B", "C"], names_of(&layout, area));
        assert_invariants(&layout);
    }

    #[test]
    fn root_left_prepends_a_column() {
        let mut layout = DockLayout::new();
        let (window_id, _, a) = single_view_window(&mut layout);
        let b = layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        // Root-tier drops hit the window edge no matter which view they
        // were reported against.
        layout.dock_new_view(&b, DropLocation::RootLeft, "C");
        let area = window_area(&layout, &window_id);
        assert_eq!(vec!["C", "A", "B"], names_of(&layout, area));
        assert_invariants(&layout);
    }

    #[test]
    fn root_bottom_pushes_existing_content_down() {
        let mut layout = DockLayout::new();
        let (window_id, root_id, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        assert_eq!(DockKind::Horizontal, layout.dock_kind(&root_id));

        layout.dock_new_view(&a, DropLocation::RootBottom, "C");
        let area = window_area(&layout, &window_id);
        assert_eq!(DockKind::Vertical, layout.dock_kind(&root_id));
        let children: Vec<NodeId> = layout.tree().children(area).collect();
        assert_eq!(2, children.len());
        assert_eq!(DockKind::Horizontal, layout.dock_kind(layout.id_of(children[0])));
        assert_eq!(vec!["A", "B"], names_of(&layout, children[0]));
        assert_eq!("C", layout.tree().str_prop(children[1], props::NAME));
        assert_invariants(&layout);
    }

    #[test]
    fn docking_onto_a_window_targets_its_content_area() {
        let mut layout = DockLayout::new();
        let (window_id, _, _a) = single_view_window(&mut layout);
        layout.dock_new_view(&window_id, DropLocation::ViewRight, "B");
        let area = window_area(&layout, &window_id);
        let row = layout.tree().first_child(area).unwrap();
        assert_eq!(vec!["A", "B"], names_of(&layout, row));
        assert_invariants(&layout);
    }

    #[test]
    fn open_in_new_window_extracts_the_node() {
        let mut layout = DockLayout::new();
        let (w1, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        layout.open_in_new_window(&a, Point::new(500.0, 300.0));

        assert_eq!(2, layout.window_count());
        // Old window keeps B alone; A lives in the new window.
        let old_area = window_area(&layout, &w1);
        assert_eq!(vec!["B"], names_of(&layout, old_area));
        assert_invariants(&layout);
    }

    #[test]
    fn create_in_new_window_places_one_view() {
        let mut layout = DockLayout::new();
        layout.create_in_new_window("Solo", Rect::new(0.0, 0.0, 640.0, 480.0));
        assert_eq!(1, layout.window_count());
        let window = layout.first_window().unwrap();
        let area = layout.tree().first_child(window).unwrap();
        assert_eq!(vec!["Solo"], names_of(&layout, area));
        assert_eq!(640.0, layout.bounds(layout.id_of(window)).width);
        assert_invariants(&layout);
    }
}

mod search {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn open_view_as_new_tab_docks_next_to_the_match() {
        let mut layout = DockLayout::new();
        let (window_id, root_id) = layout.add_new_window("Main", Rect::default());
        layout.add_view(&root_id, "Console:1", DockKind::None);
        layout.open_view_as_new_tab("Console:2", "Console.*", DropLocation::RootLeft);

        let area = window_area(&layout, &window_id);
        let stack = layout.tree().first_child(area).unwrap();
        assert_eq!(DockKind::Tabs, layout.dock_kind(layout.id_of(stack)));
        assert_eq!(vec!["Console:1", "Console:2"], names_of(&layout, stack));
        assert_invariants(&layout);
    }

    #[test]
    fn open_view_as_new_tab_requires_a_full_match() {
        let mut layout = DockLayout::new();
        let (window_id, root_id) = layout.add_new_window("Main", Rect::default());
        layout.add_view(&root_id, "Console:1", DockKind::None);
        // "Console" alone only matches part of the name: fall back.
        layout.open_view_as_new_tab("X", "Console", DropLocation::RootRight);

        let area = window_area(&layout, &window_id);
        let row = layout.tree().first_child(area).unwrap();
        assert_eq!(DockKind::Horizontal, layout.dock_kind(layout.id_of(row)));
        assert_eq!(vec!["Console:1", "X"], names_of(&layout, row));
        assert_invariants(&layout);
    }

    #[test]
    fn open_view_as_new_tab_without_windows_opens_one() {
        let mut layout = DockLayout::new();
        layout.open_view_as_new_tab("X", "anything", DropLocation::RootRight);
        assert_eq!(1, layout.window_count());
        assert_invariants(&layout);
    }

    #[test]
    fn invalid_regex_falls_back() {
        let mut layout = DockLayout::new();
        let (window_id, root_id) = layout.add_new_window("Main", Rect::default());
        layout.add_view(&root_id, "A", DockKind::None);
        layout.open_view_as_new_tab("X", "(", DropLocation::RootRight);
        let area = window_area(&layout, &window_id);
        let row = layout.tree().first_child(area).unwrap();
        assert_eq!(vec!["A", "X"], names_of(&layout, row));
    }
}

mod geometry {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn size_writes_clamp_to_minimum() {
        let mut layout = DockLayout::new();
        let (_, _, a) = single_view_window(&mut layout);
        layout.set_width(&a, 1.0);
        layout.set_height(&a, -20.0);
        assert_eq!(5.0, layout.width(&a));
        assert_eq!(5.0, layout.height(&a));
    }

    #[test]
    fn propagate_bounds_splits_evenly() {
        let mut layout = DockLayout::new();
        let (window_id, _) = layout.add_new_window("Main", Rect::new(0.0, 0.0, 100.0, 80.0));
        let root_id = {
            let area = window_area(&layout, &window_id);
            layout.id_of(area).to_owned()
        };
        let a = layout.add_view(&root_id, "A", DockKind::None);
        let b = layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        layout.propagate_bounds();

        assert_eq!(Rect::new(0.0, 0.0, 100.0, 80.0), layout.bounds(&root_id));
        assert_eq!(Rect::new(0.0, 0.0, 50.0, 80.0), layout.bounds(&a));
        assert_eq!(Rect::new(50.0, 0.0, 50.0, 80.0), layout.bounds(&b));
    }

    #[test]
    fn propagate_bounds_recurses_into_nested_splits() {
        let mut layout = DockLayout::new();
        let (_, root_id) = layout.add_new_window("Main", Rect::new(0.0, 0.0, 100.0, 80.0));
        let a = layout.add_view(&root_id, "A", DockKind::None);
        let b = layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        let c = layout.dock_new_view(&a, DropLocation::ViewTop, "C");
        let rects: Vec<(String, Rect)> = layout.view_rects();

        let rect_of = |id: &str| rects.iter().find(|(i, _)| i == id).map(|(_, r)| *r).unwrap();
        assert_eq!(Rect::new(0.0, 0.0, 50.0, 40.0), rect_of(&c));
        assert_eq!(Rect::new(0.0, 40.0, 50.0, 40.0), rect_of(&a));
        assert_eq!(Rect::new(50.0, 0.0, 50.0, 80.0), rect_of(&b));
    }

    #[test]
    fn tab_children_inherit_the_full_area() {
        let mut layout = DockLayout::new();
        let (_, root_id) = layout.add_new_window("Main", Rect::new(0.0, 0.0, 200.0, 100.0));
        let stack = layout.add_view(&root_id, "Stack", DockKind::Tabs);
        let x = layout.dock_new_view(&stack, DropLocation::Tabs, "X");
        let y = layout.dock_new_view(&stack, DropLocation::Tabs, "Y");
        layout.propagate_bounds();
        assert_eq!(layout.bounds(&stack), layout.bounds(&x));
        assert_eq!(layout.bounds(&stack), layout.bounds(&y));
    }
}

mod invariants {
    use super::*;

    /// A long scripted editing session; the structural invariants must hold
    /// after every step.
    #[test_log::test]
    fn survives_an_editing_storm() {
        let mut layout = DockLayout::new();
        let (_, _, a) = single_view_window(&mut layout);
        let mut live: Vec<String> = vec![a];

        let locations = [
            DropLocation::ViewRight,
            DropLocation::ViewTop,
            DropLocation::Tabs,
            DropLocation::ParentBottom,
            DropLocation::RootLeft,
            DropLocation::ViewBottom,
            DropLocation::ParentRight,
            DropLocation::RootBottom,
            DropLocation::ViewLeft,
            DropLocation::None,
            DropLocation::Tabs,
            DropLocation::ParentLeft,
            DropLocation::RootRight,
            DropLocation::ViewTop,
        ];
        for (i, location) in locations.iter().enumerate() {
            let target = live[i % live.len()].clone();
            let id = layout.dock_new_view(&target, *location, &format!("view-{i}"));
            assert!(!id.is_empty(), "step {i} failed to place");
            live.push(id);
            assert_invariants(&layout);
        }

        // Shuffle a few existing views around.
        let moves = [
            (1usize, 5usize, DropLocation::Tabs),
            (2, 8, DropLocation::ViewBottom),
            (9, 0, DropLocation::ParentRight),
            (4, 11, DropLocation::ViewLeft),
        ];
        for (from, to, location) in moves {
            let source = live[from % live.len()].clone();
            let target = live[to % live.len()].clone();
            layout.dock_view(&source, &target, location, Point::new(100.0, 100.0), None);
            assert_invariants(&layout);
        }

        // And remove half of everything.
        for id in live.iter().step_by(2) {
            layout.remove_view(id);
            assert_invariants(&layout);
        }
    }
}

mod persistence {
    use super::*;
    use pretty_assertions::assert_eq;

    fn populated_layout() -> DockLayout {
        let mut layout = DockLayout::new();
        layout.set_layout_name("Session");
        let (window_id, _, a) = single_view_window(&mut layout);
        layout.dock_new_view(&a, DropLocation::ViewRight, "B");
        layout.dock_new_view(&a, DropLocation::ViewTop, "C");
        let stack_target = layout.dock_new_view(&a, DropLocation::Tabs, "T1");
        layout.dock_new_view(&stack_target, DropLocation::Tabs, "T2");
        layout.set_window_locked(&window_id, true);
        let (_, root2) = layout.add_new_window("Second", Rect::new(50.0, 60.0, 640.0, 480.0));
        layout.add_view(&root2, "Solo", DockKind::None);
        layout
    }

    /// Structural fingerprint: parent/child edges plus kinds and names,
    /// independent of node iteration details.
    fn fingerprint(layout: &DockLayout) -> Vec<(String, String, String, String)> {
        let tree = layout.tree();
        let mut all: Vec<(String, String, String, String)> = tree
            .preorder(layout.root())
            .map(|n| {
                let parent = tree
                    .parent(n)
                    .map(|p| tree.str_prop(p, props::ID).to_owned())
                    .unwrap_or_default();
                (
                    tree.str_prop(n, props::ID).to_owned(),
                    parent,
                    tree.kind(n).unwrap().tag().to_owned(),
                    tree.str_prop(n, props::NAME).to_owned(),
                )
            })
            .collect();
        all.sort();
        all
    }

    #[test]
    fn save_open_save_is_idempotent() {
        let mut layout = populated_layout();
        let first = layout.to_xml();
        assert!(!first.is_empty());
        assert!(layout.open_layout(&first));
        let second = layout.to_xml();
        assert_eq!(first, second);
    }

    #[test]
    fn round_trip_preserves_structure() {
        let mut layout = populated_layout();
        let before = fingerprint(&layout);
        let text = layout.to_xml();
        assert!(layout.open_layout(&text));
        assert_eq!(before, fingerprint(&layout));
        assert_invariants(&layout);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.xml");
        let layout = populated_layout();
        assert!(layout.save_to_file(&path));

        let mut restored = DockLayout::new();
        assert!(restored.open_from_file(&path));
        assert_eq!(fingerprint(&layout), fingerprint(&restored));
        assert_eq!("Session", restored.layout_name());
    }

    #[test]
    fn open_failure_leaves_layout_untouched() {
        let mut layout = populated_layout();
        let before = layout.to_xml();
        assert!(!layout.open_layout("<root><bogus/></root>"));
        assert!(!layout.open_layout("not xml at all"));
        assert!(!layout.open_layout("<window/>"));
        assert!(!layout.open_layout("<root>text content</root>"));
        assert!(!layout.open_layout("<root><window width=\"wide\"/></root>"));
        assert_eq!(before, layout.to_xml());
    }

    #[test]
    fn open_missing_file_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let mut layout = DockLayout::new();
        assert!(!layout.open_from_file(&dir.path().join("absent.xml")));
    }

    #[test]
    fn template_strips_window_placement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two-up.xml");
        let layout = populated_layout();
        assert!(layout.save_as_template(&path));

        let mut restored = DockLayout::new();
        assert!(restored.open_from_file(&path));
        assert_eq!("two-up", restored.layout_name());
        for window in restored.tree().children(restored.root()).collect::<Vec<_>>() {
            assert!(!restored.tree().has_prop(window, props::X));
            assert!(!restored.tree().has_prop(window, props::WIDTH));
            assert!(!restored.tree().has_prop(window, props::MINIMIZED));
        }
        // Content and non-placement window state survive.
        let first = restored.first_window().unwrap();
        assert!(restored.tree().bool_prop(first, props::LOCKED));
        assert!(restored.show_view("T2"), "tab content survives the template");
    }

    #[test]
    fn template_does_not_change_the_live_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.xml");
        let layout = populated_layout();
        let before = layout.to_xml();
        assert!(layout.save_as_template(&path));
        assert_eq!(before, layout.to_xml());
    }

    #[test]
    fn names_with_markup_characters_round_trip() {
        let mut layout = DockLayout::new();
        let (_, root_id) = layout.add_new_window("A & B <beta>", Rect::default());
        layout.add_view(&root_id, "\"quoted\" 'view'", DockKind::None);
        let text = layout.to_xml();
        let mut restored = DockLayout::new();
        assert!(restored.open_layout(&text));
        let window = restored.first_window().unwrap();
        assert_eq!("A & B <beta>", restored.tree().str_prop(window, props::NAME));
        assert_eq!(fingerprint(&layout), fingerprint(&restored));
    }
}
