//! Slot occupancy under add/remove/replace and capacity changes

use pretty_assertions::assert_eq;
use ui_composer::{AdaptorError, ComposerError, ElementId, Project, PropertyValue};

fn project() -> Project {
    Project::with_standard_catalog().expect("Should build the standard registry")
}

/// Occupied slots (real children plus placeholders) of a container
fn occupancy(project: &Project, container: ElementId) -> (usize, usize) {
    let live = project
        .live()
        .live_of(container)
        .expect("container should have a live instance");
    let slots = project.live().children(live).len();
    let placeholders = project.live().placeholder_count(live);
    (slots, placeholders)
}

#[test]
fn test_fresh_container_is_placeheld() {
    let mut project = project();
    let window = project.create_element("window", None).expect("Should create");
    assert_eq!(occupancy(&project, window), (1, 1));
}

#[test]
fn test_box_capacity_grow_adds_placeholders() {
    let mut project = project();
    let boxed = project.create_element("box", None).expect("Should create");
    project
        .set_property(boxed, "size", PropertyValue::Int(4))
        .expect("Should grow");
    assert_eq!(occupancy(&project, boxed), (4, 4));
    assert_eq!(
        project.property(boxed, "size").expect("Should read"),
        PropertyValue::Int(4)
    );
}

#[test]
fn test_add_child_targets_first_placeheld_slot() {
    // Capacity 2, both slots placeheld; the added child lands in slot 0 and
    // slot 1 keeps its placeholder.
    let mut project = project();
    let boxed = project.create_element("box", None).expect("Should create");
    project
        .set_property(boxed, "size", PropertyValue::Int(2))
        .expect("Should grow");

    let button = project.create_element("button", None).expect("Should create");
    project.add_child(boxed, button, true).expect("Should add");

    let live = project.live().live_of(boxed).expect("live box");
    let slots = project.live().children(live);
    assert_eq!(slots.len(), 2);
    assert_eq!(project.live().element_of(slots[0]), Some(button));
    assert!(project.live().node(slots[1]).is_placeholder());
    assert_eq!(
        project
            .packing_property(boxed, button, "position")
            .expect("Should read"),
        PropertyValue::Int(0)
    );
}

#[test]
fn test_remove_child_placeholds_the_vacated_slot() {
    let mut project = project();
    let boxed = project.create_element("box", None).expect("Should create");
    let a = project.create_element("button", None).expect("Should create");
    let b = project.create_element("button", None).expect("Should create");
    project.add_child(boxed, a, true).expect("Should add");
    project.add_child(boxed, b, true).expect("Should add");
    assert_eq!(occupancy(&project, boxed), (2, 0));

    project.remove_child(boxed, a).expect("Should remove");
    assert_eq!(occupancy(&project, boxed), (2, 1));

    // The detached child keeps its subtree but loses its packing state.
    assert!(project.model().contains(a));
    assert!(project.model().node(a).packing.is_empty());
    assert_eq!(project.model().node(a).parent(), None);
}

#[test]
fn test_capacity_shrink_cascades_delete() {
    // Three real children at positions 0, 1, 2; shrinking to 1 deletes the
    // children in the removed slots.
    let mut project = project();
    let boxed = project.create_element("box", None).expect("Should create");
    let a = project.create_element("button", None).expect("Should create");
    let b = project.create_element("button", None).expect("Should create");
    let c = project.create_element("button", None).expect("Should create");
    for child in [a, b, c] {
        project.add_child(boxed, child, true).expect("Should add");
    }

    project
        .set_property(boxed, "size", PropertyValue::Int(1))
        .expect("Should shrink");

    assert_eq!(occupancy(&project, boxed), (1, 0));
    assert!(project.model().contains(a));
    assert!(!project.model().contains(b));
    assert!(!project.model().contains(c));
    assert_eq!(
        project
            .packing_property(boxed, a, "position")
            .expect("Should read"),
        PropertyValue::Int(0)
    );
}

#[test]
fn test_grid_keeps_every_cell_occupied() {
    let mut project = project();
    let grid = project.create_element("grid", None).expect("Should create");
    project
        .set_property(grid, "n-rows", PropertyValue::Int(2))
        .expect("Should set rows");
    project
        .set_property(grid, "n-columns", PropertyValue::Int(3))
        .expect("Should set columns");
    assert_eq!(occupancy(&project, grid), (6, 6));

    let a = project.create_element("button", None).expect("Should create");
    project.add_child(grid, a, true).expect("Should add");
    assert_eq!(occupancy(&project, grid), (6, 5));

    // Spanning two cells consumes one more placeholder.
    project
        .set_packing_property(grid, a, "width", PropertyValue::Int(2))
        .expect("Should span");
    assert_eq!(occupancy(&project, grid), (5, 4));

    project.remove_child(grid, a).expect("Should remove");
    assert_eq!(occupancy(&project, grid), (6, 6));
}

#[test]
fn test_grid_shrink_deletes_out_of_bounds_children() {
    let mut project = project();
    let grid = project.create_element("grid", None).expect("Should create");
    project
        .set_property(grid, "n-rows", PropertyValue::Int(2))
        .expect("Should set rows");
    let a = project.create_element("button", None).expect("Should create");
    let b = project.create_element("button", None).expect("Should create");
    project.add_child(grid, a, true).expect("Should add");
    project.add_child(grid, b, true).expect("Should add");
    assert_eq!(
        project
            .packing_property(grid, b, "top-attach")
            .expect("Should read"),
        PropertyValue::Int(1)
    );

    project
        .set_property(grid, "n-rows", PropertyValue::Int(1))
        .expect("Should shrink");
    assert!(project.model().contains(a));
    assert!(!project.model().contains(b));
    assert_eq!(occupancy(&project, grid), (1, 0));
}

#[test]
fn test_paned_holds_exactly_two_slots() {
    let mut project = project();
    let paned = project.create_element("paned", None).expect("Should create");
    assert_eq!(occupancy(&project, paned), (2, 2));

    let a = project.create_element("button", None).expect("Should create");
    let b = project.create_element("button", None).expect("Should create");
    project.add_child(paned, a, true).expect("Should add");
    project.add_child(paned, b, true).expect("Should add");
    assert_eq!(occupancy(&project, paned), (2, 0));
    assert_eq!(
        project
            .packing_property(paned, a, "pane")
            .expect("Should read"),
        PropertyValue::Token("start".to_string())
    );
    assert_eq!(
        project
            .packing_property(paned, b, "pane")
            .expect("Should read"),
        PropertyValue::Token("end".to_string())
    );

    let c = project.create_element("button", None).expect("Should create");
    let err = project.add_child(paned, c, true).expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::IncompatibleChild { .. })
    ));

    project.remove_child(paned, a).expect("Should remove");
    assert_eq!(occupancy(&project, paned), (2, 1));
}

#[test]
fn test_window_with_consumed_slot_refuses_more() {
    let mut project = project();
    let window = project.create_element("window", None).expect("Should create");
    let boxed = project.create_element("box", None).expect("Should create");
    project.add_child(window, boxed, true).expect("Should add");

    let extra = project.create_element("label", None).expect("Should create");
    let err = project
        .add_child(window, extra, true)
        .expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::IncompatibleChild { .. })
    ));
    assert_eq!(occupancy(&project, window), (1, 0));
}

#[test]
fn test_toplevel_cannot_nest() {
    let mut project = project();
    let outer = project.create_element("window", None).expect("Should create");
    let inner = project.create_element("window", None).expect("Should create");
    let err = project
        .add_child(outer, inner, true)
        .expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::IncompatibleChild { .. })
    ));
}
