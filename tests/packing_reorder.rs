//! Ordering semantics of position-driven families and operation atomicity

use pretty_assertions::assert_eq;
use ui_composer::{AdaptorError, ComposerError, ElementId, Project, PropertyValue};

fn project() -> Project {
    Project::with_standard_catalog().expect("Should build the standard registry")
}

fn positions(project: &Project, container: ElementId) -> Vec<(ElementId, i32)> {
    project
        .children(container)
        .expect("Should list children")
        .into_iter()
        .map(|child| {
            let position = project
                .packing_property(container, child, "position")
                .expect("Should read position")
                .as_int()
                .expect("position should be an Int");
            (child, position)
        })
        .collect()
}

fn box_with_children(project: &mut Project, count: usize) -> (ElementId, Vec<ElementId>) {
    let boxed = project.create_element("box", None).expect("Should create");
    let mut children = Vec::new();
    for _ in 0..count {
        let child = project.create_element("button", None).expect("Should create");
        project.add_child(boxed, child, true).expect("Should add");
        children.push(child);
    }
    (boxed, children)
}

#[test]
fn test_positions_are_contiguous_after_adds() {
    let mut project = project();
    let (boxed, children) = box_with_children(&mut project, 3);
    assert_eq!(
        positions(&project, boxed),
        vec![(children[0], 0), (children[1], 1), (children[2], 2)]
    );
}

#[test]
fn test_position_move_displaces_a_sibling_chain() {
    let mut project = project();
    let (boxed, children) = box_with_children(&mut project, 3);
    let (a, b, c) = (children[0], children[1], children[2]);

    // Moving the first child to the last slot shifts the others down by one.
    project
        .set_packing_property(boxed, a, "position", PropertyValue::Int(2))
        .expect("Should move");
    assert_eq!(positions(&project, boxed), vec![(b, 0), (c, 1), (a, 2)]);

    // And back again.
    project
        .set_packing_property(boxed, a, "position", PropertyValue::Int(0))
        .expect("Should move");
    assert_eq!(positions(&project, boxed), vec![(a, 0), (b, 1), (c, 2)]);
}

#[test]
fn test_position_out_of_range_is_refused_without_mutation() {
    let mut project = project();
    let (boxed, children) = box_with_children(&mut project, 3);
    let before = positions(&project, boxed);

    for bad in [PropertyValue::Int(-1), PropertyValue::Int(3)] {
        let err = project
            .set_packing_property(boxed, children[0], "position", bad)
            .expect_err("Should refuse");
        assert!(matches!(
            err,
            ComposerError::Adaptor(AdaptorError::InvalidPackingValue { .. })
        ));
    }
    assert_eq!(positions(&project, boxed), before);
}

#[test]
fn test_wrong_kind_is_refused() {
    let mut project = project();
    let (boxed, children) = box_with_children(&mut project, 1);
    let err = project
        .set_packing_property(
            boxed,
            children[0],
            "position",
            PropertyValue::Text("first".to_string()),
        )
        .expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::InvalidPackingValue { .. })
    ));
}

#[test]
fn test_unknown_packing_property_is_refused() {
    let mut project = project();
    let (boxed, children) = box_with_children(&mut project, 1);
    let err = project
        .packing_property(boxed, children[0], "weight")
        .expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::UnknownPackingProperty { .. })
    ));
}

#[test]
fn test_paned_swap_displaces_the_sibling() {
    let mut project = project();
    let paned = project.create_element("paned", None).expect("Should create");
    let a = project.create_element("button", None).expect("Should create");
    let b = project.create_element("button", None).expect("Should create");
    project.add_child(paned, a, true).expect("Should add");
    project.add_child(paned, b, true).expect("Should add");

    project
        .set_packing_property(paned, a, "pane", PropertyValue::Token("end".to_string()))
        .expect("Should swap");
    assert_eq!(
        project.packing_property(paned, a, "pane").expect("Should read"),
        PropertyValue::Token("end".to_string())
    );
    assert_eq!(
        project.packing_property(paned, b, "pane").expect("Should read"),
        PropertyValue::Token("start".to_string())
    );
    assert_eq!(project.children(paned).expect("Should list"), vec![b, a]);
}

#[test]
fn test_paned_move_into_placeheld_slot() {
    let mut project = project();
    let paned = project.create_element("paned", None).expect("Should create");
    let a = project.create_element("button", None).expect("Should create");
    project.add_child(paned, a, true).expect("Should add");

    project
        .set_packing_property(paned, a, "pane", PropertyValue::Token("end".to_string()))
        .expect("Should move");

    let live = project.live().live_of(paned).expect("live paned");
    let slots = project.live().children(live);
    assert_eq!(slots.len(), 2);
    assert!(project.live().node(slots[0]).is_placeholder());
    assert_eq!(project.live().element_of(slots[1]), Some(a));
}

#[test]
fn test_paned_rejects_unknown_token() {
    let mut project = project();
    let paned = project.create_element("paned", None).expect("Should create");
    let a = project.create_element("button", None).expect("Should create");
    project.add_child(paned, a, true).expect("Should add");

    let err = project
        .set_packing_property(paned, a, "pane", PropertyValue::Token("middle".to_string()))
        .expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::InvalidPackingValue { .. })
    ));
}

#[test]
fn test_grid_overlap_is_a_slot_conflict_and_rolls_back() {
    let mut project = project();
    let grid = project.create_element("grid", None).expect("Should create");
    project
        .set_property(grid, "n-columns", PropertyValue::Int(2))
        .expect("Should set columns");

    let a = project.create_element("button", None).expect("Should create");
    let b = project.create_element("button", None).expect("Should create");
    project.add_child(grid, a, true).expect("Should add");
    project.add_child(grid, b, true).expect("Should add");
    assert_eq!(
        project
            .packing_property(grid, b, "left-attach")
            .expect("Should read"),
        PropertyValue::Int(1)
    );

    let err = project
        .set_packing_property(grid, b, "left-attach", PropertyValue::Int(0))
        .expect_err("Should conflict");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::SlotConflict { .. })
    ));

    // The refused operation left no trace.
    assert_eq!(
        project
            .packing_property(grid, b, "left-attach")
            .expect("Should read"),
        PropertyValue::Int(1)
    );
}

#[test]
fn test_grid_attach_verification_respects_bounds() {
    let mut project = project();
    let grid = project.create_element("grid", None).expect("Should create");
    project
        .set_property(grid, "n-columns", PropertyValue::Int(2))
        .expect("Should set columns");
    let a = project.create_element("button", None).expect("Should create");
    project.add_child(grid, a, true).expect("Should add");

    let err = project
        .set_packing_property(grid, a, "width", PropertyValue::Int(3))
        .expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::InvalidPackingValue { .. })
    ));
}

#[test]
fn test_menu_bar_accepts_only_items() {
    let mut project = project();
    let bar = project.create_element("menu-bar", None).expect("Should create");
    let item = project.create_element("menu-item", None).expect("Should create");
    project.add_child(bar, item, true).expect("Should add");

    let button = project.create_element("button", None).expect("Should create");
    let err = project.add_child(bar, button, true).expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::IncompatibleChild { .. })
    ));

    // Item shells have no placeholders; capacity is what they hold.
    let live = project.live().live_of(bar).expect("live bar");
    assert_eq!(project.live().children(live).len(), 1);
    assert_eq!(project.live().placeholder_count(live), 0);
}

#[test]
fn test_item_host_reorder_keeps_positions_contiguous() {
    let mut project = project();
    let bar = project.create_element("menu-bar", None).expect("Should create");
    let mut items = Vec::new();
    for _ in 0..3 {
        let item = project.create_element("menu-item", None).expect("Should create");
        project.add_child(bar, item, true).expect("Should add");
        items.push(item);
    }

    project
        .set_packing_property(bar, items[2], "position", PropertyValue::Int(0))
        .expect("Should move");
    assert_eq!(
        positions(&project, bar),
        vec![(items[2], 0), (items[0], 1), (items[1], 2)]
    );
}
