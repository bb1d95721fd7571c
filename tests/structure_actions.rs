//! Family-specific slot operations: grid lines and box slots

use pretty_assertions::assert_eq;
use ui_composer::{
    AdaptorError, ComposerError, ElementId, Project, PropertyValue, RecordedCommand, RecordingSink,
};

fn project() -> Project {
    Project::with_standard_catalog().expect("Should build the standard registry")
}

fn attach(project: &Project, grid: ElementId, child: ElementId) -> (i32, i32, i32, i32) {
    let read = |name: &str| {
        project
            .packing_property(grid, child, name)
            .expect("Should read")
            .as_int()
            .expect("attach values are Int")
    };
    (
        read("left-attach"),
        read("top-attach"),
        read("width"),
        read("height"),
    )
}

fn grid_2x2(project: &mut Project) -> (ElementId, ElementId, ElementId) {
    let grid = project.create_element("grid", None).expect("Should create");
    project
        .set_property(grid, "n-rows", PropertyValue::Int(2))
        .expect("Should set rows");
    project
        .set_property(grid, "n-columns", PropertyValue::Int(2))
        .expect("Should set columns");

    let a = project.create_element("button", None).expect("Should create");
    project.add_child(grid, a, true).expect("Should add");
    let b = project.create_element("button", None).expect("Should create");
    project.add_child(grid, b, true).expect("Should add");
    project
        .set_packing_property(grid, b, "left-attach", PropertyValue::Int(1))
        .expect("Should place");
    project
        .set_packing_property(grid, b, "top-attach", PropertyValue::Int(1))
        .expect("Should place");
    (grid, a, b)
}

#[test]
fn test_insert_row_shifts_attachments() {
    let mut project = project();
    let (grid, a, b) = grid_2x2(&mut project);

    project
        .child_action(grid, 1, "insert-row", None)
        .expect("Should insert");

    assert_eq!(
        project.property(grid, "n-rows").expect("Should read"),
        PropertyValue::Int(3)
    );
    assert_eq!(attach(&project, grid, a), (0, 0, 1, 1));
    assert_eq!(attach(&project, grid, b), (1, 2, 1, 1));

    // Six cells, two covered.
    let live = project.live().live_of(grid).expect("live grid");
    assert_eq!(project.live().children(live).len(), 6);
    assert_eq!(project.live().placeholder_count(live), 4);
}

#[test]
fn test_remove_row_deletes_contained_children() {
    let mut project = project();
    let (grid, a, b) = grid_2x2(&mut project);

    project
        .child_action(grid, 0, "remove-row", None)
        .expect("Should remove");

    assert_eq!(
        project.property(grid, "n-rows").expect("Should read"),
        PropertyValue::Int(1)
    );
    assert!(!project.model().contains(a));
    assert_eq!(attach(&project, grid, b), (1, 0, 1, 1));
}

#[test]
fn test_remove_row_shrinks_spanning_children() {
    let mut project = project();
    let grid = project.create_element("grid", None).expect("Should create");
    project
        .set_property(grid, "n-rows", PropertyValue::Int(3))
        .expect("Should set rows");
    let tall = project.create_element("button", None).expect("Should create");
    project.add_child(grid, tall, true).expect("Should add");
    project
        .set_packing_property(grid, tall, "height", PropertyValue::Int(3))
        .expect("Should span");

    project
        .child_action(grid, 1, "remove-row", None)
        .expect("Should remove");

    assert!(project.model().contains(tall));
    assert_eq!(attach(&project, grid, tall), (0, 0, 1, 2));
    assert_eq!(
        project.property(grid, "n-rows").expect("Should read"),
        PropertyValue::Int(2)
    );
}

#[test]
fn test_insert_column_before_first() {
    let mut project = project();
    let (grid, a, b) = grid_2x2(&mut project);

    project
        .child_action(grid, 0, "insert-column", None)
        .expect("Should insert");

    assert_eq!(
        project.property(grid, "n-columns").expect("Should read"),
        PropertyValue::Int(3)
    );
    assert_eq!(attach(&project, grid, a), (1, 0, 1, 1));
    assert_eq!(attach(&project, grid, b), (2, 1, 1, 1));
}

#[test]
fn test_remove_last_line_is_refused() {
    let mut project = project();
    let grid = project.create_element("grid", None).expect("Should create");
    let err = project
        .child_action(grid, 0, "remove-row", None)
        .expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::InvalidPropertyValue { .. })
    ));
}

#[test]
fn test_actions_group_on_the_sink() {
    let mut project = project();
    let (grid, _, _) = grid_2x2(&mut project);

    let mut sink = RecordingSink::new();
    project
        .child_action(grid, 1, "insert-row", Some(&mut sink))
        .expect("Should insert");

    assert_eq!(sink.commands.len(), 2);
    assert!(matches!(sink.commands[0], RecordedCommand::BeginGroup(_)));
    assert!(matches!(sink.commands[1], RecordedCommand::EndGroup));
}

#[test]
fn test_box_insert_and_remove_slot() {
    let mut project = project();
    let boxed = project.create_element("box", None).expect("Should create");
    let a = project.create_element("button", None).expect("Should create");
    project.add_child(boxed, a, true).expect("Should add");

    project
        .child_action(boxed, 0, "insert-slot", None)
        .expect("Should insert");
    assert_eq!(
        project.property(boxed, "size").expect("Should read"),
        PropertyValue::Int(2)
    );
    assert_eq!(
        project
            .packing_property(boxed, a, "position")
            .expect("Should read"),
        PropertyValue::Int(1)
    );

    // A slot holding a real child cannot be removed this way.
    let err = project
        .child_action(boxed, 1, "remove-slot", None)
        .expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::SlotConflict { .. })
    ));

    project
        .child_action(boxed, 0, "remove-slot", None)
        .expect("Should remove");
    assert_eq!(
        project.property(boxed, "size").expect("Should read"),
        PropertyValue::Int(1)
    );
    assert_eq!(
        project
            .packing_property(boxed, a, "position")
            .expect("Should read"),
        PropertyValue::Int(0)
    );
}

#[test]
fn test_unknown_action_is_refused() {
    let mut project = project();
    let boxed = project.create_element("box", None).expect("Should create");
    let err = project
        .child_action(boxed, 0, "rotate", None)
        .expect_err("Should refuse");
    assert!(matches!(
        err,
        ComposerError::Adaptor(AdaptorError::UnknownChildAction { .. })
    ));
}

#[test]
fn test_notebook_page_shrink_removes_tabs() {
    let mut project = project();
    let notebook = project.create_element("notebook", None).expect("Should create");
    project
        .set_property(notebook, "pages", PropertyValue::Int(2))
        .expect("Should set pages");

    let page = project.create_element("button", None).expect("Should create");
    project.add_child(notebook, page, true).expect("Should add");
    let tab = project.create_element("label", None).expect("Should create");
    project.set_child_type(tab, Some("tab")).expect("Should mark");
    project.add_child(notebook, tab, true).expect("Should add");
    project
        .set_packing_property(notebook, tab, "position", PropertyValue::Int(1))
        .expect("Should label page 1");

    project
        .set_property(notebook, "pages", PropertyValue::Int(1))
        .expect("Should shrink");

    // Page 0 and its child survive; the tab labelling page 1 is deleted.
    assert!(project.model().contains(page));
    assert!(!project.model().contains(tab));
    let live = project.live().live_of(notebook).expect("live notebook");
    assert_eq!(project.live().children(live).len(), 1);
    assert!(project.live().special_children(live).is_empty());
}
