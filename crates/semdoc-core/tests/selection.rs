use semdoc_core::{
    Document, ElementNode, Mark, Node, Range, Selection, state_with_document,
};

fn doc() -> Document {
    Document::new(ElementNode::with_children(
        "div",
        vec![
            Node::element("div", vec![Node::text("abc")]),
            Node::text("de"),
        ],
    ))
}

#[test]
fn well_behavedness_requires_a_range() {
    let mut selection = Selection::new();
    assert!(!selection.is_well_behaved());
    assert!(selection.last_range().is_none());

    let doc = doc();
    selection.add_range(Range::from_paths(&doc, vec![1, 0], vec![1, 2]).unwrap());
    assert!(selection.is_well_behaved());
    assert!(!selection.is_collapsed());
    assert_eq!(selection.last_range().unwrap().end_path(), &vec![1, 2]);

    selection.clear_ranges();
    assert!(!selection.is_well_behaved());
}

#[test]
fn collapse_in_targets_a_node_interior() {
    let doc = doc();
    let selection = Selection::collapse_in(&doc, &[0, 0], 2).unwrap();
    assert!(selection.is_collapsed());
    assert_eq!(selection.ranges[0].start_path(), &vec![0, 0, 2]);
}

#[test]
fn same_as_ignores_sticky_marks() {
    let doc = doc();
    let range = Range::from_paths(&doc, vec![1, 0], vec![1, 1]).unwrap();
    let a = Selection::from_range(range.clone());
    let mut b = Selection::from_range(range);
    b.active_marks.insert(Mark::named("bold"));
    assert!(a.same_as(&b));

    b.is_right_to_left = true;
    assert!(!a.same_as(&b));
}

#[test]
fn rebase_clamps_ranges_onto_the_new_tree() {
    // Selection built against a bigger document, rebased onto a smaller
    // one: paths clamp to what exists.
    let big = Document::new(ElementNode::with_children(
        "div",
        vec![Node::text("abcdef"), Node::text("gh")],
    ));
    let selection = Selection::from_range(
        Range::from_paths(&big, vec![1, 2], vec![1, 2]).unwrap(),
    );

    let small = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::text("x")],
    ));
    let rebased = selection.rebase(&small.document);
    assert_eq!(rebased.ranges[0].start_path(), &vec![0, 1]);
    assert_eq!(rebased.ranges[0].revision(), small.document.revision());
}
