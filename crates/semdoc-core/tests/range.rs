use semdoc_core::{Document, ElementNode, Node, Range, node_at};

fn nested_doc() -> Document {
    Document::new(ElementNode::with_children(
        "div",
        vec![
            Node::element("div", vec![Node::text("abcd")]),
            Node::element(
                "div",
                vec![
                    Node::text("efgh"),
                    Node::element("div", vec![Node::text("ijkl")]),
                ],
            ),
        ],
    ))
}

#[test]
fn confined_ranges_share_a_parent_and_cover_the_range() {
    let doc = nested_doc();
    let range = Range::from_paths(&doc, vec![0, 0, 2], vec![1, 1, 0, 2]).unwrap();
    let confined = range.minimum_confined_ranges(&doc).unwrap();

    for sub in &confined {
        assert_eq!(
            &sub.start_path()[..sub.start_path().len() - 1],
            &sub.end_path()[..sub.end_path().len() - 1],
            "confined range must stay inside one parent"
        );
    }

    let pairs: Vec<(Vec<usize>, Vec<usize>)> = confined
        .iter()
        .map(|r| (r.start_path().clone(), r.end_path().clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (vec![0, 0, 2], vec![0, 0, 4]),
            (vec![1, 0], vec![1, 1]),
            (vec![1, 1, 0, 0], vec![1, 1, 0, 2]),
        ]
    );
}

#[test]
fn range_confined_to_one_parent_is_its_own_decomposition() {
    let doc = Document::new(ElementNode::with_children(
        "div",
        vec![Node::element(
            "ul",
            vec![Node::element("li", vec![Node::text("x")])],
        )],
    ));
    // Exactly around the only list item: must not expand to the list.
    let range = Range::from_paths(&doc, vec![0, 0], vec![0, 1]).unwrap();
    let confined = range.minimum_confined_ranges(&doc).unwrap();
    assert_eq!(confined.len(), 1);
    assert_eq!(confined[0].start_path(), &vec![0, 0]);
    assert_eq!(confined[0].end_path(), &vec![0, 1]);
}

#[test]
fn boundary_positions_walk_outward_across_parents() {
    let doc = Document::new(ElementNode::with_children(
        "div",
        vec![
            Node::element("div", vec![Node::text("ab")]),
            Node::text("c"),
        ],
    ));
    // Starts at the very start inside the first div, ends past it: the
    // fully covered div is taken whole instead of being emptied.
    let range = Range::from_paths(&doc, vec![0, 0, 0], vec![1]).unwrap();
    let confined = range.minimum_confined_ranges(&doc).unwrap();
    assert_eq!(confined.len(), 1);
    assert_eq!(confined[0].start_path(), &vec![0]);
    assert_eq!(confined[0].end_path(), &vec![1]);
}

#[test]
fn collapsed_range_yields_single_collapsed_decomposition() {
    let doc = nested_doc();
    let range = Range::from_paths(&doc, vec![1, 0, 2], vec![1, 0, 2]).unwrap();
    let confined = range.minimum_confined_ranges(&doc).unwrap();
    assert_eq!(confined.len(), 1);
    assert!(confined[0].is_collapsed());
}

#[test]
fn range_orders_its_endpoints() {
    let doc = nested_doc();
    let range = Range::from_paths(&doc, vec![1, 0], vec![0, 1]).unwrap();
    assert_eq!(range.start_path(), &vec![0, 1]);
    assert_eq!(range.end_path(), &vec![1, 0]);
}

#[test]
fn inside_node_spans_the_full_interior() {
    let doc = nested_doc();
    let range = Range::inside_node(&doc, &[1, 1]).unwrap();
    assert_eq!(range.start_path(), &vec![1, 1, 0]);
    assert_eq!(range.end_path(), &vec![1, 1, 1]);
}

#[test]
fn around_node_covers_exactly_the_node() {
    let doc = nested_doc();
    let range = Range::around_node(&doc, &[1, 1]).unwrap();
    assert_eq!(range.start_path(), &vec![1, 1]);
    assert_eq!(range.end_path(), &vec![1, 2]);
    let node = node_at(doc.root(), range.start_path()).unwrap();
    assert!(matches!(node, Node::Element(el) if el.kind == "div"));
}
