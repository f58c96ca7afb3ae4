use std::sync::Arc;

use semdoc_core::{
    Bias, ElementNode, MarkSet, Node, Position, Range, RangeMapper, Transaction, node_at,
    state_with_document,
};

#[test]
fn empty_mapper_is_identity() {
    let mapper = RangeMapper::new();
    assert!(mapper.is_identity());
    assert_eq!(mapper.map_path(&vec![1, 2, 3], Bias::Left), vec![1, 2, 3]);
    assert_eq!(mapper.map_path(&vec![0], Bias::Right), vec![0]);
}

#[test]
fn zero_step_transaction_maps_positions_to_themselves() {
    let state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::text("abcd")],
    ));
    let pos = Position::from_path(&state.document, vec![0, 2]).unwrap();
    let mut tx = Transaction::new(Arc::new(state));
    let mapped = tx.map_position(&pos, Bias::Right).unwrap();
    assert_eq!(mapped, pos);
}

#[test]
fn positions_after_an_insertion_keep_their_content() {
    let state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::text("abcd"), Node::text("wxyz")],
    ));
    let doc0 = state.document.clone();
    let mut tx = Transaction::new(Arc::new(state));

    let insert_at = Range::from_paths(&doc0, vec![0, 2], vec![0, 2]).unwrap();
    tx.insert_text(insert_at, "XX", MarkSet::default()).unwrap();

    // The sibling after the edited text is untouched.
    let before_sibling = Position::from_path(&doc0, vec![1]).unwrap();
    let mapped = tx.map_position(&before_sibling, Bias::Right).unwrap();
    assert_eq!(mapped.path(), &vec![1]);
    let doc = tx.current_document().unwrap();
    let Some(Node::Text(t)) = node_at(doc.root(), mapped.path()) else {
        panic!("expected text node after mapping");
    };
    assert_eq!(t.text, "wxyz");

    // An offset after the insertion point shifts by the inserted length.
    let after_insert = Position::from_path(&doc0, vec![0, 3]).unwrap();
    let mapped = tx.map_position(&after_insert, Bias::Right).unwrap();
    assert_eq!(mapped.path(), &vec![0, 5]);
}

#[test]
fn bias_resolves_the_insertion_boundary() {
    let state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::text("abcd")],
    ));
    let doc0 = state.document.clone();
    let mut tx = Transaction::new(Arc::new(state));

    let insert_at = Range::from_paths(&doc0, vec![0, 2], vec![0, 2]).unwrap();
    tx.insert_text(insert_at, "XX", MarkSet::default()).unwrap();

    let at_boundary = Position::from_path(&doc0, vec![0, 2]).unwrap();
    let left = tx.map_position(&at_boundary, Bias::Left).unwrap();
    let right = tx.map_position(&at_boundary, Bias::Right).unwrap();
    assert_eq!(left.path(), &vec![0, 2]);
    assert_eq!(right.path(), &vec![0, 4]);
}

#[test]
fn removal_collapses_interior_positions_per_bias() {
    let state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::text("abcdef")],
    ));
    let doc0 = state.document.clone();
    let mut tx = Transaction::new(Arc::new(state));

    let doomed = Range::from_paths(&doc0, vec![0, 1], vec![0, 5]).unwrap();
    tx.delete(doomed).unwrap();
    let doc = tx.current_document().unwrap();
    assert_eq!(
        doc.root().children,
        vec![Node::text("a"), Node::text("f")]
    );

    // A position strictly inside the removed span collapses to the seam.
    let interior = Position::from_path(&doc0, vec![0, 3]).unwrap();
    let mapped = tx.map_position(&interior, Bias::Left).unwrap();
    assert_eq!(mapped.path(), &vec![1]);

    // The old end-of-text position lands at the end of the tail text.
    let tail = Position::from_path(&doc0, vec![0, 6]).unwrap();
    let mapped_tail = tx.map_position(&tail, Bias::Right).unwrap();
    assert_eq!(mapped_tail.path(), &vec![1, 1]);
}
