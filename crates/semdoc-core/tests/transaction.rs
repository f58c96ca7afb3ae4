use pretty_assertions::assert_eq;
use semdoc_core::{
    Bias, Editor, EditorError, ElementNode, MarkSet, Node, NodeHandle, Position, Range,
    node_at, state_with_document,
};

fn two_paragraph_state() -> semdoc_core::State {
    state_with_document(ElementNode::with_children(
        "div",
        vec![
            Node::element("div", vec![Node::text("abcd")]),
            Node::element("div", vec![Node::text("wxyz")]),
        ],
    ))
}

#[test]
fn apply_is_incremental_and_repeatable() {
    let state = state_with_document(ElementNode::with_children("div", vec![Node::text("ab")]));
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let r1 = Range::from_paths(&doc0, vec![0, 2], vec![0, 2]).unwrap();
    tx.insert_text(r1, "c", MarkSet::default()).unwrap();
    assert_eq!(tx.size(), 1);
    let after_first = tx.current_document().unwrap().clone();

    // Re-applying without new steps changes nothing.
    assert_eq!(tx.current_document().unwrap(), &after_first);

    let r2 = Range::collapsed(Position::from_path(&after_first, vec![0, 3]).unwrap());
    tx.insert_text(r2, "d", MarkSet::default()).unwrap();
    assert_eq!(tx.size(), 2);
    assert_eq!(
        tx.current_document().unwrap().root().children,
        vec![Node::text("abcd")]
    );

    editor.dispatch(tx).unwrap();
    assert_eq!(
        editor.state().document.root().children,
        vec![Node::text("abcd")]
    );
}

#[test]
fn rollback_discards_steps_and_leaves_the_base_state() {
    let state = state_with_document(ElementNode::with_children("div", vec![Node::text("ab")]));
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);

    let mut tx = editor.begin_transaction();
    let range = Range::from_paths(&doc0, vec![0, 0], vec![0, 2]).unwrap();
    tx.delete(range).unwrap();
    assert_eq!(tx.size(), 1);

    tx.rollback();
    assert_eq!(tx.size(), 0);
    editor.dispatch(tx).unwrap();
    assert_eq!(
        editor.state().document.root().children,
        vec![Node::text("ab")]
    );
}

#[test]
fn node_handles_resolve_in_the_working_copy_after_edits() {
    let state = two_paragraph_state();
    let doc0 = state.document.clone();
    let editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let handle = NodeHandle::new(&doc0, vec![1]).unwrap();
    let pos = Position::from_path(&doc0, vec![0]).unwrap();
    tx.insert_at_position(pos, vec![Node::element("p", vec![])])
        .unwrap();

    let mapped = tx.in_working_copy(&handle).unwrap();
    assert_eq!(mapped.path, vec![2]);
    let doc = tx.current_document().unwrap();
    assert_eq!(
        node_at(doc.root(), &mapped.path),
        Some(&Node::element("div", vec![Node::text("wxyz")]))
    );
}

#[test]
fn node_handle_from_an_unrelated_tree_is_rejected() {
    let state = two_paragraph_state();
    let editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let unrelated = state_with_document(ElementNode::new("div"));
    // Force a different revision by editing the unrelated document first.
    let mut other_editor = Editor::with_state(unrelated);
    let mut other_tx = other_editor.begin_transaction();
    other_tx
        .insert_at_position(
            Position::from_path(&other_editor.state().document, vec![0]).unwrap(),
            vec![Node::text("x")],
        )
        .unwrap();
    other_editor.dispatch(other_tx).unwrap();

    let foreign = NodeHandle::new(&other_editor.state().document, vec![0]).unwrap();
    let err = tx.in_working_copy(&foreign).unwrap_err();
    assert!(matches!(err, EditorError::Model(_)));
}

#[test]
fn move_to_position_relocates_content() {
    let state = two_paragraph_state();
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let range = Range::from_paths(&doc0, vec![0, 0, 1], vec![0, 0, 3]).unwrap();
    let target = Position::from_path(&doc0, vec![1, 1, 2]).unwrap();
    let result = tx.move_to_position(range, target).unwrap();
    assert_eq!(result.start_path(), &vec![1, 1, 2]);
    assert_eq!(result.end_path(), &vec![1, 1, 4]);

    editor.dispatch(tx).unwrap();
    assert_eq!(
        editor.state().document.root(),
        &ElementNode::with_children(
            "div",
            vec![
                Node::element("div", vec![Node::text("a"), Node::text("d")]),
                Node::element("div", vec![Node::text("wxbcyz")]),
            ]
        )
    );
}

#[test]
fn moving_into_the_moved_range_fails_without_mutation() {
    let state = two_paragraph_state();
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let range = Range::from_paths(&doc0, vec![0, 0, 1], vec![0, 0, 3]).unwrap();
    let target = Position::from_path(&doc0, vec![0, 0, 2]).unwrap();
    let err = tx.move_to_position(range, target).unwrap_err();
    assert!(matches!(err, EditorError::Assertion(_)));
    assert_eq!(tx.size(), 0);

    editor.dispatch(tx).unwrap();
    assert_eq!(editor.state().document, doc0);
}

#[test]
fn split_until_cuts_ancestors_up_to_the_limit() {
    let state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::element(
            "blockquote",
            vec![Node::element("p", vec![Node::text("abcd")])],
        )],
    ));
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let limit = NodeHandle::new(&doc0, vec![0]).unwrap();
    let pos = Position::from_path(&doc0, vec![0, 0, 0, 2]).unwrap();
    let seam = tx.split_until_element(pos, &limit, false).unwrap();
    assert_eq!(seam.path(), &vec![0, 1]);

    editor.dispatch(tx).unwrap();
    assert_eq!(
        editor.state().document.root(),
        &ElementNode::with_children(
            "div",
            vec![Node::element(
                "blockquote",
                vec![
                    Node::element("p", vec![Node::text("ab")]),
                    Node::element("p", vec![Node::text("cd")]),
                ]
            )]
        )
    );
}

#[test]
fn split_at_a_boundary_walks_around_instead_of_splitting() {
    let state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::element(
            "blockquote",
            vec![Node::element("p", vec![Node::text("abcd")])],
        )],
    ));
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let limit = NodeHandle::new(&doc0, vec![0]).unwrap();
    // Start of the paragraph text: nothing to split off.
    let pos = Position::from_path(&doc0, vec![0, 0, 0, 0]).unwrap();
    let seam = tx.split_until_element(pos, &limit, false).unwrap();
    assert_eq!(seam.path(), &vec![0, 0]);

    editor.dispatch(tx).unwrap();
    assert_eq!(
        editor.state().document.root(),
        &ElementNode::with_children(
            "div",
            vec![Node::element(
                "blockquote",
                vec![Node::element("p", vec![Node::text("abcd")])]
            )]
        )
    );
}

#[test]
fn unwrap_inserts_br_between_merged_inline_runs() {
    let state = state_with_document(ElementNode::with_children(
        "div",
        vec![
            Node::text("a"),
            Node::element("span", vec![Node::text("b")]),
            Node::text("c"),
        ],
    ));
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let handle = NodeHandle::new(&doc0, vec![1]).unwrap();
    tx.unwrap(&handle, true).unwrap();
    editor.dispatch(tx).unwrap();

    assert_eq!(
        editor.state().document.root().children,
        vec![
            Node::text("a"),
            Node::element("br", vec![]),
            Node::text("b"),
            Node::element("br", vec![]),
            Node::text("c"),
        ]
    );
}

#[test]
fn unwrapping_a_text_node_is_an_error() {
    let state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::text("a")],
    ));
    let doc0 = state.document.clone();
    let editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let handle = NodeHandle::new(&doc0, vec![0]).unwrap();
    let err = tx.unwrap(&handle, false).unwrap_err();
    assert!(matches!(err, EditorError::Assertion(_)));
}

#[test]
fn selection_is_carried_across_document_edits() {
    let mut state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::text("abc")],
    ));
    state.selection = semdoc_core::Selection::from_range(
        Range::from_paths(&state.document, vec![0, 1], vec![0, 1]).unwrap(),
    );
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);

    let mut tx = editor.begin_transaction();
    let range = Range::from_paths(&doc0, vec![0, 1], vec![0, 1]).unwrap();
    tx.insert_text(range, "XX", MarkSet::default()).unwrap();
    editor.dispatch(tx).unwrap();

    let selection = &editor.state().selection;
    assert_eq!(selection.ranges.len(), 1);
    assert_eq!(selection.ranges[0].start_path(), &vec![0, 3]);
    assert!(selection.ranges[0].is_collapsed());
}

#[test]
fn redundant_selection_updates_add_no_step() {
    let mut state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::text("abc")],
    ));
    state.selection = semdoc_core::Selection::from_range(
        Range::from_paths(&state.document, vec![0, 1], vec![0, 1]).unwrap(),
    );
    let editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let same = tx.current_selection().unwrap();
    assert!(!tx.set_selection(same).unwrap());
    assert_eq!(tx.size(), 0);
}

#[test]
fn history_chain_supports_undo() {
    let state = state_with_document(ElementNode::with_children("div", vec![Node::text("ab")]));
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);

    let mut tx = editor.begin_transaction();
    let range = Range::from_paths(&doc0, vec![0, 2], vec![0, 2]).unwrap();
    tx.insert_text(range, "c", MarkSet::default()).unwrap();
    editor.dispatch(tx).unwrap();
    assert_eq!(
        editor.state().document.root().children,
        vec![Node::text("abc")]
    );
    assert!(editor.state().previous.is_some());

    assert!(editor.undo().unwrap());
    assert_eq!(
        editor.state().document.root().children,
        vec![Node::text("ab")]
    );
    assert!(!editor.undo().unwrap());
}

#[test]
fn restore_snapshot_walks_the_chain() {
    let state = state_with_document(ElementNode::with_children("div", vec![Node::text("a")]));
    let mut editor = Editor::with_state(state);

    for text in ["b", "c"] {
        let doc = editor.state().document.clone();
        let max = doc.root().children[0].max_offset();
        let mut tx = editor.begin_transaction();
        let range = Range::from_paths(&doc, vec![0, max], vec![0, max]).unwrap();
        tx.insert_text(range, text, MarkSet::default()).unwrap();
        editor.dispatch(tx).unwrap();
    }
    assert_eq!(
        editor.state().document.root().children,
        vec![Node::text("abc")]
    );
    assert_eq!(editor.state().history_len(), 3);

    let mut tx = editor.begin_transaction();
    tx.restore_snapshot(2);
    editor.dispatch(tx).unwrap();
    assert_eq!(
        editor.state().document.root().children,
        vec![Node::text("a")]
    );
}

#[test]
fn replace_node_swaps_a_subtree() {
    let state = two_paragraph_state();
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let handle = NodeHandle::new(&doc0, vec![0]).unwrap();
    tx.replace_node(&handle, vec![Node::element("p", vec![Node::text("new")])])
        .unwrap();
    editor.dispatch(tx).unwrap();

    assert_eq!(
        editor.state().document.root().children,
        vec![
            Node::element("p", vec![Node::text("new")]),
            Node::element("div", vec![Node::text("wxyz")]),
        ]
    );
}

#[test]
fn remove_nodes_behaves_like_a_plain_removal() {
    let state = two_paragraph_state();
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let range = Range::from_paths(&doc0, vec![0], vec![1]).unwrap();
    tx.remove_nodes(range).unwrap();
    editor.dispatch(tx).unwrap();

    assert_eq!(
        editor.state().document.root().children,
        vec![Node::element("div", vec![Node::text("wxyz")])]
    );
}

#[test]
fn selection_helpers_collapse_and_retarget() {
    let mut state = two_paragraph_state();
    state.selection = semdoc_core::Selection::from_range(
        Range::from_paths(&state.document, vec![0, 0, 0], vec![0, 0, 2]).unwrap(),
    );
    let doc0 = state.document.clone();
    let mut editor = Editor::with_state(state);

    let mut tx = editor.begin_transaction();
    tx.collapse_selection(true).unwrap();
    editor.dispatch(tx).unwrap();
    let selection = &editor.state().selection;
    assert!(selection.ranges[0].is_collapsed());
    assert_eq!(selection.ranges[0].start_path(), &vec![0, 0, 0]);

    let mut tx = editor.begin_transaction();
    let handle = NodeHandle::new(&doc0, vec![1, 0]).unwrap();
    tx.collapse_in(&handle, 2).unwrap();
    editor.dispatch(tx).unwrap();
    let selection = &editor.state().selection;
    assert_eq!(selection.ranges[0].start_path(), &vec![1, 0, 2]);

    let mut tx = editor.begin_transaction();
    let range = Range::from_paths(&editor.state().document, vec![0], vec![2]).unwrap();
    tx.select_range(range).unwrap();
    editor.dispatch(tx).unwrap();
    let selection = &editor.state().selection;
    assert_eq!(selection.ranges.len(), 1);
    assert_eq!(selection.ranges[0].end_path(), &vec![2]);
}

#[test]
fn map_range_applies_per_endpoint_bias() {
    let state = two_paragraph_state();
    let doc0 = state.document.clone();
    let editor = Editor::with_state(state);
    let mut tx = editor.begin_transaction();

    let insert_at = Position::from_path(&doc0, vec![0, 0, 2]).unwrap();
    tx.insert_at_position(insert_at, vec![Node::element("br", vec![])])
        .unwrap();

    let old = Range::from_paths(&doc0, vec![0, 0, 2], vec![0, 0, 4]).unwrap();
    let mapped = tx
        .map_range(
            &old,
            semdoc_core::RangeMapConfig {
                start_bias: Bias::Left,
                end_bias: Bias::Right,
            },
        )
        .unwrap();
    // Start stays before the inserted node, end shifts past it.
    assert_eq!(mapped.start_path(), &vec![0, 0, 2]);
    assert_eq!(mapped.end_path(), &vec![0, 2, 2]);
}

#[test]
fn mapping_a_position_with_a_foreign_revision_fails() {
    let state = state_with_document(ElementNode::with_children("div", vec![Node::text("ab")]));
    let mut editor = Editor::with_state(state);

    // Advance the editor twice so the current revision is ahead of
    // anything a fresh transaction has cached.
    for _ in 0..2 {
        let doc = editor.state().document.clone();
        let mut tx = editor.begin_transaction();
        let range = Range::from_paths(&doc, vec![0, 0], vec![0, 0]).unwrap();
        tx.insert_text(range, "x", MarkSet::default()).unwrap();
        editor.dispatch(tx).unwrap();
    }

    let old_doc = editor
        .state()
        .previous
        .as_ref()
        .map(|p| p.document.clone())
        .unwrap();
    let stale = Position::from_path(&old_doc, vec![0, 1]).unwrap();
    let mut tx = editor.begin_transaction();
    let err = tx.map_position(&stale, Bias::Right).unwrap_err();
    assert!(matches!(err, EditorError::Model(_)));
}
