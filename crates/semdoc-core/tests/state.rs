use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use semdoc_core::{
    Command, Editor, EditorError, ElementNode, InlineComponentSpec, MarkSpec, Node, PluginConfig,
    Range, Selection, Transaction, WidgetSpec, empty_state, state_with_document,
};
use serde_json::Value;

#[test]
fn empty_state_starts_with_core_registries_and_commands() {
    let state = empty_state();
    assert_eq!(state.document.root().kind, "div");
    assert!(state.document.root().children.is_empty());
    assert!(state.marks_registry.is_registered("bold"));
    assert!(state.commands.get("insert-text").is_some());
    assert!(state.commands.names().contains(&"unindent-list"));
    assert!(!state.selection.is_well_behaved());
    assert!(state.previous.is_none());
    assert!(state.datastore.is_empty());
}

#[test]
fn registrations_land_on_the_next_state() {
    let mut editor = Editor::new();
    let mut tx = editor.begin_transaction();
    tx.register_mark(MarkSpec {
        name: "comment".into(),
        priority: 900,
        write_tag: "mark".into(),
    });
    tx.register_inline_component(InlineComponentSpec {
        name: "card".into(),
        tag: "div".into(),
        atomic: false,
    });
    tx.register_widget(WidgetSpec {
        desired_location: "toolbar".into(),
        component_name: "bold-button".into(),
    });
    tx.set_plugins(vec![PluginConfig {
        name: "lists".into(),
        options: Value::Null,
    }]);
    editor.dispatch(tx).unwrap();

    let state = editor.state();
    assert!(state.marks_registry.is_registered("comment"));
    assert!(state.inline_components_registry.is_registered("card"));
    assert_eq!(state.widget_map["toolbar"].len(), 1);
    assert_eq!(state.plugins.len(), 1);
    assert_eq!(state.plugins[0].name, "lists");
}

#[test]
fn changing_the_base_iri_recomputes_the_datastore() {
    let mut root = ElementNode::new("div");
    let mut thing = ElementNode::new("div");
    thing.attrs.insert("about".into(), "x".into());
    thing.attrs.insert("typeof".into(), "http://example.org/T".into());
    root.children.push(Node::Element(thing));

    let mut editor = Editor::with_state(state_with_document(root));
    assert_eq!(
        editor.state().datastore.triples()[0].subject,
        "http://localhost/x"
    );

    let mut tx = editor.begin_transaction();
    tx.set_base_iri("http://b.example/");
    editor.dispatch(tx).unwrap();

    assert_eq!(editor.state().base_iri, "http://b.example/");
    assert_eq!(
        editor.state().datastore.triples()[0].subject,
        "http://b.example/x"
    );
}

#[test]
fn dispatch_listeners_see_every_dispatch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    let mut editor = Editor::new();
    editor.add_dispatch_listener(Arc::new(move |_state, steps| {
        seen.fetch_add(1 + steps.len(), Ordering::SeqCst);
    }));

    let mut tx = editor.begin_transaction();
    tx.set_config("k", Some("v".into()));
    editor.dispatch(tx).unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

struct ShoutCommand;

impl Command for ShoutCommand {
    fn name(&self) -> &'static str {
        "shout"
    }

    fn execute(&self, tx: &mut Transaction, _args: Option<Value>) -> Result<(), EditorError> {
        let selection = tx.current_selection()?;
        let range = selection
            .last_range()
            .cloned()
            .ok_or_else(|| EditorError::MisbehavedSelection("no range".into()))?;
        tx.insert_text(range, "!", Default::default())?;
        Ok(())
    }
}

#[test]
fn commands_registered_through_a_transaction_become_executable() {
    let mut state = state_with_document(ElementNode::with_children(
        "div",
        vec![Node::text("hey")],
    ));
    state.selection = Selection::from_range(
        Range::from_paths(&state.document, vec![0, 3], vec![0, 3]).unwrap(),
    );
    let mut editor = Editor::with_state(state);

    let mut tx = editor.begin_transaction();
    tx.register_command(Arc::new(ShoutCommand));
    editor.dispatch(tx).unwrap();

    editor.execute_command("shout", None).unwrap();
    assert_eq!(
        editor.state().document.root().children,
        vec![Node::text("hey!")]
    );
}

#[test]
fn transactions_can_start_from_a_shared_state_handle() {
    let editor = Editor::new();
    let mut tx = Transaction::new(editor.state_arc());
    assert_eq!(tx.size(), 0);
    assert!(!tx.should_focus());
    tx.focus();
    assert!(tx.should_focus());
    assert_eq!(
        tx.working_copy().unwrap().document.root().kind,
        editor.state().document.root().kind
    );
}
