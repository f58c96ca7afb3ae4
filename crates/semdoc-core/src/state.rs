use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commands::{CommandRegistry, default_commands};
use crate::datastore::Datastore;
use crate::inline::InlineComponentsRegistry;
use crate::marks::{MarksManager, MarksRegistry};
use crate::node::{Document, ElementNode};
use crate::selection::Selection;

/// Resolved plugin configuration carried on the state. Loading mechanics
/// live outside the core; the state only records what is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    pub name: String,
    #[serde(default)]
    pub options: Value,
}

/// A toolbar/sidebar widget registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSpec {
    pub desired_location: String,
    pub component_name: String,
}

/// An immutable snapshot of everything the editor knows: the document,
/// the selection, the registries, the derived indexes and the command
/// table. Every edit produces a structurally new `State`; the old one is
/// reachable through `previous`, forming the singly linked history chain.
#[derive(Clone)]
pub struct State {
    pub document: Document,
    pub selection: Selection,
    pub marks_registry: MarksRegistry,
    pub inline_components_registry: InlineComponentsRegistry,
    pub datastore: Datastore,
    pub marks_manager: MarksManager,
    pub commands: CommandRegistry,
    pub plugins: Vec<PluginConfig>,
    pub widget_map: BTreeMap<String, Vec<WidgetSpec>>,
    pub config: BTreeMap<String, Option<String>>,
    pub base_iri: String,
    pub previous: Option<Arc<State>>,
}

impl State {
    /// Number of snapshots reachable through the history chain, this one
    /// included.
    pub fn history_len(&self) -> usize {
        let mut count = 1;
        let mut cur = self.previous.as_deref();
        while let Some(state) = cur {
            count += 1;
            cur = state.previous.as_deref();
        }
        count
    }
}

const DEFAULT_BASE_IRI: &str = "http://localhost/";

/// The state every editor starts from: an empty root element, no
/// selection, core marks and commands, empty derived indexes.
pub fn empty_state() -> State {
    let document = Document::new(ElementNode::new("div"));
    let datastore = Datastore::from_parse(document.root(), DEFAULT_BASE_IRI);
    let marks_manager = MarksManager::from_document(document.root());
    State {
        document,
        selection: Selection::new(),
        marks_registry: MarksRegistry::core(),
        inline_components_registry: InlineComponentsRegistry::new(),
        datastore,
        marks_manager,
        commands: default_commands(),
        plugins: Vec::new(),
        widget_map: BTreeMap::new(),
        config: BTreeMap::new(),
        base_iri: DEFAULT_BASE_IRI.to_string(),
        previous: None,
    }
}

/// A state seeded with a specific document; used by tests and by hosts
/// that parse content before constructing the editor.
pub fn state_with_document(root: ElementNode) -> State {
    let mut state = empty_state();
    let document = Document::new(root);
    state.datastore = Datastore::from_parse(document.root(), &state.base_iri);
    state.marks_manager = MarksManager::from_document(document.root());
    state.document = document;
    state
}
