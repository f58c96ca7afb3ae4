use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::node::{ElementNode, Node};
use crate::position::Path;

/// A formatting or semantic annotation attached to text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Mark {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Mark {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(key.into(), value.into());
        Self {
            name: name.into(),
            attributes,
        }
    }
}

pub type MarkSet = BTreeSet<Mark>;

/// Registered description of a mark: ordering priority between nested
/// marks and the tag the export writer wraps marked text in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSpec {
    pub name: String,
    pub priority: usize,
    pub write_tag: String,
}

#[derive(Debug, Clone, Default)]
pub struct MarksRegistry {
    specs: HashMap<String, MarkSpec>,
}

impl MarksRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry every fresh state starts with: the classic text
    /// styles.
    pub fn core() -> Self {
        let mut registry = Self::default();
        for (name, priority, tag) in [
            ("bold", 100, "strong"),
            ("italic", 200, "em"),
            ("underline", 300, "u"),
            ("strikethrough", 400, "del"),
            ("highlight", 500, "span"),
        ] {
            registry.register_mark(MarkSpec {
                name: name.to_string(),
                priority,
                write_tag: tag.to_string(),
            });
        }
        registry
    }

    /// Last registration wins, matching how plugins may override a core
    /// spec.
    pub fn register_mark(&mut self, spec: MarkSpec) {
        self.specs.insert(spec.name.clone(), spec);
    }

    pub fn lookup(&self, name: &str) -> Option<&MarkSpec> {
        self.specs.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }
}

/// Derived index from mark name to the text nodes carrying it. Rebuilt
/// lazily when a transaction flagged the marks as invalid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarksManager {
    by_name: BTreeMap<String, Vec<Path>>,
}

impl MarksManager {
    pub fn from_document(root: &ElementNode) -> Self {
        let mut by_name: BTreeMap<String, Vec<Path>> = BTreeMap::new();

        fn walk(children: &[Node], path: &mut Path, by_name: &mut BTreeMap<String, Vec<Path>>) {
            for (ix, node) in children.iter().enumerate() {
                path.push(ix);
                match node {
                    Node::Text(text) => {
                        for mark in &text.marks {
                            by_name.entry(mark.name.clone()).or_default().push(path.clone());
                        }
                    }
                    Node::Element(el) => walk(&el.children, path, by_name),
                    Node::InlineComponent(c) => walk(&c.children, path, by_name),
                }
                path.pop();
            }
        }

        walk(&root.children, &mut Vec::new(), &mut by_name);
        Self { by_name }
    }

    /// Text-node paths carrying `name`, in document order.
    pub fn text_paths_with(&self, name: &str) -> &[Path] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn mark_names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}
