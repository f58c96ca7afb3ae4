//! Derived RDFa triple index. The extraction is deliberately
//! contract-level: it walks the annotated tree and exposes triples plus
//! subject-to-node mappings, and gets fully recomputed whenever a
//! transaction invalidated it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::node::{ElementNode, Node};
use crate::position::Path;

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Object {
    Named(String),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: Object,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datastore {
    triples: Vec<Triple>,
    subject_nodes: BTreeMap<String, Vec<Path>>,
}

#[derive(Clone)]
struct WalkContext {
    subject: Option<String>,
    vocab: Option<String>,
    prefixes: BTreeMap<String, String>,
}

impl Datastore {
    pub fn from_parse(root: &ElementNode, base_iri: &str) -> Self {
        let mut store = Datastore::default();
        let mut blank_counter = 0usize;
        let context = WalkContext {
            subject: root
                .attrs
                .get("about")
                .map(|about| expand(about, &BTreeMap::new(), None, base_iri)),
            vocab: root.attrs.get("vocab").cloned(),
            prefixes: parse_prefixes(root.attrs.get("prefix")),
        };
        let mut path = Vec::new();
        store.walk_children(
            &root.children,
            &mut path,
            &context,
            base_iri,
            &mut blank_counter,
        );
        store
    }

    fn walk_children(
        &mut self,
        children: &[Node],
        path: &mut Path,
        context: &WalkContext,
        base_iri: &str,
        blank_counter: &mut usize,
    ) {
        for (ix, node) in children.iter().enumerate() {
            path.push(ix);
            match node {
                Node::Element(el) => {
                    let next = self.process_element(el, path, context, base_iri, blank_counter);
                    self.walk_children(&el.children, path, &next, base_iri, blank_counter);
                }
                Node::InlineComponent(c) => {
                    self.walk_children(&c.children, path, context, base_iri, blank_counter);
                }
                Node::Text(_) => {}
            }
            path.pop();
        }
    }

    fn process_element(
        &mut self,
        el: &ElementNode,
        path: &Path,
        context: &WalkContext,
        base_iri: &str,
        blank_counter: &mut usize,
    ) -> WalkContext {
        let mut next = context.clone();
        for (prefix, iri) in parse_prefixes(el.attrs.get("prefix")) {
            next.prefixes.insert(prefix, iri);
        }
        if let Some(vocab) = el.attrs.get("vocab") {
            next.vocab = Some(vocab.clone());
        }

        let prefixes = next.prefixes.clone();
        let vocab = next.vocab.clone();
        let expand_here = move |term: &str| expand(term, &prefixes, vocab.as_deref(), base_iri);

        if let Some(about) = el.attrs.get("about") {
            let subject = expand_here(about);
            self.bind_subject(&subject, path);
            next.subject = Some(subject);
        }

        if let Some(types) = el.attrs.get("typeof") {
            let subject = match &next.subject {
                Some(subject) => subject.clone(),
                None => {
                    *blank_counter += 1;
                    let blank = format!("_:b{blank_counter}");
                    next.subject = Some(blank.clone());
                    blank
                }
            };
            self.bind_subject(&subject, path);
            for ty in types.split_whitespace() {
                self.triples.push(Triple {
                    subject: subject.clone(),
                    predicate: RDF_TYPE.to_string(),
                    object: Object::Named(expand_here(ty)),
                });
            }
        }

        // `next.subject` is the element's own subject when it set one,
        // otherwise whatever it inherited.
        if let Some(property) = el.attrs.get("property")
            && let Some(subject) = next.subject.clone()
        {
            let object = if let Some(resource) = el.attrs.get("resource") {
                Object::Named(expand_here(resource))
            } else if let Some(content) = el.attrs.get("content") {
                Object::Literal(content.clone())
            } else {
                Object::Literal(text_content(el))
            };
            for predicate in property.split_whitespace() {
                self.triples.push(Triple {
                    subject: subject.clone(),
                    predicate: expand_here(predicate),
                    object: object.clone(),
                });
            }
        }

        // A resource attribute re-roots descendants under a new subject.
        if let Some(resource) = el.attrs.get("resource") {
            let subject = expand_here(resource);
            self.bind_subject(&subject, path);
            next.subject = Some(subject);
        }

        next
    }

    fn bind_subject(&mut self, subject: &str, path: &Path) {
        let nodes = self.subject_nodes.entry(subject.to_string()).or_default();
        if nodes.last() != Some(path) {
            nodes.push(path.clone());
        }
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subject_nodes.keys().map(String::as_str)
    }

    /// Paths of the elements that introduced `subject`.
    pub fn nodes_for_subject(&self, subject: &str) -> &[Path] {
        self.subject_nodes
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn match_pattern(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&Object>,
    ) -> Vec<&Triple> {
        self.triples
            .iter()
            .filter(|t| subject.is_none_or(|s| t.subject == s))
            .filter(|t| predicate.is_none_or(|p| t.predicate == p))
            .filter(|t| object.is_none_or(|o| &t.object == o))
            .collect()
    }
}

fn parse_prefixes(attr: Option<&String>) -> BTreeMap<String, String> {
    let mut prefixes = BTreeMap::new();
    let Some(attr) = attr else {
        return prefixes;
    };
    let mut tokens = attr.split_whitespace();
    while let (Some(prefix), Some(iri)) = (tokens.next(), tokens.next()) {
        let Some(prefix) = prefix.strip_suffix(':') else {
            continue;
        };
        prefixes.insert(prefix.to_string(), iri.to_string());
    }
    prefixes
}

fn expand(term: &str, prefixes: &BTreeMap<String, String>, vocab: Option<&str>, base: &str) -> String {
    if term.starts_with("http://") || term.starts_with("https://") || term.starts_with("_:") {
        return term.to_string();
    }
    if let Some((prefix, local)) = term.split_once(':')
        && let Some(iri) = prefixes.get(prefix)
    {
        return format!("{iri}{local}");
    }
    if let Some(vocab) = vocab {
        return format!("{vocab}{term}");
    }
    if base.ends_with('/') || base.ends_with('#') {
        format!("{base}{term}")
    } else {
        format!("{base}#{term}")
    }
}

fn text_content(el: &ElementNode) -> String {
    let mut out = String::new();
    let mut stack: Vec<&Node> = el.children.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match node {
            Node::Text(t) => out.push_str(&t.text),
            Node::Element(el) => stack.extend(el.children.iter().rev()),
            Node::InlineComponent(c) => stack.extend(c.children.iter().rev()),
        }
    }
    out
}
