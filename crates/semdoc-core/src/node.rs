use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::EditorError;
use crate::marks::MarkSet;
use crate::position::{Path, Revision};

pub type Attrs = BTreeMap<String, String>;
/// Opaque payload for inline components (props and state).
pub type Payload = BTreeMap<String, Value>;

/// Which derived artifacts of a node are stale and need re-sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyKind {
    /// Child list changed.
    Content,
    /// The node itself changed (attributes, component state).
    Node,
    /// Marks on the node changed.
    Mark,
}

impl DirtyKind {
    fn bit(self) -> u8 {
        match self {
            DirtyKind::Content => 1,
            DirtyKind::Node => 2,
            DirtyKind::Mark => 4,
        }
    }
}

/// Per-node dirty marker set. Ignored by content equality: two trees with
/// the same content compare equal regardless of what a renderer still has
/// to sync.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DirtySet {
    bits: u8,
}

impl DirtySet {
    pub fn add(&mut self, kind: DirtyKind) {
        self.bits |= kind.bit();
    }

    pub fn remove(&mut self, kind: DirtyKind) {
        self.bits &= !kind.bit();
    }

    pub fn contains(&self, kind: DirtyKind) -> bool {
        self.bits & kind.bit() != 0
    }

    pub fn clear(&mut self) {
        self.bits = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    InlineComponent(InlineComponentNode),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: String,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(skip)]
    pub dirty: DirtySet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: MarkSet,
    #[serde(skip)]
    pub dirty: DirtySet,
}

/// An embedded widget: an element variant carrying a reference to a
/// registered component spec, immutable `props` and mutable `state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineComponentNode {
    pub spec: String,
    #[serde(default)]
    pub props: Payload,
    #[serde(default)]
    pub state: Payload,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(skip)]
    pub dirty: DirtySet,
}

impl PartialEq for ElementNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.attrs == other.attrs && self.children == other.children
    }
}

impl PartialEq for TextNode {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.marks == other.marks
    }
}

impl PartialEq for InlineComponentNode {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
            && self.props == other.props
            && self.state == other.state
            && self.children == other.children
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Element(a), Node::Element(b)) => a == b,
            (Node::Text(a), Node::Text(b)) => a == b,
            (Node::InlineComponent(a), Node::InlineComponent(b)) => a == b,
            _ => false,
        }
    }
}

impl ElementNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::default(),
            children: Vec::new(),
            dirty: DirtySet::default(),
        }
    }

    pub fn with_children(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::default(),
            children,
            dirty: DirtySet::default(),
        }
    }

    /// Clone kind and attributes, not children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            attrs: self.attrs.clone(),
            children: Vec::new(),
            dirty: DirtySet::default(),
        }
    }

    /// Offset space of an element: one offset per gap between children.
    pub fn max_offset(&self) -> usize {
        self.children.len()
    }

    /// Split the child list at `index`. `self` keeps `children[..index]`,
    /// the returned sibling (same kind and attributes) takes the rest.
    pub fn split_at(&mut self, index: usize) -> ElementNode {
        let mut right = self.shallow_clone();
        right.children = self.children.split_off(index.min(self.children.len()));
        self.dirty.add(DirtyKind::Content);
        right.dirty.add(DirtyKind::Content);
        right
    }
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::default(),
            dirty: DirtySet::default(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
            dirty: DirtySet::default(),
        }
    }

    pub fn max_offset(&self) -> usize {
        self.text.len()
    }
}

impl InlineComponentNode {
    pub fn new(spec: impl Into<String>, props: Payload) -> Self {
        Self {
            spec: spec.into(),
            props,
            state: Payload::default(),
            children: Vec::new(),
            dirty: DirtySet::default(),
        }
    }

    /// Component state is the one mutable slot on an otherwise value-style
    /// tree; writes flag the node for re-render.
    pub fn set_state_entry(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
        self.dirty.add(DirtyKind::Node);
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode::new(text))
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(ElementNode::with_children(kind, children))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Child count for containers, text length for text.
    pub fn max_offset(&self) -> usize {
        match self {
            Node::Element(el) => el.max_offset(),
            Node::Text(t) => t.max_offset(),
            Node::InlineComponent(c) => c.children.len(),
        }
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Element(el) => Some(&el.children),
            Node::InlineComponent(c) => Some(&c.children),
            Node::Text(_) => None,
        }
    }

    fn children_vec_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(el) => Some(&mut el.children),
            Node::InlineComponent(c) => Some(&mut c.children),
            Node::Text(_) => None,
        }
    }

    pub fn dirty(&self) -> &DirtySet {
        match self {
            Node::Element(el) => &el.dirty,
            Node::Text(t) => &t.dirty,
            Node::InlineComponent(c) => &c.dirty,
        }
    }

    pub fn dirty_mut(&mut self) -> &mut DirtySet {
        match self {
            Node::Element(el) => &mut el.dirty,
            Node::Text(t) => &mut t.dirty,
            Node::InlineComponent(c) => &mut c.dirty,
        }
    }

    /// Whether a node renders as a block. Used by `unwrap` to decide if a
    /// `br` boundary is needed between two inline runs.
    pub fn is_block(&self) -> bool {
        match self {
            Node::Element(el) => is_block_kind(&el.kind),
            Node::Text(_) | Node::InlineComponent(_) => false,
        }
    }
}

const BLOCK_KINDS: &[&str] = &[
    "div", "p", "ul", "ol", "li", "table", "thead", "tbody", "tr", "td", "th", "blockquote", "h1",
    "h2", "h3", "h4", "h5", "h6",
];

pub fn is_block_kind(kind: &str) -> bool {
    BLOCK_KINDS.contains(&kind)
}

/// The document: a root element plus the revision stamp that positions and
/// ranges are checked against. Each applied step produces a structurally
/// new document with a bumped revision; earlier revisions are never
/// mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    revision: Revision,
    root: ElementNode,
}

impl Document {
    pub fn new(root: ElementNode) -> Self {
        Self {
            revision: Revision::initial(),
            root,
        }
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn root(&self) -> &ElementNode {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut ElementNode {
        &mut self.root
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision = self.revision.next();
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        node_at(&self.root, path)
    }

    pub fn contains_path(&self, path: &[usize]) -> bool {
        path.is_empty() || node_at(&self.root, path).is_some()
    }
}

/// Resolve a node by its child-index path. The empty path addresses the
/// root itself, which is not a `Node`; callers treat it separately.
pub fn node_at<'a>(root: &'a ElementNode, path: &[usize]) -> Option<&'a Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = root.children.get(first)?;
    for &ix in rest {
        node = node.children()?.get(ix)?;
    }
    Some(node)
}

pub fn node_at_mut<'a>(
    root: &'a mut ElementNode,
    path: &[usize],
) -> Result<&'a mut Node, EditorError> {
    let (&first, rest) = path
        .split_first()
        .ok_or_else(|| EditorError::IllegalArgument("empty node path".into()))?;
    let mut node = root
        .children
        .get_mut(first)
        .ok_or_else(|| out_of_bounds(path, 0))?;
    for (depth, &ix) in rest.iter().enumerate() {
        node = node
            .children_vec_mut()
            .ok_or_else(|| {
                EditorError::Model(format!("non-container node at depth {depth} of {path:?}"))
            })?
            .get_mut(ix)
            .ok_or_else(|| out_of_bounds(path, depth + 1))?;
    }
    Ok(node)
}

fn out_of_bounds(path: &[usize], depth: usize) -> EditorError {
    EditorError::Model(format!("path {path:?} out of bounds at depth {depth}"))
}

fn children_at_mut<'a>(
    root: &'a mut ElementNode,
    parent_path: &[usize],
) -> Result<&'a mut Vec<Node>, EditorError> {
    if parent_path.is_empty() {
        return Ok(&mut root.children);
    }
    node_at_mut(root, parent_path)?
        .children_vec_mut()
        .ok_or_else(|| EditorError::Model(format!("node at {parent_path:?} is not a container")))
}

/// Offset capacity of the node at `parent_path` (empty path = root).
pub fn max_offset_at(root: &ElementNode, parent_path: &[usize]) -> Result<usize, EditorError> {
    if parent_path.is_empty() {
        return Ok(root.max_offset());
    }
    node_at(root, parent_path)
        .map(Node::max_offset)
        .ok_or_else(|| EditorError::Model(format!("no node at {parent_path:?}")))
}

/// Splice `nodes` into the container at `parent_path` before `index`,
/// flagging the container's content dirty.
pub fn insert_children_at(
    root: &mut ElementNode,
    parent_path: &[usize],
    index: usize,
    nodes: Vec<Node>,
) -> Result<(), EditorError> {
    mark_dirty(root, parent_path, DirtyKind::Content);
    let children = children_at_mut(root, parent_path)?;
    if index > children.len() {
        return Err(EditorError::IllegalArgument(format!(
            "insert index {index} > {} in {parent_path:?}",
            children.len()
        )));
    }
    children.splice(index..index, nodes);
    Ok(())
}

/// Remove `range` children of the container at `parent_path`, returning
/// them in document order.
pub fn remove_children_range(
    root: &mut ElementNode,
    parent_path: &[usize],
    range: std::ops::Range<usize>,
) -> Result<Vec<Node>, EditorError> {
    mark_dirty(root, parent_path, DirtyKind::Content);
    let children = children_at_mut(root, parent_path)?;
    if range.end > children.len() || range.start > range.end {
        return Err(EditorError::IllegalArgument(format!(
            "remove range {range:?} out of bounds ({} children) in {parent_path:?}",
            children.len()
        )));
    }
    Ok(children.splice(range, std::iter::empty()).collect())
}

/// Flag the node at `node_path` dirty (the root for the empty path).
pub fn mark_dirty(root: &mut ElementNode, node_path: &[usize], kind: DirtyKind) {
    if node_path.is_empty() {
        root.dirty.add(kind);
    } else if let Ok(node) = node_at_mut(root, node_path) {
        node.dirty_mut().add(kind);
    }
}

/// Clear dirty markers on a whole subtree, e.g. after a renderer sync.
pub fn clear_dirty_deep(node: &mut Node) {
    let mut stack: Vec<&mut Node> = vec![node];
    while let Some(node) = stack.pop() {
        node.dirty_mut().clear();
        if let Some(children) = node.children_vec_mut() {
            stack.extend(children.iter_mut());
        }
    }
}

/// Collect the paths of all text nodes in the subtree rooted at
/// `node_path` (which may itself be a text node).
pub fn text_paths_in(root: &ElementNode, node_path: &Path) -> Vec<Path> {
    let mut out = Vec::new();
    let Some(node) = node_at(root, node_path) else {
        return out;
    };
    let mut stack: Vec<(Path, &Node)> = vec![(node_path.clone(), node)];
    while let Some((path, node)) = stack.pop() {
        match node {
            Node::Text(_) => out.push(path),
            Node::Element(_) | Node::InlineComponent(_) => {
                if let Some(children) = node.children() {
                    for (ix, child) in children.iter().enumerate().rev() {
                        let mut child_path = path.clone();
                        child_path.push(ix);
                        stack.push((child_path, child));
                    }
                }
            }
        }
    }
    out
}
