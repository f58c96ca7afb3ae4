use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::EditorError;
use crate::node::{Document, ElementNode, Node, max_offset_at, node_at};
use crate::position::{Path, Position, Revision, compare_paths};

/// An ordered pair of positions over one document revision. `start` never
/// exceeds `end`; selection direction lives on the selection, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    revision: Revision,
    start: Path,
    end: Path,
}

impl Range {
    pub fn new(a: Position, b: Position) -> Result<Self, EditorError> {
        if a.revision() != b.revision() {
            return Err(EditorError::Model(
                "range endpoints from different document revisions".into(),
            ));
        }
        let revision = a.revision();
        let (start, end) = match compare_paths(a.path(), b.path()) {
            Ordering::Greater => (b.into_path(), a.into_path()),
            _ => (a.into_path(), b.into_path()),
        };
        Ok(Self {
            revision,
            start,
            end,
        })
    }

    pub fn collapsed(pos: Position) -> Self {
        let revision = pos.revision();
        let path = pos.into_path();
        Self {
            revision,
            start: path.clone(),
            end: path,
        }
    }

    pub fn from_paths(doc: &Document, start: Path, end: Path) -> Result<Self, EditorError> {
        Range::new(
            Position::from_path(doc, start)?,
            Position::from_path(doc, end)?,
        )
    }

    /// The range exactly covering the node at `node_path`.
    pub fn around_node(doc: &Document, node_path: &[usize]) -> Result<Self, EditorError> {
        Range::new(
            Position::before_node(doc, node_path)?,
            Position::after_node(doc, node_path)?,
        )
    }

    /// The full interior of the container (or text) at `node_path`.
    pub fn inside_node(doc: &Document, node_path: &[usize]) -> Result<Self, EditorError> {
        let max = max_offset_at(doc.root(), node_path)?;
        Range::new(
            Position::in_node(doc, node_path, 0)?,
            Position::in_node(doc, node_path, max)?,
        )
    }

    pub(crate) fn stamp(revision: Revision, start: Path, end: Path) -> Self {
        Self {
            revision,
            start,
            end,
        }
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn start_path(&self) -> &Path {
        &self.start
    }

    pub fn end_path(&self) -> &Path {
        &self.end
    }

    pub fn start(&self) -> Position {
        Position::stamp(self.revision, self.start.clone())
    }

    pub fn end(&self) -> Position {
        Position::stamp(self.revision, self.end.clone())
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn collapse(&self, to_left: bool) -> Range {
        let path = if to_left {
            self.start.clone()
        } else {
            self.end.clone()
        };
        Self {
            revision: self.revision,
            start: path.clone(),
            end: path,
        }
    }

    /// Decompose into the smallest set of ranges that each stay inside one
    /// parent, in document order. Node-level operations only accept edits
    /// confined to a single child list, so anything crossing element
    /// boundaries goes through this first.
    pub fn minimum_confined_ranges(&self, doc: &Document) -> Result<Vec<Range>, EditorError> {
        if self.revision != doc.revision() {
            return Err(EditorError::Model(
                "range revision does not match the document".into(),
            ));
        }
        let pairs = confined_path_ranges(doc.root(), &self.start, &self.end)?;
        Ok(pairs
            .into_iter()
            .map(|(start, end)| Range::stamp(self.revision, start, end))
            .collect())
    }
}

/// Walk a start boundary outward: a position at offset 0 of its parent is
/// equivalent to the gap before that parent, and using the outer gap means
/// operations never split an element that is covered from its very start.
pub(crate) fn walk_start_outward(path: &Path) -> Path {
    let mut path = path.clone();
    while path.len() > 1 && path.last() == Some(&0) {
        path.pop();
    }
    path
}

/// End-side counterpart: offset == maxOffset becomes the gap after the
/// parent.
pub(crate) fn walk_end_outward(root: &ElementNode, path: &Path) -> Result<Path, EditorError> {
    let mut path = path.clone();
    loop {
        if path.len() <= 1 {
            return Ok(path);
        }
        let parent = &path[..path.len() - 1];
        let max = max_offset_at(root, parent)?;
        if path.last() != Some(&max) {
            return Ok(path);
        }
        path.pop();
        if let Some(last) = path.last_mut() {
            *last += 1;
        }
    }
}

/// Boundary offsets of a text node are virtual: offset 0 is the gap
/// before it, offset len the gap after it. Normalizing them up front
/// keeps a fully covered text node collectible as a whole node.
fn normalize_text_start(root: &ElementNode, path: &Path) -> Path {
    if path.len() > 1
        && path.last() == Some(&0)
        && matches!(node_at(root, &path[..path.len() - 1]), Some(Node::Text(_)))
    {
        return path[..path.len() - 1].to_vec();
    }
    path.clone()
}

fn normalize_text_end(root: &ElementNode, path: &Path) -> Path {
    if path.len() > 1
        && let Some(Node::Text(text)) = node_at(root, &path[..path.len() - 1])
        && path.last() == Some(&text.text.len())
    {
        let mut gap = path[..path.len() - 1].to_vec();
        if let Some(last) = gap.last_mut() {
            *last += 1;
        }
        return gap;
    }
    path.clone()
}

/// Core of `minimum_confined_ranges`, on raw paths so operation algorithms
/// can reuse it against a working tree mid-step.
pub(crate) fn confined_path_ranges(
    root: &ElementNode,
    start: &Path,
    end: &Path,
) -> Result<Vec<(Path, Path)>, EditorError> {
    let start = normalize_text_start(root, start);
    let end = normalize_text_end(root, end);
    if compare_paths(&start, &end) != Ordering::Less {
        return Ok(vec![(end.clone(), end)]);
    }
    // A range already confined to one parent is its own decomposition;
    // the boundary walk below only applies while crossing parents.
    if start[..start.len() - 1] == end[..end.len() - 1] {
        return Ok(vec![(start, end)]);
    }
    let start = walk_start_outward(&start);
    let end = walk_end_outward(root, &end)?;
    if compare_paths(&start, &end) != Ordering::Less {
        return Ok(vec![(end.clone(), end)]);
    }
    if start[..start.len() - 1] == end[..end.len() - 1] {
        return Ok(vec![(start, end)]);
    }

    // Depth at which the two spines part ways.
    let divergence = start
        .iter()
        .zip(end.iter())
        .position(|(a, b)| a != b)
        .unwrap_or(start.len().min(end.len()) - 1);

    let mut left: Vec<(Path, Path)> = Vec::new();
    let mut s = start;
    while s.len() - 1 > divergence {
        let parent = s[..s.len() - 1].to_vec();
        let max = max_offset_at(root, &parent)?;
        if s[s.len() - 1] < max {
            let mut parent_end = parent.clone();
            parent_end.push(max);
            left.push((s.clone(), parent_end));
        }
        // Continue from the gap after the parent.
        s = parent;
        if let Some(last) = s.last_mut() {
            *last += 1;
        }
    }

    let mut right: Vec<(Path, Path)> = Vec::new();
    let mut e = end;
    while e.len() - 1 > divergence {
        let parent = e[..e.len() - 1].to_vec();
        if e[e.len() - 1] > 0 {
            let mut parent_start = parent.clone();
            parent_start.push(0);
            right.push((parent_start, e.clone()));
        }
        // Continue from the gap before the parent.
        e = parent;
    }

    let mut result = left;
    if compare_paths(&s, &e) == Ordering::Less {
        result.push((s, e));
    }
    result.extend(right.into_iter().rev());
    Ok(result)
}

/// Collect the child-index paths of the top-level nodes a set of confined
/// path ranges covers, in document order.
pub(crate) fn covered_node_paths(pairs: &[(Path, Path)]) -> Vec<Path> {
    let mut out = Vec::new();
    for (start, end) in pairs {
        let parent = &start[..start.len() - 1];
        let from = start[start.len() - 1];
        let to = end[end.len() - 1];
        for ix in from..to {
            let mut path = parent.to_vec();
            path.push(ix);
            out.push(path);
        }
    }
    out
}

/// Walk the covered top-level nodes of a range and return the paths of
/// those matching `predicate`, outermost first.
pub fn find_nodes_in_range<F>(doc: &Document, range: &Range, predicate: F) -> Vec<Path>
where
    F: Fn(&Node) -> bool,
{
    let Ok(pairs) = confined_path_ranges(doc.root(), range.start_path(), range.end_path()) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut stack: Vec<Path> = covered_node_paths(&pairs);
    stack.reverse();
    while let Some(path) = stack.pop() {
        let Some(node) = node_at(doc.root(), &path) else {
            continue;
        };
        if predicate(node) {
            out.push(path.clone());
        }
        if let Some(children) = node.children() {
            for ix in (0..children.len()).rev() {
                let mut child = path.clone();
                child.push(ix);
                stack.push(child);
            }
        }
    }
    out
}
