use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::EditorError;
use crate::node::{Document, Node, max_offset_at, node_at};

/// A path of offsets from the document root. Every component but the last
/// descends into a child; the last is an offset inside the final parent
/// (a gap index for containers, a char offset for text).
pub type Path = Vec<usize>;

/// Revision stamp of a document snapshot. Positions and ranges carry the
/// revision they were created against; using them against any other
/// revision without going through the range mapper is a `Model` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision(u64);

impl Revision {
    pub fn initial() -> Self {
        Revision(0)
    }

    pub(crate) fn next(self) -> Self {
        Revision(self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativePosition {
    Before,
    Equal,
    After,
}

/// Lexicographic path order. A strict prefix sorts before its extensions:
/// the gap before a node precedes every position inside it.
pub fn compare_paths(a: &[usize], b: &[usize]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    revision: Revision,
    path: Path,
}

impl Position {
    /// Validate `path` against `doc` and stamp it with the document's
    /// revision.
    pub fn from_path(doc: &Document, path: Path) -> Result<Self, EditorError> {
        validate_position_path(doc, &path)?;
        Ok(Self {
            revision: doc.revision(),
            path,
        })
    }

    /// The gap immediately before the node at `node_path`.
    pub fn before_node(doc: &Document, node_path: &[usize]) -> Result<Self, EditorError> {
        if node_at(doc.root(), node_path).is_none() {
            return Err(EditorError::Model(format!("no node at {node_path:?}")));
        }
        Ok(Self {
            revision: doc.revision(),
            path: node_path.to_vec(),
        })
    }

    /// The gap immediately after the node at `node_path`.
    pub fn after_node(doc: &Document, node_path: &[usize]) -> Result<Self, EditorError> {
        if node_at(doc.root(), node_path).is_none() {
            return Err(EditorError::Model(format!("no node at {node_path:?}")));
        }
        let mut path = node_path.to_vec();
        let last = path
            .last_mut()
            .ok_or_else(|| EditorError::IllegalArgument("empty node path".into()))?;
        *last += 1;
        Ok(Self {
            revision: doc.revision(),
            path,
        })
    }

    /// Offset `offset` inside the node at `node_path` (the root for the
    /// empty path).
    pub fn in_node(doc: &Document, node_path: &[usize], offset: usize) -> Result<Self, EditorError> {
        let mut path = node_path.to_vec();
        path.push(offset);
        Self::from_path(doc, path)
    }

    pub(crate) fn stamp(revision: Revision, path: Path) -> Self {
        Self { revision, path }
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> Path {
        self.path
    }

    /// Path of the parent the offset lives in.
    pub fn parent_path(&self) -> &[usize] {
        &self.path[..self.path.len().saturating_sub(1)]
    }

    pub fn offset(&self) -> usize {
        *self.path.last().unwrap_or(&0)
    }

    pub fn compare(&self, other: &Position) -> Result<RelativePosition, EditorError> {
        if self.revision != other.revision {
            return Err(EditorError::Model(
                "comparing positions from different document revisions".into(),
            ));
        }
        Ok(match compare_paths(&self.path, &other.path) {
            Ordering::Less => RelativePosition::Before,
            Ordering::Equal => RelativePosition::Equal,
            Ordering::Greater => RelativePosition::After,
        })
    }

    /// Strictly between `start` and `end` (path order, same revision
    /// assumed by the caller).
    pub fn is_strictly_between(&self, start: &Path, end: &Path) -> bool {
        compare_paths(&self.path, start) == Ordering::Greater
            && compare_paths(&self.path, end) == Ordering::Less
    }

    /// The node the position's parent holds right after the offset, if the
    /// parent is a container.
    pub fn node_after<'a>(&self, doc: &'a Document) -> Option<&'a Node> {
        node_after_path(doc, &self.path)
    }

    pub fn node_before<'a>(&self, doc: &'a Document) -> Option<&'a Node> {
        let (offset, parent) = self.path.split_last()?;
        if *offset == 0 {
            return None;
        }
        let mut path = parent.to_vec();
        path.push(offset - 1);
        node_after_path(doc, &path)
    }

    /// True when the position addresses a char offset strictly inside a
    /// text node; such positions are virtual until a split materializes
    /// the boundary.
    pub fn is_inside_text(&self, doc: &Document) -> bool {
        let parent = self.parent_path();
        if parent.is_empty() {
            return false;
        }
        match node_at(doc.root(), parent) {
            Some(Node::Text(t)) => self.offset() > 0 && self.offset() < t.text.len(),
            _ => false,
        }
    }
}

fn node_after_path<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a Node> {
    let (offset, parent) = path.split_last()?;
    if parent.is_empty() {
        return doc.root().children.get(*offset);
    }
    node_at(doc.root(), parent)?.children()?.get(*offset)
}

fn validate_position_path(doc: &Document, path: &[usize]) -> Result<(), EditorError> {
    let (offset, parent) = path
        .split_last()
        .ok_or_else(|| EditorError::IllegalArgument("empty position path".into()))?;
    for depth in 1..path.len() {
        if node_at(doc.root(), &path[..depth]).is_none() {
            return Err(EditorError::Model(format!(
                "position path {path:?} leaves the tree at depth {depth}"
            )));
        }
    }
    let max = max_offset_at(doc.root(), parent)?;
    if *offset > max {
        return Err(EditorError::Model(format!(
            "offset {offset} exceeds max offset {max} of parent {parent:?}"
        )));
    }
    Ok(())
}
