use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::EditorError;
use crate::marks::MarkSet;
use crate::node::{Document, ElementNode, Node};
use crate::position::{Path, Position, compare_paths};
use crate::range::Range;

/// An ordered set of ranges plus directionality and the sticky marks that
/// apply to the next insertion at a collapsed caret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub ranges: Vec<Range>,
    #[serde(default)]
    pub is_right_to_left: bool,
    #[serde(default)]
    pub active_marks: MarkSet,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_range(range: Range) -> Self {
        Self {
            ranges: vec![range],
            is_right_to_left: false,
            active_marks: MarkSet::default(),
        }
    }

    /// Collapsed selection at `offset` inside the node at `node_path`.
    pub fn collapse_in(
        doc: &Document,
        node_path: &[usize],
        offset: usize,
    ) -> Result<Self, EditorError> {
        let pos = Position::in_node(doc, node_path, offset)?;
        Ok(Self::from_range(Range::collapsed(pos)))
    }

    /// Most commands operate on the last range.
    pub fn last_range(&self) -> Option<&Range> {
        self.ranges.last()
    }

    /// A well-behaved selection has at least one range; commands requiring
    /// more specific shapes check on top of this.
    pub fn is_well_behaved(&self) -> bool {
        !self.ranges.is_empty()
    }

    pub fn is_collapsed(&self) -> bool {
        self.ranges.iter().all(Range::is_collapsed)
    }

    pub fn add_range(&mut self, range: Range) {
        self.ranges.push(range);
    }

    pub fn clear_ranges(&mut self) {
        self.ranges.clear();
    }

    /// Structural equality used to suppress redundant selection-changed
    /// steps; sticky marks don't count.
    pub fn same_as(&self, other: &Selection) -> bool {
        self.ranges == other.ranges && self.is_right_to_left == other.is_right_to_left
    }

    /// Remap this selection onto `doc`: clamp every path to something that
    /// exists there and restamp the revision. Used whenever a step
    /// produces a new document.
    pub fn rebase(&self, doc: &Document) -> Selection {
        let ranges = self
            .ranges
            .iter()
            .map(|range| {
                let start = clamp_path(doc.root(), range.start_path());
                let end = clamp_path(doc.root(), range.end_path());
                let (start, end) = match compare_paths(&start, &end) {
                    Ordering::Greater => (end, start),
                    _ => (start, end),
                };
                Range::stamp(doc.revision(), start, end)
            })
            .collect();
        Selection {
            ranges,
            is_right_to_left: self.is_right_to_left,
            active_marks: self.active_marks.clone(),
        }
    }
}

/// Clamp a position path onto the given tree, component by component.
/// Components that descend past a leaf are dropped; offsets clamp to the
/// parent's capacity.
fn clamp_path(root: &ElementNode, path: &[usize]) -> Path {
    let mut resolved: Path = Vec::with_capacity(path.len());
    let mut children: &[Node] = &root.children;
    for (depth, &want) in path.iter().enumerate() {
        let last = depth + 1 == path.len();
        if last {
            resolved.push(want.min(children.len()));
            return resolved;
        }
        if children.is_empty() {
            resolved.push(0);
            return resolved;
        }
        let ix = want.min(children.len() - 1);
        resolved.push(ix);
        match &children[ix] {
            Node::Element(el) => children = &el.children,
            Node::InlineComponent(c) => children = &c.children,
            Node::Text(t) => {
                // Next component is a char offset; anything deeper is
                // dropped.
                let offset = path.get(depth + 1).copied().unwrap_or(0);
                resolved.push(offset.min(t.text.len()));
                return resolved;
            }
        }
    }
    if resolved.is_empty() {
        resolved.push(0);
    }
    resolved
}
