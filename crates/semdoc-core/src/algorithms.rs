//! Tree transformation algorithms shared by the steps. They operate on a
//! working copy of a document's root, take pre-validated path ranges (the
//! transaction layer validates; see the failure policy in the step docs)
//! and return the affected nodes plus a mapper fragment describing the
//! rewrite.

use std::cmp::Ordering;

use crate::errors::EditorError;
use crate::mapper::{Bias, RangeMapper, SpanMapping};
use crate::marks::Mark;
use crate::node::{
    DirtyKind, ElementNode, Node, TextNode, insert_children_at, mark_dirty, max_offset_at, node_at,
    node_at_mut, remove_children_range, text_paths_in,
};
use crate::position::{Path, compare_paths};
use crate::range::{confined_path_ranges, covered_node_paths};

pub struct RemoveOutcome {
    pub removed: Vec<Node>,
    pub mapper: RangeMapper,
    /// Gap where the removed span collapsed to.
    pub seam: Path,
}

pub struct InsertOutcome {
    pub overwritten: Vec<Node>,
    /// Boundary and inserted nodes whose mark continuity needs
    /// re-validation; already flagged mark-dirty in the tree.
    pub mark_check: Vec<Path>,
    pub mapper: RangeMapper,
    pub inserted_span: (Path, Path),
}

#[derive(Debug)]
pub struct MoveOutcome {
    pub moved: usize,
    pub overwritten: Vec<Node>,
    pub mapper: RangeMapper,
    pub inserted_span: (Path, Path),
}

/// Materialize a text boundary at `pos`. Boundary offsets (0 or len) just
/// resolve to the adjacent gap without creating an empty sibling. Returns
/// the gap path and the mapper fragment.
///
/// `keep_right` mirrors the element split below: it picks which half is
/// the freshly cloned node, which is unobservable on a value tree but kept
/// so call sites read like the operations they port.
pub fn split_text(
    root: &mut ElementNode,
    pos: &Path,
    _keep_right: bool,
) -> Result<(Path, RangeMapper), EditorError> {
    let Some((&offset, parent)) = pos.split_last() else {
        return Err(EditorError::IllegalArgument("empty position path".into()));
    };
    if parent.is_empty() {
        return Ok((pos.clone(), RangeMapper::new()));
    }
    let Some(Node::Text(text)) = node_at(root, parent) else {
        // Already a gap between nodes.
        return Ok((pos.clone(), RangeMapper::new()));
    };
    let len = text.text.len();
    let Some((&text_ix, gparent)) = parent.split_last() else {
        return Err(EditorError::Model("text node without a parent".into()));
    };
    if offset == 0 {
        return Ok((parent.to_vec(), RangeMapper::new()));
    }
    if offset >= len {
        let mut gap = gparent.to_vec();
        gap.push(text_ix + 1);
        return Ok((gap, RangeMapper::new()));
    }

    let offset = clamp_to_char_boundary(&text.text, offset);
    let Some(Node::Text(text)) = node_at_mut(root, parent).ok() else {
        return Err(EditorError::Model("text node vanished during split".into()));
    };
    let right = TextNode::with_marks(text.text.split_off(offset), text.marks.clone());
    text.dirty.add(DirtyKind::Content);
    insert_children_at(root, gparent, text_ix + 1, vec![Node::Text(right)])?;

    let mut gap = gparent.to_vec();
    gap.push(text_ix + 1);
    let mut new_end = gap.clone();
    new_end.push(0);
    let mapper = RangeMapper::single(SpanMapping {
        affected_start: pos.clone(),
        affected_end: pos.clone(),
        new_end,
    });
    Ok((gap, mapper))
}

/// Structural split: materialize the text boundary at `pos`, then split
/// the position's parent element into two siblings at that index,
/// reattaching both halves under the grandparent. Returns the seam
/// position between the halves. No-op on the root.
pub fn split(
    root: &mut ElementNode,
    pos: &Path,
    keep_right: bool,
) -> Result<(Path, RangeMapper), EditorError> {
    let (gap, mut mapper) = split_text(root, pos, keep_right)?;
    let Some((&gap_offset, parent_path)) = gap.split_last() else {
        return Ok((gap, mapper));
    };
    if parent_path.is_empty() {
        // Splitting directly under the root splits nothing further.
        return Ok((gap, mapper));
    }
    let Some((&parent_ix, gparent)) = parent_path.split_last() else {
        return Ok((gap, mapper));
    };

    let parent = node_at_mut(root, parent_path)?;
    let Node::Element(parent_el) = parent else {
        return Err(EditorError::TypeAssertion(format!(
            "cannot split non-element at {parent_path:?}"
        )));
    };
    if keep_right {
        // The original node keeps the right half; a fresh clone takes the
        // left children and lands before it.
        let mut left = parent_el.shallow_clone();
        left.children = parent_el.children.drain(..gap_offset).collect();
        left.dirty.add(DirtyKind::Content);
        parent_el.dirty.add(DirtyKind::Content);
        insert_children_at(root, gparent, parent_ix, vec![Node::Element(left)])?;
    } else {
        let right = parent_el.split_at(gap_offset);
        insert_children_at(root, gparent, parent_ix + 1, vec![Node::Element(right)])?;
    }

    let mut seam = gparent.to_vec();
    seam.push(parent_ix + 1);
    let mut new_end = seam.clone();
    new_end.push(0);
    mapper.append_mapper(RangeMapper::single(SpanMapping {
        affected_start: gap.clone(),
        affected_end: gap,
        new_end,
    }));
    Ok((seam, mapper))
}

/// Remove the content covered by `[start, end]`: split text at both
/// boundaries when needed, walk the confined sub-ranges collecting
/// top-level nodes, and remove them (reverse document order, so earlier
/// paths stay valid). An end landing exactly on a parent boundary walks
/// outward instead of splitting, so no zero-length siblings appear.
pub fn remove(
    root: &mut ElementNode,
    start: &Path,
    end: &Path,
) -> Result<RemoveOutcome, EditorError> {
    let mut mapper = RangeMapper::new();
    let mut start = start.clone();
    let mut end = end.clone();

    let (start_gap, m_start) = split_text(root, &start, false)?;
    end = m_start.map_path(&end, Bias::Right);
    mapper.append_mapper(m_start);
    start = start_gap;

    let (end_gap, m_end) = split_text(root, &end, true)?;
    start = m_end.map_path(&start, Bias::Left);
    mapper.append_mapper(m_end);
    end = end_gap;

    if compare_paths(&start, &end) != Ordering::Less {
        return Ok(RemoveOutcome {
            removed: Vec::new(),
            mapper,
            seam: end,
        });
    }

    // The decomposition's outermost endpoints are the normalized range
    // boundaries; the span mapping is built over those.
    let pairs = confined_path_ranges(root, &start, &end)?;
    let norm_start = pairs
        .first()
        .map(|(s, _)| s.clone())
        .ok_or_else(|| EditorError::Model("empty confined decomposition".into()))?;
    let norm_end = pairs
        .last()
        .map(|(_, e)| e.clone())
        .ok_or_else(|| EditorError::Model("empty confined decomposition".into()))?;
    let new_end = removed_adjusted_path(&norm_end, &pairs);

    let mut removed_by_pair: Vec<Vec<Node>> = Vec::with_capacity(pairs.len());
    for (pair_start, pair_end) in pairs.iter().rev() {
        let parent = &pair_start[..pair_start.len() - 1];
        let from = pair_start[pair_start.len() - 1];
        let to = pair_end[pair_end.len() - 1];
        removed_by_pair.push(remove_children_range(root, parent, from..to)?);
    }
    removed_by_pair.reverse();
    let removed = removed_by_pair.into_iter().flatten().collect();

    mapper.append_mapper(RangeMapper::single(SpanMapping {
        affected_start: norm_start.clone(),
        affected_end: norm_end,
        new_end,
    }));
    Ok(RemoveOutcome {
        removed,
        mapper,
        seam: norm_start,
    })
}

/// Where `path` ends up once the children covered by `pairs` are gone.
/// Pairs apply deepest-first, mirroring the removal order, so shallower
/// renumbering never invalidates a deeper match.
fn removed_adjusted_path(path: &Path, pairs: &[(Path, Path)]) -> Path {
    let mut out = path.clone();
    for (pair_start, pair_end) in pairs.iter().rev() {
        let depth = pair_start.len() - 1;
        let parent = &pair_start[..depth];
        let to = pair_end[depth];
        let from = pair_start[depth];
        if out.len() > depth && &out[..depth] == parent && out[depth] >= to {
            out[depth] -= to - from;
        }
    }
    out
}

/// Insert `nodes` at `[start, end]`. A non-collapsed range is first
/// removed; the nodes are then spliced in at the resulting gap. Inserting
/// one text node into the middle of a text run with identical marks
/// splices the string directly, so surrounding text stays one node.
pub fn insert(
    root: &mut ElementNode,
    start: &Path,
    end: &Path,
    nodes: Vec<Node>,
) -> Result<InsertOutcome, EditorError> {
    if start == end {
        return insert_at_gap(root, start, nodes, Vec::new(), RangeMapper::new());
    }
    let RemoveOutcome {
        removed,
        mapper,
        seam,
    } = remove(root, start, end)?;
    insert_at_gap(root, &seam, nodes, removed, mapper)
}

fn insert_at_gap(
    root: &mut ElementNode,
    pos: &Path,
    nodes: Vec<Node>,
    overwritten: Vec<Node>,
    mut mapper: RangeMapper,
) -> Result<InsertOutcome, EditorError> {
    if nodes.is_empty() {
        return Ok(InsertOutcome {
            overwritten,
            mark_check: Vec::new(),
            mapper,
            inserted_span: (pos.clone(), pos.clone()),
        });
    }

    // Splice path: a lone text node landing inside equally-marked text.
    if let [Node::Text(incoming)] = nodes.as_slice() {
        let parent = &pos[..pos.len() - 1];
        if let Some(Node::Text(host)) = (!parent.is_empty())
            .then(|| node_at(root, parent))
            .flatten()
            && host.marks == incoming.marks
        {
            let offset = clamp_to_char_boundary(&host.text, pos[pos.len() - 1].min(host.text.len()));
            let inserted_len = incoming.text.len();
            let Some(Node::Text(host)) = node_at_mut(root, parent).ok() else {
                return Err(EditorError::Model("text node vanished during insert".into()));
            };
            host.text.insert_str(offset, &incoming.text);
            host.dirty.add(DirtyKind::Content);
            let mark_check = vec![parent.to_vec()];
            mark_dirty(root, parent, DirtyKind::Mark);

            let mut spliced_start = parent.to_vec();
            spliced_start.push(offset);
            let mut new_end = parent.to_vec();
            new_end.push(offset + inserted_len);
            mapper.append_mapper(RangeMapper::single(SpanMapping {
                affected_start: spliced_start.clone(),
                affected_end: spliced_start.clone(),
                new_end: new_end.clone(),
            }));
            return Ok(InsertOutcome {
                overwritten,
                mark_check,
                mapper,
                inserted_span: (spliced_start, new_end),
            });
        }
    }

    let (gap, m_split) = split_text(root, pos, false)?;
    mapper.append_mapper(m_split);
    let parent = gap[..gap.len() - 1].to_vec();
    let gap_offset = gap[gap.len() - 1];
    let count = nodes.len();

    insert_children_at(root, &parent, gap_offset, nodes)?;

    let mut mark_check: Vec<Path> = Vec::new();
    if gap_offset > 0 {
        let mut before = parent.clone();
        before.push(gap_offset - 1);
        mark_check.push(before);
    }
    let max = max_offset_at(root, &parent)?;
    for ix in gap_offset..(gap_offset + count).min(max) {
        let mut inserted = parent.clone();
        inserted.push(ix);
        mark_check.push(inserted);
    }
    if gap_offset + count < max {
        let mut after = parent.clone();
        after.push(gap_offset + count);
        mark_check.push(after);
    }
    for path in &mark_check {
        mark_dirty(root, path, DirtyKind::Mark);
    }

    let mut new_end = parent.clone();
    new_end.push(gap_offset + count);
    mapper.append_mapper(RangeMapper::single(SpanMapping {
        affected_start: gap.clone(),
        affected_end: gap.clone(),
        new_end: new_end.clone(),
    }));
    Ok(InsertOutcome {
        overwritten,
        mark_check,
        mapper,
        inserted_span: (gap, new_end),
    })
}

/// Remove `[start, end]` and reinsert the removed nodes at `target`.
/// A target inside the source span has no meaningful result; it fails
/// before any mutation.
pub fn move_range(
    root: &mut ElementNode,
    start: &Path,
    end: &Path,
    target: &Path,
) -> Result<MoveOutcome, EditorError> {
    if compare_paths(target, start) == Ordering::Greater
        && compare_paths(target, end) == Ordering::Less
    {
        return Err(EditorError::Assertion(
            "cannot move a range to a position inside itself".into(),
        ));
    }
    let RemoveOutcome {
        removed, mapper, ..
    } = remove(root, start, end)?;
    let moved = removed.len();
    let target = mapper.map_path(target, Bias::Left);
    let outcome = insert_at_gap(root, &target, removed, Vec::new(), mapper)?;
    Ok(MoveOutcome {
        moved,
        overwritten: outcome.overwritten,
        mapper: outcome.mapper,
        inserted_span: outcome.inserted_span,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkAction {
    Add,
    Remove,
}

/// Add or remove a mark on every text node covered by `[start, end]`,
/// splitting text at the boundaries so the mark change stays inside the
/// range.
pub fn apply_mark(
    root: &mut ElementNode,
    start: &Path,
    end: &Path,
    mark: &Mark,
    action: MarkAction,
) -> Result<(RangeMapper, (Path, Path)), EditorError> {
    let mut mapper = RangeMapper::new();

    let (start_gap, m_start) = split_text(root, start, false)?;
    let end = m_start.map_path(end, Bias::Right);
    mapper.append_mapper(m_start);
    let (end_gap, m_end) = split_text(root, &end, true)?;
    let start_gap = m_end.map_path(&start_gap, Bias::Left);
    mapper.append_mapper(m_end);

    let pairs = confined_path_ranges(root, &start_gap, &end_gap)?;
    for node_path in covered_node_paths(&pairs) {
        for text_path in text_paths_in(root, &node_path) {
            let Ok(Node::Text(text)) = node_at_mut(root, &text_path) else {
                continue;
            };
            let changed = match action {
                MarkAction::Add => text.marks.insert(mark.clone()),
                MarkAction::Remove => {
                    let before = text.marks.len();
                    text.marks.retain(|m| m.name != mark.name);
                    text.marks.len() != before
                }
            };
            if changed {
                text.dirty.add(DirtyKind::Mark);
            }
        }
    }
    Ok((mapper, (start_gap, end_gap)))
}

fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
