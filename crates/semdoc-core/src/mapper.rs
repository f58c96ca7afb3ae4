use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::position::{Path, compare_paths};

/// Resolves the ambiguous case where a mapped position coincides exactly
/// with an edited boundary: `Right` lands after newly inserted content,
/// `Left` stays before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Bias {
    Left,
    #[default]
    Right,
}

/// Bias policy for mapping a range's two endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeMapConfig {
    pub start_bias: Bias,
    pub end_bias: Bias,
}

/// One span replacement: the content between `affected_start` and
/// `affected_end` was rewritten, and the old end now corresponds to
/// `new_end`.
#[derive(Debug, Clone)]
pub(crate) struct SpanMapping {
    pub affected_start: Path,
    pub affected_end: Path,
    pub new_end: Path,
}

/// Rewrites positions valid before a document transformation into their
/// equivalents after it. Composable: appending the mapper of each step in
/// order yields the mapper of the whole transaction.
#[derive(Debug, Clone, Default)]
pub struct RangeMapper {
    mappings: Vec<SpanMapping>,
}

impl RangeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn single(mapping: SpanMapping) -> Self {
        Self {
            mappings: vec![mapping],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Sequential composition; `other` applies after `self`.
    pub fn append_mapper(&mut self, other: RangeMapper) {
        self.mappings.extend(other.mappings);
    }

    pub fn map_path(&self, path: &Path, bias: Bias) -> Path {
        let mut current = path.clone();
        for mapping in &self.mappings {
            current = map_through(mapping, &current, bias);
        }
        current
    }

    pub fn map_range_paths(&self, start: &Path, end: &Path, config: RangeMapConfig) -> (Path, Path) {
        let start = self.map_path(start, config.start_bias);
        let mut end = self.map_path(end, config.end_bias);
        if compare_paths(&start, &end) == Ordering::Greater {
            end = start.clone();
        }
        (start, end)
    }
}

fn map_through(mapping: &SpanMapping, pos: &Path, bias: Bias) -> Path {
    match compare_paths(pos, &mapping.affected_start) {
        Ordering::Less => pos.clone(),
        Ordering::Equal => match bias {
            Bias::Left => pos.clone(),
            Bias::Right => mapping.new_end.clone(),
        },
        Ordering::Greater => {
            if compare_paths(pos, &mapping.affected_end) != Ordering::Less {
                shift_after(pos, &mapping.affected_end, &mapping.new_end)
            } else {
                // Strictly inside the rewritten span: collapse to a
                // boundary per bias.
                match bias {
                    Bias::Left => mapping.affected_start.clone(),
                    Bias::Right => mapping.new_end.clone(),
                }
            }
        }
    }
}

/// Shift a position at or after the affected end by the depth-wise deltas
/// between old and new end. Deltas apply along the shared spine and at the
/// first divergence depth; deeper components belong to a sibling subtree
/// whose interior is untouched and are copied verbatim.
fn shift_after(pos: &Path, old_end: &Path, new_end: &Path) -> Path {
    let mut out = Vec::with_capacity(pos.len());
    let mut diverged = false;
    for (depth, &value) in pos.iter().enumerate() {
        if diverged {
            out.push(value);
            continue;
        }
        let old = old_end.get(depth).copied();
        let delta = match (old, new_end.get(depth).copied()) {
            (Some(o), Some(n)) => n as i64 - o as i64,
            _ => 0,
        };
        let shifted = (value as i64 + delta).max(0) as usize;
        out.push(shifted);
        match old {
            Some(o) if o == value => {}
            _ => diverged = true,
        }
    }
    out
}
