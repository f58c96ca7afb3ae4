use std::fmt;
use std::sync::Arc;

use crate::algorithms::{self, MarkAction};
use crate::errors::EditorError;
use crate::mapper::{Bias, RangeMapConfig, RangeMapper};
use crate::marks::Mark;
use crate::node::{DirtyKind, Document, ElementNode, Node, node_at_mut};
use crate::position::{Path, Position};
use crate::range::Range;
use crate::selection::Selection;
use crate::state::{PluginConfig, State};

/// Editor-state manipulation that cannot be expressed as a tree
/// operation; receives the input state, returns the replacement.
pub type StateManip = Arc<dyn Fn(&State) -> State + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeAction {
    Set,
    Remove,
}

/// One atomic, replayable transformation inside a transaction. Given an
/// input state, `get_result` is pure: it never mutates the input (the
/// document is cloned and its revision bumped), which is what lets the
/// transaction memoize results positionally and only recompute the
/// suffix after new steps are appended.
#[derive(Clone)]
pub enum Step {
    /// Replace the content of `range` with `nodes` (empty nodes = delete).
    Replace { range: Range, nodes: Vec<Node> },
    /// Remove the content of `range`.
    Remove { range: Range },
    /// Materialize boundaries at the range's ends; with `split_parent`,
    /// structurally split the parent element as well.
    Split { range: Range, split_parent: bool },
    /// Add or remove a mark across `range`.
    Mark {
        range: Range,
        mark: Mark,
        action: MarkAction,
    },
    /// Set or remove an attribute of the element right after `pos`.
    Attribute {
        pos: Position,
        action: AttributeAction,
        key: String,
        value: Option<String>,
    },
    Selection { selection: Selection },
    Config { key: String, value: Option<String> },
    State { manip: StateManip },
    Plugin { configs: Vec<PluginConfig> },
}

pub struct StepResult {
    pub state: State,
    pub mapper: RangeMapper,
    pub default_range: Option<Range>,
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Replace { .. } => "replace",
            Step::Remove { .. } => "remove",
            Step::Split { .. } => "split",
            Step::Mark { .. } => "mark",
            Step::Attribute { .. } => "attribute",
            Step::Selection { .. } => "selection",
            Step::Config { .. } => "config",
            Step::State { .. } => "state",
            Step::Plugin { .. } => "plugin",
        }
    }

    /// Operation steps rewrite the document tree and produce a mapper and
    /// a default range.
    pub fn is_operation(&self) -> bool {
        matches!(
            self,
            Step::Replace { .. }
                | Step::Remove { .. }
                | Step::Split { .. }
                | Step::Mark { .. }
                | Step::Attribute { .. }
        )
    }

    pub fn invalidates_rdf(&self) -> bool {
        matches!(
            self,
            Step::Replace { .. } | Step::Remove { .. } | Step::Split { .. } | Step::Attribute { .. }
        )
    }

    pub fn invalidates_marks(&self) -> bool {
        matches!(
            self,
            Step::Replace { .. } | Step::Remove { .. } | Step::Split { .. } | Step::Mark { .. }
        )
    }

    pub fn get_result(&self, state: &State) -> Result<StepResult, EditorError> {
        match self {
            Step::Replace { range, nodes } => {
                check_revision(range, state)?;
                let mut doc = state.document.clone();
                doc.bump_revision();
                let outcome = algorithms::insert(
                    doc.root_mut(),
                    range.start_path(),
                    range.end_path(),
                    nodes.clone(),
                )?;
                let (span_start, span_end) = outcome.inserted_span;
                let default_range = Range::stamp(doc.revision(), span_start, span_end);
                Ok(advance(state, doc, outcome.mapper, Some(default_range)))
            }
            Step::Remove { range } => {
                check_revision(range, state)?;
                let mut doc = state.document.clone();
                doc.bump_revision();
                let outcome =
                    algorithms::remove(doc.root_mut(), range.start_path(), range.end_path())?;
                let default_range =
                    Range::stamp(doc.revision(), outcome.seam.clone(), outcome.seam);
                Ok(advance(state, doc, outcome.mapper, Some(default_range)))
            }
            Step::Split {
                range,
                split_parent,
            } => {
                check_revision(range, state)?;
                let mut doc = state.document.clone();
                doc.bump_revision();
                let root = doc.root_mut();
                if range.is_collapsed() {
                    let (seam, mapper) = split_one(root, range.start_path(), false, *split_parent)?;
                    let default_range = Range::stamp(doc.revision(), seam.clone(), seam);
                    Ok(advance(state, doc, mapper, Some(default_range)))
                } else {
                    let (end_seam, m_end) = split_one(root, range.end_path(), true, *split_parent)?;
                    let start = m_end.map_path(range.start_path(), Bias::Left);
                    let (start_seam, m_start) = split_one(root, &start, false, *split_parent)?;
                    let end_seam = m_start.map_path(&end_seam, Bias::Right);
                    let mut mapper = m_end;
                    mapper.append_mapper(m_start);
                    let default_range = Range::stamp(doc.revision(), start_seam, end_seam);
                    Ok(advance(state, doc, mapper, Some(default_range)))
                }
            }
            Step::Mark {
                range,
                mark,
                action,
            } => {
                check_revision(range, state)?;
                let mut doc = state.document.clone();
                doc.bump_revision();
                let (mapper, (span_start, span_end)) = algorithms::apply_mark(
                    doc.root_mut(),
                    range.start_path(),
                    range.end_path(),
                    mark,
                    *action,
                )?;
                let default_range = Range::stamp(doc.revision(), span_start, span_end);
                Ok(advance(state, doc, mapper, Some(default_range)))
            }
            Step::Attribute {
                pos,
                action,
                key,
                value,
            } => {
                if pos.revision() != state.document.revision() {
                    return Err(EditorError::Model(
                        "attribute step position does not belong to the current document".into(),
                    ));
                }
                let mut doc = state.document.clone();
                doc.bump_revision();
                let node = node_at_mut(doc.root_mut(), pos.path())?;
                let Node::Element(el) = node else {
                    return Err(EditorError::TypeAssertion(format!(
                        "attribute target at {:?} is not an element",
                        pos.path()
                    )));
                };
                match action {
                    AttributeAction::Set => {
                        let value = value.clone().ok_or_else(|| {
                            EditorError::IllegalArgument(
                                "attribute set without a value".into(),
                            )
                        })?;
                        el.attrs.insert(key.clone(), value);
                    }
                    AttributeAction::Remove => {
                        el.attrs.remove(key);
                    }
                }
                el.dirty.add(DirtyKind::Node);
                let default_range =
                    Range::stamp(doc.revision(), pos.path().clone(), pos.path().clone());
                Ok(advance(state, doc, RangeMapper::new(), Some(default_range)))
            }
            Step::Selection { selection } => {
                let mut next = state.clone();
                next.selection = selection.rebase(&state.document);
                Ok(StepResult {
                    state: next,
                    mapper: RangeMapper::new(),
                    default_range: None,
                })
            }
            Step::Config { key, value } => {
                let mut next = state.clone();
                next.config.insert(key.clone(), value.clone());
                Ok(StepResult {
                    state: next,
                    mapper: RangeMapper::new(),
                    default_range: None,
                })
            }
            Step::State { manip } => Ok(StepResult {
                state: manip(state),
                mapper: RangeMapper::new(),
                default_range: None,
            }),
            Step::Plugin { configs } => {
                let mut next = state.clone();
                next.plugins = configs.clone();
                Ok(StepResult {
                    state: next,
                    mapper: RangeMapper::new(),
                    default_range: None,
                })
            }
        }
    }
}

fn split_one(
    root: &mut ElementNode,
    path: &Path,
    keep_right: bool,
    split_parent: bool,
) -> Result<(Path, RangeMapper), EditorError> {
    if split_parent {
        algorithms::split(root, path, keep_right)
    } else {
        algorithms::split_text(root, path, keep_right)
    }
}

fn check_revision(range: &Range, state: &State) -> Result<(), EditorError> {
    if range.revision() != state.document.revision() {
        return Err(EditorError::Model(
            "step range does not belong to the current document revision".into(),
        ));
    }
    Ok(())
}

/// Assemble the post-step state: swap the document in and carry the
/// selection across by mapping it through the step's rewrite, then
/// clamping it onto the new tree.
fn advance(
    state: &State,
    doc: Document,
    mapper: RangeMapper,
    default_range: Option<Range>,
) -> StepResult {
    let mut next = state.clone();
    let mut selection = next.selection.clone();
    for range in &mut selection.ranges {
        let (start, end) = mapper.map_range_paths(
            range.start_path(),
            range.end_path(),
            RangeMapConfig {
                start_bias: Bias::Right,
                end_bias: Bias::Right,
            },
        );
        *range = Range::stamp(doc.revision(), start, end);
    }
    next.selection = selection.rebase(&doc);
    next.document = doc;
    StepResult {
        state: next,
        mapper,
        default_range,
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step::{}", self.kind())
    }
}
