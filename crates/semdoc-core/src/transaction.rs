use std::sync::Arc;

use tracing::debug;

use crate::algorithms::MarkAction;
use crate::datastore::Datastore;
use crate::errors::EditorError;
use crate::mapper::{Bias, RangeMapConfig, RangeMapper};
use crate::marks::{Mark, MarkSet, MarkSpec, MarksManager};
use crate::inline::InlineComponentSpec;
use crate::node::{Document, ElementNode, Node, TextNode, max_offset_at, node_at};
use crate::position::{Path, Position, Revision};
use crate::range::{Range, confined_path_ranges, covered_node_paths};
use crate::selection::Selection;
use crate::state::{PluginConfig, State, WidgetSpec};
use crate::commands::Command;
use crate::step::{AttributeAction, Step, StepResult};

/// A reference to a node captured against some revision: its child-index
/// path plus the revision it was observed in. Commands hold handles across
/// steps and resolve them through `Transaction::in_working_copy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    pub revision: Revision,
    pub path: Path,
}

impl NodeHandle {
    pub fn new(doc: &Document, path: Path) -> Result<Self, EditorError> {
        if !doc.contains_path(&path) {
            return Err(EditorError::Model(format!("no node at {path:?}")));
        }
        Ok(Self {
            revision: doc.revision(),
            path,
        })
    }

    /// Handle to the document root.
    pub fn root(doc: &Document) -> Self {
        Self {
            revision: doc.revision(),
            path: Vec::new(),
        }
    }
}

/// The unit of work: accumulates steps against a base state, applies them
/// incrementally and memoizes per-step results, and exposes the editing
/// primitives commands are written against. Dispatching consumes the
/// transaction, so a dispatched transaction cannot be mutated or
/// re-dispatched.
pub struct Transaction {
    initial_state: Arc<State>,
    steps: Vec<Step>,
    step_cache: Vec<StepResult>,
    mapper: RangeMapper,
    rdf_invalid: bool,
    marks_invalid: bool,
    will_create_snapshot: bool,
    should_focus: bool,
}

impl Transaction {
    pub fn new(state: Arc<State>) -> Self {
        Self {
            initial_state: state,
            steps: Vec::new(),
            step_cache: Vec::new(),
            mapper: RangeMapper::new(),
            rdf_invalid: false,
            marks_invalid: false,
            will_create_snapshot: false,
            should_focus: false,
        }
    }

    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    pub fn size(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn should_focus(&self) -> bool {
        self.should_focus
    }

    /// Ask the view to re-focus the editing surface after dispatch.
    pub fn focus(&mut self) {
        self.should_focus = true;
    }

    /// Flag the resulting state for retention in the undo history.
    pub fn create_snapshot(&mut self) {
        self.will_create_snapshot = true;
    }

    /// Produce the working state: fold any not-yet-applied steps onto the
    /// last cached state, composing their mappers into the
    /// transaction-wide mapper, then lazily rebuild the derived indexes
    /// that were invalidated. Repeatable; resumes from the cache instead
    /// of recomputing from scratch.
    pub fn apply(&mut self) -> Result<&State, EditorError> {
        while self.step_cache.len() < self.steps.len() {
            let ix = self.step_cache.len();
            let cur: &State = self
                .step_cache
                .last()
                .map(|r| &r.state)
                .unwrap_or(&*self.initial_state);
            let result = self.steps[ix].get_result(cur)?;
            self.mapper.append_mapper(result.mapper.clone());
            self.step_cache.push(result);
        }

        if let Some(last) = self.step_cache.last_mut() {
            let document_changed =
                last.state.document.revision() != self.initial_state.document.revision();
            let base_changed = last.state.base_iri != self.initial_state.base_iri;
            if document_changed || base_changed {
                if self.rdf_invalid {
                    debug!("recalculating datastore");
                    last.state.datastore =
                        Datastore::from_parse(last.state.document.root(), &last.state.base_iri);
                    self.rdf_invalid = false;
                }
                if self.marks_invalid {
                    debug!("recalculating marks manager");
                    last.state.marks_manager =
                        MarksManager::from_document(last.state.document.root());
                    self.marks_invalid = false;
                }
            }
            if document_changed && self.will_create_snapshot {
                last.state.previous = Some(Arc::clone(&self.initial_state));
            }
        }
        Ok(self.peek_state())
    }

    /// Latest state without driving the step fold; valid right after
    /// `apply`.
    fn peek_state(&self) -> &State {
        self.step_cache
            .last()
            .map(|r| &r.state)
            .unwrap_or(&*self.initial_state)
    }

    fn current_revision(&self) -> Revision {
        self.peek_state().document.revision()
    }

    pub fn working_copy(&mut self) -> Result<&State, EditorError> {
        self.apply()
    }

    pub fn current_document(&mut self) -> Result<&Document, EditorError> {
        Ok(&self.apply()?.document)
    }

    pub fn current_selection(&mut self) -> Result<Selection, EditorError> {
        Ok(self.apply()?.selection.clone())
    }

    pub fn add_step(&mut self, step: Step) {
        if step.invalidates_rdf() {
            self.rdf_invalid = true;
        }
        if step.invalidates_marks() {
            self.marks_invalid = true;
        }
        self.steps.push(step);
    }

    fn add_and_commit_operation_step(&mut self, step: Step) -> Result<Range, EditorError> {
        if !step.is_operation() {
            return Err(EditorError::IllegalArgument(format!(
                "step '{}' is not an operation step",
                step.kind()
            )));
        }
        self.add_step(step);
        self.apply()?;
        self.step_cache
            .last()
            .and_then(|r| r.default_range.clone())
            .ok_or_else(|| {
                EditorError::IllegalExecutionState(
                    "operation step produced no default range".into(),
                )
            })
    }

    /// Discard all accumulated steps; the base state is untouched.
    pub fn rollback(&mut self) -> Arc<State> {
        self.steps.clear();
        self.step_cache.clear();
        self.mapper = RangeMapper::new();
        self.rdf_invalid = false;
        self.marks_invalid = false;
        Arc::clone(&self.initial_state)
    }

    /// Push a step that swaps in a state from the history chain,
    /// `steps_back` snapshots behind the base state.
    pub fn restore_snapshot(&mut self, steps_back: usize) {
        let mut target: &State = &self.initial_state;
        let mut walked = 0;
        while walked < steps_back {
            match target.previous.as_deref() {
                Some(prev) => {
                    target = prev;
                    walked += 1;
                }
                None => break,
            }
        }
        debug!(steps_back = walked, "restoring snapshot");
        let restored = target.clone();
        self.add_step(Step::State {
            manip: Arc::new(move |_| restored.clone()),
        });
    }

    // ------------------------------------------------------------------
    // Mapping across revisions

    /// Composed mapper from the state with `revision` to the working
    /// state. The cache is scanned newest-first.
    fn mapper_from(&self, revision: Revision) -> Result<RangeMapper, EditorError> {
        if revision == self.initial_state.document.revision() {
            return Ok(self.mapper.clone());
        }
        for ix in (0..self.step_cache.len()).rev() {
            if self.step_cache[ix].state.document.revision() == revision {
                let mut mapper = RangeMapper::new();
                for result in &self.step_cache[ix + 1..] {
                    mapper.append_mapper(result.mapper.clone());
                }
                return Ok(mapper);
            }
        }
        Err(EditorError::Model(
            "revision did not arise from this transaction".into(),
        ))
    }

    pub fn map_position(&mut self, pos: &Position, bias: Bias) -> Result<Position, EditorError> {
        self.apply()?;
        let current = self.current_revision();
        if pos.revision() == current {
            return Ok(pos.clone());
        }
        let mapper = self.mapper_from(pos.revision())?;
        Ok(Position::stamp(current, mapper.map_path(pos.path(), bias)))
    }

    pub fn map_range(
        &mut self,
        range: &Range,
        config: RangeMapConfig,
    ) -> Result<Range, EditorError> {
        self.apply()?;
        let current = self.current_revision();
        if range.revision() == current {
            return Ok(range.clone());
        }
        let mapper = self.mapper_from(range.revision())?;
        let (start, end) = mapper.map_range_paths(range.start_path(), range.end_path(), config);
        Ok(Range::stamp(current, start, end))
    }

    fn map_to_current_range(&mut self, range: &Range) -> Result<Range, EditorError> {
        self.map_range(range, RangeMapConfig::default())
    }

    /// Resolve a node captured against an earlier revision of this
    /// transaction (or its base) to its path in the working state.
    pub fn in_working_copy(&mut self, handle: &NodeHandle) -> Result<NodeHandle, EditorError> {
        self.apply()?;
        let current = self.current_revision();
        if handle.path.is_empty() {
            return Ok(NodeHandle {
                revision: current,
                path: Vec::new(),
            });
        }
        let path = if handle.revision == current {
            handle.path.clone()
        } else {
            let mapper = self.mapper_from(handle.revision).map_err(|_| {
                EditorError::Model(
                    "cannot trace a node that did not come from this transaction".into(),
                )
            })?;
            mapper.map_path(&handle.path, Bias::Right)
        };
        if node_at(self.peek_state().document.root(), &path).is_none() {
            return Err(EditorError::Model(format!(
                "node captured at {:?} no longer resolves (mapped to {path:?})",
                handle.path
            )));
        }
        Ok(NodeHandle {
            revision: current,
            path,
        })
    }

    // ------------------------------------------------------------------
    // Editing primitives

    pub fn insert_text(
        &mut self,
        range: Range,
        text: &str,
        marks: MarkSet,
    ) -> Result<Range, EditorError> {
        let node = Node::Text(TextNode::with_marks(text, marks));
        self.insert_nodes(range, vec![node])
    }

    pub fn insert_nodes(&mut self, range: Range, nodes: Vec<Node>) -> Result<Range, EditorError> {
        let range = self.map_to_current_range(&range)?;
        let result = self.add_and_commit_operation_step(Step::Replace { range, nodes })?;
        self.create_snapshot();
        Ok(result)
    }

    pub fn insert_at_position(
        &mut self,
        pos: Position,
        nodes: Vec<Node>,
    ) -> Result<Range, EditorError> {
        let pos = self.map_position(&pos, Bias::Right)?;
        self.create_snapshot();
        self.insert_nodes(Range::collapsed(pos), nodes)
    }

    /// Replace the content of `range` with nothing, splitting text at the
    /// boundaries so no partial nodes survive.
    pub fn delete(&mut self, range: Range) -> Result<Range, EditorError> {
        let range = self.map_to_current_range(&range)?;
        let result = self.add_and_commit_operation_step(Step::Replace {
            range,
            nodes: Vec::new(),
        })?;
        self.create_snapshot();
        Ok(result)
    }

    pub fn delete_node(&mut self, handle: &NodeHandle) -> Result<Range, EditorError> {
        let handle = self.in_working_copy(handle)?;
        let range = around_path(self.current_revision(), &handle.path)?;
        self.create_snapshot();
        self.delete(range)
    }

    pub fn remove_nodes(&mut self, range: Range) -> Result<Range, EditorError> {
        let range = self.map_to_current_range(&range)?;
        let result = self.add_and_commit_operation_step(Step::Remove { range })?;
        self.create_snapshot();
        Ok(result)
    }

    /// Replace the node behind `handle` with `nodes`.
    pub fn replace_node(
        &mut self,
        handle: &NodeHandle,
        nodes: Vec<Node>,
    ) -> Result<Range, EditorError> {
        let handle = self.in_working_copy(handle)?;
        let range = around_path(self.current_revision(), &handle.path)?;
        self.insert_nodes(range, nodes)
    }

    /// Move the content of `range` to `target`: materialize boundaries at
    /// both ends, collect the covered nodes, delete them, and reinsert
    /// them at the target mapped past the deletion. Returns the range
    /// covering the moved content at its destination.
    pub fn move_to_position(
        &mut self,
        range: Range,
        target: Position,
    ) -> Result<Range, EditorError> {
        let range = self.map_to_current_range(&range)?;
        let target = self.map_position(&target, Bias::Left)?;
        if target.is_strictly_between(range.start_path(), range.end_path()) {
            return Err(EditorError::Assertion(
                "cannot move a range to a position within that range".into(),
            ));
        }
        let from = self.current_revision();

        self.add_step(Step::Split {
            range: range.clone(),
            split_parent: false,
        });
        self.apply()?;

        let split_range = {
            let mapper = self.mapper_from(from)?;
            let (start, end) = mapper.map_range_paths(
                range.start_path(),
                range.end_path(),
                RangeMapConfig {
                    start_bias: Bias::Right,
                    end_bias: Bias::Left,
                },
            );
            Range::stamp(self.current_revision(), start, end)
        };

        let nodes: Vec<Node> = {
            let root = self.peek_state().document.root();
            let pairs =
                confined_path_ranges(root, split_range.start_path(), split_range.end_path())?;
            covered_node_paths(&pairs)
                .iter()
                .filter_map(|path| node_at(root, path).cloned())
                .collect()
        };

        self.add_step(Step::Replace {
            range: split_range,
            nodes: Vec::new(),
        });
        self.apply()?;

        let target = self.map_position(&target, Bias::Left)?;
        let result = self.add_and_commit_operation_step(Step::Replace {
            range: Range::collapsed(target),
            nodes,
        })?;
        self.create_snapshot();
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Splitting

    /// Split ancestors of `pos` until its parent satisfies `predicate`
    /// (called with the parent element and its path) or the root is
    /// reached. With `split_at_ends` false, boundary positions walk
    /// around their parent instead of splitting off empty halves.
    pub fn split_until<P>(
        &mut self,
        pos: Position,
        predicate: P,
        split_at_ends: bool,
    ) -> Result<Position, EditorError>
    where
        P: Fn(&ElementNode, &[usize]) -> bool,
    {
        let mut pos = self.map_position(&pos, Bias::Right)?;
        if self.parent_matches(&pos, &predicate)? {
            return self.execute_split(pos, split_at_ends, false, false);
        }
        while !self.parent_matches(&pos, &predicate)? {
            pos = self.execute_split(pos, split_at_ends, true, true)?;
        }
        self.create_snapshot();
        Ok(pos)
    }

    fn parent_matches<P>(&mut self, pos: &Position, predicate: &P) -> Result<bool, EditorError>
    where
        P: Fn(&ElementNode, &[usize]) -> bool,
    {
        self.apply()?;
        let root = self.peek_state().document.root();
        let mut parent_path = pos.parent_path();
        // A position inside text belongs, for splitting purposes, to the
        // element owning that text.
        if let Some(Node::Text(_)) = node_at(root, parent_path) {
            parent_path = &parent_path[..parent_path.len() - 1];
        }
        if parent_path.is_empty() {
            return Ok(true);
        }
        match node_at(root, parent_path) {
            Some(Node::Element(el)) => Ok(predicate(el, parent_path)),
            Some(_) => Ok(false),
            None => Err(EditorError::Model(format!(
                "split position parent {parent_path:?} not found"
            ))),
        }
    }

    /// Split ancestors of `pos` until reaching the element behind `limit`.
    pub fn split_until_element(
        &mut self,
        pos: Position,
        limit: &NodeHandle,
        split_at_ends: bool,
    ) -> Result<Position, EditorError> {
        self.create_snapshot();
        let limit = self.in_working_copy(limit)?;
        let limit_path = limit.path;
        self.split_until(
            pos,
            move |_, path| path == limit_path.as_slice(),
            split_at_ends,
        )
    }

    /// Split both ends of `range` until `start.parent == start_limit` and
    /// `end.parent == end_limit`. The resulting range fully contains the
    /// split-off elements.
    pub fn split_range_until_elements(
        &mut self,
        range: Range,
        start_limit: &NodeHandle,
        end_limit: &NodeHandle,
        split_at_ends: bool,
    ) -> Result<Range, EditorError> {
        let range = self.map_to_current_range(&range)?;
        let end_pos = self.split_until_element(range.end(), end_limit, split_at_ends)?;
        let start_pos = self.map_position(&range.start(), Bias::Right)?;
        let result_start = self.split_until_element(start_pos, start_limit, split_at_ends)?;
        let result_end = self.map_position(&end_pos, Bias::Right)?;
        Range::new(result_start, result_end)
    }

    fn execute_split(
        &mut self,
        pos: Position,
        split_at_ends: bool,
        split_parent: bool,
        wrap_around: bool,
    ) -> Result<Position, EditorError> {
        let pos = self.map_position(&pos, Bias::Right)?;
        if !split_at_ends {
            let parent_path = pos.parent_path().to_vec();
            let max = max_offset_at(self.peek_state().document.root(), &parent_path)?;
            let current = self.current_revision();
            if pos.offset() == 0 {
                return Ok(if !wrap_around || parent_path.is_empty() {
                    pos
                } else {
                    Position::stamp(current, parent_path)
                });
            }
            if pos.offset() == max {
                return Ok(if !wrap_around || parent_path.is_empty() {
                    pos
                } else {
                    let mut after = parent_path;
                    if let Some(last) = after.last_mut() {
                        *last += 1;
                    }
                    Position::stamp(current, after)
                });
            }
        }
        self.create_snapshot();
        let seam = self.add_and_commit_operation_step(Step::Split {
            range: Range::collapsed(pos),
            split_parent,
        })?;
        Ok(seam.start())
    }

    /// Replace the element behind `handle` by its children. With
    /// `ensure_block`, a `br` is inserted where removing the element edge
    /// would otherwise merge two inline runs.
    pub fn unwrap(&mut self, handle: &NodeHandle, ensure_block: bool) -> Result<Range, EditorError> {
        let handle = self.in_working_copy(handle)?;
        let children = {
            let root = self.peek_state().document.root();
            let Some(node) = node_at(root, &handle.path) else {
                return Err(EditorError::Assertion("could not find node to unwrap".into()));
            };
            let Node::Element(el) = node else {
                return Err(EditorError::Assertion("cannot unwrap a leaf node".into()));
            };
            el.children.clone()
        };
        let range = around_path(self.current_revision(), &handle.path)?;
        let result = self.add_and_commit_operation_step(Step::Replace {
            range,
            nodes: children,
        })?;

        if ensure_block {
            if self.needs_block_boundary(&result.end())? {
                let pos = self.map_position(&result.end(), Bias::Left)?;
                self.insert_at_position(pos, vec![Node::Element(ElementNode::new("br"))])?;
            }
            if self.needs_block_boundary(&result.start())? {
                let pos = self.map_position(&result.start(), Bias::Left)?;
                self.insert_at_position(pos, vec![Node::Element(ElementNode::new("br"))])?;
            }
        }

        self.create_snapshot();
        self.map_range(&result, RangeMapConfig::default())
    }

    fn needs_block_boundary(&mut self, pos: &Position) -> Result<bool, EditorError> {
        let pos = self.map_position(pos, Bias::Left)?;
        let doc = &self.peek_state().document;
        let before = pos.node_before(doc);
        let after = pos.node_after(doc);
        Ok(match (before, after) {
            (Some(before), Some(after)) => !before.is_block() && !after.is_block(),
            _ => false,
        })
    }

    // ------------------------------------------------------------------
    // Attributes, marks, selection

    pub fn set_property(
        &mut self,
        handle: &NodeHandle,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), EditorError> {
        let handle = self.in_working_copy(handle)?;
        let pos = Position::stamp(handle.revision, handle.path);
        self.add_step(Step::Attribute {
            pos,
            action: AttributeAction::Set,
            key: key.into(),
            value: Some(value.into()),
        });
        Ok(())
    }

    pub fn remove_property(
        &mut self,
        handle: &NodeHandle,
        key: impl Into<String>,
    ) -> Result<(), EditorError> {
        let handle = self.in_working_copy(handle)?;
        let pos = Position::stamp(handle.revision, handle.path);
        self.add_step(Step::Attribute {
            pos,
            action: AttributeAction::Remove,
            key: key.into(),
            value: None,
        });
        Ok(())
    }

    pub fn add_mark(&mut self, range: Range, mark: Mark) -> Result<Range, EditorError> {
        let range = self.map_to_current_range(&range)?;
        let result = self.add_and_commit_operation_step(Step::Mark {
            range,
            mark,
            action: MarkAction::Add,
        })?;
        self.create_snapshot();
        Ok(result)
    }

    pub fn remove_mark(&mut self, range: Range, mark: Mark) -> Result<Range, EditorError> {
        let range = self.map_to_current_range(&range)?;
        let result = self.add_and_commit_operation_step(Step::Mark {
            range,
            mark,
            action: MarkAction::Remove,
        })?;
        self.create_snapshot();
        Ok(result)
    }

    /// Sticky mark for the next insertion at a collapsed caret.
    pub fn add_mark_to_selection(&mut self, mark: Mark) -> Result<(), EditorError> {
        let mut selection = self.current_selection()?;
        selection.active_marks.insert(mark);
        self.add_step(Step::Selection { selection });
        self.create_snapshot();
        Ok(())
    }

    pub fn remove_mark_from_selection(&mut self, mark_name: &str) -> Result<(), EditorError> {
        let mut selection = self.current_selection()?;
        selection.active_marks.retain(|m| m.name != mark_name);
        self.add_step(Step::Selection { selection });
        self.create_snapshot();
        Ok(())
    }

    /// Set a new selection; returns whether it differed from the current
    /// one (an unchanged selection adds no step).
    pub fn set_selection(&mut self, selection: Selection) -> Result<bool, EditorError> {
        let current = self.apply()?;
        let rebased = selection.rebase(&current.document);
        let changed = !rebased.same_as(&current.selection);
        if changed {
            self.add_step(Step::Selection { selection: rebased });
        }
        Ok(changed)
    }

    pub fn select_range(&mut self, range: Range) -> Result<(), EditorError> {
        let range = self.map_to_current_range(&range)?;
        let mut selection = self.current_selection()?;
        selection.clear_ranges();
        selection.add_range(range);
        self.add_step(Step::Selection { selection });
        Ok(())
    }

    pub fn collapse_selection(&mut self, to_left: bool) -> Result<(), EditorError> {
        let mut selection = self.current_selection()?;
        if let Some(last) = selection.ranges.last_mut() {
            *last = last.collapse(to_left);
        }
        self.add_step(Step::Selection { selection });
        Ok(())
    }

    /// Collapsed selection at `offset` inside the node behind `handle`.
    pub fn collapse_in(&mut self, handle: &NodeHandle, offset: usize) -> Result<(), EditorError> {
        let handle = self.in_working_copy(handle)?;
        let mut selection = self.current_selection()?;
        let range = {
            let doc = &self.peek_state().document;
            Range::collapsed(Position::in_node(doc, &handle.path, offset)?)
        };
        selection.clear_ranges();
        selection.add_range(range);
        self.add_step(Step::Selection { selection });
        Ok(())
    }

    // ------------------------------------------------------------------
    // State-level edits

    /// Arbitrary state manipulation; the closure receives a fresh clone.
    pub fn edit_state<F>(&mut self, manip: F)
    where
        F: Fn(&mut State) + Send + Sync + 'static,
    {
        self.add_step(Step::State {
            manip: Arc::new(move |state| {
                let mut clone = state.clone();
                manip(&mut clone);
                clone
            }),
        });
    }

    pub fn set_config(&mut self, key: impl Into<String>, value: Option<String>) {
        self.add_step(Step::Config {
            key: key.into(),
            value,
        });
    }

    pub fn set_base_iri(&mut self, iri: impl Into<String>) {
        let iri = iri.into();
        self.rdf_invalid = true;
        self.edit_state(move |state| state.base_iri = iri.clone());
    }

    pub fn set_plugins(&mut self, configs: Vec<PluginConfig>) {
        self.add_step(Step::Plugin { configs });
    }

    pub fn register_command(&mut self, command: Arc<dyn Command>) {
        self.edit_state(move |state| state.commands.register(Arc::clone(&command)));
    }

    pub fn register_mark(&mut self, spec: MarkSpec) {
        self.edit_state(move |state| state.marks_registry.register_mark(spec.clone()));
    }

    pub fn register_inline_component(&mut self, spec: InlineComponentSpec) {
        self.edit_state(move |state| {
            state
                .inline_components_registry
                .register_component(spec.clone())
        });
    }

    pub fn register_widget(&mut self, spec: WidgetSpec) {
        self.edit_state(move |state| {
            state
                .widget_map
                .entry(spec.desired_location.clone())
                .or_default()
                .push(spec.clone());
        });
    }

    /// Consume the transaction and hand back the final state and the
    /// steps that produced it.
    pub(crate) fn finish(mut self) -> Result<(State, Vec<Step>, bool), EditorError> {
        self.apply()?;
        let state = match self.step_cache.pop() {
            Some(result) => result.state,
            None => (*self.initial_state).clone(),
        };
        Ok((state, self.steps, self.should_focus))
    }
}

fn around_path(revision: Revision, path: &Path) -> Result<Range, EditorError> {
    let Some((&last, parent)) = path.split_last() else {
        return Err(EditorError::IllegalArgument(
            "cannot build a range around the root".into(),
        ));
    };
    let mut start = parent.to_vec();
    start.push(last);
    let mut end = parent.to_vec();
    end.push(last + 1);
    Ok(Range::stamp(revision, start, end))
}
