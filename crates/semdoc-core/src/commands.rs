use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use crate::errors::EditorError;
use crate::marks::Mark;
use crate::node::{ElementNode, Node, node_at};
use crate::position::{Path, Position};
use crate::range::{Range, find_nodes_in_range};
use crate::selection::Selection;
use crate::state::State;
use crate::transaction::{NodeHandle, Transaction};

/// A named editing entry point. `can_execute` gates availability (e.g.
/// toolbar enablement) without mutating anything; `execute` builds steps
/// on the transaction it is handed.
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_execute(&self, state: &State, args: Option<&Value>) -> bool {
        let _ = (state, args);
        true
    }

    fn execute(&self, tx: &mut Transaction, args: Option<Value>) -> Result<(), EditorError>;
}

#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last registration wins; plugins may shadow a core command.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name().to_string(), command);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The command table every fresh state starts with.
pub fn default_commands() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(InsertTextCommand));
    registry.register(Arc::new(DeleteSelectionCommand));
    registry.register(Arc::new(AddMarkCommand));
    registry.register(Arc::new(RemoveMarkCommand));
    registry.register(Arc::new(MakeListCommand));
    registry.register(Arc::new(UnindentListCommand));
    registry.register(Arc::new(SetPropertyCommand));
    registry.register(Arc::new(RemovePropertyCommand));
    registry
}

fn arg_str<'a>(args: Option<&'a Value>, key: &str) -> Result<&'a str, EditorError> {
    args.and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .ok_or_else(|| EditorError::IllegalArgument(format!("missing string argument '{key}'")))
}

fn arg_path(args: Option<&Value>, key: &str) -> Result<Path, EditorError> {
    let value = args
        .and_then(|v| v.get(key))
        .and_then(Value::as_array)
        .ok_or_else(|| EditorError::IllegalArgument(format!("missing path argument '{key}'")))?;
    value
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| EditorError::IllegalArgument(format!("non-numeric entry in '{key}'")))
        })
        .collect()
}

fn last_range(selection: &Selection) -> Result<Range, EditorError> {
    selection
        .last_range()
        .cloned()
        .ok_or_else(|| EditorError::MisbehavedSelection("selection has no range".into()))
}

/// Insert text at the last selection range, carrying the selection's
/// sticky marks, and leave the caret after the inserted run.
pub struct InsertTextCommand;

impl Command for InsertTextCommand {
    fn name(&self) -> &'static str {
        "insert-text"
    }

    fn can_execute(&self, state: &State, _args: Option<&Value>) -> bool {
        state.selection.is_well_behaved()
    }

    fn execute(&self, tx: &mut Transaction, args: Option<Value>) -> Result<(), EditorError> {
        let text = arg_str(args.as_ref(), "text")?.to_string();
        let selection = tx.current_selection()?;
        let range = last_range(&selection)?;
        let result = tx.insert_text(range, &text, selection.active_marks.clone())?;
        let mut after = tx.current_selection()?;
        after.clear_ranges();
        after.add_range(result.collapse(false));
        tx.set_selection(after)?;
        Ok(())
    }
}

/// Delete the content of the last selection range and collapse the caret
/// at the seam.
pub struct DeleteSelectionCommand;

impl Command for DeleteSelectionCommand {
    fn name(&self) -> &'static str {
        "delete-selection"
    }

    fn can_execute(&self, state: &State, _args: Option<&Value>) -> bool {
        state
            .selection
            .last_range()
            .is_some_and(|range| !range.is_collapsed())
    }

    fn execute(&self, tx: &mut Transaction, _args: Option<Value>) -> Result<(), EditorError> {
        let selection = tx.current_selection()?;
        let range = last_range(&selection)?;
        let result = tx.delete(range)?;
        let mut after = tx.current_selection()?;
        after.clear_ranges();
        after.add_range(result.collapse(true));
        tx.set_selection(after)?;
        Ok(())
    }
}

fn mark_from_args(args: Option<&Value>) -> Result<Mark, EditorError> {
    let name = arg_str(args, "mark")?.to_string();
    let mut attributes = BTreeMap::new();
    if let Some(map) = args
        .and_then(|v| v.get("attributes"))
        .and_then(Value::as_object)
    {
        for (key, value) in map {
            if let Some(value) = value.as_str() {
                attributes.insert(key.clone(), value.to_string());
            }
        }
    }
    Ok(Mark { name, attributes })
}

/// Apply a mark to the last range, or make it sticky at a collapsed
/// caret.
pub struct AddMarkCommand;

impl Command for AddMarkCommand {
    fn name(&self) -> &'static str {
        "add-mark"
    }

    fn can_execute(&self, state: &State, args: Option<&Value>) -> bool {
        state.selection.is_well_behaved()
            && arg_str(args, "mark")
                .map(|name| state.marks_registry.is_registered(name))
                .unwrap_or(false)
    }

    fn execute(&self, tx: &mut Transaction, args: Option<Value>) -> Result<(), EditorError> {
        let mark = mark_from_args(args.as_ref())?;
        let selection = tx.current_selection()?;
        let range = last_range(&selection)?;
        if range.is_collapsed() {
            return tx.add_mark_to_selection(mark);
        }
        let result = tx.add_mark(range, mark)?;
        tx.select_range(result)?;
        Ok(())
    }
}

pub struct RemoveMarkCommand;

impl Command for RemoveMarkCommand {
    fn name(&self) -> &'static str {
        "remove-mark"
    }

    fn can_execute(&self, state: &State, args: Option<&Value>) -> bool {
        state.selection.is_well_behaved() && arg_str(args, "mark").is_ok()
    }

    fn execute(&self, tx: &mut Transaction, args: Option<Value>) -> Result<(), EditorError> {
        let mark = mark_from_args(args.as_ref())?;
        let selection = tx.current_selection()?;
        let range = last_range(&selection)?;
        if range.is_collapsed() {
            return tx.remove_mark_from_selection(&mark.name);
        }
        let result = tx.remove_mark(range, mark)?;
        tx.select_range(result)?;
        Ok(())
    }
}

/// Set an attribute on the element at the given path.
pub struct SetPropertyCommand;

impl Command for SetPropertyCommand {
    fn name(&self) -> &'static str {
        "set-property"
    }

    fn can_execute(&self, state: &State, args: Option<&Value>) -> bool {
        arg_path(args, "path")
            .ok()
            .and_then(|path| state.document.node_at(&path))
            .is_some_and(Node::is_element)
    }

    fn execute(&self, tx: &mut Transaction, args: Option<Value>) -> Result<(), EditorError> {
        let path = arg_path(args.as_ref(), "path")?;
        let key = arg_str(args.as_ref(), "key")?.to_string();
        let value = arg_str(args.as_ref(), "value")?.to_string();
        let handle = {
            let doc = tx.current_document()?;
            NodeHandle::new(doc, path)?
        };
        tx.set_property(&handle, key, value)
    }
}

pub struct RemovePropertyCommand;

impl Command for RemovePropertyCommand {
    fn name(&self) -> &'static str {
        "remove-property"
    }

    fn can_execute(&self, state: &State, args: Option<&Value>) -> bool {
        arg_path(args, "path")
            .ok()
            .and_then(|path| state.document.node_at(&path))
            .is_some_and(Node::is_element)
    }

    fn execute(&self, tx: &mut Transaction, args: Option<Value>) -> Result<(), EditorError> {
        let path = arg_path(args.as_ref(), "path")?;
        let key = arg_str(args.as_ref(), "key")?.to_string();
        let handle = {
            let doc = tx.current_document()?;
            NodeHandle::new(doc, path)?
        };
        tx.remove_property(&handle, key)
    }
}

fn is_list_container(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|el| el.kind == "ul" || el.kind == "ol")
}

fn is_list_item(node: &Node) -> bool {
    node.as_element().is_some_and(|el| el.kind == "li")
}

/// Longest prefix of `path` (optionally including `path` itself) whose
/// node matches the predicate.
fn ancestor_path_matching<F>(
    root: &ElementNode,
    path: &[usize],
    include_self: bool,
    predicate: F,
) -> Option<Path>
where
    F: Fn(&Node) -> bool,
{
    let mut len = if include_self {
        path.len()
    } else {
        path.len().saturating_sub(1)
    };
    while len >= 1 {
        let candidate = &path[..len];
        if node_at(root, candidate).is_some_and(&predicate) {
            return Some(candidate.to_vec());
        }
        len -= 1;
    }
    None
}

fn common_prefix(a: &[usize], b: &[usize]) -> Path {
    a.iter()
        .zip(b.iter())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| *x)
        .collect()
}

/// Wrap the blocks covered by the selection into a list. Splits the
/// selection out to the nearest block ancestor, turns each covered block
/// into a list item (contiguous inline runs share one), and replaces the
/// split-off span with the list.
pub struct MakeListCommand;

impl Command for MakeListCommand {
    fn name(&self) -> &'static str {
        "make-list"
    }

    fn can_execute(&self, state: &State, _args: Option<&Value>) -> bool {
        state.selection.is_well_behaved()
    }

    fn execute(&self, tx: &mut Transaction, args: Option<Value>) -> Result<(), EditorError> {
        let kind = args
            .as_ref()
            .and_then(|v| v.get("kind"))
            .and_then(Value::as_str)
            .unwrap_or("ul")
            .to_string();
        if kind != "ul" && kind != "ol" {
            return Err(EditorError::IllegalArgument(format!(
                "unknown list kind '{kind}'"
            )));
        }

        let selection = tx.current_selection()?;
        let range = last_range(&selection)?;

        let limit = {
            let doc = tx.current_document()?;
            let mut ancestor = common_prefix(
                &range.start_path()[..range.start_path().len().saturating_sub(1)],
                &range.end_path()[..range.end_path().len().saturating_sub(1)],
            );
            while !ancestor.is_empty() {
                match node_at(doc.root(), &ancestor) {
                    Some(node) if node.is_block() => break,
                    _ => {
                        ancestor.pop();
                    }
                }
            }
            NodeHandle::new(doc, ancestor)?
        };

        let split_range = tx.split_range_until_elements(range, &limit, &limit, false)?;

        let covered: Vec<Node> = {
            let doc = tx.current_document()?;
            let parent = &split_range.start_path()[..split_range.start_path().len() - 1];
            let from = split_range.start_path()[split_range.start_path().len() - 1];
            let to = split_range.end_path()[split_range.end_path().len() - 1];
            (from..to)
                .filter_map(|ix| {
                    let mut path = parent.to_vec();
                    path.push(ix);
                    node_at(doc.root(), &path).cloned()
                })
                .collect()
        };

        let mut items: Vec<Node> = Vec::new();
        let mut inline_run: Vec<Node> = Vec::new();
        for node in covered {
            if node.is_block() {
                if !inline_run.is_empty() {
                    items.push(Node::element("li", std::mem::take(&mut inline_run)));
                }
                items.push(Node::element("li", vec![node]));
            } else {
                inline_run.push(node);
            }
        }
        if !inline_run.is_empty() {
            items.push(Node::element("li", inline_run));
        }
        if items.is_empty() {
            items.push(Node::element("li", vec![Node::text("")]));
        }

        let list = Node::element(kind, items);
        let result = tx.insert_nodes(split_range, vec![list])?;
        let mut after = tx.current_selection()?;
        after.clear_ranges();
        after.add_range(result.collapse(false));
        tx.set_selection(after)?;
        Ok(())
    }
}

/// Lift nested list items one level: each selected item moves out of its
/// inner list into the outer list right after its former grandparent
/// item, carrying any following siblings along as a fresh sublist.
pub struct UnindentListCommand;

impl UnindentListCommand {
    /// List items the command operates on: items covered by the range plus
    /// the item the range sits inside, keeping only items nested below
    /// another item and dropping ones related to an already-kept path.
    fn target_items(state_root: &ElementNode, range: &Range) -> Vec<Path> {
        let mut candidates: Vec<Path> = Vec::new();
        for boundary in [range.start_path(), range.end_path()] {
            let node_path = &boundary[..boundary.len().saturating_sub(1)];
            if let Some(li) = ancestor_path_matching(state_root, node_path, true, is_list_item) {
                if !candidates.contains(&li) {
                    candidates.push(li);
                }
            }
        }
        candidates.sort_by_key(Path::len);
        candidates
    }

    fn is_nested(root: &ElementNode, li_path: &[usize]) -> bool {
        ancestor_path_matching(root, li_path, false, is_list_item).is_some()
    }
}

impl Command for UnindentListCommand {
    fn name(&self) -> &'static str {
        "unindent-list"
    }

    fn can_execute(&self, state: &State, _args: Option<&Value>) -> bool {
        let Some(range) = state.selection.last_range() else {
            return false;
        };
        let root = state.document.root();
        let mut items = Self::target_items(root, range);
        items.extend(find_nodes_in_range(&state.document, range, is_list_item));
        items.iter().any(|li| Self::is_nested(root, li))
    }

    fn execute(&self, tx: &mut Transaction, _args: Option<Value>) -> Result<(), EditorError> {
        let selection = tx.current_selection()?;
        let range = last_range(&selection)?;

        let (items, revision) = {
            let doc = tx.current_document()?;
            let root = doc.root();
            let mut items = Self::target_items(root, &range);
            for li in find_nodes_in_range(doc, &range, is_list_item) {
                if !items.contains(&li) {
                    items.push(li);
                }
            }
            items.retain(|li| Self::is_nested(root, li));
            // Related-chunk dedup: keep the shallowest of each nested
            // family; descendants move along with it.
            items.sort_by_key(Path::len);
            let mut kept: Vec<Path> = Vec::new();
            for li in items {
                if !kept.iter().any(|base| li.starts_with(base)) {
                    kept.push(li);
                }
            }
            (kept, doc.revision())
        };

        if items.is_empty() {
            return Err(EditorError::Selection(
                "the selection is not inside a nested list".into(),
            ));
        }

        for li_path in items {
            let li_handle = tx.in_working_copy(&NodeHandle {
                revision,
                path: li_path,
            })?;

            let plan = {
                let doc = tx.current_document()?;
                let root = doc.root();
                let li_path = &li_handle.path;
                let Some(parent_list) =
                    ancestor_path_matching(root, li_path, false, is_list_container)
                else {
                    continue;
                };
                let Some(grand_li) =
                    ancestor_path_matching(root, &parent_list, false, is_list_item)
                else {
                    continue;
                };
                if ancestor_path_matching(root, &grand_li, false, is_list_container).is_none() {
                    continue;
                }
                let Some(Node::Element(parent_el)) = node_at(root, &parent_list) else {
                    return Err(EditorError::TypeAssertion(
                        "list container is not an element".into(),
                    ));
                };
                let li_ix = li_path[li_path.len() - 1];
                if li_ix >= parent_el.children.len() {
                    return Err(EditorError::IllegalExecutionState(
                        "list item index out of bounds".into(),
                    ));
                }
                let li_node = parent_el.children[li_ix].clone();
                let followers: Vec<Node> = parent_el.children[li_ix + 1..].to_vec();
                let parent_kind = parent_el.kind.clone();
                let parent_max = parent_el.children.len();
                (
                    parent_list,
                    grand_li,
                    li_ix,
                    li_node,
                    followers,
                    parent_kind,
                    parent_max,
                    doc.revision(),
                )
            };
            let (parent_list, grand_li, li_ix, li_node, followers, parent_kind, parent_max, rev) =
                plan;

            // Detach the item and everything after it from the inner list.
            let mut del_start = parent_list.clone();
            del_start.push(li_ix);
            let mut del_end = parent_list.clone();
            del_end.push(parent_max);
            tx.delete(Range::stamp(rev, del_start, del_end))?;

            // Followers become a sublist under the lifted item.
            let mut new_li = match li_node {
                Node::Element(el) => el,
                _ => {
                    return Err(EditorError::TypeAssertion(
                        "list item is not an element".into(),
                    ));
                }
            };
            if !followers.is_empty() {
                new_li
                    .children
                    .push(Node::element(parent_kind.clone(), followers));
            }

            let grand_handle = tx.in_working_copy(&NodeHandle {
                revision: rev,
                path: grand_li,
            })?;
            let insert_pos = {
                let mut path = grand_handle.path.clone();
                if let Some(last) = path.last_mut() {
                    *last += 1;
                }
                Position::stamp(grand_handle.revision, path)
            };
            tx.insert_at_position(insert_pos, vec![Node::Element(new_li)])?;

            // The inner list goes away once it holds nothing.
            let parent_handle = tx.in_working_copy(&NodeHandle {
                revision: rev,
                path: parent_list,
            })?;
            let empty = {
                let doc = tx.current_document()?;
                node_at(doc.root(), &parent_handle.path)
                    .and_then(Node::as_element)
                    .is_some_and(|el| el.children.is_empty())
            };
            if empty {
                tx.delete_node(&parent_handle)?;
            }
        }
        Ok(())
    }
}
