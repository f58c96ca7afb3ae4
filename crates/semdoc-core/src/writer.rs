//! Pure export to an HTML-like string: editor-internal attributes are
//! stripped, marked text is wrapped in the registered mark tags, and
//! inline components render in static (non-live) mode.

use crate::errors::EditorError;
use crate::inline::InlineComponentsRegistry;
use crate::marks::MarksRegistry;
use crate::node::{ElementNode, Node};
use crate::state::State;

const INTERNAL_ATTR_PREFIX: &str = "data-editor-";
const VOID_KINDS: &[&str] = &["br", "hr"];

pub fn write_exported_document(state: &State) -> Result<String, EditorError> {
    let mut out = String::new();
    write_element(
        state.document.root(),
        &state.marks_registry,
        &state.inline_components_registry,
        &mut out,
    )?;
    Ok(out)
}

pub fn write_exported_html(
    node: &Node,
    marks: &MarksRegistry,
    components: &InlineComponentsRegistry,
) -> Result<String, EditorError> {
    let mut out = String::new();
    write_node(node, marks, components, &mut out)?;
    Ok(out)
}

fn write_node(
    node: &Node,
    marks: &MarksRegistry,
    components: &InlineComponentsRegistry,
    out: &mut String,
) -> Result<(), EditorError> {
    match node {
        Node::Element(el) => write_element(el, marks, components, out),
        Node::Text(text) => {
            // Nest mark tags outermost-first by registered priority;
            // unregistered marks carry no tag of their own.
            let mut active: Vec<&str> = Vec::new();
            let mut sorted: Vec<_> = text.marks.iter().collect();
            sorted.sort_by_key(|mark| {
                marks
                    .lookup(&mark.name)
                    .map(|spec| spec.priority)
                    .unwrap_or(usize::MAX)
            });
            for mark in sorted {
                if let Some(spec) = marks.lookup(&mark.name) {
                    out.push('<');
                    out.push_str(&spec.write_tag);
                    out.push('>');
                    active.push(&spec.write_tag);
                }
            }
            out.push_str(&html_escape::encode_text(&text.text));
            for tag in active.iter().rev() {
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            Ok(())
        }
        Node::InlineComponent(component) => {
            let spec = components.lookup(&component.spec).ok_or_else(|| {
                EditorError::Writer(format!(
                    "inline component spec '{}' is not registered",
                    component.spec
                ))
            })?;
            let props = serde_json::to_string(&component.props)
                .map_err(|err| EditorError::Writer(format!("unserializable props: {err}")))?;
            out.push('<');
            out.push_str(&spec.tag);
            out.push_str(" data-component=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(&spec.name));
            out.push_str("\" data-props=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(&props));
            out.push_str("\">");
            for child in &component.children {
                write_node(child, marks, components, out)?;
            }
            out.push_str("</");
            out.push_str(&spec.tag);
            out.push('>');
            Ok(())
        }
    }
}

fn write_element(
    el: &ElementNode,
    marks: &MarksRegistry,
    components: &InlineComponentsRegistry,
    out: &mut String,
) -> Result<(), EditorError> {
    out.push('<');
    out.push_str(&el.kind);
    for (key, value) in &el.attrs {
        if key.starts_with(INTERNAL_ATTR_PREFIX) {
            continue;
        }
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    if el.children.is_empty() && VOID_KINDS.contains(&el.kind.as_str()) {
        out.push_str("/>");
        return Ok(());
    }
    out.push('>');
    for child in &el.children {
        write_node(child, marks, components, out)?;
    }
    out.push_str("</");
    out.push_str(&el.kind);
    out.push('>');
    Ok(())
}
