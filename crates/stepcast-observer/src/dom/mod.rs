//! Arena-backed page model.
//!
//! A [`Document`] is a tree of element and text nodes addressed by
//! [`NodeId`]. It carries just enough live state (input values, checked
//! flags, selected options) for the observer to read what a browser would
//! expose, and can be built from a JSON snapshot.

mod selector;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ObserverError;

pub use selector::{Selector, SelectorList};

/// Index of a node in its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element node.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name (lowercase).
    pub tag: String,
    attrs: BTreeMap<String, String>,
    /// Live value of form controls.
    pub value: String,
    /// Live checked state of checkboxes and radios.
    pub checked: bool,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            value: String::new(),
            checked: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attrs.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Lowercased `type` attribute, empty when absent.
    pub fn input_type(&self) -> String {
        self.attr("type").unwrap_or_default().to_ascii_lowercase()
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// `input`, `textarea` or `select`.
    pub fn is_form_field(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Serialized form of a page, as loaded from JSON.
///
/// ```json
/// { "tag": "label", "attrs": { "for": "email" }, "children": ["Email"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text(String),
    Element(ElementSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
    /// Initial live value; defaults to the `value` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Initial checked state; defaults to presence of `checked`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

/// The page tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a `body` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Element(Element::new("body")),
            }],
        }
    }

    pub fn from_spec(root: &ElementSpec) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
        };
        doc.push_spec(None, &NodeSpec::Element(root.clone()));
        doc
    }

    pub fn from_json(json: &str) -> Result<Self, ObserverError> {
        let root: ElementSpec = serde_json::from_str(json)?;
        Ok(Self::from_spec(&root))
    }

    fn push_spec(&mut self, parent: Option<NodeId>, spec: &NodeSpec) -> NodeId {
        match spec {
            NodeSpec::Text(text) => self.push(parent, NodeData::Text(text.clone())),
            NodeSpec::Element(el) => {
                let mut element = Element::new(&el.tag);
                for (name, value) in &el.attrs {
                    element.set_attr(name, value.clone());
                }
                element.value = el
                    .value
                    .clone()
                    .or_else(|| element.attr("value").map(str::to_string))
                    .unwrap_or_default();
                element.checked = el.checked.unwrap_or(element.attr("checked").is_some());
                let id = self.push(parent, NodeData::Element(element));
                for child in &el.children {
                    self.push_spec(Some(id), child);
                }
                if el.tag.eq_ignore_ascii_case("select") {
                    self.sync_select_value(id);
                }
                id
            }
        }
    }

    fn push(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a new element under `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push(Some(parent), NodeData::Element(Element::new(tag)))
    }

    /// Append a text node under `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(Some(parent), NodeData::Text(text.to_string()))
    }

    /// Replace the children of `id` with a single text node. A lone text
    /// child is rewritten in place.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if id.0 >= self.nodes.len() {
            return;
        }
        if let [only] = self.nodes[id.0].children[..] {
            if let NodeData::Text(current) = &mut self.nodes[only.0].data {
                current.clear();
                current.push_str(text);
                return;
            }
        }
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for child in old {
            self.nodes[child.0].parent = None;
        }
        self.append_text(id, text);
    }

    /// Whether `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root() {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Whether the element at `id` matches `selectors`.
    pub fn matches(&self, id: NodeId, selectors: &SelectorList) -> bool {
        self.element(id).is_some_and(|el| selectors.matches(el))
    }

    /// `id` itself or its nearest ancestor matching `selectors`.
    pub fn closest(&self, id: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.matches(node, selectors) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// First descendant of `scope` (excluding `scope`) matching `selectors`,
    /// in document order.
    pub fn query_selector(&self, scope: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        self.descendants(scope).find(|id| self.matches(*id, selectors))
    }

    /// All descendants of `scope` matching `selectors`, in document order.
    pub fn query_selector_all(&self, scope: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|id| self.matches(*id, selectors))
            .collect()
    }

    /// First element anywhere in the document matching `selectors`,
    /// including the root.
    pub fn find(&self, selectors: &SelectorList) -> Option<NodeId> {
        let root = self.root();
        if self.matches(root, selectors) {
            return Some(root);
        }
        self.query_selector(root, selectors)
    }

    pub fn get_element_by_id(&self, html_id: &str) -> Option<NodeId> {
        let root = self.root();
        std::iter::once(root)
            .chain(self.descendants(root))
            .find(|id| self.element(*id).and_then(|el| el.attr("id")) == Some(html_id))
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|s| self.element(*s).is_some())
    }

    /// Pre-order walk of everything below `scope`.
    pub fn descendants(&self, scope: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.children(next).iter().rev().copied());
            Some(next)
        })
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_content_excluding(id, None)
    }

    /// Text content with every subtree matching `excluded` left out.
    pub fn text_content_excluding(&self, id: NodeId, excluded: Option<&SelectorList>) -> String {
        let mut out = String::new();
        self.collect_text(id, excluded, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, excluded: Option<&SelectorList>, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(_) => {
                for child in &node.children {
                    if excluded.is_some_and(|sel| self.matches(*child, sel)) {
                        continue;
                    }
                    self.collect_text(*child, excluded, out);
                }
            }
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.value = value.to_string();
        }
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(id) {
            el.checked = checked;
        }
    }

    /// Value of an `option`: its `value` attribute, else its text.
    pub fn option_value(&self, option: NodeId) -> String {
        match self.element(option).and_then(|el| el.attr("value")) {
            Some(value) => value.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .filter(|id| self.element(*id).is_some_and(|el| el.is("option")))
            .collect()
    }

    /// Select the option whose value equals `value`. Returns false when no
    /// such option exists.
    pub fn select_option(&mut self, select: NodeId, value: &str) -> bool {
        let found = self
            .options(select)
            .into_iter()
            .any(|opt| self.option_value(opt) == value);
        if found {
            self.set_value(select, value);
        }
        found
    }

    /// The currently selected `option` of a `select`.
    pub fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let current = &self.element(select)?.value;
        self.options(select)
            .into_iter()
            .find(|opt| self.option_value(*opt) == *current)
    }

    /// Keep a value that names an option; otherwise fall back to the
    /// browser default (the `selected` option, else the first one).
    fn sync_select_value(&mut self, select: NodeId) {
        let options = self.options(select);
        let current = self
            .element(select)
            .map(|el| el.value.clone())
            .unwrap_or_default();
        if options.iter().any(|o| self.option_value(*o) == current) {
            return;
        }
        let chosen = options
            .iter()
            .copied()
            .find(|o| self.element(*o).is_some_and(|el| el.attr("selected").is_some()))
            .or_else(|| options.first().copied());
        if let Some(option) = chosen {
            let value = self.option_value(option);
            self.set_value(select, &value);
        }
    }
}

#[cfg(test)]
#[path = "dom_tests.rs"]
mod tests;
