use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::str::FromStr;
use std::{fmt::Display, ops::Deref};

/// Tags that are always treated as user-actionable.
const INTERACTIVE_TAGS: &[&str] = &["button", "a", "input", "select", "textarea"];

/// `role` values that make any element user-actionable.
const INTERACTIVE_ROLES: &[&str] = &["button", "link"];

/// Externally assigned backend node identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct NodeId(String);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeId(s.to_string()))
    }
}

impl Deref for NodeId {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(fr: &str) -> Self {
        NodeId(fr.to_string())
    }
}

impl From<String> for NodeId {
    fn from(fr: String) -> Self {
        NodeId(fr)
    }
}

impl From<NodeId> for String {
    fn from(fr: NodeId) -> Self {
        fr.0
    }
}

/// One markup element that carried a backend node identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub tag: String,
    /// Whitespace-normalized text of the element and all of its descendants
    pub text_content: String,
    pub aria_label: Option<String>,
    /// Every attribute except the identifier attribute
    pub attributes: BTreeMap<String, String>,
    /// Nearest identified ancestor. A lookup key into the graph, not an owner.
    pub parent_id: Option<NodeId>,
    /// Nearest identified descendants, in document order, without duplicates
    pub children_ids: Vec<NodeId>,
    pub is_interactive: bool,
}

impl Node {
    /// Create a node from the raw pieces of an element.
    ///
    /// Text is whitespace-normalized, the aria label is resolved and
    /// interactivity is computed here, once.
    pub fn new(
        id: NodeId,
        tag: &str,
        raw_text: &str,
        attributes: BTreeMap<String, String>,
        parent_id: Option<NodeId>,
    ) -> Self {
        let aria_label = attributes
            .get("aria-label")
            .or_else(|| attributes.get("aria_label"))
            .cloned();
        let is_interactive = is_interactive(tag, &attributes);

        Self {
            id,
            tag: tag.to_string(),
            text_content: normalize_whitespace(raw_text),
            aria_label,
            attributes,
            parent_id,
            children_ids: vec![],
            is_interactive,
        }
    }

    /// Append a child id unless it is already present or points back at this node.
    pub fn push_child(&mut self, child_id: NodeId) {
        if child_id != self.id && !self.children_ids.contains(&child_id) {
            self.children_ids.push(child_id);
        }
    }
}

/// Collapse every run of whitespace into a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Heuristic interactivity check.
///
/// An element is interactive when its tag is one of the native controls, its
/// `role` is `button` or `link`, or it carries any inline event handler
/// attribute (`onclick`, `onmouseover`, ...).
pub fn is_interactive(tag: &str, attributes: &BTreeMap<String, String>) -> bool {
    INTERACTIVE_TAGS.contains(&tag)
        || attributes
            .get("role")
            .is_some_and(|role| INTERACTIVE_ROLES.contains(&role.as_str()))
        || attributes.contains_key("onclick")
        || attributes.keys().any(|name| name.starts_with("on"))
}
