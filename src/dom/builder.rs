//! Markup to node graph conversion.
//!
//! Parsing is delegated to `scraper` (html5ever). The builder only walks the
//! resulting element tree and materializes elements that carry an identifier.

use std::collections::{BTreeMap, HashMap, HashSet};

use scraper::{ElementRef, Html};

use super::{DomError, Node, NodeGraph, NodeId};

/// Attribute carrying the externally assigned node id.
pub const DEFAULT_ID_ATTRIBUTE: &str = "backend_node_id";

/// Builds a [`NodeGraph`] out of HTML markup.
///
/// The builder holds configuration only. Each call to [`build`](Self::build)
/// walks the tree with its own stack and accumulator, so a builder can be
/// reused for any number of documents and nesting depth is not bounded by
/// the call stack.
#[derive(Clone, Debug)]
pub struct NodeGraphBuilder {
    id_attribute: String,
    strict: bool,
}

/// Per-build traversal state.
#[derive(Default)]
struct Accumulator {
    nodes: HashMap<NodeId, Node>,
    /// Ids handed out so far, in pre-order. Later repeats are transparent.
    claimed: HashSet<NodeId>,
    duplicates: usize,
}

/// How markup is handed to html5ever.
#[derive(Debug, PartialEq, Eq)]
enum ParseMode {
    Document,
    Fragment,
    /// Fragment starting with a table part, parsed inside a `<table>`
    TableFragment,
}

/// Tags html5ever drops when they appear outside a table in body context.
const TABLE_PART_TAGS: &[&str] = &[
    "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr",
];

impl Default for NodeGraphBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ID_ATTRIBUTE)
    }
}

impl NodeGraphBuilder {
    pub fn new(id_attribute: &str) -> Self {
        Self {
            // html5ever lowercases attribute names
            id_attribute: id_attribute.to_lowercase(),
            strict: false,
        }
    }

    /// Fail with [`DomError::ParseFailure`] when the parser had to recover
    /// from malformed markup instead of degrading silently.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn id_attribute(&self) -> &str {
        &self.id_attribute
    }

    /// Build from raw bytes. Bytes that are not UTF-8 are a parse failure.
    pub fn build_bytes(&self, bytes: &[u8]) -> Result<NodeGraph, DomError> {
        let markup = std::str::from_utf8(bytes)
            .map_err(|e| DomError::ParseFailure(format!("markup is not valid utf8: {e}")))?;
        self.build(markup)
    }

    /// Parse `markup` and build the node graph.
    ///
    /// Markup starting with a doctype, `<html>`, `<head>` or `<body>` is parsed
    /// as a document, markup starting with a table part inside a `<table>`,
    /// anything else as a body fragment. html5ever still applies its tree
    /// construction rules, so elements that cannot live where they appear
    /// (e.g. a `<td>` directly inside a `<div>`) are discarded together with
    /// their attributes. A warning is logged when that loses identified
    /// elements.
    pub fn build(&self, markup: &str) -> Result<NodeGraph, DomError> {
        let html = match parse_mode(markup) {
            ParseMode::Document => Html::parse_document(markup),
            ParseMode::Fragment => Html::parse_fragment(markup),
            ParseMode::TableFragment => Html::parse_fragment(&format!("<table>{markup}</table>")),
        };

        if !html.errors.is_empty() {
            if self.strict {
                return Err(DomError::ParseFailure(html.errors.join("; ")));
            }
            log::warn!(
                "recovered from {} markup error(s), first: {}",
                html.errors.len(),
                html.errors[0]
            );
        }

        let mut acc = Accumulator::default();
        self.walk(html.root_element(), &mut acc);

        if !html.errors.is_empty() {
            let declared = self.declared_ids(markup);
            let kept = acc.nodes.len() + acc.duplicates;
            if declared > kept {
                log::warn!(
                    "markup declares {declared} `{}` attribute(s) but only {kept} survived html parsing",
                    self.id_attribute
                );
            }
        }

        if acc.nodes.is_empty() {
            log::warn!(
                "no elements carrying `{}` found, node graph is empty",
                self.id_attribute
            );
        } else {
            log::debug!("built node graph with {} node(s)", acc.nodes.len());
        }

        Ok(NodeGraph::from_nodes(acc.nodes))
    }

    /// Pre-order walk over the element tree with an explicit stack.
    ///
    /// Each frame carries the nearest identified ancestor. Ancestors are
    /// created before their descendants, so every identified element is
    /// appended to its ancestor's `children_ids` in document order.
    fn walk(&self, root: ElementRef<'_>, acc: &mut Accumulator) {
        let mut stack: Vec<(ElementRef<'_>, Option<NodeId>)> = vec![(root, None)];

        while let Some((element, parent_id)) = stack.pop() {
            let context_id = match self.claim_id(element, acc) {
                Some(id) => {
                    let node = self.node_for(element, id.clone(), parent_id.clone());
                    if let Some(parent) = parent_id.as_ref().and_then(|p| acc.nodes.get_mut(p)) {
                        parent.push_child(id.clone());
                    }
                    acc.nodes.insert(id.clone(), node);
                    Some(id)
                }
                // transparent: descendants attach to the nearest identified ancestor
                None => parent_id,
            };

            let children: Vec<ElementRef<'_>> =
                element.children().filter_map(ElementRef::wrap).collect();
            stack.extend(
                children
                    .into_iter()
                    .rev()
                    .map(|child| (child, context_id.clone())),
            );
        }
    }

    fn node_for(&self, element: ElementRef<'_>, id: NodeId, parent_id: Option<NodeId>) -> Node {
        let value = element.value();
        let attributes: BTreeMap<String, String> = value
            .attrs()
            .filter(|(name, _)| *name != self.id_attribute)
            .map(|(name, val)| (name.to_string(), val.to_string()))
            .collect();
        let raw_text: String = element.text().collect();

        Node::new(id, value.name(), &raw_text, attributes, parent_id)
    }

    /// Read the identifier of `element` and reserve it.
    ///
    /// Missing or empty identifiers, and ids already used earlier in the
    /// document, yield `None`.
    fn claim_id(&self, element: ElementRef<'_>, acc: &mut Accumulator) -> Option<NodeId> {
        let raw = element.value().attr(&self.id_attribute)?;
        if raw.is_empty() {
            return None;
        }

        let id = NodeId::from(raw);
        if !acc.claimed.insert(id.clone()) {
            log::warn!("duplicate node id `{id}`, treating later element as unidentified");
            acc.duplicates += 1;
            return None;
        }

        Some(id)
    }

    /// Rough count of identifier attributes written in the raw markup.
    fn declared_ids(&self, markup: &str) -> usize {
        let lower = markup.to_lowercase();
        lower
            .match_indices(self.id_attribute.as_str())
            .filter(|(pos, _)| {
                let preceded = lower[..*pos]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_whitespace);
                let rest = lower[pos + self.id_attribute.len()..].trim_start();
                preceded && rest.starts_with('=')
            })
            .count()
    }
}

/// Lowercase name of the first tag in `markup`, if it starts with one.
fn first_tag(markup: &str) -> Option<String> {
    let rest = markup.trim_start().strip_prefix('<')?;
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

fn parse_mode(markup: &str) -> ParseMode {
    let head: String = markup.trim_start().chars().take(1024).collect();
    let head = head.to_lowercase();
    if head.starts_with("<!doctype") || head.contains("<html") {
        return ParseMode::Document;
    }

    match first_tag(&head).as_deref() {
        Some("head" | "body") => ParseMode::Document,
        Some(tag) if TABLE_PART_TAGS.contains(&tag) => ParseMode::TableFragment,
        _ => ParseMode::Fragment,
    }
}
