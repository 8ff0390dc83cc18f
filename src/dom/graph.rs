use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::{Node, NodeId};

/// Default number of hops walked in each direction when collecting context.
pub const DEFAULT_CONTEXT_DEPTH: usize = 3;

/// Flat mapping from node id to node. Owns every node of one document.
#[derive(Clone, Debug, Default)]
pub struct NodeGraph {
    nodes: HashMap<NodeId, Node>,
}

/// Inspection view of one interactive node together with its context.
#[derive(Clone, Debug, Serialize)]
pub struct RagEntry {
    pub id: NodeId,
    pub tag: String,
    pub text_content: String,
    pub context: String,
    pub aria_label: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub parent_id: Option<NodeId>,
    pub children_ids: Vec<NodeId>,
}

/// Insertion-ordered, deduplicating collector of context strings.
#[derive(Default)]
struct ContextParts<'a> {
    seen: HashSet<&'a str>,
    parts: Vec<&'a str>,
}

impl<'a> ContextParts<'a> {
    fn push(&mut self, text: &'a str) {
        let text = text.trim();
        if !text.is_empty() && self.seen.insert(text) {
            self.parts.push(text);
        }
    }

    fn join(self) -> String {
        self.parts.join(" ")
    }
}

impl NodeGraph {
    pub(crate) fn from_nodes(nodes: HashMap<NodeId, Node>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    /// All nodes ordered by id.
    pub fn sorted(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Interactive nodes ordered by id.
    pub fn interactive(&self) -> Vec<&Node> {
        self.sorted()
            .into_iter()
            .filter(|node| node.is_interactive)
            .collect()
    }

    /// Nodes without an identified ancestor, ordered by id.
    pub fn roots(&self) -> Vec<&Node> {
        self.sorted()
            .into_iter()
            .filter(|node| node.parent_id.is_none())
            .collect()
    }

    /// Text found around `node_id` within `max_depth` hops.
    ///
    /// Ancestors are collected nearest first, then descendants in pre-order.
    /// Repeated strings are kept once. Unknown ids and dangling links yield
    /// whatever could be collected before the gap.
    pub fn context(&self, node_id: &NodeId, max_depth: usize) -> String {
        let Some(node) = self.nodes.get(node_id) else {
            log::debug!("context requested for unknown node `{node_id}`");
            return String::new();
        };

        let mut parts = ContextParts::default();

        let mut current = node;
        for _ in 0..max_depth {
            let Some(parent_id) = current.parent_id.as_ref() else {
                break;
            };
            let Some(parent) = self.nodes.get(parent_id) else {
                log::debug!("node `{}` references missing parent `{parent_id}`", current.id);
                break;
            };
            parts.push(&parent.text_content);
            current = parent;
        }

        self.collect_descendants(node, max_depth, &mut parts);

        parts.join()
    }

    /// Pre-order walk over `children_ids`, `max_depth` hops deep.
    fn collect_descendants<'a>(
        &'a self,
        node: &'a Node,
        max_depth: usize,
        parts: &mut ContextParts<'a>,
    ) {
        let mut stack: Vec<(&'a Node, usize)> = vec![(node, 0)];

        while let Some((current, depth)) = stack.pop() {
            if depth > 0 {
                parts.push(&current.text_content);
            }
            if depth >= max_depth {
                continue;
            }

            let mut children = Vec::with_capacity(current.children_ids.len());
            for child_id in &current.children_ids {
                match self.nodes.get(child_id) {
                    Some(child) => children.push((child, depth + 1)),
                    None => log::debug!(
                        "node `{}` references missing child `{child_id}`",
                        current.id
                    ),
                }
            }
            stack.extend(children.into_iter().rev());
        }
    }

    /// Summaries of every interactive node with its context, ordered by id.
    pub fn rag_index(&self, max_depth: usize) -> Vec<RagEntry> {
        self.interactive()
            .into_iter()
            .map(|node| RagEntry {
                id: node.id.clone(),
                tag: node.tag.clone(),
                text_content: node.text_content.clone(),
                context: self.context(&node.id, max_depth),
                aria_label: node.aria_label.clone(),
                attributes: node.attributes.clone(),
                parent_id: node.parent_id.clone(),
                children_ids: node.children_ids.clone(),
            })
            .collect()
    }
}
