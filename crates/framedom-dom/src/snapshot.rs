//! Serializable views of a subtree, for debugging output.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{DomTree, NodeId, NodeType};

/// An owned, serializable copy of a subtree.
///
/// Iframes with a live nested browsing context carry a snapshot of their
/// nested document in `content_document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSnapshot {
    /// A document node.
    Document {
        /// "loading", "interactive" or "complete".
        #[serde(rename = "readyState")]
        ready_state: String,
        /// Child snapshots in tree order.
        children: Vec<NodeSnapshot>,
    },
    /// An element node.
    Element {
        /// The element's tag name as reported by `tagName`.
        #[serde(rename = "tagName")]
        tag_name: String,
        /// The element's namespace, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        /// Attributes, sorted by name for stable output.
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        /// Child snapshots in tree order.
        children: Vec<NodeSnapshot>,
        /// The nested document of an iframe.
        #[serde(rename = "contentDocument", skip_serializing_if = "Option::is_none")]
        content_document: Option<Box<NodeSnapshot>>,
    },
    /// A text node.
    Text {
        /// The text data.
        data: String,
    },
    /// A comment node.
    Comment {
        /// The comment data.
        data: String,
    },
}

impl DomTree {
    /// Capture the subtree rooted at `id`, descending into nested documents.
    #[must_use]
    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.get(id)?;
        let children = || {
            self.children(id)
                .iter()
                .filter_map(|&c| self.snapshot(c))
                .collect()
        };
        Some(match &node.node_type {
            NodeType::Document(data) => NodeSnapshot::Document {
                ready_state: data.ready_state.to_string(),
                children: children(),
            },
            NodeType::Element(data) => NodeSnapshot::Element {
                tag_name: self.tag_name(id).unwrap_or_default(),
                namespace: data.namespace.clone(),
                attributes: data
                    .attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                children: children(),
                content_document: self
                    .content_document(id)
                    .and_then(|doc| self.snapshot(doc))
                    .map(Box::new),
            },
            NodeType::Text(data) => NodeSnapshot::Text { data: data.clone() },
            NodeType::Comment(data) => NodeSnapshot::Comment { data: data.clone() },
        })
    }
}
