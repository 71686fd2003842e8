//! In-memory DOM host for the framedom adapter.
//!
//! This crate provides an arena-based DOM tree following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/), extended with the
//! parts of the [HTML Standard](https://html.spec.whatwg.org/) an iframe-aware
//! adapter depends on:
//!
//! - several documents in one arena, each node tracking its node document
//! - nested browsing contexts created when an `<iframe>` becomes connected
//! - document readiness and a task queue that fires `load` on the iframe
//! - one-shot load listeners
//! - a per-window Trusted Types policy factory and the sinks that consult it
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships,
//! providing O(1) access and traversal without borrow checker issues. Nodes are
//! never freed; a removed subtree simply becomes unreachable from its document.

mod error;
mod frames;
mod mutation;
mod snapshot;
pub mod trusted_types;

pub use error::DomError;
pub use frames::{BrowsingContext, ContextId, FrameLoading, LoadListener};
pub use snapshot::NodeSnapshot;

use std::collections::{HashMap, VecDeque};
use std::fmt;

use strum_macros::{Display, EnumString};

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// [§ 1.3 Namespaces](https://infra.spec.whatwg.org/#html-namespace)
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// [§ 1.3 Namespaces](https://infra.spec.whatwg.org/#svg-namespace)
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// A type-safe index into the DOM arena.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// `NodeId` provides O(1) access to any node in the arena without borrowing issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The top-level document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 3.1.5 Current document readiness](https://html.spec.whatwg.org/multipage/dom.html#current-document-readiness)
///
/// "Each Document has a current document readiness, a string, initially
/// "complete"." Documents created for navigation start out as "loading".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ReadyState {
    /// The document is still loading.
    Loading,
    /// Parsing finished, subresources are still loading.
    Interactive,
    /// The document and all subresources have loaded.
    Complete,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
/// "Each node has an associated node document... and parent (null or an element)."
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-node-document)
    /// "Each node has an associated node document, set upon creation, that is
    /// a document." A document's node document is that document itself.
    pub document: NodeId,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    pub next_sibling: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    pub prev_sibling: Option<NodeId>,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document(DocumentData),
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
}

/// Document-specific data.
#[derive(Debug, Clone)]
pub struct DocumentData {
    /// "current document readiness"
    pub ready_state: ReadyState,
    /// [§ 7.3.1 Browsing contexts](https://html.spec.whatwg.org/multipage/document-sequences.html#concept-document-bc)
    /// "A Document's browsing context is the browsing context whose session
    /// history contains the Document, if any, and null otherwise."
    pub browsing_context: Option<ContextId>,
}

/// Element-specific data.
///
/// Per [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element):
/// "Elements have an associated namespace, namespace prefix, local name..."
///
/// NOTE: Prefixes and custom element state are not modelled.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// "An element's local name"
    pub tag_name: String,
    /// "An element's namespace"
    pub namespace: Option<String>,
    /// "An element has an associated attribute list"
    pub attrs: AttributesMap,
    /// Markup assigned through [`DomTree::set_inner_markup`], after the
    /// document's default Trusted Types policy has approved it. The host
    /// records markup verbatim; it has no HTML parser.
    pub markup: Option<String>,
}

impl ElementData {
    /// An HTML element with the given local name and no attributes.
    #[must_use]
    pub fn html(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            namespace: Some(HTML_NAMESPACE.to_string()),
            attrs: AttributesMap::new(),
            markup: None,
        }
    }

    /// Whether this is an element in the HTML namespace with the given local name.
    #[must_use]
    pub fn is_html(&self, local_name: &str) -> bool {
        self.namespace.as_deref() == Some(HTML_NAMESPACE) && self.tag_name == local_name
    }
}

/// Arena-based DOM host with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// A single arena holds every document the host knows about: the top-level
/// document at [`NodeId::ROOT`] and one document per nested browsing context.
/// The host also owns the event loop that drives iframe loading; see
/// [`DomTree::run_until_idle`].
pub struct DomTree {
    /// All nodes, indexed by `NodeId`.
    nodes: Vec<Node>,
    /// All browsing contexts, indexed by `ContextId`. Index 0 is top-level.
    contexts: Vec<BrowsingContext>,
    /// iframe element -> its current nested browsing context.
    frames: HashMap<NodeId, ContextId>,
    /// [§ 8.1.7 Event loops](https://html.spec.whatwg.org/multipage/webappapis.html#task-queue)
    tasks: VecDeque<frames::Task>,
    /// One-shot `load` listeners, in registration order, per event target.
    load_listeners: HashMap<NodeId, VecDeque<LoadListener>>,
    /// How newly created nested documents finish loading.
    frame_loading: FrameLoading,
    /// Whether newly created windows expose a Trusted Types factory.
    trusted_types_supported: bool,
}

impl DomTree {
    /// Create a host with just the top-level Document node.
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            contexts: Vec::new(),
            frames: HashMap::new(),
            tasks: VecDeque::new(),
            load_listeners: HashMap::new(),
            frame_loading: FrameLoading::default(),
            trusted_types_supported: true,
        };
        let root = tree.alloc_document(ReadyState::Complete);
        let top = tree.attach_context(root, None);
        debug_assert_eq!(top, ContextId::TOP);
        tree
    }

    /// Create a host whose top-level document has the
    /// `<html><head></head><body></body></html>` skeleton.
    #[must_use]
    pub fn html_document() -> Self {
        let mut tree = Self::new();
        tree.build_skeleton(NodeId::ROOT);
        tree
    }

    /// Get the top-level document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty (should always hold at least the Document).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node owned by `document` and return its ID.
    /// The node is not yet attached to any tree.
    pub fn alloc(&mut self, document: NodeId, node_type: NodeType) -> NodeId {
        let id = NodeId(self.len());
        self.nodes.push(Node {
            node_type,
            document,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    /// Allocate a document node that owns itself.
    pub(crate) fn alloc_document(&mut self, ready_state: ReadyState) -> NodeId {
        let id = NodeId(self.len());
        self.alloc(
            id,
            NodeType::Document(DocumentData {
                ready_state,
                browsing_context: None,
            }),
        )
    }

    /// Append `<html><head></head><body></body></html>` to an empty document.
    pub(crate) fn build_skeleton(&mut self, document: NodeId) {
        let html = self.create_element(document, "html");
        let head = self.create_element(document, "head");
        let body = self.create_element(document, "body");
        for (parent, child) in [(document, html), (html, head), (html, body)] {
            self.link_last(parent, child);
        }
    }

    /// [§ 4.5 createElement](https://dom.spec.whatwg.org/#dom-document-createelement)
    ///
    /// "If this is an HTML document, then set localName to localName in ASCII
    /// lowercase." "Let namespace be the HTML namespace..."
    pub fn create_element(&mut self, document: NodeId, local_name: &str) -> NodeId {
        self.alloc(document, NodeType::Element(ElementData::html(local_name)))
    }

    /// [§ 4.5 createElementNS](https://dom.spec.whatwg.org/#dom-document-createelementns)
    ///
    /// "If namespace is the empty string, then set it to null." Names are kept
    /// as given, without case folding.
    pub fn create_element_ns(
        &mut self,
        document: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
    ) -> NodeId {
        let namespace = namespace.filter(|ns| !ns.is_empty()).map(str::to_string);
        self.alloc(
            document,
            NodeType::Element(ElementData {
                tag_name: qualified_name.to_string(),
                namespace,
                attrs: AttributesMap::new(),
                markup: None,
            }),
        )
    }

    /// [§ 4.5 createTextNode](https://dom.spec.whatwg.org/#dom-document-createtextnode)
    ///
    /// "Returns a Text node whose data is data and node document is this."
    pub fn create_text_node(&mut self, document: NodeId, data: &str) -> NodeId {
        self.alloc(document, NodeType::Text(data.to_string()))
    }

    /// [§ 4.5 createComment](https://dom.spec.whatwg.org/#dom-document-createcomment)
    pub fn create_comment(&mut self, document: NodeId, data: &str) -> NodeId {
        self.alloc(document, NodeType::Comment(data.to_string()))
    }

    /// [§ 4.4 ownerDocument](https://dom.spec.whatwg.org/#dom-node-ownerdocument)
    ///
    /// Returns the node document, including for document nodes themselves.
    #[must_use]
    pub fn node_document(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.document)
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Collect `id` and all of its descendants in tree order.
    #[must_use]
    pub fn inclusive_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// [§ 4.2.2 Root](https://dom.spec.whatwg.org/#concept-tree-root)
    ///
    /// "The root of an object is itself, if its parent is null, or else it is
    /// the root of its parent."
    #[must_use]
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// [§ 4.2.2 Connected](https://dom.spec.whatwg.org/#connected)
    ///
    /// "An element is connected if its shadow-including root is a document."
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.as_document(self.tree_root(id)).is_some()
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get document data if this node is a document.
    #[must_use]
    pub fn as_document(&self, id: NodeId) -> Option<&DocumentData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Document(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// [§ 4.9 tagName](https://dom.spec.whatwg.org/#dom-element-tagname)
    ///
    /// "If this is in the HTML namespace and its node document is an HTML
    /// document, then set qualifiedName to qualifiedName in ASCII uppercase."
    ///
    /// Every document in this host is an HTML document. Non-elements have no
    /// tag name.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.as_element(id).map(|e| {
            if e.namespace.as_deref() == Some(HTML_NAMESPACE) {
                e.tag_name.to_ascii_uppercase()
            } else {
                e.tag_name.clone()
            }
        })
    }

    /// [§ 4.9 namespaceURI](https://dom.spec.whatwg.org/#dom-element-namespaceuri)
    #[must_use]
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).and_then(|e| e.namespace.as_deref())
    }

    /// [§ 4.9 getAttribute](https://dom.spec.whatwg.org/#dom-element-getattribute)
    #[must_use]
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.as_element(id)
            .and_then(|e| e.attrs.get(name))
            .map(String::as_str)
    }

    /// [§ 4.9 setAttribute](https://dom.spec.whatwg.org/#dom-element-setattribute)
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotSupported`] if `id` is not an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let element = self
            .as_element_mut(id)
            .ok_or(DomError::NotSupported("setAttribute on a non-element"))?;
        let _ = element.attrs.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Whether `id` is an HTML `<iframe>` element.
    #[must_use]
    pub fn is_iframe(&self, id: NodeId) -> bool {
        self.as_element(id).is_some_and(|e| e.is_html("iframe"))
    }

    /// [§ 3.1.3 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self, document: NodeId) -> Option<NodeId> {
        self.children(document)
            .iter()
            .find(|&&id| self.as_element(id).is_some())
            .copied()
    }

    /// [§ 3.1.3 The head element](https://html.spec.whatwg.org/multipage/dom.html#the-head-element-2)
    ///
    /// "The head element of a document is the first head element that is a
    /// child of the html element, if there is one, or null otherwise."
    #[must_use]
    pub fn head(&self, document: NodeId) -> Option<NodeId> {
        self.child_of_html(document, &["head"])
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    ///
    /// "The body element of a document is the first of the html element's children
    /// that is either a body element or a frameset element, or null if there is
    /// no such element."
    #[must_use]
    pub fn body(&self, document: NodeId) -> Option<NodeId> {
        self.child_of_html(document, &["body", "frameset"])
    }

    fn child_of_html(&self, document: NodeId, names: &[&str]) -> Option<NodeId> {
        let html = self.document_element(document)?;
        if !self.as_element(html).is_some_and(|e| e.is_html("html")) {
            return None;
        }
        self.children(html)
            .iter()
            .find(|&&id| {
                self.as_element(id)
                    .is_some_and(|e| names.iter().any(|name| e.is_html(name)))
            })
            .copied()
    }

    /// [§ 3.1.5 readyState](https://html.spec.whatwg.org/multipage/dom.html#dom-document-readystate)
    #[must_use]
    pub fn ready_state(&self, document: NodeId) -> Option<ReadyState> {
        self.as_document(document).map(|d| d.ready_state)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DomTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomTree")
            .field("nodes", &self.len())
            .field("contexts", &self.contexts.len())
            .field("pending_tasks", &self.tasks.len())
            .field("frame_loading", &self.frame_loading)
            .finish_non_exhaustive()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
