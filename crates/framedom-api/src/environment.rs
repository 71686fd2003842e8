//! The host environment the adapter drives.
//!
//! Everything the adapter knows about documents goes through
//! [`DomEnvironment`]. The in-memory [`DomTree`](framedom_dom::DomTree) is one
//! implementation; any DOM-like tree with a notion of "element that hosts a
//! nested document" can provide another.

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use framedom_dom::trusted_types::PolicyRules;
use framedom_dom::{DomError, ReadyState};

/// A one-shot reaction to a frame's load signal. It receives the environment
/// so it can keep mutating the tree.
pub type Listener<E> = Box<dyn FnOnce(&mut E)>;

/// DOM primitives and frame capabilities of a host.
///
/// Node handles are cheap, comparable values (arena indices, reference-counted
/// handles). Mutation primitives report misuse as [`DomError`]; the adapter
/// passes those through untouched.
pub trait DomEnvironment: Sized + 'static {
    /// A handle to any node: documents, elements and text.
    type Node: Clone + Eq + Hash + fmt::Debug + 'static;

    /// The document nodes are created in when no isolation is requested.
    fn ambient_document(&self) -> Self::Node;

    /// The `<head>` of `document`, if it has one.
    fn head(&self, document: &Self::Node) -> Option<Self::Node>;

    /// The `<body>` of `document`, if it has one.
    fn body(&self, document: &Self::Node) -> Option<Self::Node>;

    /// The root element of `document`, if it has one.
    fn document_element(&self, document: &Self::Node) -> Option<Self::Node>;

    /// Create an element owned by `document`.
    fn create_element(&mut self, document: &Self::Node, local_name: &str) -> Self::Node;

    /// Create an element with an explicit namespace, owned by `document`.
    fn create_element_ns(
        &mut self,
        document: &Self::Node,
        namespace: Option<&str>,
        qualified_name: &str,
    ) -> Self::Node;

    /// Create a text node owned by `document`.
    fn create_text_node(&mut self, document: &Self::Node, data: &str) -> Self::Node;

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Whatever the host's append primitive rejects.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Remove `child` from `parent`.
    ///
    /// # Errors
    ///
    /// Whatever the host's remove primitive rejects.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Insert `child` before `reference`, or last when `reference` is `None`.
    ///
    /// # Errors
    ///
    /// Whatever the host's insert primitive rejects.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), DomError>;

    /// Assign the text content of `node`.
    ///
    /// # Errors
    ///
    /// Whatever the host's text primitive rejects.
    fn set_text_content(&mut self, node: &Self::Node, text: &str) -> Result<(), DomError>;

    /// The parent of `node`.
    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

    /// The next sibling of `node`.
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// The tag name of `node`; empty for nodes that are not elements.
    fn tag_name(&self, node: &Self::Node) -> String;

    /// Whether `node` hosts a nested document (an `<iframe>` in a browser).
    fn is_frame_like(&self, node: &Self::Node) -> bool;

    /// The nested document of a frame-like node, once one exists.
    fn content_document(&self, frame: &Self::Node) -> Option<Self::Node>;

    /// Readiness of `document`.
    fn ready_state(&self, document: &Self::Node) -> ReadyState;

    /// Whether `document`'s owning window is still reachable.
    fn has_live_window(&self, document: &Self::Node) -> bool;

    /// Run `listener` once, the next time `frame` signals `load`. Listeners
    /// on the same frame run in registration order.
    fn add_load_listener(&mut self, frame: &Self::Node, listener: Listener<Self>);

    /// Install `rules` as the default content-trust policy of `document`'s
    /// global scope.
    ///
    /// # Errors
    ///
    /// [`DomError::NotSupported`] when the scope cannot take a policy.
    fn install_default_policy(
        &mut self,
        document: &Self::Node,
        rules: Rc<dyn PolicyRules>,
    ) -> Result<(), DomError>;
}
