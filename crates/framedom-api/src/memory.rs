//! [`DomEnvironment`] for the in-memory host.

use std::rc::Rc;

use framedom_dom::trusted_types::PolicyRules;
use framedom_dom::{DomError, DomTree, NodeId, ReadyState};

use crate::environment::{DomEnvironment, Listener};
use crate::{Config, DomApi};

impl DomEnvironment for DomTree {
    type Node = NodeId;

    fn ambient_document(&self) -> NodeId {
        self.root()
    }

    fn head(&self, document: &NodeId) -> Option<NodeId> {
        DomTree::head(self, *document)
    }

    fn body(&self, document: &NodeId) -> Option<NodeId> {
        DomTree::body(self, *document)
    }

    fn document_element(&self, document: &NodeId) -> Option<NodeId> {
        DomTree::document_element(self, *document)
    }

    fn create_element(&mut self, document: &NodeId, local_name: &str) -> NodeId {
        DomTree::create_element(self, *document, local_name)
    }

    fn create_element_ns(
        &mut self,
        document: &NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
    ) -> NodeId {
        DomTree::create_element_ns(self, *document, namespace, qualified_name)
    }

    fn create_text_node(&mut self, document: &NodeId, data: &str) -> NodeId {
        DomTree::create_text_node(self, *document, data)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        DomTree::append_child(self, *parent, *child)
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        DomTree::remove_child(self, *parent, *child)
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> Result<(), DomError> {
        DomTree::insert_before(self, *parent, *child, reference.copied())
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) -> Result<(), DomError> {
        DomTree::set_text_content(self, *node, text)
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.parent(*node)
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        DomTree::next_sibling(self, *node)
    }

    fn tag_name(&self, node: &NodeId) -> String {
        DomTree::tag_name(self, *node).unwrap_or_default()
    }

    fn is_frame_like(&self, node: &NodeId) -> bool {
        self.is_iframe(*node)
    }

    fn content_document(&self, frame: &NodeId) -> Option<NodeId> {
        DomTree::content_document(self, *frame)
    }

    fn ready_state(&self, document: &NodeId) -> ReadyState {
        DomTree::ready_state(self, *document).unwrap_or(ReadyState::Loading)
    }

    fn has_live_window(&self, document: &NodeId) -> bool {
        DomTree::has_live_window(self, *document)
    }

    fn add_load_listener(&mut self, frame: &NodeId, listener: Listener<Self>) {
        DomTree::add_load_listener(self, *frame, listener);
    }

    fn install_default_policy(
        &mut self,
        document: &NodeId,
        rules: Rc<dyn PolicyRules>,
    ) -> Result<(), DomError> {
        DomTree::install_default_policy(self, *document, rules)
    }
}

impl DomApi<DomTree> {
    /// An adapter over a fresh in-memory HTML document.
    #[must_use]
    pub fn in_memory(config: Config) -> Self {
        Self::with_config(DomTree::html_document(), config)
    }

    /// Run the host's event loop until no tasks remain, replaying deferred
    /// operations as frames finish loading. Returns the number of tasks run.
    pub fn run_until_idle(&mut self) -> usize {
        self.environment_mut().run_until_idle()
    }
}
