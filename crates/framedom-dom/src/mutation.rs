//! Tree mutation algorithms.
//!
//! [§ 4.2.3 Mutation algorithms](https://dom.spec.whatwg.org/#mutation-algorithms)

use crate::{DomError, DomTree, NodeId, NodeType};

impl DomTree {
    /// [§ 4.2.3 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    ///
    /// # Errors
    ///
    /// Fails with the same errors as [`DomTree::insert_before`].
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// [§ 4.2.3 Pre-insert](https://dom.spec.whatwg.org/#concept-node-pre-insert)
    ///
    /// Inserts `node` into `parent` before `child`, or as the last child when
    /// `child` is `None`. A node that already has a parent is moved, and a node
    /// from another document is adopted into `parent`'s node document.
    ///
    /// # Errors
    ///
    /// - [`DomError::UnknownNode`] if any id is not in the arena.
    /// - [`DomError::HierarchyRequest`] if the insertion would yield an
    ///   incorrect tree (inserting an ancestor, a document, or text under a
    ///   document).
    /// - [`DomError::NotFound`] if `child` is not a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        child: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.ensure_pre_insertion_validity(node, parent, child)?;

        // STEP 2: "If referenceChild is node, then set referenceChild to
        //          node's next sibling."
        let reference = match child {
            Some(c) if c == node => self.next_sibling(node),
            other => other,
        };

        // STEP 3: "Insert node into parent before referenceChild."
        // Adoption removes node from its old parent first.
        let document = self.node_document(parent).ok_or(DomError::UnknownNode(parent))?;
        self.adopt(node, document);

        let index = match reference {
            Some(r) => self.children(parent).iter().position(|&c| c == r),
            None => None,
        };
        if let Some(n) = self.get_mut(node) {
            n.parent = Some(parent);
        }
        if let Some(p) = self.get_mut(parent) {
            match index {
                Some(i) => p.children.insert(i, node),
                None => p.children.push(node),
            }
        }
        self.relink(parent);

        if self.is_connected(parent) {
            self.run_insertion_steps(node);
        }
        Ok(())
    }

    /// [§ 4.2.3 Pre-remove](https://dom.spec.whatwg.org/#concept-node-pre-remove)
    ///
    /// # Errors
    ///
    /// - [`DomError::UnknownNode`] if either id is not in the arena.
    /// - [`DomError::NotFound`] if `child`'s parent is not `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let _ = self.get(parent).ok_or(DomError::UnknownNode(parent))?;
        let _ = self.get(child).ok_or(DomError::UnknownNode(child))?;

        // STEP 1: "If child's parent is not parent, then throw a
        //          "NotFoundError" DOMException."
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotFound { parent, child });
        }
        self.remove(child);
        Ok(())
    }

    /// [§ 4.4 textContent](https://dom.spec.whatwg.org/#dom-node-textcontent)
    ///
    /// Returns `None` for documents, the concatenated data of all descendant
    /// Text nodes for elements, and the node's data otherwise.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> Option<String> {
        match &self.get(id)?.node_type {
            NodeType::Document(_) => None,
            NodeType::Text(data) | NodeType::Comment(data) => Some(data.clone()),
            NodeType::Element(_) => Some(
                self.inclusive_descendants(id)
                    .into_iter()
                    .filter_map(|d| self.as_text(d))
                    .collect(),
            ),
        }
    }

    /// [§ 4.4 textContent setter](https://dom.spec.whatwg.org/#set-text-content)
    ///
    /// - Element: "String replace all with the given value within this."
    /// - Text/Comment: "Replace data with node this, offset 0, count this's
    ///   length, and data the given value."
    /// - Document: "Do nothing."
    ///
    /// # Errors
    ///
    /// Returns [`DomError::UnknownNode`] if `id` is not in the arena.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        let node = self.get(id).ok_or(DomError::UnknownNode(id))?;
        let document = node.document;
        match node.node_type {
            NodeType::Document(_) => Ok(()),
            NodeType::Text(_) | NodeType::Comment(_) => {
                if let Some(
                    NodeType::Text(data) | NodeType::Comment(data),
                ) = self.get_mut(id).map(|n| &mut n.node_type)
                {
                    *data = text.to_string();
                }
                Ok(())
            }
            NodeType::Element(_) => {
                for child in self.children(id).to_vec() {
                    self.remove(child);
                }
                // "Let node be null. If string is not the empty string, then
                //  set node to a new Text node..."
                if !text.is_empty() {
                    let text_node = self.create_text_node(document, text);
                    self.link_last(id, text_node);
                }
                Ok(())
            }
        }
    }

    /// [§ 4.2.3 Ensure pre-insertion validity](https://dom.spec.whatwg.org/#concept-node-ensure-pre-insertion-validity)
    fn ensure_pre_insertion_validity(
        &self,
        node: NodeId,
        parent: NodeId,
        child: Option<NodeId>,
    ) -> Result<(), DomError> {
        let parent_node = self.get(parent).ok_or(DomError::UnknownNode(parent))?;
        let inserted = self.get(node).ok_or(DomError::UnknownNode(node))?;

        // STEP 1: "If parent is not a Document, DocumentFragment, or Element
        //          node, then throw a "HierarchyRequestError" DOMException."
        let parent_is_document = match parent_node.node_type {
            NodeType::Document(_) => true,
            NodeType::Element(_) => false,
            NodeType::Text(_) | NodeType::Comment(_) => {
                return Err(DomError::HierarchyRequest("parent cannot have children"));
            }
        };

        // STEP 2: "If node is a host-including inclusive ancestor of parent,
        //          then throw a "HierarchyRequestError" DOMException."
        if node == parent || self.is_descendant_of(parent, node) {
            return Err(DomError::HierarchyRequest("node is an ancestor of parent"));
        }

        // STEP 3: "If child is non-null and its parent is not parent, then
        //          throw a "NotFoundError" DOMException."
        if let Some(c) = child {
            if self.parent(c) != Some(parent) {
                return Err(DomError::NotFound { parent, child: c });
            }
        }

        match inserted.node_type {
            // STEP 4: node must not be a document.
            NodeType::Document(_) => Err(DomError::HierarchyRequest("cannot insert a document")),
            // STEP 5: "If either node is a Text node and parent is a document..."
            NodeType::Text(_) if parent_is_document => {
                Err(DomError::HierarchyRequest("cannot insert text into a document"))
            }
            // STEP 6: "parent has an element child" for element nodes.
            NodeType::Element(_) if parent_is_document => {
                let has_other_element = self
                    .children(parent)
                    .iter()
                    .any(|&c| c != node && self.as_element(c).is_some());
                if has_other_element {
                    Err(DomError::HierarchyRequest("document already has an element child"))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// [§ 4.5 Adopt](https://dom.spec.whatwg.org/#concept-node-adopt)
    ///
    /// "If node's parent is non-null, then remove node." Then, when the
    /// documents differ, "for each inclusiveDescendant in node's
    /// shadow-including inclusive descendants: set inclusiveDescendant's
    /// node document to document."
    fn adopt(&mut self, node: NodeId, document: NodeId) {
        if self.parent(node).is_some() {
            self.remove(node);
        }
        if self.node_document(node) == Some(document) {
            return;
        }
        for descendant in self.inclusive_descendants(node) {
            if let Some(n) = self.get_mut(descendant) {
                n.document = document;
            }
        }
    }

    /// [§ 4.2.3 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Detaches `node` from its parent and runs the removing steps for the
    /// subtree when it was connected.
    fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let was_connected = self.is_connected(parent);

        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        if let Some(n) = self.get_mut(node) {
            n.parent = None;
            n.prev_sibling = None;
            n.next_sibling = None;
        }
        self.relink(parent);

        if was_connected {
            self.run_removing_steps(node);
        }
    }

    /// Append without validity checks or insertion steps. Used while building
    /// fresh subtrees that nothing else can observe yet.
    pub(crate) fn link_last(&mut self, parent: NodeId, child: NodeId) {
        if let Some(n) = self.get_mut(child) {
            n.parent = Some(parent);
        }
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        self.relink(parent);
    }

    /// Recompute the sibling links of `parent`'s children.
    fn relink(&mut self, parent: NodeId) {
        let children = self.children(parent).to_vec();
        for (i, &child) in children.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| children[p]);
            let next = children.get(i + 1).copied();
            if let Some(n) = self.get_mut(child) {
                n.prev_sibling = prev;
                n.next_sibling = next;
            }
        }
    }
}
