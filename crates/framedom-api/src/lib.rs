//! Iframe-aware DOM operations for virtual-DOM renderers.
//!
//! [`DomApi`] exposes the node creation and tree mutation primitives a
//! renderer patches with. Two things set it apart from calling the host
//! directly:
//!
//! - **Frame redirection.** A mutation aimed at an `<iframe>` is applied to
//!   the body of the iframe's nested document. If that document has not
//!   finished loading, the mutation is queued and replayed, in issue order
//!   and exactly once, when the iframe fires `load`. See [`router`].
//! - **Clean documents.** With [`Config::clean`], new nodes are created in the
//!   nested document of a hidden iframe instead of the ambient document,
//!   optionally with a [`ContentPolicy`] installed as that window's default
//!   Trusted Types policy. See [`factory`].
//!
//! Reads (`parent_node`, `next_sibling`, `tag_name`) are never redirected.
//!
//! ```
//! use framedom_api::{Dispatch, DomApi};
//! use framedom_dom::NodeId;
//!
//! let mut api = DomApi::in_memory(Default::default());
//! let body = api.environment().body(NodeId::ROOT).unwrap();
//! let frame = api.create_element("iframe");
//! api.append_child(&body, &frame).unwrap();
//!
//! let item = api.create_element("p");
//! assert_eq!(api.append_child(&frame, &item).unwrap(), Dispatch::Deferred);
//!
//! let _ = api.run_until_idle();
//! let nested = api.environment().content_document(frame).unwrap();
//! assert_eq!(api.parent_node(&item), api.environment().body(nested));
//! ```

mod config;
mod environment;
pub mod factory;
mod memory;
pub mod router;

pub use config::{Config, ContentPolicy};
pub use environment::{DomEnvironment, Listener};
pub use factory::{CleanDocument, DocumentFactory};
pub use router::{
    Dispatch, FrameState, Mutation, MutationRouter, OperationKind, PendingOperation, frame_state,
};

pub use framedom_dom as dom;
pub use framedom_dom::DomError;

use std::fmt;

/// The DOM operation surface handed to a renderer.
///
/// Owns the host environment, the document factory and the mutation router.
/// One adapter shares one cached clean document across all of its calls.
pub struct DomApi<E: DomEnvironment> {
    env: E,
    factory: DocumentFactory<E::Node>,
    router: MutationRouter<E::Node>,
}

impl<E: DomEnvironment> DomApi<E> {
    /// An adapter creating nodes in the ambient document of `env`.
    #[must_use]
    pub fn new(env: E) -> Self {
        Self::with_config(env, Config::default())
    }

    /// An adapter following `config`.
    #[must_use]
    pub fn with_config(env: E, config: Config) -> Self {
        Self {
            env,
            factory: DocumentFactory::new(config),
            router: MutationRouter::new(),
        }
    }

    /// The configuration fixed at construction.
    #[must_use]
    pub const fn config(&self) -> &Config {
        self.factory.config()
    }

    // Creation

    /// `document.createElement(tag)` on the factory document.
    pub fn create_element(&mut self, tag: &str) -> E::Node {
        let document = self.factory.document(&mut self.env);
        self.env.create_element(&document, tag)
    }

    /// `document.createElementNS(namespace, qualified_name)` on the factory
    /// document.
    pub fn create_element_ns(&mut self, namespace: Option<&str>, qualified_name: &str) -> E::Node {
        let document = self.factory.document(&mut self.env);
        self.env.create_element_ns(&document, namespace, qualified_name)
    }

    /// `document.createTextNode(text)` on the factory document.
    pub fn create_text_node(&mut self, text: &str) -> E::Node {
        let document = self.factory.document(&mut self.env);
        self.env.create_text_node(&document, text)
    }

    // Mutation

    /// Append `child` to `parent`, or to the nested body if `parent` is a
    /// frame.
    ///
    /// # Errors
    ///
    /// The host's error for a mutation applied synchronously, or
    /// [`DomError::MissingBody`] for a ready frame without a body.
    pub fn append_child(
        &mut self,
        parent: &E::Node,
        child: &E::Node,
    ) -> Result<Dispatch, DomError> {
        self.router.dispatch(
            &mut self.env,
            parent,
            Mutation::AppendChild {
                child: child.clone(),
            },
        )
    }

    /// Remove `child` from `parent`, or from the nested body if `parent` is a
    /// frame.
    ///
    /// # Errors
    ///
    /// See [`DomApi::append_child`].
    pub fn remove_child(
        &mut self,
        parent: &E::Node,
        child: &E::Node,
    ) -> Result<Dispatch, DomError> {
        self.router.dispatch(
            &mut self.env,
            parent,
            Mutation::RemoveChild {
                child: child.clone(),
            },
        )
    }

    /// Insert `child` before `reference` under `parent`; at the end when
    /// `reference` is `None`. The reference is passed through unchanged when
    /// the call is redirected or deferred.
    ///
    /// # Errors
    ///
    /// See [`DomApi::append_child`].
    pub fn insert_before(
        &mut self,
        parent: &E::Node,
        child: &E::Node,
        reference: Option<&E::Node>,
    ) -> Result<Dispatch, DomError> {
        self.router.dispatch(
            &mut self.env,
            parent,
            Mutation::InsertBefore {
                child: child.clone(),
                reference: reference.cloned(),
            },
        )
    }

    /// Assign the text content of `node`, or of the nested body if `node` is
    /// a frame.
    ///
    /// # Errors
    ///
    /// See [`DomApi::append_child`].
    pub fn set_text_content(&mut self, node: &E::Node, text: &str) -> Result<Dispatch, DomError> {
        self.router.dispatch(
            &mut self.env,
            node,
            Mutation::SetTextContent {
                text: text.to_owned(),
            },
        )
    }

    // Reads

    /// The parent of `node`.
    #[must_use]
    pub fn parent_node(&self, node: &E::Node) -> Option<E::Node> {
        self.env.parent_node(node)
    }

    /// The next sibling of `node`.
    #[must_use]
    pub fn next_sibling(&self, node: &E::Node) -> Option<E::Node> {
        self.env.next_sibling(node)
    }

    /// The tag name of `node`.
    #[must_use]
    pub fn tag_name(&self, node: &E::Node) -> String {
        self.env.tag_name(node)
    }

    // Diagnostics

    /// The document new nodes are created in, recreating a stale clean
    /// document first.
    pub fn factory_document(&mut self) -> E::Node {
        self.factory.document(&mut self.env)
    }

    /// The cached clean document, if clean mode has created one.
    #[must_use]
    pub const fn clean_document(&self) -> Option<&CleanDocument<E::Node>> {
        self.factory.clean_document()
    }

    /// Load state of `frame`.
    #[must_use]
    pub fn frame_state(&self, frame: &E::Node) -> FrameState {
        frame_state(&self.env, frame)
    }

    /// Number of mutations waiting for `frame` to load.
    #[must_use]
    pub fn pending_operations(&self, frame: &E::Node) -> usize {
        self.router.pending_operations(frame)
    }

    /// The mutation router, for inspecting queued mutations.
    #[must_use]
    pub const fn router(&self) -> &MutationRouter<E::Node> {
        &self.router
    }

    /// The host environment.
    #[must_use]
    pub const fn environment(&self) -> &E {
        &self.env
    }

    /// The host environment, mutably. Driving the host's event loop through
    /// this is what replays deferred mutations.
    pub const fn environment_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Give the host environment back. Mutations still queued stay attached
    /// to their frames' load listeners and replay if those fire.
    #[must_use]
    pub fn into_environment(self) -> E {
        self.env
    }
}

impl<E> fmt::Debug for DomApi<E>
where
    E: DomEnvironment + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomApi")
            .field("env", &self.env)
            .field("factory", &self.factory)
            .field("router", &self.router)
            .finish()
    }
}
