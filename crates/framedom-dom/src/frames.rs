//! Nested browsing contexts, iframe loading and the host event loop.
//!
//! [§ 4.8.5 The iframe element](https://html.spec.whatwg.org/multipage/iframe-embed-object.html#the-iframe-element)
//!
//! "When an iframe element element is inserted into a document whose browsing
//! context is non-null, the user agent must run these steps: Create a new
//! child navigable for element. ... Process the iframe attributes for
//! element, with initialInsertion set to true."
//!
//! A freshly created nested document starts out `loading`. Completion is a
//! queued task: it marks the document `complete` and fires `load` at the
//! iframe element. Removing the iframe destroys the child navigable, after
//! which the nested window is unreachable.

use log::debug;

use crate::trusted_types::TrustedTypePolicyFactory;
use crate::{DomTree, NodeId, NodeType, ReadyState};

/// A type-safe index into the host's browsing contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub usize);

impl ContextId {
    /// The top-level browsing context owning [`NodeId::ROOT`].
    pub const TOP: Self = Self(0);
}

/// [§ 7.3.1 Browsing contexts](https://html.spec.whatwg.org/multipage/document-sequences.html#browsing-context)
///
/// The window side of a document: the global scope that nested content runs in.
#[derive(Debug)]
pub struct BrowsingContext {
    /// The active document.
    pub document: NodeId,
    /// [§ 7.3.1 container](https://html.spec.whatwg.org/multipage/document-sequences.html#nav-container)
    /// The iframe element hosting this context, `None` for the top level.
    pub container: Option<NodeId>,
    /// Set once the context is destroyed; its window is then unreachable.
    pub discarded: bool,
    /// [§ 2.3 `TrustedTypePolicyFactory`](https://w3c.github.io/trusted-types/dist/spec/#trusted-type-policy-factory)
    /// "`window.trustedTypes`"
    pub trusted_types: TrustedTypePolicyFactory,
}

/// How nested documents created by this host finish loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameLoading {
    /// Completion is queued as a task and happens on the next turn of the
    /// event loop.
    #[default]
    Queued,
    /// Navigation never completes on its own, as with a failed or hung load.
    /// [`DomTree::finish_frame_load`] can still complete it manually.
    Stalled,
}

/// A one-shot `load` listener. It receives the host so it can mutate the
/// tree while the event is being dispatched.
pub type LoadListener = Box<dyn FnOnce(&mut DomTree)>;

/// [§ 8.1.7.1 Definitions](https://html.spec.whatwg.org/multipage/webappapis.html#concept-task)
#[derive(Debug, Clone, Copy)]
pub(crate) enum Task {
    /// Mark the context's document complete and fire `load` at its container.
    FinishLoad(ContextId),
}

impl DomTree {
    /// Choose how nested documents created from now on finish loading.
    pub const fn set_frame_loading(&mut self, frame_loading: FrameLoading) {
        self.frame_loading = frame_loading;
    }

    /// Choose whether windows created from now on expose a usable Trusted
    /// Types factory.
    pub const fn set_trusted_types_supported(&mut self, supported: bool) {
        self.trusted_types_supported = supported;
    }

    /// Get a browsing context by its ID.
    #[must_use]
    pub fn context(&self, id: ContextId) -> Option<&BrowsingContext> {
        self.contexts.get(id.0)
    }

    /// The live browsing context whose active document is `document`.
    #[must_use]
    pub fn live_context_of(&self, document: NodeId) -> Option<ContextId> {
        let id = self.as_document(document)?.browsing_context?;
        let context = self.context(id)?;
        (!context.discarded && context.document == document).then_some(id)
    }

    /// [§ 7.2 defaultView](https://html.spec.whatwg.org/multipage/nav-history-apis.html#dom-document-defaultview)
    ///
    /// "Returns the active window of this's browsing context, if there is one."
    /// The window is reachable exactly while the context is alive.
    #[must_use]
    pub fn has_live_window(&self, document: NodeId) -> bool {
        self.live_context_of(document).is_some()
    }

    /// [§ 4.8.5 contentDocument](https://html.spec.whatwg.org/multipage/iframe-embed-object.html#dom-iframe-contentdocument)
    ///
    /// The active document of the iframe's nested browsing context, or `None`
    /// if the iframe is not connected (no nested context exists).
    #[must_use]
    pub fn content_document(&self, iframe: NodeId) -> Option<NodeId> {
        let id = self.frames.get(&iframe)?;
        let context = self.context(*id)?;
        (!context.discarded).then_some(context.document)
    }

    /// Register a one-shot `load` listener on `target`.
    ///
    /// [§ 2.7 addEventListener](https://dom.spec.whatwg.org/#dom-eventtarget-addeventlistener)
    /// with `{ once: true }`. Listeners run in registration order.
    pub fn add_load_listener(&mut self, target: NodeId, listener: LoadListener) {
        self.load_listeners.entry(target).or_default().push_back(listener);
    }

    /// Number of `load` listeners still waiting on `target`.
    #[must_use]
    pub fn load_listener_count(&self, target: NodeId) -> usize {
        self.load_listeners.get(&target).map_or(0, std::collections::VecDeque::len)
    }

    /// Number of tasks waiting in the event loop.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Run the oldest queued task. Returns `false` if the queue was empty.
    pub fn run_next_task(&mut self) -> bool {
        let Some(task) = self.tasks.pop_front() else {
            return false;
        };
        match task {
            Task::FinishLoad(id) => self.finish_load(id),
        }
        true
    }

    /// Run tasks until the queue is empty, including tasks queued by the
    /// tasks themselves. Returns the number of tasks run.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while self.run_next_task() {
            ran += 1;
        }
        ran
    }

    /// Complete the load of `iframe`'s nested document now, regardless of the
    /// host's [`FrameLoading`] setting. Returns `false` if the iframe has no
    /// live nested context or its document already completed.
    pub fn finish_frame_load(&mut self, iframe: NodeId) -> bool {
        let Some(&id) = self.frames.get(&iframe) else {
            return false;
        };
        let loading = self
            .content_document(iframe)
            .and_then(|doc| self.ready_state(doc))
            .is_some_and(|state| state != ReadyState::Complete);
        if loading {
            self.finish_load(id);
        }
        loading
    }

    /// [§ 7.4.5 Completing loading](https://html.spec.whatwg.org/multipage/document-lifecycle.html#completely-finish-loading)
    fn finish_load(&mut self, id: ContextId) {
        let Some(context) = self.context(id) else {
            return;
        };
        if context.discarded {
            return;
        }
        let (document, container) = (context.document, context.container);
        // Load fires once per navigation; a completed document has fired it.
        if self.ready_state(document) == Some(ReadyState::Complete) {
            return;
        }
        if let Some(NodeType::Document(data)) = self.get_mut(document).map(|n| &mut n.node_type) {
            data.ready_state = ReadyState::Complete;
        }
        // "If container is non-null, then queue an element task on the DOM
        //  manipulation task source given container to fire an event named
        //  load at container." Dispatched inline here; we are already a task.
        if let Some(iframe) = container {
            self.fire_load(iframe);
        }
    }

    /// Dispatch `load` at `target`. Listeners added during dispatch wait for
    /// the next `load`.
    fn fire_load(&mut self, target: NodeId) {
        let listeners = self.load_listeners.remove(&target).unwrap_or_default();
        debug!("firing load at {target:?} ({} listeners)", listeners.len());
        for listener in listeners {
            listener(self);
        }
    }

    /// Create a browsing context for `document`, hosted by `container`.
    pub(crate) fn attach_context(&mut self, document: NodeId, container: Option<NodeId>) -> ContextId {
        let id = ContextId(self.contexts.len());
        self.contexts.push(BrowsingContext {
            document,
            container,
            discarded: false,
            trusted_types: TrustedTypePolicyFactory::new(self.trusted_types_supported),
        });
        if let Some(NodeType::Document(data)) = self.get_mut(document).map(|n| &mut n.node_type) {
            data.browsing_context = Some(id);
        }
        id
    }

    /// [§ 4.8.5 iframe insertion steps](https://html.spec.whatwg.org/multipage/iframe-embed-object.html#the-iframe-element:html-element-post-connection-steps)
    ///
    /// Runs for `node` and its descendants after `node` became connected.
    pub(crate) fn run_insertion_steps(&mut self, node: NodeId) {
        let root = self.tree_root(node);
        if !self.has_live_window(root) {
            return;
        }
        for id in self.inclusive_descendants(node) {
            if self.is_iframe(id) && self.content_document(id).is_none() {
                self.create_child_navigable(id);
            }
        }
    }

    /// [§ 4.8.5 iframe removing steps](https://html.spec.whatwg.org/multipage/iframe-embed-object.html#the-iframe-element:html-element-removing-steps)
    ///
    /// "Destroy a child navigable given removedNode."
    pub(crate) fn run_removing_steps(&mut self, node: NodeId) {
        for id in self.inclusive_descendants(node) {
            if let Some(context) = self.frames.remove(&id) {
                self.destroy_context(context);
            }
        }
    }

    /// [§ 7.3.1.1 Creating a new child navigable](https://html.spec.whatwg.org/multipage/document-sequences.html#create-a-new-child-navigable)
    ///
    /// The initial `about:blank` document gets the html/head/body skeleton
    /// and starts out `loading`.
    fn create_child_navigable(&mut self, iframe: NodeId) {
        let document = self.alloc_document(ReadyState::Loading);
        self.build_skeleton(document);
        let id = self.attach_context(document, Some(iframe));
        let _ = self.frames.insert(iframe, id);
        debug!("iframe {iframe:?} got nested document {document:?} ({id:?})");

        if self.frame_loading == FrameLoading::Queued {
            self.tasks.push_back(Task::FinishLoad(id));
        }
    }

    /// [§ 7.3.1.3 Destroying a child navigable](https://html.spec.whatwg.org/multipage/document-sequences.html#destroy-a-child-navigable)
    ///
    /// Nested iframes inside the destroyed document go with it.
    fn destroy_context(&mut self, id: ContextId) {
        let Some(context) = self.contexts.get_mut(id.0) else {
            return;
        };
        if context.discarded {
            return;
        }
        context.discarded = true;
        let document = context.document;
        debug!("destroyed {id:?} (document {document:?})");
        self.run_removing_steps(document);
    }
}
