//! Deferred mutation routing for frame targets.
//!
//! Every mutation the adapter performs goes through [`MutationRouter::dispatch`]:
//!
//! 1. A target that is not frame-like is mutated directly.
//! 2. A frame-like target is replaced by the body of its nested document when
//!    that document is `complete`, and the rule is applied again.
//! 3. Otherwise the mutation is queued for that frame. The first queued
//!    mutation subscribes to the frame's `load` signal; when it fires, the
//!    queue is drained in issue order through the same rule.
//!
//! While a frame has queued mutations, later mutations for it are queued too,
//! even if its document has meanwhile become ready, so nothing overtakes the
//! backlog. Each queued mutation leaves the queue exactly once.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use framedom_dom::{DomError, ReadyState};
use log::{debug, warn};
use strum_macros::{Display, EnumString};

use crate::environment::DomEnvironment;

/// The kind of a mutation, named after the DOM member it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum OperationKind {
    /// `Node.appendChild`
    #[strum(serialize = "appendChild")]
    AppendChild,
    /// `Node.removeChild`
    #[strum(serialize = "removeChild")]
    RemoveChild,
    /// `Node.insertBefore`
    #[strum(serialize = "insertBefore")]
    InsertBefore,
    /// `Node.textContent` assignment
    #[strum(serialize = "textContent")]
    SetTextContent,
}

/// A mutation and its payload, independent of the node it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<N> {
    /// Append `child` as the last child.
    AppendChild {
        /// The node to append.
        child: N,
    },
    /// Remove `child`.
    RemoveChild {
        /// The node to remove.
        child: N,
    },
    /// Insert `child` before `reference`; at the end when `reference` is `None`.
    InsertBefore {
        /// The node to insert.
        child: N,
        /// The sibling to insert before.
        reference: Option<N>,
    },
    /// Replace the content with `text`.
    SetTextContent {
        /// The new text.
        text: String,
    },
}

impl<N> Mutation<N> {
    /// The kind of this mutation.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::AppendChild { .. } => OperationKind::AppendChild,
            Self::RemoveChild { .. } => OperationKind::RemoveChild,
            Self::InsertBefore { .. } => OperationKind::InsertBefore,
            Self::SetTextContent { .. } => OperationKind::SetTextContent,
        }
    }
}

/// Outcome of a routed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The mutation took effect before the call returned.
    Applied,
    /// The mutation is queued until the target frame finishes loading.
    Deferred,
}

/// Load state of a frame-like node, as far as routing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FrameState {
    /// No nested document exists yet.
    Uninitialized,
    /// A nested document exists but is not `complete`.
    Loading,
    /// The nested document is `complete`.
    Ready,
}

/// A mutation waiting for its frame to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation<N> {
    /// Issue order across all frames of one router.
    pub sequence: u64,
    /// The frame the mutation was issued against.
    pub frame: N,
    /// What to do once the frame is ready.
    pub mutation: Mutation<N>,
}

#[derive(Debug)]
struct PendingQueues<N> {
    by_frame: HashMap<N, VecDeque<PendingOperation<N>>>,
    next_sequence: u64,
}

impl<N: Eq + Hash> PendingQueues<N> {
    fn backlog(&self, frame: &N) -> usize {
        self.by_frame.get(frame).map_or(0, VecDeque::len)
    }
}

type SharedQueues<N> = Rc<RefCell<PendingQueues<N>>>;

/// Routes mutations to their effective target, deferring the ones aimed at
/// frames that have not finished loading.
pub struct MutationRouter<N> {
    pending: SharedQueues<N>,
}

impl<N> MutationRouter<N>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
{
    /// A router with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Rc::new(RefCell::new(PendingQueues {
                by_frame: HashMap::new(),
                next_sequence: 0,
            })),
        }
    }

    /// Apply `mutation` to `target`, redirecting and deferring as needed.
    ///
    /// # Errors
    ///
    /// Returns the host's [`DomError`] when a mutation applied synchronously
    /// fails, or [`DomError::MissingBody`] when a ready nested document has no
    /// body. Deferred mutations never fail here; a failure during replay is
    /// logged.
    pub fn dispatch<E>(
        &self,
        env: &mut E,
        target: &N,
        mutation: Mutation<N>,
    ) -> Result<Dispatch, DomError>
    where
        E: DomEnvironment<Node = N>,
    {
        route(&self.pending, env, target, mutation)
    }

    /// Number of mutations queued for `frame`.
    #[must_use]
    pub fn pending_operations(&self, frame: &N) -> usize {
        self.pending.borrow().backlog(frame)
    }

    /// The mutations queued for `frame`, oldest first.
    #[must_use]
    pub fn pending(&self, frame: &N) -> Vec<PendingOperation<N>> {
        self.pending
            .borrow()
            .by_frame
            .get(frame)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Frames with at least one queued mutation.
    #[must_use]
    pub fn waiting_frames(&self) -> Vec<N> {
        self.pending.borrow().by_frame.keys().cloned().collect()
    }
}

impl<N> Default for MutationRouter<N>
where
    N: Clone + Eq + Hash + fmt::Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N: fmt::Debug> fmt::Debug for MutationRouter<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationRouter")
            .field("pending", &self.pending)
            .finish()
    }
}

/// Classify `frame` by the state of its nested document.
#[must_use]
pub fn frame_state<E: DomEnvironment>(env: &E, frame: &E::Node) -> FrameState {
    match env.content_document(frame) {
        None => FrameState::Uninitialized,
        Some(document) if env.ready_state(&document) == ReadyState::Complete => FrameState::Ready,
        Some(_) => FrameState::Loading,
    }
}

fn route<E: DomEnvironment>(
    queues: &SharedQueues<E::Node>,
    env: &mut E,
    target: &E::Node,
    mutation: Mutation<E::Node>,
) -> Result<Dispatch, DomError> {
    if !env.is_frame_like(target) {
        apply(env, target, mutation)?;
        return Ok(Dispatch::Applied);
    }

    let has_backlog = queues.borrow().backlog(target) > 0;
    if !has_backlog && frame_state(env, target) == FrameState::Ready {
        let body = env
            .content_document(target)
            .and_then(|document| env.body(&document))
            .ok_or(DomError::MissingBody)?;
        return route(queues, env, &body, mutation);
    }

    defer(queues, env, target, mutation);
    Ok(Dispatch::Deferred)
}

fn apply<E: DomEnvironment>(
    env: &mut E,
    target: &E::Node,
    mutation: Mutation<E::Node>,
) -> Result<(), DomError> {
    match mutation {
        Mutation::AppendChild { child } => env.append_child(target, &child),
        Mutation::RemoveChild { child } => env.remove_child(target, &child),
        Mutation::InsertBefore { child, reference } => {
            env.insert_before(target, &child, reference.as_ref())
        }
        Mutation::SetTextContent { text } => env.set_text_content(target, &text),
    }
}

fn defer<E: DomEnvironment>(
    queues: &SharedQueues<E::Node>,
    env: &mut E,
    frame: &E::Node,
    mutation: Mutation<E::Node>,
) {
    let kind = mutation.kind();
    let first = {
        let mut queues = queues.borrow_mut();
        let sequence = queues.next_sequence;
        queues.next_sequence += 1;
        let queue = queues.by_frame.entry(frame.clone()).or_default();
        queue.push_back(PendingOperation {
            sequence,
            frame: frame.clone(),
            mutation,
        });
        queue.len() == 1
    };
    debug!("deferred {kind} on {frame:?} until load");

    if first {
        let shared = Rc::clone(queues);
        let key = frame.clone();
        env.add_load_listener(frame, Box::new(move |env: &mut E| replay(&shared, env, &key)));
    }
}

fn replay<E: DomEnvironment>(queues: &SharedQueues<E::Node>, env: &mut E, frame: &E::Node) {
    let batch = queues
        .borrow_mut()
        .by_frame
        .remove(frame)
        .unwrap_or_default();
    debug!("replaying {} deferred operations on {frame:?}", batch.len());

    for operation in batch {
        let kind = operation.mutation.kind();
        match route(queues, env, frame, operation.mutation) {
            Ok(Dispatch::Applied) => {}
            Ok(Dispatch::Deferred) => debug!("{kind} on {frame:?} deferred again"),
            Err(err) => warn!("deferred {kind} on {frame:?} failed: {err}"),
        }
    }
}
