//! DOM exceptions raised by tree mutation primitives.
//!
//! [§ 2.3 Exceptions](https://webidl.spec.whatwg.org/#idl-DOMException-error-names)

use thiserror::Error;

use crate::NodeId;

/// Errors produced by [`DomTree`](crate::DomTree) operations.
///
/// The variants mirror the `DOMException` names a browser would throw for
/// the same misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The id does not refer to a node in this tree.
    #[error("node {0:?} does not exist in this tree")]
    UnknownNode(NodeId),

    /// "`HierarchyRequestError`: The operation would yield an incorrect node tree."
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(&'static str),

    /// "`NotFoundError`: The object can not be found here."
    #[error("node {child:?} is not a child of {parent:?}")]
    NotFound {
        /// The node whose children were searched.
        parent: NodeId,
        /// The node that was expected among them.
        child: NodeId,
    },

    /// "`NotSupportedError`: The operation is not supported."
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    /// [§ 2.3.2 createPolicy](https://w3c.github.io/trusted-types/dist/spec/#dom-trustedtypepolicyfactory-createpolicy)
    ///
    /// "If policyName is default and the factory's default policy value is
    /// not null, throw a `TypeError`."
    #[error("a trusted types policy named {0:?} already exists")]
    DuplicatePolicy(String),

    /// A nested document has no body element to redirect content into.
    #[error("document has no body element")]
    MissingBody,
}
