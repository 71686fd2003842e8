//! The document new nodes are created in.
//!
//! In default mode that is the ambient document. In clean mode the factory
//! attaches a hidden iframe to the ambient `<head>` and creates nodes in the
//! iframe's nested document, which starts out with none of the ambient
//! document's globals, styles or scripts. The nested document is cached, but
//! every access first checks that its window is still reachable; a frame that
//! was removed or reloaded is replaced by a fresh one.

use std::fmt;
use std::rc::Rc;

use framedom_common::warning::warn_once;
use log::{debug, warn};

use crate::config::{Config, PolicyShim};
use crate::environment::DomEnvironment;

const COMPONENT: &str = "framedom::factory";

/// The iframe backing clean mode and its nested document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanDocument<N> {
    /// The hidden iframe attached to the ambient document.
    pub frame: N,
    /// The iframe's nested document, used to create nodes.
    pub document: N,
}

/// Produces the document used to manufacture new nodes.
pub struct DocumentFactory<N> {
    config: Config,
    clean: Option<CleanDocument<N>>,
}

impl<N: Clone + fmt::Debug> DocumentFactory<N> {
    /// A factory following `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            clean: None,
        }
    }

    /// The configuration this factory was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The cached clean document, without revalidating it.
    #[must_use]
    pub const fn clean_document(&self) -> Option<&CleanDocument<N>> {
        self.clean.as_ref()
    }

    /// The document to create nodes in.
    ///
    /// Never returns a clean document whose window has gone away. If the host
    /// cannot produce a nested document at all, the ambient document is used.
    pub fn document<E>(&mut self, env: &mut E) -> N
    where
        E: DomEnvironment<Node = N>,
    {
        if !self.config.is_clean() {
            return env.ambient_document();
        }

        if let Some(clean) = &self.clean {
            if env.has_live_window(&clean.document) {
                return clean.document.clone();
            }
            debug!("clean document {:?} went stale, recreating", clean.document);
        }

        match create_clean_document(env, &self.config) {
            Some(clean) => {
                let document = clean.document.clone();
                self.clean = Some(clean);
                document
            }
            None => {
                self.clean = None;
                env.ambient_document()
            }
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for DocumentFactory<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFactory")
            .field("config", &self.config)
            .field("clean", &self.clean)
            .finish()
    }
}

fn create_clean_document<E: DomEnvironment>(
    env: &mut E,
    config: &Config,
) -> Option<CleanDocument<E::Node>> {
    let ambient = env.ambient_document();
    let frame = env.create_element(&ambient, "iframe");

    // Attaching the frame is what gives it a nested browsing context.
    let container = env.head(&ambient).unwrap_or_else(|| {
        warn_once(COMPONENT, "ambient document has no <head>; attaching clean frame elsewhere");
        env.document_element(&ambient).unwrap_or_else(|| ambient.clone())
    });
    if let Err(err) = env.append_child(&container, &frame) {
        warn!(target: COMPONENT, "could not attach clean frame: {err}");
        return None;
    }

    let Some(document) = env.content_document(&frame) else {
        warn_once(COMPONENT, "clean frame has no nested document; using the ambient document");
        return None;
    };
    debug!("created clean document {document:?} in frame {frame:?}");

    if let Some(policy) = config.content_policy() {
        let shim = Rc::new(PolicyShim::new(Rc::clone(policy)));
        if let Err(err) = env.install_default_policy(&document, shim) {
            debug!("default policy rejected by {document:?}: {err}");
            warn_once(COMPONENT, "content policy not installed in clean document");
        }
    }

    Some(CleanDocument { frame, document })
}
