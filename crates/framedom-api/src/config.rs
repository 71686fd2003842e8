//! Adapter configuration and the content-trust policy contract.

use std::fmt;
use std::rc::Rc;

use framedom_dom::trusted_types::{PolicyRules, TrustedHtml, TrustedScript, TrustedScriptUrl};

/// A caller-supplied content-trust policy.
///
/// The three capabilities correspond to the `createHTML`, `createScript` and
/// `createScriptURL` callbacks of a Trusted Types policy.
pub trait ContentPolicy {
    /// Approve `input` for use as markup.
    fn sanitize_markup(&self, input: &str) -> TrustedHtml;

    /// Approve `input` for use as script source text.
    fn sanitize_script_text(&self, input: &str) -> TrustedScript;

    /// Approve `input` for use as a script reference (URL).
    fn sanitize_script_reference(&self, input: &str) -> TrustedScriptUrl;
}

/// Immutable adapter configuration, fixed when the adapter is built.
///
/// ```
/// use framedom_api::Config;
///
/// let config = Config::new().clean(true);
/// assert!(config.is_clean());
/// assert!(config.content_policy().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Config {
    clean: bool,
    content_policy: Option<Rc<dyn ContentPolicy>>,
}

impl Config {
    /// Default configuration: nodes are created in the ambient document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create nodes inside an isolated nested document instead of the
    /// ambient one.
    #[must_use]
    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Install `policy` as the default policy of the isolated document.
    /// Has no effect unless clean mode is on.
    #[must_use]
    pub fn with_content_policy(mut self, policy: Rc<dyn ContentPolicy>) -> Self {
        self.content_policy = Some(policy);
        self
    }

    /// Whether clean-document mode is on.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.clean
    }

    /// The configured content policy, if any.
    #[must_use]
    pub const fn content_policy(&self) -> Option<&Rc<dyn ContentPolicy>> {
        self.content_policy.as_ref()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("clean", &self.clean)
            .field("content_policy", &self.content_policy.is_some())
            .finish()
    }
}

/// Local stand-in for a [`ContentPolicy`] inside another global scope.
///
/// Trusted values minted by the caller's policy belong to the caller's realm,
/// so the nested scope gets rules that delegate to the policy and hand back
/// the plain content string.
pub(crate) struct PolicyShim {
    policy: Rc<dyn ContentPolicy>,
}

impl PolicyShim {
    pub(crate) const fn new(policy: Rc<dyn ContentPolicy>) -> Self {
        Self { policy }
    }
}

impl PolicyRules for PolicyShim {
    fn create_html(&self, input: &str) -> String {
        self.policy.sanitize_markup(input).into_string()
    }

    fn create_script(&self, input: &str) -> String {
        self.policy.sanitize_script_text(input).into_string()
    }

    fn create_script_url(&self, input: &str) -> String {
        self.policy.sanitize_script_reference(input).into_string()
    }
}
