//! Trusted Types for the host's windows.
//!
//! [Trusted Types](https://w3c.github.io/trusted-types/dist/spec/)
//!
//! Each window owns a [`TrustedTypePolicyFactory`]. Installing a policy named
//! `"default"` makes the injection sinks of that window's documents
//! ([`DomTree::set_inner_markup`], [`DomTree::set_script_text`],
//! [`DomTree::set_script_src`]) pass string input through the policy before
//! it reaches the tree.
//!
//! Policy values are realm-bound: a [`TrustedHtml`] minted by one window's
//! policy is just a wrapper around a string to any other window. Policies are
//! therefore built from [`PolicyRules`], which deal in plain strings.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::{DomError, DomTree, NodeId};

/// Name of the policy consulted by injection sinks.
pub const DEFAULT_POLICY_NAME: &str = "default";

macro_rules! trusted_value {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Wrap a value approved by a policy.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// The approved value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Unwrap into the approved string.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

trusted_value!(
    /// [§ 2.2.1 `TrustedHTML`](https://w3c.github.io/trusted-types/dist/spec/#trusted-html)
    TrustedHtml
);
trusted_value!(
    /// [§ 2.2.2 `TrustedScript`](https://w3c.github.io/trusted-types/dist/spec/#trusted-script)
    TrustedScript
);
trusted_value!(
    /// [§ 2.2.3 `TrustedScriptURL`](https://w3c.github.io/trusted-types/dist/spec/#trused-script-url)
    TrustedScriptUrl
);

/// [§ 2.3.4 `TrustedTypePolicyOptions`](https://w3c.github.io/trusted-types/dist/spec/#trustedtypepolicyoptions)
///
/// The callbacks behind a policy: `createHTML`, `createScript` and
/// `createScriptURL`.
pub trait PolicyRules {
    /// Approve `input` for an HTML sink.
    fn create_html(&self, input: &str) -> String;
    /// Approve `input` as script source text.
    fn create_script(&self, input: &str) -> String;
    /// Approve `input` as a script URL.
    fn create_script_url(&self, input: &str) -> String;
}

/// [§ 2.3.2 `TrustedTypePolicy`](https://w3c.github.io/trusted-types/dist/spec/#trusted-type-policy)
#[derive(Clone)]
pub struct TrustedTypePolicy {
    name: String,
    rules: Rc<dyn PolicyRules>,
}

impl TrustedTypePolicy {
    /// The policy's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// [§ 2.3.2 createHTML](https://w3c.github.io/trusted-types/dist/spec/#dom-trustedtypepolicy-createhtml)
    #[must_use]
    pub fn create_html(&self, input: &str) -> TrustedHtml {
        TrustedHtml::new(self.rules.create_html(input))
    }

    /// [§ 2.3.2 createScript](https://w3c.github.io/trusted-types/dist/spec/#dom-trustedtypepolicy-createscript)
    #[must_use]
    pub fn create_script(&self, input: &str) -> TrustedScript {
        TrustedScript::new(self.rules.create_script(input))
    }

    /// [§ 2.3.2 createScriptURL](https://w3c.github.io/trusted-types/dist/spec/#dom-trustedtypepolicy-createscripturl)
    #[must_use]
    pub fn create_script_url(&self, input: &str) -> TrustedScriptUrl {
        TrustedScriptUrl::new(self.rules.create_script_url(input))
    }
}

impl fmt::Debug for TrustedTypePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedTypePolicy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// [§ 2.3 `TrustedTypePolicyFactory`](https://w3c.github.io/trusted-types/dist/spec/#trusted-type-policy-factory)
#[derive(Debug, Default)]
pub struct TrustedTypePolicyFactory {
    supported: bool,
    policies: Vec<TrustedTypePolicy>,
}

impl TrustedTypePolicyFactory {
    /// A factory for a window that does (or does not) implement Trusted Types.
    #[must_use]
    pub const fn new(supported: bool) -> Self {
        Self {
            supported,
            policies: Vec::new(),
        }
    }

    /// Whether this window implements Trusted Types at all.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.supported
    }

    /// [§ 2.3.1 createPolicy](https://w3c.github.io/trusted-types/dist/spec/#dom-trustedtypepolicyfactory-createpolicy)
    ///
    /// # Errors
    ///
    /// - [`DomError::NotSupported`] if the window has no Trusted Types.
    /// - [`DomError::DuplicatePolicy`] if a default policy already exists.
    pub fn create_policy(
        &mut self,
        name: &str,
        rules: Rc<dyn PolicyRules>,
    ) -> Result<TrustedTypePolicy, DomError> {
        if !self.supported {
            return Err(DomError::NotSupported("trustedTypes is not available"));
        }
        if name == DEFAULT_POLICY_NAME && self.default_policy().is_some() {
            return Err(DomError::DuplicatePolicy(name.to_string()));
        }
        let policy = TrustedTypePolicy {
            name: name.to_string(),
            rules,
        };
        self.policies.push(policy.clone());
        Ok(policy)
    }

    /// [§ 2.3.1 defaultPolicy](https://w3c.github.io/trusted-types/dist/spec/#dom-trustedtypepolicyfactory-defaultpolicy)
    #[must_use]
    pub fn default_policy(&self) -> Option<&TrustedTypePolicy> {
        self.policies.iter().find(|p| p.name == DEFAULT_POLICY_NAME)
    }
}

impl DomTree {
    /// The Trusted Types factory of `document`'s window.
    #[must_use]
    pub fn trusted_types(&self, document: NodeId) -> Option<&TrustedTypePolicyFactory> {
        let id = self.live_context_of(document)?;
        self.contexts.get(id.0).map(|c| &c.trusted_types)
    }

    /// Install `rules` as the `"default"` policy of `document`'s window.
    ///
    /// # Errors
    ///
    /// - [`DomError::NotSupported`] if the document has no live window or the
    ///   window has no Trusted Types.
    /// - [`DomError::DuplicatePolicy`] if a default policy is already installed.
    pub fn install_default_policy(
        &mut self,
        document: NodeId,
        rules: Rc<dyn PolicyRules>,
    ) -> Result<(), DomError> {
        let id = self
            .live_context_of(document)
            .ok_or(DomError::NotSupported("document has no window"))?;
        let context = self
            .contexts
            .get_mut(id.0)
            .ok_or(DomError::NotSupported("document has no window"))?;
        let _ = context.trusted_types.create_policy(DEFAULT_POLICY_NAME, rules)?;
        debug!("installed default trusted types policy for {document:?}");
        Ok(())
    }

    fn default_policy_for(&self, node: NodeId) -> Option<&TrustedTypePolicy> {
        let document = self.node_document(node)?;
        self.trusted_types(document)?.default_policy()
    }

    /// [§ 4.1 Get Trusted Type compliant string](https://w3c.github.io/trusted-types/dist/spec/#get-trusted-type-compliant-string-algorithm)
    /// for an HTML sink (`innerHTML`).
    ///
    /// The host has no HTML parser; the approved markup is recorded on the
    /// element and its children are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotSupported`] if `element` is not an element.
    pub fn set_inner_markup(&mut self, element: NodeId, markup: &str) -> Result<(), DomError> {
        let approved = match self.default_policy_for(element) {
            Some(policy) => policy.create_html(markup).into_string(),
            None => markup.to_string(),
        };
        if self.as_element(element).is_none() {
            return Err(DomError::NotSupported("innerHTML on a non-element"));
        }
        self.set_text_content(element, "")?;
        if let Some(data) = self.as_element_mut(element) {
            data.markup = Some(approved);
        }
        Ok(())
    }

    /// The markup last recorded by [`DomTree::set_inner_markup`].
    #[must_use]
    pub fn inner_markup(&self, element: NodeId) -> Option<&str> {
        self.as_element(element).and_then(|e| e.markup.as_deref())
    }

    /// Script text sink (`script.text`), approved by `createScript`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotSupported`] if `script` is not a `<script>`.
    pub fn set_script_text(&mut self, script: NodeId, text: &str) -> Result<(), DomError> {
        if !self.as_element(script).is_some_and(|e| e.is_html("script")) {
            return Err(DomError::NotSupported("script text on a non-script element"));
        }
        let approved = match self.default_policy_for(script) {
            Some(policy) => policy.create_script(text).into_string(),
            None => text.to_string(),
        };
        self.set_text_content(script, &approved)
    }

    /// Script URL sink (`script.src`), approved by `createScriptURL`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotSupported`] if `script` is not a `<script>`.
    pub fn set_script_src(&mut self, script: NodeId, url: &str) -> Result<(), DomError> {
        if !self.as_element(script).is_some_and(|e| e.is_html("script")) {
            return Err(DomError::NotSupported("script src on a non-script element"));
        }
        let approved = match self.default_policy_for(script) {
            Some(policy) => policy.create_script_url(url).into_string(),
            None => url.to_string(),
        };
        self.set_attribute(script, "src", &approved)
    }
}
