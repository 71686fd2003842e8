//! Deduplicated warnings for degraded host environments.
//!
//! A missing capability (no Trusted Types in a nested realm, a document
//! without a `<head>`) tends to be hit on every call that touches it. These
//! helpers report each distinct message once through the [`log`] facade, with
//! the reporting component as the log target.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

fn key(component: &str, message: &str) -> String {
    format!("[{component}] {message}")
}

/// Warn about a degraded capability (logged once per unique message).
///
/// # Example
/// ```
/// use framedom_common::warning::warn_once;
///
/// warn_once("factory", "trusted types unsupported in clean document");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let should_log = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key(component, message));

    if should_log {
        log::warn!(target: component, "{message}");
    }
}

/// Whether `message` has already been reported for `component`.
#[must_use]
pub fn has_warned(component: &str, message: &str) -> bool {
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .is_some_and(|set| set.contains(&key(component, message)))
}

/// Forget all recorded warnings, so the next occurrence is logged again.
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
