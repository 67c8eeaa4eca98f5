//! Session and identity state for one client instance.

use std::sync::{Arc, RwLock};

use faultline_core::generate_session_id;

/// Process-local session and identity state.
///
/// The session identifier is fixed at construction and lives as long as the
/// client instance. The user identity is mutable; reads happen at send time,
/// so an update between capture and send is reflected in the sent payload.
/// Updates are last-write-wins.
#[derive(Debug, Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    session_id: String,
    user_id: RwLock<Option<String>>,
}

impl SessionContext {
    /// Create a context with a freshly generated session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::with_session_id(generate_session_id())
    }

    /// Create a context with a caller-supplied session identifier.
    #[must_use]
    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                session_id: session_id.into(),
                user_id: RwLock::new(None),
            }),
        }
    }

    /// The session identifier. Stable for the lifetime of this context.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// The current user identity, if one is set.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.inner.user_id.read().map_or(None, |guard| guard.clone())
    }

    /// Set the user identity for all subsequent sends.
    pub fn set_user(&self, user_id: impl Into<String>) {
        if let Ok(mut guard) = self.inner.user_id.write() {
            *guard = Some(user_id.into());
        }
    }

    /// Clear the user identity.
    pub fn clear_user(&self) {
        if let Ok(mut guard) = self.inner.user_id.write() {
            *guard = None;
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_stable_across_clones() {
        let context = SessionContext::new();
        let clone = context.clone();
        assert_eq!(context.session_id(), clone.session_id());
    }

    #[test]
    fn independent_contexts_get_distinct_sessions() {
        let a = SessionContext::new();
        let b = SessionContext::new();
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn user_updates_are_visible_through_clones() {
        let context = SessionContext::new();
        let clone = context.clone();

        assert!(context.user_id().is_none());

        clone.set_user("user-7");
        assert_eq!(context.user_id().as_deref(), Some("user-7"));

        context.clear_user();
        assert!(clone.user_id().is_none());
    }
}
