//! Session and request identifier generation.
//!
//! Identifiers combine a millisecond timestamp with process-local entropy.
//! The format is opaque to consumers; uniqueness within practical bounds is
//! the only guarantee. There is no cryptographic unguessability, so callers
//! that need it must supply their own identifiers.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a session identifier for one client instance.
#[must_use]
pub fn generate_session_id() -> String {
    entropy_id()
}

/// Generate a correlation identifier for one inbound request.
#[must_use]
pub fn generate_request_id() -> String {
    entropy_id()
}

fn entropy_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    #[allow(clippy::as_conversions)]
    let random = RandomState::new().build_hasher().finish() as u32;
    format!("{timestamp:x}-{random:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_distinct() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_carry_timestamp_and_entropy_parts() {
        let id = generate_request_id();
        let parts: Vec<&str> = id.splitn(2, '-').collect();
        assert_eq!(parts.len(), 2);
        assert!(u128::from_str_radix(parts[0], 16).is_ok());
        assert!(u32::from_str_radix(parts[1], 16).is_ok());
    }
}
