//! Session identifier resolution.
//!
//! A caller-supplied id (the `X-Session-ID` header) is propagated unchanged;
//! when absent a fresh UUID is generated. The same resolution runs in the
//! gateway and in every agent runtime so both sides agree on the identifier
//! recorded for a turn.

use uuid::Uuid;

/// Resolve a session identifier: pass through a non-empty supplied id,
/// otherwise generate a globally unique one.
pub fn resolve(provided: Option<&str>) -> String {
    match provided {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplied_id_is_returned_unchanged() {
        assert_eq!(resolve(Some("abc-123")), "abc-123");
    }

    #[test]
    fn blank_or_missing_id_generates_unique_ids() {
        let a = resolve(None);
        let b = resolve(Some("   "));
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert!(Uuid::parse_str(&b).is_ok());
    }
}
