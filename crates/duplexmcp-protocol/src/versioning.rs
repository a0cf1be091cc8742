//! Protocol version constants and negotiation.
//!
//! The client requests its latest supported version; the server echoes it
//! when supported, otherwise answers with the newest version it supports.
//! The client rejects the connection if the server's choice is outside its
//! own supported set.

/// Latest protocol revision this SDK implements.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-11-25";

/// Protocol revisions this SDK accepts, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] =
    &["2025-11-25", "2025-06-18", "2025-03-26", "2024-11-05"];

/// Whether this SDK accepts the given protocol revision.
pub fn is_supported(version: &str) -> bool {
    SUPPORTED_PROTOCOL_VERSIONS.contains(&version)
}

/// Server-side negotiation: echo a supported requested version, otherwise
/// answer with the newest version this side supports.
pub fn negotiate(requested: &str) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .find(|v| **v == requested)
        .copied()
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_echoes_supported() {
        assert_eq!(negotiate("2025-06-18"), "2025-06-18");
        assert_eq!(negotiate(LATEST_PROTOCOL_VERSION), LATEST_PROTOCOL_VERSION);
    }

    #[test]
    fn test_negotiate_falls_back_to_latest() {
        assert_eq!(negotiate("1999-01-01"), LATEST_PROTOCOL_VERSION);
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported("2024-11-05"));
        assert!(!is_supported("2020-01-01"));
    }
}
