//! crates/scroll_saga_core/src/messages.rs
//!
//! Maps port errors to the inline status text shown to the user.

use crate::ports::PortError;

pub const CONNECTION_ISSUE: &str =
    "Connection issue detected. Please check your internet and refresh.";
pub const GENERIC_FAILURE: &str = "Something went wrong. Please refresh and try again.";
pub const BOOKLIST_AUTH_REQUIRED: &str =
    "Authentication required. Please log in again to sync your book list.";

/// Lowercased fragments that identify a connectivity failure in an error's text.
const NETWORK_MARKERS: &[&str] = &[
    "failed to fetch",
    "networkerror",
    "network request failed",
    "load failed",
    "timeout",
    "timed out",
    "error sending request",
    "connection refused",
    "connection reset",
    "dns error",
];

pub fn looks_like_network_failure(text: &str) -> bool {
    let normalized = text.to_lowercase();
    NETWORK_MARKERS
        .iter()
        .any(|marker| normalized.contains(marker))
}

/// The message to show for `error`, falling back to `fallback` when the
/// backend did not explain itself.
pub fn user_message(error: &PortError, fallback: &str) -> String {
    let raw = match error {
        PortError::Network(_) => return CONNECTION_ISSUE.to_string(),
        PortError::Http { message, .. } => match message {
            Some(message) => message.trim().to_string(),
            None => return fallback.to_string(),
        },
        PortError::Decode(_) | PortError::Cancelled => return fallback.to_string(),
        other => other.to_string(),
    };

    if raw.is_empty() {
        return fallback.to_string();
    }
    if looks_like_network_failure(&raw) {
        return CONNECTION_ISSUE.to_string();
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_normalized() {
        let err = PortError::Network("error sending request for url (https://x)".to_string());
        assert_eq!(user_message(&err, "fallback"), CONNECTION_ISSUE);

        let err = PortError::Unexpected("upstream Timeout while reading".to_string());
        assert_eq!(user_message(&err, "fallback"), CONNECTION_ISSUE);
    }

    #[test]
    fn server_messages_surface_verbatim() {
        let err = PortError::Http {
            status: 400,
            message: Some("Username already exists.".to_string()),
        };
        assert_eq!(user_message(&err, "fallback"), "Username already exists.");
    }

    #[test]
    fn unparseable_http_errors_use_the_fallback() {
        let err = PortError::Http {
            status: 500,
            message: None,
        };
        assert_eq!(user_message(&err, "Unable to load novels."), "Unable to load novels.");
        assert_eq!(
            user_message(&PortError::Decode("eof".to_string()), "Unable to load novels."),
            "Unable to load novels."
        );
    }

    #[test]
    fn preconditions_keep_their_own_text() {
        assert_eq!(
            user_message(&PortError::MissingIdentity, "fallback"),
            "Missing user id. Please log in again."
        );
        assert_eq!(
            user_message(&PortError::InvalidInput("Both fields are required.".into()), "x"),
            "Both fields are required."
        );
    }
}
