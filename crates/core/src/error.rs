//! Error types for the sheetdraft domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all sheetdraft operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Chat platform errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Spreadsheet errors ---
    #[error("Spreadsheet error: {0}")]
    Sheets(#[from] SheetsError),

    // --- Conversation errors ---
    #[error("{0}")]
    Conversation(#[from] ConversationError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Message edit failed on {channel}: {reason}")]
    EditFailed { channel: String, reason: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),

    #[error("Invalid update payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, Error)]
pub enum SheetsError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Failed to load credentials from {path}: {reason}")]
    Credentials { path: String, reason: String },

    #[error("Sheets API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
}

impl SheetsError {
    /// Whether the failure means the credential itself was rejected.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            SheetsError::AuthenticationFailed(_) | SheetsError::Credentials { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Session not found for chat {chat_id}. Please start again with /start or /sheets.")]
    SessionNotFound { chat_id: i64 },

    #[error("{0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheets_error_displays_status() {
        let err = Error::Sheets(SheetsError::Api {
            status_code: 400,
            message: "Unable to parse range".into(),
        });
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Unable to parse range"));
    }

    #[test]
    fn conversation_error_is_shown_verbatim() {
        let err = Error::from(ConversationError::SessionNotFound { chat_id: 42 });
        assert!(err.to_string().starts_with("Session not found for chat 42"));
    }

    #[test]
    fn auth_errors_are_classified() {
        assert!(SheetsError::AuthenticationFailed("bad key".into()).is_auth());
        assert!(
            SheetsError::Credentials {
                path: "credentials.json".into(),
                reason: "missing".into()
            }
            .is_auth()
        );
        assert!(!SheetsError::Network("reset".into()).is_auth());
    }
}
