//! Platform error types.

use assetlift_transport::TransportError;

/// Errors produced by platform calls.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GraphQL error: {}", .messages.join("; "))]
    Graphql { messages: Vec<String> },

    #[error("staged upload rejected: {}", .messages.join("; "))]
    Negotiation { messages: Vec<String> },

    #[error("resource creation rejected: {}", .messages.join("; "))]
    Registration { messages: Vec<String> },

    #[error("response missing {0}")]
    MissingData(&'static str),
}

impl PlatformError {
    pub(crate) fn negotiation(message: impl Into<String>) -> Self {
        Self::Negotiation {
            messages: vec![message.into()],
        }
    }

    pub(crate) fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            messages: vec![message.into()],
        }
    }

    /// Platform-reported messages, if this error carries any.
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Graphql { messages }
            | Self::Negotiation { messages }
            | Self::Registration { messages } => messages,
            _ => &[],
        }
    }
}
