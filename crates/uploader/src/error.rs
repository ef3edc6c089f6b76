//! Upload error types.

use std::fmt;

use assetlift_platform::PlatformError;
use assetlift_transfer::ValidationError;
use assetlift_transport::TransportError;

/// Phase of the staged upload protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadPhase {
    Validate,
    Negotiate,
    Transfer,
    Register,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validate => "validate",
            Self::Negotiate => "negotiate",
            Self::Transfer => "transfer",
            Self::Register => "register",
        };
        f.write_str(s)
    }
}

/// Errors produced by an upload. None of them are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("negotiation failed: {0}")]
    Negotiation(#[source] PlatformError),

    #[error("storage endpoint returned {status}: {body}")]
    Transfer { status: u16, body: String },

    #[error("transfer failed: {0}")]
    TransferTransport(#[source] TransportError),

    #[error("registration failed: {0}")]
    Registration(#[source] PlatformError),

    #[error("cancelled during {0}")]
    Cancelled(UploadPhase),
}

impl UploadError {
    /// Phase in which the upload failed.
    pub fn phase(&self) -> UploadPhase {
        match self {
            Self::Validation(_) => UploadPhase::Validate,
            Self::Negotiation(_) => UploadPhase::Negotiate,
            Self::Transfer { .. } | Self::TransferTransport(_) => UploadPhase::Transfer,
            Self::Registration(_) => UploadPhase::Register,
            Self::Cancelled(phase) => *phase,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
