//! Multipart payloads for policy-signed staged uploads.
//!
//! The storage endpoint behind a staged target validates its signed policy
//! against the exact field order and encoding it issued, so bodies are
//! assembled by hand rather than through a generic form encoder.

mod boundary;
mod content_type;
mod multipart;

pub use boundary::{Boundary, MAX_BOUNDARY_ATTEMPTS};
pub use content_type::{DEFAULT_CONTENT_TYPE, data_uri, detect_content_type};
pub use multipart::{Attachment, MultipartBody, build, encoded_len};

/// Malformed local input, rejected before anything is sent.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one policy parameter is required")]
    EmptyParameters,

    #[error("attachment is empty")]
    EmptyAttachment,

    #[error("filename is empty")]
    EmptyFilename,

    #[error("{field} contains a quote or line break: {value:?}")]
    InvalidHeaderText { field: &'static str, value: String },

    #[error("could not generate a boundary absent from the payload after {0} attempts")]
    BoundaryCollision(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
