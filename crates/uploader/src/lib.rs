//! Staged upload client.
//!
//! A file reaches the platform in three phases:
//!
//! 1. **negotiate**: request a single-use staged target for the file's
//!    name, MIME type and size;
//! 2. **transfer**: POST a multipart body carrying the target's signed
//!    parameters followed by the file to the storage endpoint;
//! 3. **register**: create a platform resource from the staged resource
//!    URL.
//!
//! A failure in any phase aborts that file. Nothing is retried; a fresh
//! upload negotiates a fresh target.

pub mod error;
pub mod orchestrator;
mod session;
pub mod types;

pub use error::{UploadError, UploadPhase};
pub use orchestrator::StagedUploader;
pub use types::{BatchEntry, UploadEvent, UploadRequest, UploaderConfig};
