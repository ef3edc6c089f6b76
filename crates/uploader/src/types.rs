//! Data types for the upload flow.

use std::time::Duration;

use assetlift_protocol::CreatedResource;

use crate::error::{UploadError, UploadPhase};

/// One file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub alt: Option<String>,
}

impl UploadRequest {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            mime_type: mime_type.into(),
            alt: None,
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }
}

/// Result for one input of a batch upload, in input order.
#[derive(Debug)]
pub struct BatchEntry {
    pub index: usize,
    pub filename: String,
    pub result: Result<CreatedResource, UploadError>,
}

impl BatchEntry {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Phase that failed, if any.
    pub fn failed_phase(&self) -> Option<UploadPhase> {
        self.result.as_ref().err().map(UploadError::phase)
    }
}

/// Progress event emitted during uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    PhaseStarted { filename: String, phase: UploadPhase },
    PhaseCompleted { filename: String, phase: UploadPhase },
    /// The file was registered.
    Completed { filename: String, resource_id: String },
    /// The file failed in `phase`.
    Failed {
        filename: String,
        phase: UploadPhase,
        error: String,
    },
}

/// Uploader tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    /// Timeout for the multipart POST to the storage endpoint.
    pub transfer_timeout: Duration,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            transfer_timeout: Duration::from_secs(120),
        }
    }
}
