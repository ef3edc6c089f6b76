//! Staged target negotiation: request shaping and response validation.

use assetlift_protocol::constants::STAGED_HTTP_METHOD;
use assetlift_protocol::graphql::{StagedUploadInput, StagedUploadsCreatePayload};
use assetlift_protocol::{FileDescriptor, StagedTarget};

use crate::error::PlatformError;

/// Builds the negotiation input for one file.
pub fn staged_input(descriptor: &FileDescriptor) -> StagedUploadInput {
    StagedUploadInput {
        filename: descriptor.name.clone(),
        mime_type: descriptor.mime_type.clone(),
        resource: descriptor.resource_class.staged_resource().to_string(),
        file_size: descriptor.byte_length.to_string(),
        http_method: STAGED_HTTP_METHOD.to_string(),
    }
}

/// Extracts the single staged target, surfacing platform validation
/// messages as [`PlatformError::Negotiation`].
pub fn target_from_payload(payload: StagedUploadsCreatePayload) -> Result<StagedTarget, PlatformError> {
    if !payload.user_errors.is_empty() {
        return Err(PlatformError::Negotiation {
            messages: payload.user_errors.iter().map(|e| e.describe()).collect(),
        });
    }

    payload
        .staged_targets
        .into_iter()
        .next()
        .and_then(|node| node.into_target())
        .ok_or_else(|| PlatformError::negotiation("no staged target returned"))
}
