use std::fmt;

use uuid::Uuid;

use crate::ValidationError;
use crate::multipart::Attachment;

/// Upper bound on boundary regeneration after collisions.
pub const MAX_BOUNDARY_ATTEMPTS: usize = 8;

const BOUNDARY_PREFIX: &str = "----AssetliftBoundary";

/// A multipart boundary token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Generates a fresh random boundary.
    pub fn generate() -> Self {
        Self(format!("{BOUNDARY_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Wraps a caller-supplied token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token occurs anywhere in the payload text or bytes.
    pub fn appears_in(&self, parameters: &[(String, String)], attachment: &Attachment<'_>) -> bool {
        let token = self.0.as_bytes();
        parameters
            .iter()
            .any(|(name, value)| contains(name.as_bytes(), token) || contains(value.as_bytes(), token))
            || contains(attachment.filename.as_bytes(), token)
            || contains(attachment.mime_type.as_bytes(), token)
            || contains(attachment.bytes, token)
    }

    /// Generates a boundary that does not collide with the payload.
    pub fn for_payload(
        parameters: &[(String, String)],
        attachment: &Attachment<'_>,
    ) -> Result<Self, ValidationError> {
        Self::for_payload_with(parameters, attachment, Self::generate)
    }

    /// Like [`Boundary::for_payload`] with an explicit generator.
    pub fn for_payload_with(
        parameters: &[(String, String)],
        attachment: &Attachment<'_>,
        mut generate: impl FnMut() -> Boundary,
    ) -> Result<Self, ValidationError> {
        for _ in 0..MAX_BOUNDARY_ATTEMPTS {
            let candidate = generate();
            if !candidate.0.is_empty() && !candidate.appears_in(parameters, attachment) {
                return Ok(candidate);
            }
        }
        Err(ValidationError::BoundaryCollision(MAX_BOUNDARY_ATTEMPTS))
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty()
        && haystack.len() >= needle.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}
