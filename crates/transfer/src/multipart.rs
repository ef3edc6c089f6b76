//! Byte-exact `multipart/form-data` assembly.
//!
//! Layout, with `B` the boundary:
//!
//! ```text
//! --B\r\nContent-Disposition: form-data; name="{name}"\r\n\r\n{value}\r\n   (per parameter, in order)
//! --B\r\nContent-Disposition: form-data; name="file"; filename="{filename}"\r\n
//! Content-Type: {mime}\r\n\r\n{raw bytes}\r\n--B--\r\n
//! ```
//!
//! Text is written as plain UTF-8 with no byte-order mark. Attachment bytes
//! are copied verbatim.

use crate::ValidationError;
use crate::boundary::Boundary;

const FILE_FIELD: &str = "file";

/// The binary part of a multipart body.
#[derive(Debug, Clone, Copy)]
pub struct Attachment<'a> {
    pub bytes: &'a [u8],
    pub filename: &'a str,
    pub mime_type: &'a str,
}

/// A built multipart body and the boundary it was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    boundary: Boundary,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Builds the body for one upload attempt.
///
/// Parameters are emitted in the given order, followed by the attachment as
/// the final `file` part.
pub fn build(
    boundary: &Boundary,
    parameters: &[(String, String)],
    attachment: &Attachment<'_>,
) -> Result<MultipartBody, ValidationError> {
    validate(parameters, attachment)?;

    let b = boundary.as_str();
    let mut out = Vec::with_capacity(encoded_len(boundary, parameters, attachment));

    for (name, value) in parameters {
        out.extend_from_slice(b"--");
        out.extend_from_slice(b.as_bytes());
        out.extend_from_slice(b"\r\nContent-Disposition: form-data; name=\"");
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b"\"\r\n\r\n");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(b"--");
    out.extend_from_slice(b.as_bytes());
    out.extend_from_slice(b"\r\nContent-Disposition: form-data; name=\"");
    out.extend_from_slice(FILE_FIELD.as_bytes());
    out.extend_from_slice(b"\"; filename=\"");
    out.extend_from_slice(attachment.filename.as_bytes());
    out.extend_from_slice(b"\"\r\nContent-Type: ");
    out.extend_from_slice(attachment.mime_type.as_bytes());
    out.extend_from_slice(b"\r\n\r\n");
    out.extend_from_slice(attachment.bytes);
    out.extend_from_slice(b"\r\n--");
    out.extend_from_slice(b.as_bytes());
    out.extend_from_slice(b"--\r\n");

    Ok(MultipartBody {
        boundary: boundary.clone(),
        bytes: out,
    })
}

/// Exact byte length [`build`] produces for these inputs.
pub fn encoded_len(
    boundary: &Boundary,
    parameters: &[(String, String)],
    attachment: &Attachment<'_>,
) -> usize {
    const PART_HEAD: usize = "--".len() + "\r\nContent-Disposition: form-data; name=\"".len();
    let b = boundary.as_str().len();

    let params: usize = parameters
        .iter()
        .map(|(name, value)| PART_HEAD + b + name.len() + "\"\r\n\r\n".len() + value.len() + 2)
        .sum();

    let file_head = PART_HEAD
        + b
        + FILE_FIELD.len()
        + "\"; filename=\"".len()
        + attachment.filename.len()
        + "\"\r\nContent-Type: ".len()
        + attachment.mime_type.len()
        + "\r\n\r\n".len();
    let closing = "\r\n--".len() + b + "--\r\n".len();

    params + file_head + attachment.bytes.len() + closing
}

fn validate(parameters: &[(String, String)], attachment: &Attachment<'_>) -> Result<(), ValidationError> {
    if parameters.is_empty() {
        return Err(ValidationError::EmptyParameters);
    }
    if attachment.bytes.is_empty() {
        return Err(ValidationError::EmptyAttachment);
    }
    if attachment.filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }
    check_header_text("parameter name", parameters.iter().map(|(n, _)| n.as_str()))?;
    check_header_text("filename", [attachment.filename])?;
    check_header_text("MIME type", [attachment.mime_type])?;
    Ok(())
}

/// Rejects text that would break out of a quoted header value.
fn check_header_text<'a>(
    field: &'static str,
    values: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    for value in values {
        if value.contains(['"', '\r', '\n']) {
            return Err(ValidationError::InvalidHeaderText {
                field,
                value: value.to_string(),
            });
        }
    }
    Ok(())
}
