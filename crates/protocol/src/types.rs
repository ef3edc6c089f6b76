use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse content category used by the platform to pick a processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceClass {
    Image,
    Video,
    GenericFile,
}

/// Lookup row: variant, MIME prefix, staged-upload resource, creation content type.
const CLASS_TABLE: [(ResourceClass, &str, &str, &str); 3] = [
    (ResourceClass::Image, "image/", "IMAGE", "IMAGE"),
    (ResourceClass::Video, "video/", "VIDEO", "VIDEO"),
    (ResourceClass::GenericFile, "", "FILE", "FILE"),
];

impl ResourceClass {
    fn row(self) -> &'static (ResourceClass, &'static str, &'static str, &'static str) {
        CLASS_TABLE
            .iter()
            .find(|row| row.0 == self)
            .unwrap_or(&CLASS_TABLE[2])
    }

    /// Classifies a MIME type. Anything that is not `image/*` or `video/*`
    /// is a generic file.
    pub fn from_mime(mime_type: &str) -> Self {
        let mime = mime_type.trim().to_ascii_lowercase();
        CLASS_TABLE
            .iter()
            .find(|(_, prefix, _, _)| !prefix.is_empty() && mime.starts_with(prefix))
            .map(|row| row.0)
            .unwrap_or(ResourceClass::GenericFile)
    }

    /// MIME prefix for this class (`""` for generic files).
    pub fn mime_prefix(self) -> &'static str {
        self.row().1
    }

    /// Resource value for the staged-upload negotiation.
    pub fn staged_resource(self) -> &'static str {
        self.row().2
    }

    /// Content type value for resource creation.
    pub fn content_type(self) -> &'static str {
        self.row().3
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.staged_resource())
    }
}

/// Error returned when parsing an unknown resource class name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource class: {0}")]
pub struct ParseResourceClassError(pub String);

impl FromStr for ResourceClass {
    type Err = ParseResourceClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "file" | "generic" | "genericfile" | "generic_file" => Ok(Self::GenericFile),
            _ => Err(ParseResourceClassError(s.to_string())),
        }
    }
}

/// Describes one file to be staged. Built by the caller per upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    pub byte_length: u64,
    pub resource_class: ResourceClass,
}

impl FileDescriptor {
    /// Builds a descriptor, deriving the resource class from the MIME type.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, byte_length: u64) -> Self {
        let mime_type = mime_type.into();
        let resource_class = ResourceClass::from_mime(&mime_type);
        Self {
            name: name.into(),
            mime_type,
            byte_length,
            resource_class,
        }
    }
}

/// A single-use, policy-signed upload destination.
///
/// `parameters` must be replayed in the issued order; the storage endpoint
/// validates the signed policy against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTarget {
    pub upload_url: String,
    pub resource_url: String,
    pub parameters: Vec<(String, String)>,
}

/// Processing state of a created resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Uploaded,
    Processing,
    Ready,
    Failed,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Pixel dimensions reported for images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Resource returned by the registration phase.
///
/// `status` and `delivery_url` keep evolving on the platform after the
/// registration call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedResource {
    pub id: String,
    pub status: ResourceStatus,
    pub delivery_url: Option<String>,
    pub dimensions: Option<Dimensions>,
}

/// Outcome of a single reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The URL answered with a success status.
    Accessible,
    /// The URL answered with a non-success status.
    Unreachable,
    /// Transport failure or timeout.
    Error,
}

impl ProbeOutcome {
    pub fn is_reachable(self) -> bool {
        self == ProbeOutcome::Accessible
    }
}

/// One probe made during delivery URL resolution. Diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionAttempt {
    pub candidate_url: String,
    pub strategy_name: String,
    pub outcome: ProbeOutcome,
}
