use serde::{Deserialize, Serialize};

use crate::types::{CreatedResource, Dimensions, ResourceStatus, StagedTarget};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A GraphQL request body.
#[derive(Debug, Clone, Serialize)]
pub struct GraphqlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

/// A GraphQL response body. `errors` are top-level execution errors, distinct
/// from mutation `userErrors`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

/// Top-level GraphQL error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

/// Validation error reported by a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    /// Index of the input element this error refers to, from a field path
    /// such as `["files", "1", "alt"]`.
    pub fn input_index(&self) -> Option<usize> {
        self.field
            .as_ref()
            .and_then(|path| path.get(1))
            .and_then(|segment| segment.parse().ok())
    }

    /// Message prefixed with the dotted field path when one is present.
    pub fn describe(&self) -> String {
        match &self.field {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), self.message),
            _ => self.message.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Staged upload negotiation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadInput {
    pub filename: String,
    pub mime_type: String,
    pub resource: String,
    /// Sent as a string; the platform's size scalar exceeds 32 bits.
    pub file_size: String,
    pub http_method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StagedUploadsCreateVariables {
    pub input: Vec<StagedUploadInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadsCreateData {
    pub staged_uploads_create: Option<StagedUploadsCreatePayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadsCreatePayload {
    #[serde(default)]
    pub staged_targets: Vec<StagedTargetNode>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedTargetNode {
    pub url: Option<String>,
    pub resource_url: Option<String>,
    #[serde(default)]
    pub parameters: Vec<StagedParameter>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StagedParameter {
    pub name: String,
    pub value: String,
}

impl StagedTargetNode {
    /// Converts the node into a target, keeping parameter order. Returns
    /// `None` if either URL is missing.
    pub fn into_target(self) -> Option<StagedTarget> {
        Some(StagedTarget {
            upload_url: self.url.filter(|u| !u.is_empty())?,
            resource_url: self.resource_url.filter(|u| !u.is_empty())?,
            parameters: self
                .parameters
                .into_iter()
                .map(|p| (p.name, p.value))
                .collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Resource creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreateInput {
    pub original_source: String,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileCreateVariables {
    pub files: Vec<FileCreateInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreateData {
    pub file_create: Option<FileCreatePayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreatePayload {
    #[serde(default)]
    pub files: Vec<Option<FileNode>>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

/// A created or queried file node. Only the fields of the concrete type
/// returned by the platform are populated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: String,
    #[serde(default)]
    pub file_status: Option<ResourceStatus>,
    #[serde(default)]
    pub image: Option<ImageNode>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageNode {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceNode {
    #[serde(default)]
    pub url: Option<String>,
}

impl FileNode {
    /// Delivery URL for whichever concrete type this node is.
    pub fn delivery_url(&self) -> Option<String> {
        self.image
            .as_ref()
            .and_then(|i| i.url.clone())
            .or_else(|| self.url.clone())
            .or_else(|| self.sources.iter().find_map(|s| s.url.clone()))
            .filter(|u| !u.is_empty())
    }

    fn dimensions(&self) -> Option<Dimensions> {
        let image = self.image.as_ref()?;
        Some(Dimensions {
            width: image.width?,
            height: image.height?,
        })
    }

    /// Converts into a [`CreatedResource`]. A missing status means the
    /// platform has accepted the file but not started processing.
    pub fn into_resource(self) -> CreatedResource {
        CreatedResource {
            delivery_url: self.delivery_url(),
            dimensions: self.dimensions(),
            status: self.file_status.unwrap_or(ResourceStatus::Uploaded),
            id: self.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Resource lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ResourceByIdVariables {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceByIdData {
    pub node: Option<FileNode>,
}
