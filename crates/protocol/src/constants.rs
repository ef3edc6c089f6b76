use std::time::Duration;

/// Requests a staged upload target for each input.
pub const STAGED_UPLOADS_CREATE: &str = r#"mutation stagedUploadsCreate($input: [StagedUploadInput!]!) {
  stagedUploadsCreate(input: $input) {
    stagedTargets { url resourceUrl parameters { name value } }
    userErrors { field message }
  }
}"#;

/// Creates resources from origin references (staged resource URL, public URL or data URI).
pub const FILE_CREATE: &str = r#"mutation fileCreate($files: [FileCreateInput!]!) {
  fileCreate(files: $files) {
    files {
      id
      fileStatus
      ... on MediaImage { image { url width height } }
      ... on GenericFile { url }
      ... on Video { sources { url } }
    }
    userErrors { field message }
  }
}"#;

/// Looks up a resource's current delivery URL.
pub const RESOURCE_BY_ID: &str = r#"query resourceById($id: ID!) {
  node(id: $id) {
    id
    ... on MediaImage { fileStatus image { url width height } }
    ... on GenericFile { fileStatus url }
    ... on Video { fileStatus sources { url } }
  }
}"#;

/// HTTP method requested for staged uploads; the transfer phase always POSTs.
pub const STAGED_HTTP_METHOD: &str = "POST";

/// Query parameter used by the delivery network as a cache buster.
pub const VERSION_PARAM: &str = "v";

/// Default timeout for a platform or storage request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a single reachability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
