//! Resource creation: request shaping and per-entry result attribution.

use assetlift_protocol::CreatedResource;
use assetlift_protocol::graphql::{FileCreateInput, FileCreatePayload};

use crate::Registration;
use crate::error::PlatformError;

/// Builds creation inputs in registration order.
pub fn file_create_inputs(registrations: &[Registration]) -> Vec<FileCreateInput> {
    registrations
        .iter()
        .map(|r| FileCreateInput {
            original_source: r.origin.clone(),
            content_type: r.resource_class.content_type().to_string(),
            alt: r.alt.clone().filter(|a| !a.is_empty()),
        })
        .collect()
}

/// Splits a creation payload into one result per input.
///
/// User errors whose field path names an input index fail that entry only.
/// Errors without an index fail every entry that has no created resource.
pub fn split_results(
    count: usize,
    payload: FileCreatePayload,
) -> Vec<Result<CreatedResource, PlatformError>> {
    let mut per_entry: Vec<Vec<String>> = vec![Vec::new(); count];
    let mut global = Vec::new();
    for err in &payload.user_errors {
        match err.input_index() {
            Some(i) if i < count => per_entry[i].push(err.describe()),
            _ => global.push(err.describe()),
        }
    }

    let mut files = payload.files.into_iter();
    per_entry
        .into_iter()
        .map(|messages| {
            let node = files.next().flatten();
            if !messages.is_empty() {
                return Err(PlatformError::Registration { messages });
            }
            match node {
                Some(node) => Ok(node.into_resource()),
                None if !global.is_empty() => Err(PlatformError::Registration {
                    messages: global.clone(),
                }),
                None => Err(PlatformError::registration("no resource returned")),
            }
        })
        .collect()
}
