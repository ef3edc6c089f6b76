//! Platform API client.
//!
//! Three GraphQL operations are consumed: staged target negotiation,
//! resource creation from an origin reference, and resource lookup by id.
//! [`PlatformApi`] is the seam the uploader and resolver depend on;
//! [`GraphqlPlatform`] implements it over any [`Transport`].
//!
//! [`Transport`]: assetlift_transport::Transport

pub mod client;
pub mod error;
pub mod negotiate;
pub mod register;

use assetlift_protocol::{CreatedResource, FileDescriptor, ResourceClass, StagedTarget};
use assetlift_transport::BoxFuture;

pub use client::{GraphqlPlatform, PlatformConfig};
pub use error::PlatformError;

/// A resource creation request by origin reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Staged resource URL, public URL or `data:` URI.
    pub origin: String,
    pub resource_class: ResourceClass,
    pub alt: Option<String>,
}

/// Operations consumed from the platform.
pub trait PlatformApi: Send + Sync {
    /// Allocates a new single-use staged target. Never cached.
    fn negotiate<'a>(
        &'a self,
        descriptor: &'a FileDescriptor,
    ) -> BoxFuture<'a, Result<StagedTarget, PlatformError>>;

    /// Creates resources in one request. The outer error fails the whole
    /// request; inner errors are per registration, in input order.
    fn register_batch<'a>(
        &'a self,
        registrations: &'a [Registration],
    ) -> BoxFuture<'a, Result<Vec<Result<CreatedResource, PlatformError>>, PlatformError>>;

    /// Looks up a resource's current state, `None` if the id is unknown.
    fn lookup<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<CreatedResource>, PlatformError>>;

    /// Creates a single resource.
    fn register<'a>(
        &'a self,
        registration: &'a Registration,
    ) -> BoxFuture<'a, Result<CreatedResource, PlatformError>> {
        Box::pin(async move {
            let mut results = self
                .register_batch(std::slice::from_ref(registration))
                .await?;
            results
                .pop()
                .unwrap_or_else(|| Err(PlatformError::registration("no resource returned")))
        })
    }
}
