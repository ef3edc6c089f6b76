//! Data model and GraphQL wire types for staged asset uploads.
//!
//! The types here are shared by the transfer, platform, uploader and
//! resolver crates. The GraphQL documents in [`constants`] are the only
//! operations consumed from the platform.

pub mod constants;
pub mod graphql;
pub mod types;

// Re-export primary types for convenience.
pub use graphql::{GraphqlError, UserError};
pub use types::{
    CreatedResource, Dimensions, FileDescriptor, ParseResourceClassError, ProbeOutcome,
    ResolutionAttempt, ResourceClass, ResourceStatus, StagedTarget,
};
