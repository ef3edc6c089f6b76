//! Delivery URL resolution.
//!
//! Freshly created resources propagate to the delivery network
//! asynchronously, so a delivery URL may briefly answer 404 or carry a
//! stale version parameter. [`Resolver`] searches a fixed sequence of
//! candidate URLs with a bounded backoff and reports the first reachable
//! one.

pub mod candidates;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod probe;

pub use clock::{Clock, SystemClock};
pub use config::ResolveConfig;
pub use engine::{Resolution, ResolveTarget, Resolver, Strategy};
pub use error::ResolveError;
pub use probe::{Prober, TransportProber};
