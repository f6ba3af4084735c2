//! Core types and service wiring for the cassonetto waste collection client.
//!
//! Talks to the Mantova Ambiente API, caches each zone's schedule in a JSON
//! file with a TTL, and answers "is there a pickup tomorrow?" per waste
//! stream.

/// File-backed TTL cache for collection snapshots.
pub mod cache;
/// HTTP client for the Mantova Ambiente API.
pub mod client;
/// Domain models: collections, datasets, zones, waste types.
pub mod model;
/// Error types and the traits seaming the service to its collaborators.
pub mod ports;
/// Cache-or-fetch orchestration service.
pub mod service;

pub use cache::*;
pub use client::*;
pub use model::*;
pub use ports::*;
pub use service::*;
