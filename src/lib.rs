//! Stayfinder — rental listing service.
//!
//! Library crate for the region weather enrichment core: the country
//! directory, region entities and their store, the TTL weather cache,
//! weather providers, and the batched resolver that ties them together.
//! Exposed for use by integration tests and the binary entry point.

pub mod cache;
pub mod config;
pub mod countries;
pub mod error;
pub mod region;
pub mod resolver;
pub mod store;
pub mod weather;
