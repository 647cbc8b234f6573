//! Endpoint request builders and data models for the Meridian controller API.
//!
//! Provides typed structures and a client wrapper over a
//! [`meridian_core::Session`]. Methods here build a versioned URL and a
//! payload, delegate to the core REST call engine, and hand the normalized
//! response back to the caller; retry, region, and trust handling all live
//! in the core.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::ApiClient;
pub use models::{Address, Element, LoginRequest, Profile, RoleSpec, Site, SiteRequest};

/// Convenient result alias that reuses the shared SDK error type.
pub type Result<T> = meridian_core::Result<T>;
