//! LMS Remote - single-entity write client
//!
//! The course backend only exposes flat create/update endpoints per level.
//! This crate defines that contract ([`RemoteResourceClient`]), its error
//! type, and a reqwest-based implementation.
//!
//! Enable the `mock` feature to get `MockRemoteResourceClient` (mockall) in
//! downstream tests.

#![warn(unreachable_pub)]

pub mod client;
pub mod config;
pub mod error;
pub mod http;

pub use client::RemoteResourceClient;
#[cfg(any(test, feature = "mock"))]
pub use client::MockRemoteResourceClient;
pub use config::ClientConfig;
pub use error::RemoteError;
pub use http::HttpResourceClient;
