//! Authenticated HTTP client module.
//!
//! This module provides the `ApiClient` for making requests against the
//! configured base URL, with the session token attached to each outgoing
//! request by the `RequestAuthenticator`.
//!
//! The token is whatever opaque credential the session holds; it is
//! forwarded in the `authorization` header exactly as stored.

pub mod authenticator;
pub mod client;
pub mod error;

pub use authenticator::RequestAuthenticator;
pub use client::ApiClient;
pub use error::ApiError;
