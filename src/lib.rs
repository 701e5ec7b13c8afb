//! satchel - persisted session tokens and authenticated HTTP requests.
//!
//! This crate provides the session core an API-backed application embeds:
//! a [`SessionStore`] that holds the current authentication token, persists
//! it on every change, and rehydrates it on startup; and an [`ApiClient`]
//! that attaches the current token to every outgoing request.
//!
//! The token is opaque. Whatever credential a login flow stores is forwarded
//! verbatim in the `authorization` header; requests made without a token go
//! out unauthenticated rather than failing.
//!
//! ```no_run
//! use satchel::{ApiClient, Config, FileStorage, SessionStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let session = SessionStore::open(FileStorage::new(config.data_dir()?))?;
//! let client = ApiClient::new(config.base_url()?)?.with_session(session.clone());
//!
//! // A login flow stores the credential; every later request carries it.
//! session.set_token("token-from-login")?;
//! let profile: serde_json::Value = client.get("/v1/me").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod session;

pub use api::{ApiClient, ApiError, RequestAuthenticator};
pub use config::Config;
pub use session::{
    FileStorage, KeyringStorage, MemoryStorage, SessionStorage, SessionState, SessionStore,
};
