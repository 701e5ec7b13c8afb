//! Shared HTTP client for talking to the configured API.
//!
//! This module provides the `ApiClient` wrapper around a pooled
//! `reqwest::Client`. Every request is resolved against the configured base
//! URL and passed through the session authenticator at preparation time, so
//! callers never handle tokens themselves.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::session::SessionStore;

use super::{ApiError, RequestAuthenticator};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
/// 1 second is polite to the server while not making users wait too long.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// HTTP client bound to one base URL.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    authenticator: Option<RequestAuthenticator>,
}

impl ApiClient {
    /// Create a client for the given base URL, without session authentication.
    /// Requests go out exactly as prepared.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            authenticator: None,
        })
    }

    /// Install session authentication, consuming the client.
    ///
    /// From here on every request prepared through this client carries the
    /// token currently held by `session`, read fresh at preparation time.
    /// Installing again replaces the previous session.
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.authenticator = Some(RequestAuthenticator::new(session));
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Prepare a request for `path` relative to the base URL.
    ///
    /// The authenticator runs here, synchronously, so the returned builder
    /// already carries the credential current at this moment. Each builder
    /// owns its own header map; a later token change does not reach into
    /// requests already prepared.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.url(path));
        match &self.authenticator {
            Some(auth) => auth.apply(request),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a GET request and parse the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_with_retry(path, || self.request(Method::GET, path))
            .await
    }

    /// Send a POST request with a JSON body and parse the JSON response.
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.send_with_retry(path, || self.request(Method::POST, path).json(body))
            .await
    }

    /// Send with bounded retries on 429.
    ///
    /// The request is re-prepared for every attempt, so each attempt observes
    /// the token current at its own issuance.
    async fn send_with_retry<T, F>(&self, path: &str, prepare: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = prepare()
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", path))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", path));
                }
                None => {
                    // Rate limited
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(
                        path = path,
                        retry = retries,
                        backoff_ms = backoff_ms,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }
}
