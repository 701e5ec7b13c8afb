//! Outbound request authentication.
//!
//! `RequestAuthenticator` decorates outgoing requests with the current
//! session token. It holds no token of its own - every call reads the
//! shared [`SessionStore`] fresh, so a login or logout elsewhere in the
//! process takes effect on the very next request with no wiring.

use reqwest::header::{self, HeaderValue};
use reqwest::RequestBuilder;
use tracing::warn;

use crate::session::SessionStore;

/// Attaches the session token to outgoing requests.
///
/// Clone is cheap - the underlying session store is shared.
#[derive(Clone)]
pub struct RequestAuthenticator {
    session: SessionStore,
}

impl RequestAuthenticator {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// Attach the current token as the `authorization` header.
    ///
    /// The token is forwarded verbatim; no scheme prefix is added, since
    /// the server issued the credential in exactly the shape it expects
    /// back. Without a token the request passes through untouched, and a
    /// token that cannot be encoded as a header is logged and skipped.
    /// This never fails a request on its own.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => match Self::header_value(&token) {
                Some(value) => request.header(header::AUTHORIZATION, value),
                None => {
                    warn!("Session token is not a valid header value, sending unauthenticated");
                    request
                }
            },
            None => request,
        }
    }

    fn header_value(token: &str) -> Option<HeaderValue> {
        let mut value = HeaderValue::from_str(token).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}
