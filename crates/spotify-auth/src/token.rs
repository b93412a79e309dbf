//! Authorization-code token exchange
//!
//! POSTs `grant_type=authorization_code&code=...&redirect_uri=...` to the
//! configured token endpoint, authenticated with the client credentials as
//! HTTP Basic auth. The response body is not read: the caller only learns the
//! status line.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use tracing::debug;

use crate::constants::GRANT_TYPE_AUTHORIZATION_CODE;
use crate::credentials::ClientCredentials;
use crate::error::{Error, Result};

/// One-shot token request built per redirect callback.
#[derive(Debug, Clone, Copy)]
pub struct TokenRequest<'a> {
    pub code: &'a str,
    pub redirect_uri: &'a str,
}

impl<'a> TokenRequest<'a> {
    pub fn new(code: &'a str, redirect_uri: &'a str) -> Self {
        Self { code, redirect_uri }
    }

    /// Form fields in wire order.
    pub fn form(&self) -> [(&'static str, &'a str); 3] {
        [
            ("grant_type", GRANT_TYPE_AUTHORIZATION_CODE),
            ("code", self.code),
            ("redirect_uri", self.redirect_uri),
        ]
    }
}

/// Status line returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOutcome {
    pub status: u16,
    /// Canonical reason phrase, empty for non-standard codes
    pub reason: String,
}

impl ExchangeOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Redeem an authorization code at `token_url`.
///
/// Errors are limited to request construction (bad URL, unusable credential
/// header) and transport failures. Any HTTP response, including 4xx/5xx,
/// comes back as `Ok(ExchangeOutcome)`.
pub async fn exchange_code(
    client: &reqwest::Client,
    token_url: &str,
    credentials: &ClientCredentials,
    request: &TokenRequest<'_>,
    timeout: Duration,
) -> Result<ExchangeOutcome> {
    let url = reqwest::Url::parse(token_url)
        .map_err(|e| Error::InvalidRequest(format!("token URL {token_url:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidRequest(format!(
            "token URL must be http or https, got scheme {:?}",
            url.scheme()
        )));
    }

    let authorization = HeaderValue::from_str(&credentials.authorization_header())
        .map_err(|e| Error::InvalidRequest(format!("authorization header: {e}")))?;

    debug!(
        token_url = %url,
        client_id = credentials.client_id(),
        "sending token request"
    );

    // `form` sets Content-Type: application/x-www-form-urlencoded
    let response = client
        .post(url)
        .header(AUTHORIZATION, authorization)
        .form(&request.form())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(timeout.as_secs())
            } else if e.is_builder() {
                Error::InvalidRequest(e.to_string())
            } else {
                Error::Http(e.to_string())
            }
        })?;

    let status = response.status();
    Ok(ExchangeOutcome {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
    })
}
