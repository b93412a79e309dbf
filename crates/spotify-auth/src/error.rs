//! Error types for the token exchange

/// Errors from a single token exchange attempt.
///
/// A non-2xx answer from the token endpoint is not an error; it is reported
/// through `ExchangeOutcome`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid token request: {0}")]
    InvalidRequest(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token request timed out after {0}s")]
    Timeout(u64),
}

/// Result alias for exchange operations.
pub type Result<T> = std::result::Result<T, Error>;
