//! Spotify OAuth authorization-code exchange
//!
//! Builds and sends the server-to-server token request that redeems an
//! authorization code. The crate has no dependency on the HTTP service that
//! receives the redirect, so it can be tested against a local mock endpoint.
//!
//! Flow:
//! 1. Service loads `ClientCredentials` once at startup
//! 2. Redirect handler receives `?code=...`
//! 3. `token::exchange_code()` POSTs the form-encoded `TokenRequest` with
//!    client-credential Basic auth and returns the `ExchangeOutcome`

pub mod constants;
pub mod credentials;
pub mod error;
pub mod token;

pub use constants::*;
pub use credentials::ClientCredentials;
pub use error::{Error, Result};
pub use token::{ExchangeOutcome, TokenRequest, exchange_code};
