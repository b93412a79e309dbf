//! Basic authentication for the admin write path
//!
//! `require_basic_auth` is applied as a route layer on `POST /admin` only.
//! On success the authenticated username is inserted as an
//! `AuthenticatedUser` request extension; on failure the request never
//! reaches the handler and a 401 challenge is returned.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use common::{Secret, basic};
use tracing::warn;

use crate::error::ApiError;
use crate::metrics;

/// Fixed set of admin accounts, `username -> password`.
#[derive(Debug)]
pub struct Accounts(HashMap<String, Secret<String>>);

impl Accounts {
    pub fn new<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(user, password)| (user.into(), Secret::new(password.into())))
                .collect(),
        )
    }

    /// Accounts used when `ADMIN_ACCOUNTS` is unset.
    pub fn default_accounts() -> Self {
        Self::new([("foo", "bar"), ("manu", "123")])
    }

    /// Parse `user:password,user:password`. Whitespace around entries is
    /// ignored; passwords may contain `:`.
    pub fn parse(raw: &str) -> common::Result<Self> {
        let mut pairs = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (user, password) = entry.split_once(':').ok_or_else(|| {
                common::Error::Config(format!(
                    "ADMIN_ACCOUNTS entries must be user:password, got {entry:?}"
                ))
            })?;
            if user.is_empty() {
                return Err(common::Error::Config(
                    "ADMIN_ACCOUNTS contains an entry with an empty username".into(),
                ));
            }
            pairs.push((user.to_string(), password.to_string()));
        }
        if pairs.is_empty() {
            return Err(common::Error::Config(
                "ADMIN_ACCOUNTS must list at least one account".into(),
            ));
        }
        Ok(Self::new(pairs))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check a username/password pair. Every account is compared so the
    /// time taken does not depend on which one matches.
    pub fn verify(&self, user: &str, password: &str) -> bool {
        self.0.iter().fold(false, |matched, (u, p)| {
            let hit = basic::constant_time_eq(u.as_bytes(), user.as_bytes())
                & basic::constant_time_eq(p.expose().as_bytes(), password.as_bytes());
            matched | hit
        })
    }
}

/// Username that passed Basic authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// Middleware: reject requests without valid Basic credentials.
pub async fn require_basic_auth(
    State(accounts): State<Arc<Accounts>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(basic::decode_header)
        .filter(|(user, password)| accounts.verify(user, password))
        .map(|(user, _)| user);

    match user {
        Some(user) => {
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        None => {
            metrics::record_auth_failure();
            warn!(path = %request.uri().path(), "basic auth rejected");
            ApiError::Unauthorized.into_response()
        }
    }
}
