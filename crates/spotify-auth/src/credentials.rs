//! Client credentials for authenticating to the token endpoint

use common::{Secret, basic};

/// OAuth client id and secret, loaded once at startup.
///
/// The secret is redacted from `Debug` output so the struct can be logged
/// or embedded in config without leaking it.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: Secret<String>,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: Secret<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn has_secret(&self) -> bool {
        !self.client_secret.expose().is_empty()
    }

    /// `Authorization` header value: `Basic base64(client_id:client_secret)`.
    pub fn authorization_header(&self) -> String {
        basic::header_value(&self.client_id, self.client_secret.expose())
    }
}
