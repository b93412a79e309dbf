//! Configuration types and loading
//!
//! Settings come from the process environment after a `.env` file has been
//! loaded into it. Variables already set in the environment win over the
//! file. A missing `.env` file is a startup error.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use spotify_auth::{ClientCredentials, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_URL};

use crate::auth::Accounts;

/// Root configuration
#[derive(Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub spotify: SpotifyConfig,
    pub accounts: Accounts,
}

/// Token exchange settings for the Spotify redirect handler
#[derive(Debug)]
pub struct SpotifyConfig {
    /// Not validated here: a bad URL fails each exchange, not startup
    pub token_url: String,
    pub redirect_uri: String,
    pub credentials: ClientCredentials,
    pub timeout: Duration,
}

const DEFAULT_PORT: u16 = 8080;

impl Config {
    /// Load `env_file` into the process environment, then read settings.
    pub fn load(env_file: &Path) -> common::Result<Self> {
        dotenv::from_path(env_file).map_err(|e| {
            common::Error::EnvFile(format!("failed to load {}: {e}", env_file.display()))
        })?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> common::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("GIN_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                common::Error::Config(format!("GIN_PORT must be a port number, got {raw:?}: {e}"))
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match get("SPOTIFY_TOKEN_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                common::Error::Config(format!(
                    "SPOTIFY_TOKEN_TIMEOUT_SECS must be an integer, got {raw:?}: {e}"
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(common::Error::Config(
                "SPOTIFY_TOKEN_TIMEOUT_SECS must be greater than 0".into(),
            ));
        }

        let accounts = match get("ADMIN_ACCOUNTS") {
            Some(raw) => Accounts::parse(&raw)?,
            None => Accounts::default_accounts(),
        };

        let credentials = ClientCredentials::new(
            get("SPOTIFY_CLIENT_ID").unwrap_or_default(),
            Secret::new(get("SPOTIFY_CLIENT_SECRET").unwrap_or_default()),
        );

        Ok(Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            spotify: SpotifyConfig {
                token_url: get("SPOTIFY_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.into()),
                redirect_uri: get("SPOTIFY_REDIRECT_URI").unwrap_or_default(),
                credentials,
                timeout: Duration::from_secs(timeout_secs),
            },
            accounts,
        })
    }

    /// Names of Spotify settings that are unset. The service still starts;
    /// the token endpoint will reject the exchange.
    pub fn missing_spotify_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.spotify.redirect_uri.is_empty() {
            missing.push("SPOTIFY_REDIRECT_URI");
        }
        if self.spotify.credentials.client_id().is_empty() {
            missing.push("SPOTIFY_CLIENT_ID");
        }
        if !self.spotify.credentials.has_secret() {
            missing.push("SPOTIFY_CLIENT_SECRET");
        }
        missing
    }

    /// Resolve the env file path from CLI arg or ENV_FILE env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("ENV_FILE") {
            return PathBuf::from(p);
        }
        PathBuf::from(".env")
    }
}
