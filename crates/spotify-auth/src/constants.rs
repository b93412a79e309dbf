//! Token endpoint defaults

/// Spotify's token endpoint, used when `SPOTIFY_TOKEN_URL` is unset.
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Grant type for redeeming an authorization code.
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// Content type of the token request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Upper bound on a single token request, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
