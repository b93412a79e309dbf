//! Spotify authorization-code redirect
//!
//! `GET /spotify/authorize?code=...` answers the browser immediately and
//! redeems the code in a spawned task. The caller never sees the exchange
//! result; it is reported only through tracing events and `ExchangeMetrics`.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use spotify_auth::{TokenRequest, exchange_code};
use tokio::task::JoinHandle;
use tracing::{Instrument, info, info_span, warn};

use crate::config::SpotifyConfig;
use crate::error::ApiError;
use crate::metrics::{self, ExchangeMetrics};

/// Shared state for the redirect handler and its background exchanges.
#[derive(Clone)]
pub struct ExchangeState {
    pub client: reqwest::Client,
    pub settings: Arc<SpotifyConfig>,
    pub metrics: ExchangeMetrics,
}

pub fn build_authorize_router(state: ExchangeState) -> Router {
    Router::new()
        .route("/spotify/authorize", get(spotify_authorize))
        .with_state(state)
}

/// First value of `key`, or `""` when absent.
fn query_param<'a>(params: &'a [(String, String)], key: &str) -> &'a str {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

/// Value checked for the `state_mismatch` rejection.
///
/// This is the `code` parameter itself, not a separate `state` parameter,
/// so the check only requires that a code is present. A `state` query
/// parameter, if sent, is ignored.
fn state_param(params: &[(String, String)]) -> &str {
    query_param(params, "code")
}

/// GET /spotify/authorize: validate the redirect and start the exchange.
async fn spotify_authorize(
    State(state): State<ExchangeState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let code = query_param(&params, "code");

    if state_param(&params).is_empty() {
        warn!("authorization redirect without code");
        return Err(ApiError::StateMismatch {
            code: code.to_string(),
        });
    }

    spawn_exchange(state, code.to_string());

    Ok(crate::json_response(
        StatusCode::OK,
        serde_json::json!({ "code": code }),
    ))
}

/// Spawn the token exchange for `code` without waiting for it.
///
/// The handle is returned for callers that want to await completion; the
/// redirect handler drops it.
pub fn spawn_exchange(state: ExchangeState, code: String) -> JoinHandle<()> {
    let exchange_id = format!("xchg_{}", uuid::Uuid::new_v4().as_simple());
    let span = info_span!("exchange", %exchange_id);
    state.metrics.started.fetch_add(1, Ordering::Relaxed);

    tokio::spawn(async move { run_exchange(&state, &code).await }.instrument(span))
}

async fn run_exchange(state: &ExchangeState, code: &str) {
    let settings = &state.settings;
    let request = TokenRequest::new(code, &settings.redirect_uri);

    let result = exchange_code(
        &state.client,
        &settings.token_url,
        &settings.credentials,
        &request,
        settings.timeout,
    )
    .await;

    match result {
        Ok(outcome) if outcome.is_success() => {
            state.metrics.completed.fetch_add(1, Ordering::Relaxed);
            metrics::record_exchange("success");
            info!(
                status = outcome.status,
                reason = %outcome.reason,
                "token exchange succeeded"
            );
        }
        Ok(outcome) => {
            state.metrics.completed.fetch_add(1, Ordering::Relaxed);
            metrics::record_exchange("rejected");
            warn!(
                status = outcome.status,
                reason = %outcome.reason,
                "token endpoint rejected exchange"
            );
        }
        Err(e) => {
            state.metrics.failed.fetch_add(1, Ordering::Relaxed);
            metrics::record_exchange("error");
            warn!(error = %e, "token exchange failed");
        }
    }
}
