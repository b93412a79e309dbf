//! User value routes
//!
//! - `GET /user/{name}`: open read of a stored value
//! - `POST /admin`: Basic-auth write of the caller's own value

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::Deserialize;
use tracing::info;

use crate::auth::{Accounts, AuthenticatedUser, require_basic_auth};
use crate::error::ApiError;
use crate::store::CredentialStore;

/// Shared state for user value handlers.
#[derive(Clone)]
pub struct UsersState {
    pub store: Arc<CredentialStore>,
    pub accounts: Arc<Accounts>,
}

/// Build the router for `/user/{name}` and the authenticated `/admin` write.
pub fn build_users_router(state: UsersState) -> Router {
    let admin = Router::new()
        .route("/admin", post(write_value))
        .route_layer(middleware::from_fn_with_state(
            state.accounts.clone(),
            require_basic_auth,
        ));

    Router::new()
        .route("/user/{name}", get(read_value))
        .merge(admin)
        .with_state(state)
}

/// GET /user/{name}: `{"user","value"}` or `{"user","status":"no value"}`, always 200.
async fn read_value(State(state): State<UsersState>, Path(name): Path<String>) -> Response {
    let body = match state.store.get(&name).await {
        Some(value) => serde_json::json!({ "user": name, "value": value }),
        None => serde_json::json!({ "user": name, "status": "no value" }),
    };
    crate::json_response(StatusCode::OK, body)
}

/// Request body for the admin write.
#[derive(Deserialize)]
struct WriteValue {
    value: String,
}

/// POST /admin: store `value` under the authenticated username.
///
/// `value` is required and must be non-empty; anything else is a 400 and the
/// store is left untouched.
async fn write_value(
    State(state): State<UsersState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    body: Result<Json<WriteValue>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    if body.value.is_empty() {
        return Err(ApiError::InvalidBody("value is required".into()));
    }

    let replaced = state.store.put(user.clone(), body.value).await.is_some();
    let entries = state.store.len().await;
    info!(user, replaced, entries, "value stored");

    Ok(crate::json_response(
        StatusCode::OK,
        serde_json::json!({ "status": "ok" }),
    ))
}
