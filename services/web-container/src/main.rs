//! web-container
//!
//! Small axum service that:
//! 1. Answers `GET /ping` health checks
//! 2. Keeps a per-user value map, written via Basic-auth `POST /admin`
//!    and read via `GET /user/{name}`
//! 3. Handles the Spotify authorization-code redirect and redeems the code
//!    against the token endpoint in the background

mod auth;
mod authorize;
mod config;
mod error;
mod metrics;
mod store;
mod users;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::Accounts;
use crate::authorize::{ExchangeState, build_authorize_router};
use crate::config::Config;
use crate::metrics::ExchangeMetrics;
use crate::store::CredentialStore;
use crate::users::{UsersState, build_users_router};

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state, split into per-router state in `build_router`.
#[derive(Clone)]
struct AppState {
    store: Arc<CredentialStore>,
    accounts: Arc<Accounts>,
    exchange: ExchangeState,
    prometheus: PrometheusHandle,
}

/// Build the axum router with all routes and shared state.
fn build_router(state: AppState) -> Router {
    let users = build_users_router(UsersState {
        store: state.store,
        accounts: state.accounts,
    });
    let authorize = build_authorize_router(state.exchange);

    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state.prometheus)
        .route("/ping", get(ping_handler))
        .merge(users)
        .merge(authorize)
        .layer(middleware::from_fn(log_request))
}

/// JSON response with an explicit content type.
pub(crate) fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting web-container");

    // CLI: simple --env-file flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_env_path = args
        .iter()
        .position(|a| a == "--env-file")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let env_path = Config::resolve_path(cli_env_path);
    info!(path = %env_path.display(), "loading configuration");

    let config = Config::load(&env_path)
        .with_context(|| format!("failed to load config from {}", env_path.display()))?;

    for name in config.missing_spotify_settings() {
        warn!(setting = name, "not set, token exchanges will likely be rejected");
    }

    info!(
        listen_addr = %config.listen_addr,
        token_url = %config.spotify.token_url,
        client_id = config.spotify.credentials.client_id(),
        token_timeout_secs = config.spotify.timeout.as_secs(),
        admin_accounts = config.accounts.len(),
        "configuration loaded"
    );

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus = metrics::install_recorder().context("failed to install metrics recorder")?;

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let listen_addr = config.listen_addr;
    let app_state = AppState {
        store: Arc::new(CredentialStore::new()),
        accounts: Arc::new(config.accounts),
        exchange: ExchangeState {
            client,
            settings: Arc::new(config.spotify),
            metrics: ExchangeMetrics::new(),
        },
        prometheus,
    };
    let exchange_metrics = app_state.exchange.metrics.clone();

    let app = build_router(app_state);

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // Drain timer starts at signal receipt, not at server start
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    // Background exchanges still running are abandoned with the runtime
    info!(
        exchanges_started = exchange_metrics.started.load(Ordering::Relaxed),
        exchanges_completed = exchange_metrics.completed.load(Ordering::Relaxed),
        exchanges_failed = exchange_metrics.failed.load(Ordering::Relaxed),
        "shutdown complete"
    );
    Ok(())
}

/// GET /ping: plain-text liveness check.
async fn ping_handler() -> &'static str {
    "pong"
}

/// Prometheus metrics endpoint: returns metrics in text exposition format.
async fn metrics_handler(State(prometheus): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        prometheus.render(),
    )
}

/// Log and count every request. The query string is left out so
/// authorization codes never reach the logs.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = started.elapsed();
    metrics::record_request(status, method.as_str(), elapsed.as_secs_f64());
    info!(
        %method,
        path,
        status,
        latency_ms = elapsed.as_millis() as u64,
        "request"
    );
    response
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    use axum::body::Body;
    use axum::http::Request;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
    use common::{Secret, basic};
    use spotify_auth::ClientCredentials;
    use tower::ServiceExt;

    use crate::config::SpotifyConfig;

    /// PrometheusHandle for tests without installing a global recorder.
    fn test_prometheus_handle() -> PrometheusHandle {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        recorder.handle()
    }

    fn test_app_state(token_url: &str) -> AppState {
        AppState {
            store: Arc::new(CredentialStore::new()),
            accounts: Arc::new(Accounts::default_accounts()),
            exchange: ExchangeState {
                client: reqwest::Client::new(),
                settings: Arc::new(SpotifyConfig {
                    token_url: token_url.to_string(),
                    redirect_uri: "http://localhost:8080/spotify/authorize".into(),
                    credentials: ClientCredentials::new("client-abc", Secret::new("s3cret".into())),
                    timeout: Duration::from_secs(2),
                }),
                metrics: ExchangeMetrics::new(),
            },
            prometheus: test_prometheus_handle(),
        }
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn admin_request(user: &str, password: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/admin")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, basic::header_value(user, password))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> axum::body::Bytes {
        axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn wait_for(counter: &AtomicU64, expected: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while counter.load(Ordering::Relaxed) < expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("background exchange did not finish in time");
    }

    #[tokio::test]
    async fn ping_returns_pong() {
        let app = build_router(test_app_state("http://unused"));
        let response = app.oneshot(get_request("/ping")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_bytes(response).await[..], b"pong");
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_prometheus_format() {
        let app = build_router(test_app_state("http://unused"));
        let response = app.oneshot(get_request("/metrics")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(
            content_type.contains("text/plain"),
            "metrics endpoint must return text/plain Prometheus format"
        );
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = build_router(test_app_state("http://unused"));
        let response = app.oneshot(get_request("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_write_is_visible_to_user_read() {
        let state = test_app_state("http://unused");
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(admin_request("foo", "bar", r#"{"value":"bar"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "status": "ok" })
        );

        let response = app.oneshot(get_request("/user/foo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "user": "foo", "value": "bar" })
        );
    }

    #[tokio::test]
    async fn rejected_admin_write_leaves_store_unchanged() {
        let state = test_app_state("http://unused");
        let store = state.store.clone();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(admin_request("foo", "not-bar", r#"{"value":"bar"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"value":"bar"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(store.len().await, 0);
        let response = app.oneshot(get_request("/user/foo")).await.unwrap();
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "user": "foo", "status": "no value" })
        );
    }

    #[tokio::test]
    async fn user_cannot_write_another_users_value() {
        let state = test_app_state("http://unused");
        let store = state.store.clone();
        let app = build_router(state);

        app.oneshot(admin_request("manu", "123", r#"{"value":"mine","user":"foo"}"#))
            .await
            .unwrap();

        assert_eq!(store.get("manu").await.as_deref(), Some("mine"));
        assert_eq!(store.get("foo").await, None);
    }

    #[tokio::test]
    async fn authorize_survives_dead_token_endpoint() {
        let state = test_app_state("http://127.0.0.1:1/api/token");
        let exchange_metrics = state.exchange.metrics.clone();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(get_request("/spotify/authorize?code=ABC123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "code": "ABC123" })
        );

        wait_for(&exchange_metrics.failed, 1).await;

        let response = app.oneshot(get_request("/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn authorize_without_code_is_state_mismatch() {
        let state = test_app_state("http://127.0.0.1:1/api/token");
        let exchange_metrics = state.exchange.metrics.clone();
        let app = build_router(state);

        let response = app
            .oneshot(get_request("/spotify/authorize"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "code": "", "error": "state_mismatch" })
        );
        assert_eq!(exchange_metrics.started.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn request_metrics_are_recorded() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = ::metrics::set_default_local_recorder(&recorder);

        let app = build_router(test_app_state("http://unused"));
        app.oneshot(get_request("/ping")).await.unwrap();

        let output = handle.render();
        assert!(output.contains("http_requests_total"), "got: {output}");
        assert!(output.contains("method=\"GET\""));
    }
}
