use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rand::Rng;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use service::{ServiceError, TokenCodec, TokenConfig, auth};

use crate::{ServerError, health, place, session, transaction, user};

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt: TokenConfig,
    /// Upper bound of the random pause before credential checks, in ms.
    pub max_delay_ms: u64,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenCodec>,
    pub max_delay_ms: u64,
}

/// Random pause before any credential or token check, so response timing
/// reveals nothing about which step rejected the request.
pub(crate) async fn auth_delay(max_ms: u64) {
    if max_ms == 0 {
        return;
    }
    let wait = rand::thread_rng().gen_range(0..=max_ms);
    tokio::time::sleep(Duration::from_millis(wait)).await;
}

async fn auth(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    auth_delay(state.max_delay_ms).await;

    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let session = auth::check_and_parse_session(&state.tokens, header)?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Parses a numeric path parameter. Anything else is a 400, not a 404.
pub(crate) fn parse_id(raw: &str) -> Result<i32, ServerError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ServiceError::ValidationFailed(
            "id must be a positive integer".to_string(),
        )
        .into()),
    }
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": "NOT_FOUND",
            "message": format!("Unknown resource: {uri}"),
        })),
    )
}

fn router(state: ServerState) -> Router {
    // Registration and login share paths with protected handlers; axum
    // merges routers with disjoint methods on the same path.
    let public = Router::new()
        .route("/sessions", post(session::login))
        .route("/users", post(user::register))
        .route("/health/ping", get(health::ping))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/users", get(user::list))
        .route(
            "/users/{id}",
            get(user::get_one).put(user::update).delete(user::remove),
        )
        .route("/places", get(place::list).post(place::create))
        .route(
            "/places/{id}",
            get(place::get_one).put(place::update).delete(place::remove),
        )
        .route("/places/{id}/transactions", get(place::transactions))
        .route(
            "/transactions",
            get(transaction::list).post(transaction::create),
        )
        .route(
            "/transactions/{id}",
            get(transaction::get_one)
                .put(transaction::update)
                .delete(transaction::remove),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state);

    Router::new()
        .nest("/api", public.merge(protected))
        .fallback(not_found)
}

/// Builds the full application router. Exposed so tests can drive it with
/// `tower::ServiceExt::oneshot` without a listener.
pub fn app(db: DatabaseConnection, config: AuthConfig) -> Router {
    let state = ServerState {
        db,
        tokens: Arc::new(TokenCodec::new(config.jwt)),
        max_delay_ms: config.max_delay_ms,
    };
    router(state)
}

pub async fn run(db: DatabaseConnection, config: AuthConfig) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(db, config, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    db: DatabaseConnection,
    config: AuthConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(db, config)).await
}

pub fn spawn_with_listener(
    db: DatabaseConnection,
    config: AuthConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(db, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
