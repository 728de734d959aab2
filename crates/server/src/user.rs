//! User handlers. Per-id routes accept "me" where noted; everything else is
//! numeric only.

use api_types::user::{PublicUser, TokenResponse, UserRegister, UserUpdate, UsersResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use service::{
    ServiceError, Session,
    auth::{self, roles},
    users,
};

use crate::{
    ServerError,
    server::{ServerState, auth_delay, parse_id},
};

fn public(user: users::Model) -> PublicUser {
    PublicUser {
        id: user.id,
        name: user.name,
        email: user.email,
    }
}

/// Public registration. Answers with a token so clients are signed in
/// immediately.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserRegister>,
) -> Result<Json<TokenResponse>, ServerError> {
    auth_delay(state.max_delay_ms).await;

    let user = users::register(&state.db, &payload.name, &payload.email, &payload.password).await?;
    let user_roles = users::parse_roles(&user)?;
    let token = state
        .tokens
        .issue(user.id, &user_roles)
        .map_err(|err| ServiceError::Internal(err.to_string()))?;

    Ok(Json(TokenResponse { token }))
}

pub async fn list(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
) -> Result<Json<UsersResponse>, ServerError> {
    auth::check_role(roles::ADMIN, &session.roles)?;

    let items = users::get_all(&state.db)
        .await?
        .into_iter()
        .map(public)
        .collect();
    Ok(Json(UsersResponse { items }))
}

/// Accepts "me" as well as a numeric id. The ownership check runs before id
/// resolution so foreign ids fail with 403, not 400.
pub async fn get_one(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, ServerError> {
    auth::check_user_id(&session, &id)?;

    let id = if id == "me" {
        session.user_id
    } else {
        parse_id(&id)?
    };
    let user = users::get_by_id(&state.db, id).await?;

    Ok(Json(public(user)))
}

pub async fn update(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<PublicUser>, ServerError> {
    let id = parse_id(&id)?;
    auth::check_user_id(&session, &id.to_string())?;

    let user = users::update_by_id(&state.db, id, &payload.name, &payload.email).await?;
    Ok(Json(public(user)))
}

pub async fn remove(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let id = parse_id(&id)?;
    auth::check_user_id(&session, &id.to_string())?;

    users::delete_by_id(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
