use api_types::user::{LoginRequest, TokenResponse};
use axum::{Json, extract::State};
use service::{ServiceError, users};

use crate::{
    ServerError,
    server::{ServerState, auth_delay},
};

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ServerError> {
    auth_delay(state.max_delay_ms).await;

    let user = users::login(&state.db, &payload.email, &payload.password).await?;
    let roles = users::parse_roles(&user)?;
    let token = state
        .tokens
        .issue(user.id, &roles)
        .map_err(|err| ServiceError::Internal(err.to_string()))?;

    Ok(Json(TokenResponse { token }))
}
