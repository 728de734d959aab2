use api_types::transaction::{
    TransactionNew, TransactionUpdate, TransactionView, TransactionsResponse, UserRef,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use service::{
    Session,
    transactions::{self, TransactionRecord},
};

use crate::{
    ServerError, place,
    server::{ServerState, parse_id},
};

pub(crate) fn view(record: TransactionRecord) -> TransactionView {
    TransactionView {
        id: record.transaction.id,
        amount: record.transaction.amount,
        date: record.transaction.date.fixed_offset(),
        place: place::view(record.place),
        user: UserRef {
            id: record.user.id,
            name: record.user.name,
        },
    }
}

pub async fn list(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
) -> Result<Json<TransactionsResponse>, ServerError> {
    let items = transactions::get_all(&state.db, &session)
        .await?
        .into_iter()
        .map(view)
        .collect();
    Ok(Json(TransactionsResponse { items }))
}

pub async fn get_one(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<TransactionView>, ServerError> {
    let id = parse_id(&id)?;
    let record = transactions::get_by_id(&state.db, &session, id).await?;
    Ok(Json(view(record)))
}

pub async fn create(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<Json<TransactionView>, ServerError> {
    let record = transactions::create(
        &state.db,
        &session,
        payload.amount,
        payload.date.with_timezone(&Utc),
        payload.place_id,
    )
    .await?;
    Ok(Json(view(record)))
}

pub async fn update(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let id = parse_id(&id)?;
    let record = transactions::update_by_id(
        &state.db,
        &session,
        id,
        payload.amount,
        payload.date.with_timezone(&Utc),
        payload.place_id,
    )
    .await?;
    Ok(Json(view(record)))
}

pub async fn remove(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let id = parse_id(&id)?;
    transactions::delete_by_id(&state.db, &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
