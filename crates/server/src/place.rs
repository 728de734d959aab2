use api_types::{
    place::{PlaceNew, PlaceUpdate, PlaceView, PlacesResponse},
    transaction::TransactionsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use service::{Session, places, transactions};

use crate::{
    ServerError,
    server::{ServerState, parse_id},
    transaction,
};

pub(crate) fn view(place: places::Model) -> PlaceView {
    PlaceView {
        id: place.id,
        name: place.name,
        rating: place.rating,
    }
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<PlacesResponse>, ServerError> {
    let items = places::get_all(&state.db)
        .await?
        .into_iter()
        .map(view)
        .collect();
    Ok(Json(PlacesResponse { items }))
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<PlaceView>, ServerError> {
    let id = parse_id(&id)?;
    let place = places::get_by_id(&state.db, id).await?;
    Ok(Json(view(place)))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<PlaceNew>,
) -> Result<Json<PlaceView>, ServerError> {
    let place = places::create(&state.db, &payload.name, payload.rating).await?;
    Ok(Json(view(place)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PlaceUpdate>,
) -> Result<Json<PlaceView>, ServerError> {
    let id = parse_id(&id)?;
    let place = places::update_by_id(&state.db, id, &payload.name, payload.rating).await?;
    Ok(Json(view(place)))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let id = parse_id(&id)?;
    places::delete_by_id(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own transactions at this place, whatever their roles.
pub async fn transactions(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<TransactionsResponse>, ServerError> {
    let id = parse_id(&id)?;
    let items = transactions::get_by_place_id(&state.db, &session, id)
        .await?
        .into_iter()
        .map(transaction::view)
        .collect();
    Ok(Json(TransactionsResponse { items }))
}
