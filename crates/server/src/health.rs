use api_types::health::Pong;
use axum::Json;

pub async fn ping() -> Json<Pong> {
    Json(Pong { pong: true })
}
