use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use service::ServiceError;

pub use server::{AuthConfig, ServerState, app, run, run_with_listener, spawn_with_listener};

mod health;
mod place;
mod server;
mod session;
mod transaction;
mod user;

pub struct ServerError(ServiceError);

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
}

#[derive(Serialize)]
struct InternalErrorBody {
    message: String,
    error: String,
}

fn status_for_service_error(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Internal(_) | ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let err = self.0;
        let status = status_for_service_error(&err);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Unclassified failures are logged with their raw message and
            // never silently swallowed.
            tracing::error!("internal error: {err}");
            let body = InternalErrorBody {
                message: "Internal Server Error".to_string(),
                error: err.to_string(),
            };
            return (status, Json(body)).into_response();
        }

        let body = ErrorBody {
            status: status.as_u16(),
            message: err.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ServerError {
    fn from(value: ServiceError) -> Self {
        Self(value)
    }
}
