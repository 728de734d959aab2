//! Domain layer: entities, validation, authorization rules and the
//! database-error translator. Everything here is plain async functions over a
//! [`sea_orm::DatabaseConnection`]; the HTTP crate stays a thin shell.

pub use auth::Session;
pub use error::ServiceError;
pub use token::{Claims, TokenCodec, TokenConfig, TokenError};

pub mod auth;
pub mod error;
pub mod password;
pub mod places;
pub mod token;
pub mod transactions;
pub mod users;

pub type ResultService<T> = Result<T, ServiceError>;
