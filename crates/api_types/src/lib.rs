use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    /// Returned by both login and registration.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenResponse {
        pub token: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserRegister {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub name: String,
        pub email: String,
    }

    /// Public projection of a user. The password hash is never exposed.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PublicUser {
        pub id: i32,
        pub name: String,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsersResponse {
        pub items: Vec<PublicUser>,
    }
}

pub mod place {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlaceNew {
        pub name: String,
        /// Rating between 1 and 5.
        pub rating: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlaceUpdate {
        pub name: String,
        pub rating: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlaceView {
        pub id: i32,
        pub name: String,
        pub rating: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlacesResponse {
        pub items: Vec<PlaceView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionNew {
        pub amount: f64,
        pub date: DateTime<FixedOffset>,
        pub place_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionUpdate {
        pub amount: f64,
        pub date: DateTime<FixedOffset>,
        pub place_id: i32,
    }

    /// Short user reference embedded in a transaction view.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserRef {
        pub id: i32,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i32,
        pub amount: f64,
        pub date: DateTime<FixedOffset>,
        pub place: super::place::PlaceView,
        pub user: UserRef,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionsResponse {
        pub items: Vec<TransactionView>,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Pong {
        pub pong: bool,
    }
}
