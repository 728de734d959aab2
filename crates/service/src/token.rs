//! Signed session tokens.
//!
//! A token carries the user id, the user's roles and the configured
//! audience/issuer, signed with a shared HS256 secret. Tokens are issued at
//! login/registration and consumed once per request by the authentication
//! guard; nothing is persisted.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("{0}")]
    Malformed(String),
    #[error("invalid audience")]
    AudienceMismatch,
    #[error("invalid issuer")]
    IssuerMismatch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub secret: String,
    pub audience: String,
    pub issuer: String,
    /// Token lifetime in seconds.
    pub expiration_interval: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified.
    pub sub: String,
    pub roles: Vec<String>,
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenCodec {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(config: TokenConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding,
            decoding,
        }
    }

    /// Builds and signs a token for a user.
    pub fn issue(&self, user_id: i32, roles: &[String]) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            roles: roles.to_vec(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + self.config.expiration_interval as i64,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| TokenError::Malformed(err.to_string()))
    }

    /// Verifies signature and expiry, then the audience and issuer claims.
    ///
    /// Expiry and signature are checked first; audience/issuer mismatches are
    /// only reported for otherwise valid tokens.
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // aud/iss are compared manually below so mismatches get their own
        // error variants.
        validation.validate_aud = false;

        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(err.to_string()),
            })?;

        if data.claims.aud != self.config.audience {
            return Err(TokenError::AudienceMismatch);
        }
        if data.claims.iss != self.config.issuer {
            return Err(TokenError::IssuerMismatch);
        }

        Ok(data.claims)
    }
}
