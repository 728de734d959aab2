//! Session derivation and authorization rules.
//!
//! A [`Session`] is the per-request identity: the user id plus the roles
//! carried by a verified token. It lives exactly as long as the request.

use crate::{
    ResultService, ServiceError,
    token::{TokenCodec, TokenError},
};

pub mod roles {
    pub const USER: &str = "USER";
    pub const ADMIN: &str = "ADMIN";
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: i32,
    pub roles: Vec<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == roles::ADMIN)
    }
}

/// The authentication guard.
///
/// Takes the raw `Authorization` header value, strips the `Bearer ` prefix
/// and verifies the token. Every failure, whatever its cause, comes back as
/// [`ServiceError::Unauthenticated`] so the server always answers 401.
pub fn check_and_parse_session(
    codec: &TokenCodec,
    authorization: Option<&str>,
) -> ResultService<Session> {
    let Some(header) = authorization else {
        return Err(ServiceError::Unauthenticated(
            "You need to be signed in".to_string(),
        ));
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        return Err(ServiceError::Unauthenticated(
            "You need to be signed in".to_string(),
        ));
    };

    let claims = match codec.parse(token) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => {
            return Err(ServiceError::Unauthenticated(
                "The token has expired".to_string(),
            ));
        }
        Err(TokenError::Malformed(reason)) => {
            return Err(ServiceError::Unauthenticated(format!(
                "Invalid authentication token: {reason}"
            )));
        }
        Err(other) => return Err(ServiceError::Unauthenticated(other.to_string())),
    };

    let user_id = claims.sub.parse().map_err(|_| {
        ServiceError::Unauthenticated("Invalid authentication token: bad subject".to_string())
    })?;

    Ok(Session {
        user_id,
        roles: claims.roles,
    })
}

/// Fails unless `role` is among `roles`.
pub fn check_role(role: &str, roles: &[String]) -> ResultService<()> {
    if roles.iter().any(|held| held == role) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You are not allowed to view this part of the application".to_string(),
        ))
    }
}

/// Self-or-admin rule for user resources.
///
/// `target` is the raw path parameter: "me", the caller's own id, or any id
/// when the caller holds ADMIN.
pub fn check_user_id(session: &Session, target: &str) -> ResultService<()> {
    if target == "me" || target == session.user_id.to_string() || session.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You are not allowed to view this user's information".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenConfig;

    fn codec() -> TokenCodec {
        TokenCodec::new(TokenConfig {
            secret: "test-secret-at-least-32-characters!!".to_string(),
            audience: "budget.test".to_string(),
            issuer: "budget.test".to_string(),
            expiration_interval: 3600,
        })
    }

    fn session(user_id: i32, roles: &[&str]) -> Session {
        Session {
            user_id,
            roles: roles.iter().map(|role| role.to_string()).collect(),
        }
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        assert_eq!(
            check_and_parse_session(&codec(), None),
            Err(ServiceError::Unauthenticated(
                "You need to be signed in".to_string()
            ))
        );
    }

    #[test]
    fn non_bearer_header_is_unauthenticated() {
        assert_eq!(
            check_and_parse_session(&codec(), Some("Basic dXNlcjpwdw==")),
            Err(ServiceError::Unauthenticated(
                "You need to be signed in".to_string()
            ))
        );
    }

    #[test]
    fn malformed_token_reports_the_reason() {
        let err = check_and_parse_session(&codec(), Some("Bearer garbage")).unwrap_err();
        match err {
            ServiceError::Unauthenticated(message) => {
                assert!(message.starts_with("Invalid authentication token:"));
            }
            other => panic!("expected Unauthenticated, got {other:?}"),
        }
    }

    #[test]
    fn valid_token_yields_session() {
        let codec = codec();
        let token = codec
            .issue(7, &["USER".to_string(), "ADMIN".to_string()])
            .unwrap();

        let session = check_and_parse_session(&codec, Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(session.user_id, 7);
        assert!(session.is_admin());
    }

    #[test]
    fn check_role_rejects_missing_role() {
        let held = vec![roles::USER.to_string()];
        assert!(check_role(roles::USER, &held).is_ok());
        assert_eq!(
            check_role(roles::ADMIN, &held),
            Err(ServiceError::Forbidden(
                "You are not allowed to view this part of the application".to_string()
            ))
        );
    }

    #[test]
    fn self_or_admin_rules() {
        let plain = session(5, &[]);
        assert!(check_user_id(&plain, "5").is_ok());
        assert!(check_user_id(&plain, "me").is_ok());
        assert!(check_user_id(&plain, "6").is_err());

        let admin = session(5, &[roles::ADMIN]);
        assert!(check_user_id(&admin, "6").is_ok());
    }
}
