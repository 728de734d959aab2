//! The module contains the errors the service layer can produce, plus the
//! translation of raw database failures into domain errors.
//!
//! The variants map one-to-one onto HTTP statuses in the server crate:
//!
//! - [`Unauthenticated`] missing/invalid/expired credentials (401).
//! - [`Forbidden`] authenticated but not allowed (403).
//! - [`ValidationFailed`] bad input or uniqueness violation (400).
//! - [`NotFound`] missing resource or broken reference (404).
//! - [`Conflict`] referential-integrity block on delete (409).
//!
//! [`Unauthenticated`]: ServiceError::Unauthenticated
//! [`Forbidden`]: ServiceError::Forbidden
//! [`ValidationFailed`]: ServiceError::ValidationFailed
//! [`NotFound`]: ServiceError::NotFound
//! [`Conflict`]: ServiceError::Conflict

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Service custom errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    ValidationFailed(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Database(DbErr),
}

impl PartialEq for ServiceError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unauthenticated(a), Self::Unauthenticated(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::ValidationFailed(a), Self::ValidationFailed(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Internal(a), Self::Internal(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Known store failure kinds the translator matches on.
///
/// Everything the store can throw that we care about is reduced to one of
/// these tagged variants; anything else falls through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreViolation {
    Unique(String),
    ForeignKey(String),
    NotFound(String),
}

fn classify(err: &DbErr) -> Option<StoreViolation> {
    if let Some(sql_err) = err.sql_err() {
        return match sql_err {
            SqlErr::UniqueConstraintViolation(message) => Some(StoreViolation::Unique(message)),
            SqlErr::ForeignKeyConstraintViolation(message) => {
                Some(StoreViolation::ForeignKey(message))
            }
            _ => None,
        };
    }

    if let DbErr::RecordNotFound(message) = err {
        return Some(StoreViolation::NotFound(message.clone()));
    }

    None
}

/// The rule table. First match wins; `None` means no rule applies and the
/// original error must be re-thrown.
///
/// Within the not-found rules the compound foreign-key names
/// (`fk_transaction_user`, `fk_transaction_place`) are checked before the
/// generic single-word ones, because a message can contain both
/// "transaction" and "user". That order is part of the contract.
fn match_rules(violation: &StoreViolation) -> Option<ServiceError> {
    match violation {
        StoreViolation::Unique(message) => {
            // SQLite reports the table.column pair ("UNIQUE constraint
            // failed: places.name"), not the index name; other stores report
            // the index. Both spellings are matched.
            let message = if message.contains("places.name")
                || message.contains("idx_place_name_unique")
            {
                "A place with this name already exists"
            } else if message.contains("users.email")
                || message.contains("idx_user_email_unique")
            {
                "There is already a user with this email address"
            } else {
                "This item already exists"
            };
            Some(ServiceError::ValidationFailed(message.to_string()))
        }
        StoreViolation::NotFound(message) => {
            let message = if message.contains("fk_transaction_user") {
                "This user does not exist"
            } else if message.contains("fk_transaction_place") {
                "This place does not exist"
            } else if message.contains("transaction") {
                "No transaction with this id exists"
            } else if message.contains("place") {
                "No place with this id exists"
            } else if message.contains("user") {
                "No user with this id exists"
            } else {
                return None;
            };
            Some(ServiceError::NotFound(message.to_string()))
        }
        StoreViolation::ForeignKey(message) => {
            let message = if message.contains("place_id") {
                "This place is still linked to transactions"
            } else if message.contains("user_id") {
                "This user is still linked to transactions"
            } else {
                return None;
            };
            Some(ServiceError::Conflict(message.to_string()))
        }
    }
}

/// Translates a raw database error into a domain error.
///
/// Errors no rule covers are passed through unchanged as
/// [`ServiceError::Database`]; the caller surfaces them as a 500.
pub fn translate(err: DbErr) -> ServiceError {
    match classify(&err).as_ref().and_then(match_rules) {
        Some(domain_err) => domain_err,
        None => ServiceError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_name_unique_violation() {
        let violation =
            StoreViolation::Unique("UNIQUE constraint failed: idx_place_name_unique".to_string());
        assert_eq!(
            match_rules(&violation),
            Some(ServiceError::ValidationFailed(
                "A place with this name already exists".to_string()
            ))
        );
    }

    #[test]
    fn user_email_unique_violation() {
        let violation =
            StoreViolation::Unique("UNIQUE constraint failed: idx_user_email_unique".to_string());
        assert_eq!(
            match_rules(&violation),
            Some(ServiceError::ValidationFailed(
                "There is already a user with this email address".to_string()
            ))
        );
    }

    #[test]
    fn sqlite_spelling_of_place_name_violation() {
        let violation =
            StoreViolation::Unique("UNIQUE constraint failed: places.name".to_string());
        assert_eq!(
            match_rules(&violation),
            Some(ServiceError::ValidationFailed(
                "A place with this name already exists".to_string()
            ))
        );
    }

    #[test]
    fn sqlite_spelling_of_user_email_violation() {
        let violation =
            StoreViolation::Unique("UNIQUE constraint failed: users.email".to_string());
        assert_eq!(
            match_rules(&violation),
            Some(ServiceError::ValidationFailed(
                "There is already a user with this email address".to_string()
            ))
        );
    }

    #[test]
    fn other_unique_violation_is_generic() {
        let violation = StoreViolation::Unique("UNIQUE constraint failed: whatever".to_string());
        assert_eq!(
            match_rules(&violation),
            Some(ServiceError::ValidationFailed(
                "This item already exists".to_string()
            ))
        );
    }

    #[test]
    fn fk_transaction_user_wins_over_generic_words() {
        // The message contains "transaction" and "user" as well; the compound
        // foreign-key rule must win.
        let violation = StoreViolation::NotFound(
            "no parent row for fk_transaction_user on transaction insert".to_string(),
        );
        assert_eq!(
            match_rules(&violation),
            Some(ServiceError::NotFound("This user does not exist".to_string()))
        );
    }

    #[test]
    fn fk_transaction_place_wins_over_generic_words() {
        let violation = StoreViolation::NotFound(
            "no parent row for fk_transaction_place on transaction insert".to_string(),
        );
        assert_eq!(
            match_rules(&violation),
            Some(ServiceError::NotFound(
                "This place does not exist".to_string()
            ))
        );
    }

    #[test]
    fn transaction_rule_wins_over_user_rule() {
        let violation = StoreViolation::NotFound("transaction for user not found".to_string());
        assert_eq!(
            match_rules(&violation),
            Some(ServiceError::NotFound(
                "No transaction with this id exists".to_string()
            ))
        );
    }

    #[test]
    fn place_and_user_rules() {
        let place = StoreViolation::NotFound("place missing".to_string());
        assert_eq!(
            match_rules(&place),
            Some(ServiceError::NotFound(
                "No place with this id exists".to_string()
            ))
        );

        let user = StoreViolation::NotFound("user missing".to_string());
        assert_eq!(
            match_rules(&user),
            Some(ServiceError::NotFound(
                "No user with this id exists".to_string()
            ))
        );
    }

    #[test]
    fn fk_violation_on_place_and_user_columns() {
        let place = StoreViolation::ForeignKey("constraint on column place_id".to_string());
        assert_eq!(
            match_rules(&place),
            Some(ServiceError::Conflict(
                "This place is still linked to transactions".to_string()
            ))
        );

        let user = StoreViolation::ForeignKey("constraint on column user_id".to_string());
        assert_eq!(
            match_rules(&user),
            Some(ServiceError::Conflict(
                "This user is still linked to transactions".to_string()
            ))
        );
    }

    #[test]
    fn unmapped_violations_fall_through() {
        assert_eq!(
            match_rules(&StoreViolation::NotFound("row gone".to_string())),
            None
        );
        assert_eq!(
            match_rules(&StoreViolation::ForeignKey("some other column".to_string())),
            None
        );
    }

    #[test]
    fn unmapped_error_passes_through_unchanged() {
        let err = DbErr::Custom("connection lost".to_string());
        let message = err.to_string();
        match translate(err) {
            ServiceError::Database(inner) => assert_eq!(inner.to_string(), message),
            other => panic!("expected Database, got {other:?}"),
        }
    }

    #[test]
    fn record_not_found_goes_through_the_rule_table() {
        let err = DbErr::RecordNotFound("transaction 42".to_string());
        assert_eq!(
            translate(err),
            ServiceError::NotFound("No transaction with this id exists".to_string())
        );
    }
}
