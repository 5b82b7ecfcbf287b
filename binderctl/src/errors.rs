use crate::db::errors::DbError;
use crate::ledger::LedgerError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Business rule failure raised by the inventory ledger
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

fn db_status(db_err: &DbError) -> StatusCode {
    match db_err {
        DbError::NotFound => StatusCode::NOT_FOUND,
        DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
        DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
        DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
        DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn db_message(db_err: &DbError) -> String {
    match db_err {
        DbError::NotFound => "Resource not found".to_string(),
        DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
            (Some("users"), Some(c)) if c.contains("username") => "This username is already taken".to_string(),
            (Some("cards"), _) => "A card with this ID is already registered".to_string(),
            _ => "Resource already exists".to_string(),
        },
        DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
        DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
        DbError::Other(_) => "Database error occurred".to_string(),
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Ledger(ledger_err) => match ledger_err {
                LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
                LedgerError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
                LedgerError::InsufficientQuantity { .. } => StatusCode::CONFLICT,
                LedgerError::CapacityExceeded { .. } => StatusCode::CONFLICT,
                LedgerError::Storage(db_err) => db_status(db_err),
            },
        }
    }

    /// Machine-readable error kind carried in every response body
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Ledger(LedgerError::NotFound { .. }) => "not_found",
            Error::Ledger(LedgerError::InvalidArgument { .. }) => "invalid_argument",
            Error::Ledger(LedgerError::InsufficientQuantity { .. }) => "insufficient_quantity",
            Error::Ledger(LedgerError::CapacityExceeded { .. }) => "capacity_exceeded",
            Error::Ledger(LedgerError::Storage(db_err)) => match db_err {
                DbError::NotFound => "not_found",
                DbError::UniqueViolation { .. } => "conflict",
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => "invalid_argument",
                DbError::Other(_) => "storage",
            },
            Error::Internal { .. } => "internal",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Ledger(LedgerError::Storage(db_err)) => db_message(db_err),
            Error::Ledger(ledger_err) => ledger_err.to_string(),
        }
    }

    fn details(&self) -> Value {
        match self {
            Error::Ledger(LedgerError::NotFound { entity, id }) => json!({ "entity": entity.to_string(), "id": id }),
            Error::Ledger(LedgerError::InsufficientQuantity { have, want }) => json!({ "have": have, "want": want }),
            Error::Ledger(LedgerError::CapacityExceeded {
                current,
                limit,
                attempted,
            }) => json!({ "current": current, "limit": limit, "attempted": attempted }),
            _ => json!({}),
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        let status = self.status_code();
        if self.is_internal() {
            tracing::error!("Internal service error: {:#}", self);
        } else if status == StatusCode::CONFLICT {
            tracing::warn!("Conflict error: {}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        let mut body = json!({
            "kind": self.kind(),
            "message": self.user_message(),
        });
        if let (Value::Object(body), Value::Object(details)) = (&mut body, self.details()) {
            body.extend(details);
        }

        (status, Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Entity;

    #[test]
    fn test_ledger_kinds_map_to_statuses() {
        let cases = [
            (Error::from(LedgerError::not_found(Entity::Deck, "x")), StatusCode::NOT_FOUND, "not_found"),
            (Error::from(LedgerError::invalid("bad")), StatusCode::BAD_REQUEST, "invalid_argument"),
            (
                Error::from(LedgerError::InsufficientQuantity { have: 1, want: 2 }),
                StatusCode::CONFLICT,
                "insufficient_quantity",
            ),
            (
                Error::from(LedgerError::CapacityExceeded {
                    current: 59,
                    limit: 60,
                    attempted: 2,
                }),
                StatusCode::CONFLICT,
                "capacity_exceeded",
            ),
            (
                Error::from(LedgerError::Storage(DbError::Other(anyhow::anyhow!("connection reset")))),
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage",
            ),
        ];

        for (err, status, kind) in cases {
            assert_eq!(err.status_code(), status, "{err}");
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn test_storage_message_does_not_leak_details() {
        let err = Error::from(LedgerError::Storage(DbError::Other(anyhow::anyhow!("password authentication failed"))));
        assert_eq!(err.user_message(), "Database error occurred");
    }

    #[test]
    fn test_internal_error_hides_operation() {
        let err = Error::Internal {
            operation: "load config: missing database url".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "internal");
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn test_details_carry_quantities() {
        let err = Error::from(LedgerError::InsufficientQuantity { have: 3, want: 5 });
        assert_eq!(err.details(), json!({ "have": 3, "want": 5 }));
    }
}
