//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

use sea_orm::error::{DbErr, SqlErr};

/// Errors raised while reading or writing entities.
///
/// Data problems (a missing row, a duplicate upsert key) are kept apart from problems with
/// the database itself (connection loss, failed statements) so the layers above can choose
/// between a 4xx and a 5xx answer.
#[derive(Debug, PartialEq)]
pub struct Error {
    // Underlying error emitted from seaORM internals
    pub source: Option<DbErr>,
    // Enum representing which category of error
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    // Invalid search term
    InvalidQueryTerm,
    // Record not found
    RecordNotFound,
    // Record not updated
    RecordNotUpdated,
    // Record not authenticated
    RecordUnauthenticated,
    // Errors related to interactions with the database itself. Ex DbError::Conn
    SystemError,
    // Constraint violation or missing required data
    ValidationError,
    // Other errors
    Other,
}

impl Error {
    pub fn not_found() -> Self {
        Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entity API Error: {:?}", self)
    }
}

impl StdError for Error {}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        let error_kind = match (&err, err.sql_err()) {
            (_, Some(SqlErr::UniqueConstraintViolation(_)))
            | (_, Some(SqlErr::ForeignKeyConstraintViolation(_))) => {
                EntityApiErrorKind::ValidationError
            }
            (DbErr::RecordNotFound(_), _) => EntityApiErrorKind::RecordNotFound,
            (DbErr::RecordNotUpdated, _) => EntityApiErrorKind::RecordNotUpdated,
            _ => EntityApiErrorKind::SystemError,
        };

        Error {
            source: Some(err),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_maps_to_record_not_found_kind() {
        let err: Error = DbErr::RecordNotFound("videos".to_string()).into();
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotFound);
        assert!(err.source.is_some());
    }

    #[test]
    fn record_not_updated_maps_to_record_not_updated_kind() {
        let err: Error = DbErr::RecordNotUpdated.into();
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotUpdated);
    }

    #[test]
    fn other_database_errors_map_to_system_error() {
        let err: Error = DbErr::Custom("connection reset".to_string()).into();
        assert_eq!(err.error_kind, EntityApiErrorKind::SystemError);
    }
}
