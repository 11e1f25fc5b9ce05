use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

fn with_message(status: StatusCode, message: Option<String>, fallback: &str) -> Response {
    (status, message.unwrap_or_else(|| fallback.to_string())).into_response()
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::NotFound(message) => {
                        debug!("Responding 404: {message:?}");
                        with_message(StatusCode::NOT_FOUND, message, "NOT FOUND")
                    }
                    EntityErrorKind::Invalid(message) => {
                        debug!("Responding 400: {message:?}");
                        with_message(StatusCode::BAD_REQUEST, message, "BAD REQUEST")
                    }
                    EntityErrorKind::Unauthenticated(message) => {
                        with_message(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
                    }
                    EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => {
                        error!("Database error: {:?}", self.0.source);
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                    }
                },
                InternalErrorKind::Config => {
                    error!("Server is missing required configuration");
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
                InternalErrorKind::Other(message) => {
                    error!("Internal error: {message} ({:?})", self.0.source);
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Network => {
                    warn!("Upstream service unreachable: {:?}", self.0.source);
                    (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
                }
                // Upstream bodies are logged, never relayed to the client.
                ExternalErrorKind::Other(message) => {
                    warn!("Upstream service error: {message}");
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
