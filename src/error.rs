//! Error types.
//!
//! Internal plumbing uses `anyhow` through the `Error` and `Result` aliases. Handlers speak
//! `ApiError`, which knows the status code and the message that is sent back to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use tracing::{debug, error};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The result type returned by HTTP handlers.
pub(crate) type ApiResult<T> = std::result::Result<T, ApiError>;

/// The failures an HTTP caller can observe.
///
/// Any failure coming out of the store, including constraint violations, is a `Persistence` error
/// and is reported as a 500 carrying the store's own message. There is no field-level validation.
#[derive(Debug)]
pub enum ApiError {
    /// No identity could be resolved for the request (401).
    Unauthenticated,
    /// The identity is not allowed to perform a mutating operation (403).
    Forbidden,
    /// The record named by the path does not exist (404).
    NotFound,
    /// The store rejected or failed the operation (500).
    Persistence(Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthenticated => f.write_str("401 Unauthorized!"),
            ApiError::Forbidden => f.write_str("403 Forbidden!"),
            ApiError::NotFound => f.write_str("404 Not Found"),
            // The alternate form includes the whole context chain down to the root cause.
            ApiError::Persistence(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Persistence(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// The JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!("Request failed with {status}: {message}");
        } else {
            debug!("Request rejected with {status}: {message}");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Converts internal results into `ApiResult`s, treating every error as a store failure.
pub(crate) trait IntoApiResult<T> {
    fn api_result(self) -> ApiResult<T>;
}

impl<T, E> IntoApiResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn api_result(self) -> ApiResult<T> {
        self.map_err(|e| ApiError::Persistence(e.into()))
    }
}
