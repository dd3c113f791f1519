use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error returned by route handlers.
///
/// Clients only ever see the static `public_message`; the underlying cause is
/// logged when the error is built.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    public_message: &'static str,
}

impl ApiError {
    /// A failed storage or I/O operation.
    pub fn internal(public_message: &'static str, cause: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", public_message, cause);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.public_message
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.public_message,
            }),
        )
            .into_response()
    }
}

/// Attaches a route's public error message to any fallible result.
pub trait OrApiError<T> {
    fn or_api_error(self, public_message: &'static str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> OrApiError<T> for Result<T, E> {
    fn or_api_error(self, public_message: &'static str) -> Result<T, ApiError> {
        self.map_err(|err| ApiError::internal(public_message, err))
    }
}
