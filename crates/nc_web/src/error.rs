use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nc_core::Error;
use serde_json::json;
use tracing::error;

/// Maps [`nc_core::Error`] onto an HTTP status and a JSON `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(Error::InvalidInput(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidInput(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Inference(_) | Error::Http(_) | Error::Feed(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("❌ Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
