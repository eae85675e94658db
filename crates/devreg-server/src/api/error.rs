//! HTTP mapping for `DevRegError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use devreg_core::error::DevRegError;

/// Handler error: wraps the shared error so it can become a response.
#[derive(Debug)]
pub struct ApiError(pub DevRegError);

impl From<DevRegError> for ApiError {
    fn from(e: DevRegError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            DevRegError::BadRequest(_) | DevRegError::UnsupportedVersion => StatusCode::BAD_REQUEST,
            DevRegError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
