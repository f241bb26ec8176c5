//! The single `IntoResponse` conversion point: every error surfaces as
//! `{ok: false, error}` with a status code from a fixed taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// The unified error type every handler returns. The `IntoResponse` impl
/// is the single place that maps a variant to its status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("request body exceeds the size limit")]
    PayloadTooLarge,

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    GatewayTimeout(String),

    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({"ok": false, "error": self.to_string()}));
        (self.status(), body).into_response()
    }
}

impl From<edi_core::CoreError> for ApiError {
    fn from(err: edi_core::CoreError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<edi_store::StoreError> for ApiError {
    fn from(err: edi_store::StoreError) -> Self {
        match err {
            edi_store::StoreError::ThreadNotFound(id) => Self::NotFound(format!("thread not found: {id}")),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<edi_auth::AuthError> for ApiError {
    fn from(err: edi_auth::AuthError) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

impl From<edi_agent::AgentError> for ApiError {
    fn from(err: edi_agent::AgentError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<edi_dispatch::DispatchError> for ApiError {
    fn from(err: edi_dispatch::DispatchError) -> Self {
        if err.is_client_error() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Upstream(err.to_string())
        }
    }
}

impl From<edi_dispatch::AskError> for ApiError {
    fn from(err: edi_dispatch::AskError) -> Self {
        match err {
            edi_dispatch::AskError::InvalidThreadId(core) => Self::BadRequest(core.to_string()),
            edi_dispatch::AskError::Upstream(message) => Self::Upstream(message),
            edi_dispatch::AskError::ReplyTimeout => Self::GatewayTimeout("timed out waiting for a reply".to_string()),
        }
    }
}

impl From<edi_dispatch::WebhookError> for ApiError {
    fn from(err: edi_dispatch::WebhookError) -> Self {
        match err {
            edi_dispatch::WebhookError::Auth(auth) => Self::Unauthorized(auth.to_string()),
            edi_dispatch::WebhookError::SecretNotConfigured => {
                Self::ServiceUnavailable("GitHub webhook secret not configured".to_string())
            }
            edi_dispatch::WebhookError::Upstream(message) => Self::Upstream(message),
        }
    }
}
