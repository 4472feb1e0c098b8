//! Error taxonomy shared by every imagery endpoint.
//!
//! Provider outcomes are turned into an [`ApiError`] in exactly two places:
//! [`classify_response`] for non-2xx answers and the `From<reqwest::Error>`
//! impl for transport failures. Everything downstream matches on
//! [`ErrorKind`] (status codes, tile degradation headers, cron reports).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

/// Upstream bodies are cut to this many characters before they are logged or
/// echoed back to callers.
pub const MAX_DETAIL_CHARS: usize = 200;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    UpstreamRejected,
    Upstream,
    RateLimited,
    NotFound,
    Transient,
    Retrieval,
    Unauthorized,
    Database,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Validation(String),

    #[error("provider rejected the request with status {status}")]
    UpstreamRejected { status: u16, body: String },

    #[error("provider request failed with status {status}")]
    Upstream { status: u16, body: String },

    #[error("provider rate limit exceeded")]
    RateLimited { body: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Retrieval(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub kind: ErrorKind,
    pub status: u16,
    pub details: Option<String>,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Configuration(_) => ErrorKind::Configuration,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::UpstreamRejected { .. } => ErrorKind::UpstreamRejected,
            ApiError::Upstream { .. } => ErrorKind::Upstream,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Transient(_) => ErrorKind::Transient,
            ApiError::Retrieval(_) => ErrorKind::Retrieval,
            ApiError::Unauthorized(_) => ErrorKind::Unauthorized,
            ApiError::Database(_) => ErrorKind::Database,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Upstream { .. } | ApiError::Retrieval(_) => StatusCode::BAD_GATEWAY,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Transient(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Truncated upstream body, when the error carries one.
    pub fn details(&self) -> Option<&str> {
        match self {
            ApiError::UpstreamRejected { body, .. }
            | ApiError::Upstream { body, .. }
            | ApiError::RateLimited { body } => Some(body.as_str()).filter(|b| !b.is_empty()),
            _ => None,
        }
    }

    pub fn missing_provider_key() -> Self {
        ApiError::Configuration("provider API key is not configured".to_string())
    }
}

pub fn truncate_detail(body: &str) -> String {
    body.chars().take(MAX_DETAIL_CHARS).collect()
}

/// Maps a non-2xx provider answer to an error kind.
pub fn classify_response(status: u16, body: &str) -> ApiError {
    let body = truncate_detail(body);
    match status {
        429 => ApiError::RateLimited { body },
        404 => ApiError::NotFound(if body.is_empty() {
            "provider resource not found".to_string()
        } else {
            format!("provider resource not found: {body}")
        }),
        400..=499 => ApiError::UpstreamRejected { status, body },
        _ => ApiError::Upstream { status, body },
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Transient("provider request timed out".to_string())
        } else if e.is_connect() {
            ApiError::Transient(format!("could not reach provider: {e}"))
        } else if e.is_decode() {
            ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                body: truncate_detail(&format!("unreadable provider response: {e}")),
            }
        } else if let Some(status) = e.status() {
            classify_response(status.as_u16(), &e.to_string())
        } else {
            ApiError::Transient(format!("provider request failed: {e}"))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        match kind {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Unauthorized => {
                debug!(kind = %kind, status = status.as_u16(), error = %self, "Request rejected");
            }
            ErrorKind::RateLimited | ErrorKind::UpstreamRejected | ErrorKind::Configuration => {
                warn!(kind = %kind, status = status.as_u16(), error = %self, "Request failed");
            }
            _ => {
                error!(kind = %kind, status = status.as_u16(), error = %self, "Request failed");
            }
        }

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            kind,
            status: status.as_u16(),
            details: self.details().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}
