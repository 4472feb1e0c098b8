use crate::common::{error::ApiError, state::AppState};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::warn;

/// Extractor guarding the scheduled endpoints with
/// `Authorization: Bearer <CRON_SECRET>`.
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Compares without short-circuiting on the first differing byte.
fn tokens_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.config.cron_secret.as_deref() else {
            return Err(ApiError::Configuration(
                "CRON_SECRET is not configured".to_string(),
            ));
        };
        match bearer_token(parts) {
            Some(token) if tokens_match(token, secret) => Ok(CronAuth),
            _ => {
                warn!(path = %parts.uri.path(), "Rejected scheduled run with bad credentials");
                Err(ApiError::Unauthorized("invalid or missing bearer token".to_string()))
            }
        }
    }
}
