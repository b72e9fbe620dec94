//! Token extractors for Axum handlers.
//!
//! Credentials here are content-server tokens, passed through verbatim
//! as `Authorization: Token <t>`. The dashboard does not verify them
//! itself -- the content server rejects bad tokens on the first remote
//! call -- but the admin extractor compares against the locally
//! configured admin token before any broadcast is allowed.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chefboard_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Pull the token out of an `Authorization: Token <t>` header, if any.
fn token_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Token "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Optional content-server credential. Never rejects; handlers that can
/// degrade without a token (e.g. the dashboard's bulk status lookup)
/// use this.
#[derive(Debug, Clone)]
pub struct MaybeToken(pub Option<String>);

impl FromRequestParts<AppState> for MaybeToken {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeToken(token_from_parts(parts)))
    }
}

/// Admin gate for the control-broadcast endpoint.
///
/// Requires `ADMIN_TOKEN` to be configured and to match the caller's
/// token exactly; with no admin token configured every caller is
/// rejected.
#[derive(Debug, Clone)]
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header. Expected: Token <token>".into(),
            ))
        })?;

        match &state.config.admin_token {
            Some(admin_token) if *admin_token == token => Ok(AdminAuth),
            _ => Err(AppError::Core(CoreError::Forbidden(
                "Admin credential required".into(),
            ))),
        }
    }
}
