//! Bearer-token authentication extractor.
//!
//! Handlers that take a [`RequireAccount`] argument only run for requests
//! carrying a valid `Authorization: Bearer <token>` header; everything else
//! is rejected with 401 before the handler body executes.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use buyit_core::AccountId;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that authenticates the request and yields the account id
/// embedded in its token.
#[derive(Debug, Clone, Copy)]
pub struct RequireAccount(pub AccountId);

impl FromRequestParts<AppState> for RequireAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let claims = state.gate().verify(token)?;
        Ok(Self(claims.account_id))
    }
}
