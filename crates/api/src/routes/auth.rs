//! Signup and login handlers.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use buyit_core::Email;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/signup`
///
/// Creates an account with an empty cart and returns a bearer token.
#[instrument(skip(state, body))]
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Json<Value>, AppError> {
    if body.username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".to_owned()));
    }
    if body.password.is_empty() {
        return Err(AppError::Validation("password must not be empty".to_owned()));
    }
    let email = Email::parse(&body.email)
        .map_err(|e| AppError::Validation(format!("invalid email: {e}")))?;

    let account = state
        .store()
        .create_account(body.username.trim(), &email, &body.password)
        .await?;
    let token = state.gate().issue(account.id);

    tracing::info!(account_id = %account.id, "account created");
    Ok(Json(json!({ "success": true, "token": token })))
}

/// `POST /auth/login`
///
/// Wrong email and wrong password both produce the same 401.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let email = Email::parse(&body.email).map_err(|_| AppError::Unauthorized)?;

    let account = state
        .store()
        .verify_login(&email, &body.password)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let token = state.gate().issue(account.id);

    Ok(Json(json!({ "success": true, "token": token })))
}
