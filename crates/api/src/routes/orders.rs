//! Checkout handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAccount;
use crate::services::checkout::{self, CheckoutRequest};
use crate::state::AppState;

/// `POST /orders` - place an order from the account's current cart.
///
/// The total is computed server-side from live catalog prices; a
/// `totalAmount` in the body is advisory only.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let clear_cart = state.config().clear_cart_after_checkout;
    let order = checkout::place_order(state.store(), account, body, clear_cart).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "orderId": order.id,
            "total": order.total,
            "itemCount": order.items.len(),
            "createdAt": order.created_at,
        })),
    ))
}
