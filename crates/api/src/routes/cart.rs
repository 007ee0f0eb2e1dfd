//! Cart handlers. All of them require a bearer token.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use buyit_core::ProductId;

use crate::error::AppError;
use crate::middleware::RequireAccount;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: ProductId,
}

/// `GET /cart` - the full ledger, one entry per slot including zeroes.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<BTreeMap<ProductId, u32>>, AppError> {
    let ledger = state.store().cart_read(account).await?;
    Ok(Json(ledger.dense()))
}

/// `POST /cart/items` - add one unit of a product.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Json(body): Json<CartItemRequest>,
) -> Result<Json<Value>, AppError> {
    let quantity = state
        .store()
        .cart_increment(account, body.product_id)
        .await?;
    Ok(Json(json!({
        "productId": body.product_id,
        "quantity": quantity,
    })))
}

/// `DELETE /cart/items` - remove one unit; a zero slot stays at zero.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Json(body): Json<CartItemRequest>,
) -> Result<Json<Value>, AppError> {
    let quantity = state
        .store()
        .cart_decrement(account, body.product_id)
        .await?;
    Ok(Json(json!({
        "productId": body.product_id,
        "quantity": quantity,
    })))
}
