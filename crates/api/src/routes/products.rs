//! Catalog handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use buyit_core::{Price, ProductId};

use crate::error::AppError;
use crate::models::{Product, ProductSpec};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CountParams {
    /// Override for the configured view size.
    pub n: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub image: String,
    pub category: String,
    pub new_price: Decimal,
    pub old_price: Decimal,
}

/// `GET /products` - the whole catalog in insertion order.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.store().list_products().await?))
}

/// `GET /products/recent` - the newest arrivals, in storage order.
#[instrument(skip(state))]
pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    let n = params.n.unwrap_or(state.config().recent_count);
    Ok(Json(state.store().recent_arrivals(n).await?))
}

/// `GET /products/featured` - a stable subset of the catalog. Reading it
/// never mutates anything.
#[instrument(skip(state))]
pub async fn featured(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    let n = params.n.unwrap_or(state.config().featured_count);
    Ok(Json(state.store().featured_subset(n).await?))
}

/// `POST /products` - register a product; the store assigns the id.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_owned()));
    }
    let new_price = Price::new(body.new_price)
        .map_err(|e| AppError::Validation(format!("new_price: {e}")))?;
    let old_price = Price::new(body.old_price)
        .map_err(|e| AppError::Validation(format!("old_price: {e}")))?;

    let product = state
        .store()
        .create_product(ProductSpec {
            name: body.name,
            image: body.image,
            category: body.category,
            new_price,
            old_price,
        })
        .await?;

    tracing::info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `DELETE /products/{id}` - remove a product from the catalog. Cart
/// entries referencing it are left in place.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if state.store().remove_product(ProductId::new(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
