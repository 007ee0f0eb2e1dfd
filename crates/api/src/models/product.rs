//! Catalog product model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use buyit_core::{Price, ProductId};

/// A purchasable product in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Monotonically assigned, unique id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Image reference (URL or storage key).
    pub image: String,
    /// Display category.
    pub category: String,
    /// Current price; the one checkout charges.
    pub new_price: Price,
    /// Prior price, kept for display.
    pub old_price: Price,
    /// Availability flag.
    pub available: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a product. The id is assigned by the
/// storage layer, never by the caller.
#[derive(Debug, Clone)]
pub struct ProductSpec {
    pub name: String,
    pub image: String,
    pub category: String,
    pub new_price: Price,
    pub old_price: Price,
}
