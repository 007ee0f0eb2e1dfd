//! Order models.
//!
//! An [`Order`] is an immutable snapshot taken at checkout: line items with
//! the unit price that was current when the order was placed, plus an
//! authoritative server-computed total. Orders are never mutated or deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use buyit_core::{AccountId, OrderId, Price, ProductId};

/// A priced order line, derived from the cart at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product id as captured at checkout.
    pub product_id: ProductId,
    /// Product name as captured at checkout.
    pub name: String,
    /// Quantity ordered.
    pub quantity: u32,
    /// Unit price at checkout time.
    pub unit_price: Price,
    /// `quantity × unit_price`.
    pub total: Decimal,
}

/// Shipping details supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

/// Raw payment details supplied by the client.
///
/// Deserialize-only by design: this struct must never be serialized or
/// persisted. Only the derived [`PaymentSummary`] is stored.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl std::fmt::Debug for PaymentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentInfo")
            .field("card_number", &"[REDACTED]")
            .field("expiry_date", &"[REDACTED]")
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

/// The only payment data an order retains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSummary {
    /// Last four digits of the card number.
    pub card_last4: String,
}

/// An immutable, priced snapshot of a checkout event.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Storage-assigned order id.
    pub id: OrderId,
    /// The account that placed the order.
    pub account_id: AccountId,
    /// Resolved line items, in product-id order.
    pub items: Vec<LineItem>,
    /// Authoritative server-computed total.
    pub total: Decimal,
    /// Client-submitted total, advisory only. Never used as the amount.
    pub quoted_total: Option<Decimal>,
    /// Shipping details as submitted.
    pub shipping: ShippingInfo,
    /// Tokenized payment reference.
    pub payment: PaymentSummary,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

/// Input to the storage layer for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub account_id: AccountId,
    pub items: Vec<LineItem>,
    pub total: Decimal,
    pub quoted_total: Option<Decimal>,
    pub shipping: ShippingInfo,
    pub payment: PaymentSummary,
}
