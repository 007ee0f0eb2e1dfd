//! Pricing and order assembly.
//!
//! Checkout reads the account's cart ledger, resolves every non-zero slot
//! against the live catalog, and prices lines at the product's current
//! price. Since-deleted products are excluded from the order rather than
//! failing the whole checkout. The server-computed total is authoritative;
//! a client-submitted figure is advisory and only logged on mismatch.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use buyit_core::{AccountId, CartLedger, ProductId};

use crate::models::{LineItem, NewOrder, Order, PaymentInfo, PaymentSummary, Product, ShippingInfo};
use crate::store::{RepositoryError, Store};

/// Errors from checkout.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Shipping or payment input failed validation. Raised before any
    /// persistence happens.
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage-layer failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Checkout request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_info: ShippingInfo,
    pub payment_info: PaymentInfo,
    /// Client-side total. Advisory only; never trusted for the amount.
    #[serde(default)]
    pub total_amount: Option<Decimal>,
}

/// Assemble line items and the authoritative total from a ledger and the
/// products that resolved against it.
///
/// Slots whose product is absent from `products` (deleted since the item
/// was added) produce no line; the remaining lines still price correctly.
#[must_use]
pub fn assemble(cart: &CartLedger, products: &[Product]) -> (Vec<LineItem>, Decimal) {
    let by_id: HashMap<ProductId, &Product> =
        products.iter().map(|product| (product.id, product)).collect();

    let mut items = Vec::new();
    let mut total = Decimal::ZERO;
    for (product_id, quantity) in cart.non_zero() {
        let Some(product) = by_id.get(&product_id) else {
            continue;
        };
        let line_total = product.new_price.line_total(quantity);
        items.push(LineItem {
            product_id,
            name: product.name.clone(),
            quantity,
            unit_price: product.new_price,
            total: line_total,
        });
        total += line_total;
    }

    (items, total)
}

/// Place an order for `account` from its current cart.
///
/// # Errors
///
/// Returns [`CheckoutError::Validation`] for missing/malformed shipping or
/// payment fields, and propagates storage errors otherwise. On storage
/// failure nothing is partially written.
pub async fn place_order(
    store: &Store,
    account: AccountId,
    request: CheckoutRequest,
    clear_cart: bool,
) -> Result<Order, CheckoutError> {
    let payment = validate(&request)?;

    let cart = store.cart_read(account).await?;
    let ids: Vec<ProductId> = cart.non_zero().map(|(id, _)| id).collect();
    let products = store.get_products(&ids).await?;

    let (items, total) = assemble(&cart, &products);

    if let Some(quoted) = request.total_amount
        && quoted != total
    {
        tracing::warn!(
            %account,
            %quoted,
            %total,
            "client-submitted total disagrees with computed total; using computed"
        );
    }

    let order = store
        .create_order(
            NewOrder {
                account_id: account,
                items,
                total,
                quoted_total: request.total_amount,
                shipping: request.shipping_info,
                payment,
            },
            clear_cart,
        )
        .await?;

    tracing::info!(%account, order_id = %order.id, %order.total, "order placed");
    Ok(order)
}

/// Validate shipping and payment fields; derive the persistable payment
/// summary. Raw card data never leaves this function.
fn validate(request: &CheckoutRequest) -> Result<PaymentSummary, CheckoutError> {
    let missing = |field: &str| CheckoutError::Validation(format!("missing field: {field}"));

    let shipping = &request.shipping_info;
    if shipping.name.trim().is_empty() {
        return Err(missing("shippingInfo.name"));
    }
    if shipping.address.trim().is_empty() {
        return Err(missing("shippingInfo.address"));
    }
    if shipping.city.trim().is_empty() {
        return Err(missing("shippingInfo.city"));
    }
    if shipping.postal_code.trim().is_empty() {
        return Err(missing("shippingInfo.postalCode"));
    }

    let payment = &request.payment_info;
    let digits: String = payment
        .card_number
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if digits.len() < 4 {
        return Err(CheckoutError::Validation(
            "paymentInfo.cardNumber must contain at least 4 digits".to_owned(),
        ));
    }
    if payment.expiry_date.trim().is_empty() {
        return Err(missing("paymentInfo.expiryDate"));
    }
    if payment.cvv.trim().is_empty() {
        return Err(missing("paymentInfo.cvv"));
    }

    let card_last4 = digits.chars().skip(digits.len() - 4).collect();
    Ok(PaymentSummary { card_last4 })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    use buyit_core::Price;

    fn product(id: i32, dollars: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product-{id}"),
            image: format!("product-{id}.png"),
            category: "misc".to_owned(),
            new_price: Price::new(Decimal::new(dollars, 0)).unwrap(),
            old_price: Price::new(Decimal::new(dollars + 5, 0)).unwrap(),
            available: true,
            created_at: Utc::now(),
        }
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            shipping_info: ShippingInfo {
                name: "Ada".to_owned(),
                address: "1 Main St".to_owned(),
                city: "Springfield".to_owned(),
                postal_code: "12345".to_owned(),
            },
            payment_info: PaymentInfo {
                card_number: "4242 4242 4242 4242".to_owned(),
                expiry_date: "12/30".to_owned(),
                cvv: "123".to_owned(),
            },
            total_amount: None,
        }
    }

    #[test]
    fn test_assemble_prices_lines_from_live_catalog() {
        // cart = {5: 2, 7: 1}; price(5)=10, price(7)=20 -> total 40, two lines
        let mut cart = CartLedger::new(300);
        cart.set_quantity(ProductId::new(5), 2).unwrap();
        cart.set_quantity(ProductId::new(7), 1).unwrap();

        let products = vec![product(5, 10), product(7, 20)];
        let (items, total) = assemble(&cart, &products);

        assert_eq!(items.len(), 2);
        assert_eq!(total, Decimal::new(40, 0));
        assert_eq!(items[0].product_id, ProductId::new(5));
        assert_eq!(items[0].total, Decimal::new(20, 0));
        assert_eq!(items[1].product_id, ProductId::new(7));
        assert_eq!(items[1].total, Decimal::new(20, 0));
    }

    #[test]
    fn test_assemble_excludes_deleted_products() {
        // cart = {5: 2}; product 5 gone -> zero lines, total 0, no error
        let mut cart = CartLedger::new(300);
        cart.set_quantity(ProductId::new(5), 2).unwrap();

        let (items, total) = assemble(&cart, &[]);
        assert!(items.is_empty());
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn test_validate_derives_card_last4() {
        let summary = validate(&request()).unwrap();
        assert_eq!(summary.card_last4, "4242");
    }

    #[test]
    fn test_validate_rejects_blank_shipping_field() {
        let mut req = request();
        req.shipping_info.city = "  ".to_owned();
        assert!(matches!(
            validate(&req),
            Err(CheckoutError::Validation(msg)) if msg.contains("city")
        ));
    }

    #[test]
    fn test_validate_rejects_short_card_number() {
        let mut req = request();
        req.payment_info.card_number = "12".to_owned();
        assert!(matches!(validate(&req), Err(CheckoutError::Validation(_))));
    }
}
