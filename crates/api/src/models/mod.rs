//! Domain models for the BuyIt backend.

pub mod account;
pub mod order;
pub mod product;

pub use account::Account;
pub use order::{LineItem, NewOrder, Order, PaymentInfo, PaymentSummary, ShippingInfo};
pub use product::{Product, ProductSpec};
