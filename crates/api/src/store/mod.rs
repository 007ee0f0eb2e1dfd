//! Storage layer for the BuyIt backend.
//!
//! Two backends implement the same operations:
//!
//! - [`memory::MemoryStore`] - in-process, used by tests and local
//!   development. Cart mutations serialize on a per-account lock.
//! - [`postgres::PostgresStore`] - production backend. Cart mutations are
//!   field-level atomic SQL; product ids come from a sequence.
//!
//! Both close the classic lost-update hazard: a cart mutation is never a
//! read-whole-document / mutate / write-whole-document round trip.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p buyit-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use buyit_core::{AccountId, CartError, CartLedger, Email, ProductId};

use crate::models::{Account, NewOrder, Order, Product, ProductSpec};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Product id outside the configured cart slot range.
    #[error("product id {product_id} is outside the cart slot range 0..{capacity}")]
    OutOfRangeItem {
        product_id: ProductId,
        capacity: u32,
    },
}

impl From<CartError> for RepositoryError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::OutOfRange {
                product_id,
                capacity,
            } => Self::OutOfRangeItem {
                product_id,
                capacity,
            },
        }
    }
}

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Storage backend, dispatched by enum so handlers stay monomorphic.
pub enum Store {
    Memory(MemoryStore),
    Postgres(PostgresStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $body:expr) => {
        match $self {
            Self::Memory($store) => $body,
            Self::Postgres($store) => $body,
        }
    };
}

impl Store {
    // -- Account Directory ----------------------------------------------------

    /// Create an account with a zeroed cart ledger.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    pub async fn create_account(
        &self,
        name: &str,
        email: &Email,
        password: &str,
    ) -> Result<Account> {
        dispatch!(self, store => store.create_account(name, email, password).await)
    }

    /// Look up an account by email and check its credential secret.
    ///
    /// Returns `Ok(None)` when the account does not exist or the secret does
    /// not match; the two cases are indistinguishable to callers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup fails.
    pub async fn verify_login(&self, email: &Email, password: &str) -> Result<Option<Account>> {
        dispatch!(self, store => store.verify_login(email, password).await)
    }

    /// Fetch an account by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such account exists.
    pub async fn get_account(&self, id: AccountId) -> Result<Account> {
        dispatch!(self, store => store.get_account(id).await)
    }

    // -- Cart Ledger ----------------------------------------------------------

    /// Atomically increment one cart slot by 1. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// - `OutOfRangeItem` if the product id is outside the slot range
    /// - `NotFound` if the product is not registered in the catalog, or the
    ///   account does not exist
    pub async fn cart_increment(&self, account: AccountId, product: ProductId) -> Result<u32> {
        dispatch!(self, store => store.cart_increment(account, product).await)
    }

    /// Atomically decrement one cart slot by 1, floored at zero. Returns the
    /// new quantity. Decrementing a zero slot is a no-op.
    ///
    /// # Errors
    ///
    /// - `OutOfRangeItem` if the product id is outside the slot range
    /// - `NotFound` if the account does not exist
    pub async fn cart_decrement(&self, account: AccountId, product: ProductId) -> Result<u32> {
        dispatch!(self, store => store.cart_decrement(account, product).await)
    }

    /// Read the account's full cart ledger.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn cart_read(&self, account: AccountId) -> Result<CartLedger> {
        dispatch!(self, store => store.cart_read(account).await)
    }

    // -- Catalog Store --------------------------------------------------------

    /// All products in insertion order.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        dispatch!(self, store => store.list_products().await)
    }

    /// The most recently created `n` products, in storage order.
    pub async fn recent_arrivals(&self, n: u32) -> Result<Vec<Product>> {
        dispatch!(self, store => store.recent_arrivals(n).await)
    }

    /// The first `n` products. Pure read: calling twice returns the same
    /// result.
    pub async fn featured_subset(&self, n: u32) -> Result<Vec<Product>> {
        dispatch!(self, store => store.featured_subset(n).await)
    }

    /// Create a product with an atomically reserved id.
    pub async fn create_product(&self, spec: ProductSpec) -> Result<Product> {
        dispatch!(self, store => store.create_product(spec).await)
    }

    /// Delete a product. Returns whether anything was deleted. Does not
    /// cascade into carts or orders.
    pub async fn remove_product(&self, id: ProductId) -> Result<bool> {
        dispatch!(self, store => store.remove_product(id).await)
    }

    /// Resolve a set of product ids. Missing ids are simply absent from the
    /// result, never an error.
    pub async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        dispatch!(self, store => store.get_products(ids).await)
    }

    // -- Orders ---------------------------------------------------------------

    /// Persist an order atomically. When `clear_cart` is set, the account's
    /// cart is emptied in the same atomic step; on failure neither happens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn create_order(&self, order: NewOrder, clear_cart: bool) -> Result<Order> {
        dispatch!(self, store => store.create_order(order, clear_cart).await)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
