//! `PostgreSQL` storage backend.
//!
//! Cart mutations push the +1/-1 into SQL instead of round-tripping the
//! ledger: an upsert with `quantity = quantity + 1` for increments and
//! `GREATEST(quantity - 1, 0)` for decrements, both atomic per row; a slot
//! that reaches zero has its row pruned so the table only holds non-zero
//! quantities. Product
//! ids come from the `product` table's sequence, so concurrent creates each
//! reserve a distinct id. Order insert and cart clearing share one
//! transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use buyit_core::{AccountId, CartLedger, Email, OrderId, Price, ProductId};

use super::{RepositoryError, Result};
use crate::models::{Account, NewOrder, Order, Product, ProductSpec};

/// `PostgreSQL` storage backend.
pub struct PostgresStore {
    pool: PgPool,
    capacity: u32,
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i32,
    name: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> Result<Account> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Account {
            id: AccountId::new(self.id),
            name: self.name,
            email,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    image: String,
    category: String,
    new_price: Decimal,
    old_price: Decimal,
    available: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self> {
        let new_price = Price::new(row.new_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;
        let old_price = Price::new(row.old_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            image: row.image,
            category: row.category,
            new_price,
            old_price,
            available: row.available,
            created_at: row.created_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, name, email, password, created_at";
const PRODUCT_COLUMNS: &str =
    "id, name, image, category, new_price, old_price, available, created_at";

impl PostgresStore {
    /// Wrap a connection pool with the given cart slot ceiling.
    #[must_use]
    pub const fn new(pool: PgPool, capacity: u32) -> Self {
        Self { pool, capacity }
    }

    fn in_range(&self, product: ProductId) -> bool {
        u32::try_from(product.as_i32()).is_ok_and(|slot| slot < self.capacity)
    }

    fn out_of_range(&self, product: ProductId) -> RepositoryError {
        RepositoryError::OutOfRangeItem {
            product_id: product,
            capacity: self.capacity,
        }
    }

    async fn account_exists(&self, id: AccountId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM account WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    // -- Account Directory ----------------------------------------------------

    pub(super) async fn create_account(
        &self,
        name: &str,
        email: &Email,
        password: &str,
    ) -> Result<Account> {
        let sql = format!(
            "INSERT INTO account (name, email, password) VALUES ($1, $2, $3) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(name)
            .bind(email)
            .bind(password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("email already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        row.into_account()
    }

    pub(super) async fn verify_login(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE email = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) if row.password == password => row.into_account().map(Some),
            _ => Ok(None),
        }
    }

    pub(super) async fn get_account(&self, id: AccountId) -> Result<Account> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.into_account()
    }

    // -- Cart Ledger ----------------------------------------------------------

    pub(super) async fn cart_increment(
        &self,
        account: AccountId,
        product: ProductId,
    ) -> Result<u32> {
        if !self.in_range(product) {
            return Err(self.out_of_range(product));
        }

        let registered: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM product WHERE id = $1)")
                .bind(product)
                .fetch_one(&self.pool)
                .await?;
        if !registered {
            return Err(RepositoryError::NotFound);
        }

        // Field-level atomic increment; the +1 happens inside the database
        let quantity: i32 = sqlx::query_scalar(
            "INSERT INTO cart_item (account_id, product_id, quantity) \
             VALUES ($1, $2, 1) \
             ON CONFLICT (account_id, product_id) \
             DO UPDATE SET quantity = cart_item.quantity + 1 \
             RETURNING quantity",
        )
        .bind(account)
        .bind(product)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                // The account row is gone
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        u32::try_from(quantity)
            .map_err(|_| RepositoryError::DataCorruption("negative cart quantity".to_owned()))
    }

    pub(super) async fn cart_decrement(
        &self,
        account: AccountId,
        product: ProductId,
    ) -> Result<u32> {
        if !self.in_range(product) {
            return Err(self.out_of_range(product));
        }

        if !self.account_exists(account).await? {
            return Err(RepositoryError::NotFound);
        }

        // Atomic floored decrement; a missing row is an already-zero slot.
        // The row lock taken by the UPDATE holds until commit, so a slot
        // that hits zero can be pruned without racing a concurrent upsert
        let mut tx = self.pool.begin().await?;
        let quantity: Option<i32> = sqlx::query_scalar(
            "UPDATE cart_item \
             SET quantity = GREATEST(quantity - 1, 0) \
             WHERE account_id = $1 AND product_id = $2 \
             RETURNING quantity",
        )
        .bind(account)
        .bind(product)
        .fetch_optional(&mut *tx)
        .await?;

        if quantity == Some(0) {
            sqlx::query("DELETE FROM cart_item WHERE account_id = $1 AND product_id = $2")
                .bind(account)
                .bind(product)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        match quantity {
            Some(q) => u32::try_from(q)
                .map_err(|_| RepositoryError::DataCorruption("negative cart quantity".to_owned())),
            None => Ok(0),
        }
    }

    pub(super) async fn cart_read(&self, account: AccountId) -> Result<CartLedger> {
        if !self.account_exists(account).await? {
            return Err(RepositoryError::NotFound);
        }

        let rows: Vec<(i32, i32)> = sqlx::query_as(
            "SELECT product_id, quantity FROM cart_item WHERE account_id = $1",
        )
        .bind(account)
        .fetch_all(&self.pool)
        .await?;

        let mut ledger = CartLedger::new(self.capacity);
        for (product_id, quantity) in rows {
            let quantity = u32::try_from(quantity).map_err(|_| {
                RepositoryError::DataCorruption("negative cart quantity".to_owned())
            })?;
            // Rows outside the configured range (capacity was lowered) are
            // dropped from the view rather than failing the read
            let _ = ledger.set_quantity(ProductId::new(product_id), quantity);
        }

        Ok(ledger)
    }

    // -- Catalog Store --------------------------------------------------------

    pub(super) async fn list_products(&self) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM product ORDER BY id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    pub(super) async fn recent_arrivals(&self, n: u32) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM product ORDER BY id DESC LIMIT $1");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(i64::from(n))
            .fetch_all(&self.pool)
            .await?;

        // Newest-first from the query; present in storage order
        let mut products = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>>>()?;
        products.reverse();
        Ok(products)
    }

    pub(super) async fn featured_subset(&self, n: u32) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM product ORDER BY id LIMIT $1");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(i64::from(n))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    pub(super) async fn create_product(&self, spec: ProductSpec) -> Result<Product> {
        // The id comes from the table's sequence: an atomic reservation, not
        // a read-max-then-add-one
        let sql = format!(
            "INSERT INTO product (name, image, category, new_price, old_price) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&spec.name)
            .bind(&spec.image)
            .bind(&spec.category)
            .bind(spec.new_price)
            .bind(spec.old_price)
            .fetch_one(&self.pool)
            .await?;

        Product::try_from(row)
    }

    pub(super) async fn remove_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(super) async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ANY($1) ORDER BY id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(raw_ids)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    // -- Orders ---------------------------------------------------------------

    pub(super) async fn create_order(&self, order: NewOrder, clear_cart: bool) -> Result<Order> {
        let id = OrderId::generate();
        let mut tx = self.pool.begin().await?;

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO orders \
             (id, account_id, items, total, quoted_total, shipping, card_last4) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING created_at",
        )
        .bind(id)
        .bind(order.account_id)
        .bind(Json(&order.items))
        .bind(order.total)
        .bind(order.quoted_total)
        .bind(Json(&order.shipping))
        .bind(&order.payment.card_last4)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        if clear_cart {
            sqlx::query("DELETE FROM cart_item WHERE account_id = $1")
                .bind(order.account_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id,
            account_id: order.account_id,
            items: order.items,
            total: order.total,
            quoted_total: order.quoted_total,
            shipping: order.shipping,
            payment: order.payment,
            created_at,
        })
    }
}
