//! In-process storage backend.
//!
//! Accounts are kept in per-account cells: the cart ledger inside each cell
//! is guarded by its own mutex, so concurrent mutations on one account
//! serialize on that cell rather than on a global lock, and mutations on
//! different accounts do not contend. Product ids come from an atomic
//! counter, so concurrent creates can never reserve the same id.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::Utc;

use buyit_core::{AccountId, CartLedger, Email, OrderId, ProductId};

use super::{RepositoryError, Result};
use crate::models::{Account, NewOrder, Order, Product};

/// Per-account record: profile, credential secret, and the cart ledger
/// behind its own serialization point.
struct AccountCell {
    account: Account,
    password: String,
    cart: Mutex<CartLedger>,
}

/// In-memory storage backend.
pub struct MemoryStore {
    capacity: u32,
    next_account_id: AtomicI32,
    next_product_id: AtomicI32,
    accounts: RwLock<HashMap<AccountId, Arc<AccountCell>>>,
    emails: RwLock<HashMap<String, AccountId>>,
    products: RwLock<BTreeMap<ProductId, Product>>,
    orders: RwLock<HashMap<OrderId, Order>>,
}

/// Recover the guard from a poisoned lock.
///
/// Nothing here holds a lock across an invariant-breaking intermediate
/// state, so continuing after a poisoned lock is sound.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    /// Create an empty store with the given cart slot ceiling.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            next_account_id: AtomicI32::new(1),
            next_product_id: AtomicI32::new(1),
            accounts: RwLock::new(HashMap::new()),
            emails: RwLock::new(HashMap::new()),
            products: RwLock::new(BTreeMap::new()),
            orders: RwLock::new(HashMap::new()),
        }
    }

    fn cell(&self, id: AccountId) -> Result<Arc<AccountCell>> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    fn in_range(&self, product: ProductId) -> bool {
        u32::try_from(product.as_i32()).is_ok_and(|slot| slot < self.capacity)
    }

    // -- Account Directory ----------------------------------------------------

    pub(super) async fn create_account(
        &self,
        name: &str,
        email: &Email,
        password: &str,
    ) -> Result<Account> {
        // Email map is the uniqueness authority; hold its write lock across
        // the check-and-insert
        let mut emails = self.emails.write().unwrap_or_else(PoisonError::into_inner);
        if emails.contains_key(email.as_str()) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let id = AccountId::new(self.next_account_id.fetch_add(1, Ordering::Relaxed));
        let account = Account {
            id,
            name: name.to_owned(),
            email: email.clone(),
            created_at: Utc::now(),
        };
        let cell = Arc::new(AccountCell {
            account: account.clone(),
            password: password.to_owned(),
            cart: Mutex::new(CartLedger::new(self.capacity)),
        });

        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, cell);
        emails.insert(email.as_str().to_owned(), id);

        Ok(account)
    }

    pub(super) async fn verify_login(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Option<Account>> {
        let id = {
            let emails = self.emails.read().unwrap_or_else(PoisonError::into_inner);
            emails.get(email.as_str()).copied()
        };
        let Some(id) = id else {
            return Ok(None);
        };

        let cell = self.cell(id)?;
        if cell.password == password {
            Ok(Some(cell.account.clone()))
        } else {
            Ok(None)
        }
    }

    pub(super) async fn get_account(&self, id: AccountId) -> Result<Account> {
        Ok(self.cell(id)?.account.clone())
    }

    // -- Cart Ledger ----------------------------------------------------------

    pub(super) async fn cart_increment(
        &self,
        account: AccountId,
        product: ProductId,
    ) -> Result<u32> {
        if !self.in_range(product) {
            return Err(RepositoryError::OutOfRangeItem {
                product_id: product,
                capacity: self.capacity,
            });
        }

        let cell = self.cell(account)?;

        // Adds are catalog-validated: in-range but unregistered ids are
        // rejected rather than silently absorbed. The catalog read lock is
        // held across the increment so the check stays true while the slot
        // is bumped; a concurrent remove_product waits until after
        let products = self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if !products.contains_key(&product) {
            return Err(RepositoryError::NotFound);
        }

        let mut cart = lock(&cell.cart);
        Ok(cart.increment(product)?)
    }

    pub(super) async fn cart_decrement(
        &self,
        account: AccountId,
        product: ProductId,
    ) -> Result<u32> {
        // No catalog check: removing a since-deleted product must still work
        let cell = self.cell(account)?;
        let mut cart = lock(&cell.cart);
        Ok(cart.decrement(product)?)
    }

    pub(super) async fn cart_read(&self, account: AccountId) -> Result<CartLedger> {
        let cell = self.cell(account)?;
        let cart = lock(&cell.cart);
        Ok(cart.clone())
    }

    // -- Catalog Store --------------------------------------------------------

    pub(super) async fn list_products(&self) -> Result<Vec<Product>> {
        let products = self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // BTreeMap iterates in id order == insertion order (ids are monotonic)
        Ok(products.values().cloned().collect())
    }

    pub(super) async fn recent_arrivals(&self, n: u32) -> Result<Vec<Product>> {
        let all = self.list_products().await?;
        let skip = all.len().saturating_sub(n as usize);
        Ok(all.into_iter().skip(skip).collect())
    }

    pub(super) async fn featured_subset(&self, n: u32) -> Result<Vec<Product>> {
        let all = self.list_products().await?;
        Ok(all.into_iter().take(n as usize).collect())
    }

    pub(super) async fn create_product(
        &self,
        spec: crate::models::ProductSpec,
    ) -> Result<Product> {
        let id = ProductId::new(self.next_product_id.fetch_add(1, Ordering::Relaxed));
        let product = Product {
            id,
            name: spec.name,
            image: spec.image,
            category: spec.category,
            new_price: spec.new_price,
            old_price: spec.old_price,
            available: true,
            created_at: Utc::now(),
        };

        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, product.clone());

        Ok(product)
    }

    pub(super) async fn remove_product(&self, id: ProductId) -> Result<bool> {
        let removed = self
            .products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        Ok(removed)
    }

    pub(super) async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let products = self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(ids
            .iter()
            .filter_map(|id| products.get(id).cloned())
            .collect())
    }

    // -- Orders ---------------------------------------------------------------

    pub(super) async fn create_order(&self, order: NewOrder, clear_cart: bool) -> Result<Order> {
        let cell = self.cell(order.account_id)?;

        let order = Order {
            id: OrderId::generate(),
            account_id: order.account_id,
            items: order.items,
            total: order.total,
            quoted_total: order.quoted_total,
            shipping: order.shipping,
            payment: order.payment,
            created_at: Utc::now(),
        };

        // Hold the cart lock across insert + clear so the two are one step
        // from any concurrent mutator's point of view
        let mut cart = lock(&cell.cart);
        self.orders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(order.id, order.clone());
        if clear_cart {
            cart.clear();
        }

        Ok(order)
    }

    /// Number of orders held. Test support.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
