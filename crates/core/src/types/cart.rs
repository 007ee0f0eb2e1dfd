//! Per-account cart ledger.
//!
//! A [`CartLedger`] maps product ids to held quantities over a fixed slot
//! range `0..capacity`. The range is bounded so that a cart can never absorb
//! arbitrary keys; ids outside the range are rejected, not silently stored.
//!
//! Quantities are unsigned and decrements saturate at zero, so no entry can
//! ever go negative.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Errors produced by cart ledger operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The product id is outside the configured slot range.
    #[error("product id {product_id} is outside the cart slot range 0..{capacity}")]
    OutOfRange {
        /// The offending product id.
        product_id: ProductId,
        /// The configured slot ceiling.
        capacity: u32,
    },
}

/// A bounded mapping from product id to non-negative quantity.
///
/// Only non-zero slots are stored; [`CartLedger::dense`] materializes the
/// complete view (including zero slots) that clients render from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLedger {
    capacity: u32,
    quantities: BTreeMap<ProductId, u32>,
}

impl CartLedger {
    /// Default slot ceiling, matching the fixed catalog-size ceiling the
    /// storefront was built around.
    pub const DEFAULT_CAPACITY: u32 = 300;

    /// Create an empty ledger with every slot in `0..capacity` at zero.
    #[must_use]
    pub const fn new(capacity: u32) -> Self {
        Self {
            capacity,
            quantities: BTreeMap::new(),
        }
    }

    /// The configured slot ceiling.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    fn check_range(&self, product_id: ProductId) -> Result<(), CartError> {
        let in_range =
            u32::try_from(product_id.as_i32()).is_ok_and(|slot| slot < self.capacity);
        if !in_range {
            return Err(CartError::OutOfRange {
                product_id,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Increment the quantity for `product_id` by one.
    ///
    /// Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfRange`] if the id is outside the slot range.
    pub fn increment(&mut self, product_id: ProductId) -> Result<u32, CartError> {
        self.check_range(product_id)?;
        let slot = self.quantities.entry(product_id).or_insert(0);
        *slot = slot.saturating_add(1);
        Ok(*slot)
    }

    /// Decrement the quantity for `product_id` by one, floored at zero.
    ///
    /// Decrementing an already-zero slot is a no-op, not an error. Returns
    /// the new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfRange`] if the id is outside the slot range.
    pub fn decrement(&mut self, product_id: ProductId) -> Result<u32, CartError> {
        self.check_range(product_id)?;
        match self.quantities.get_mut(&product_id) {
            Some(slot) if *slot > 1 => {
                *slot -= 1;
                Ok(*slot)
            }
            Some(_) => {
                // Back to zero; drop the entry so the sparse map stays minimal
                self.quantities.remove(&product_id);
                Ok(0)
            }
            None => Ok(0),
        }
    }

    /// The quantity currently held for `product_id` (zero for empty slots).
    #[must_use]
    pub fn quantity(&self, product_id: ProductId) -> u32 {
        self.quantities.get(&product_id).copied().unwrap_or(0)
    }

    /// Set a slot directly. Used when hydrating a ledger from storage rows.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfRange`] if the id is outside the slot range.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        self.check_range(product_id)?;
        if quantity == 0 {
            self.quantities.remove(&product_id);
        } else {
            self.quantities.insert(product_id, quantity);
        }
        Ok(())
    }

    /// Reset every slot to zero.
    pub fn clear(&mut self) {
        self.quantities.clear();
    }

    /// True if every slot is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Iterate over the slots with a non-zero quantity, in id order.
    pub fn non_zero(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.quantities.iter().map(|(id, qty)| (*id, *qty))
    }

    /// The complete dense view: every slot in `0..capacity`, zeros included.
    ///
    /// Clients rely on this shape for rendering, so zero-quantity entries are
    /// part of the contract.
    #[must_use]
    pub fn dense(&self) -> BTreeMap<ProductId, u32> {
        (0..self.capacity)
            .filter_map(|slot| i32::try_from(slot).ok())
            .map(|id| {
                let product_id = ProductId::new(id);
                (product_id, self.quantity(product_id))
            })
            .collect()
    }
}

impl Default for CartLedger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_and_read_back() {
        let mut cart = CartLedger::new(10);
        assert_eq!(cart.increment(ProductId::new(3)).unwrap(), 1);
        assert_eq!(cart.increment(ProductId::new(3)).unwrap(), 2);
        assert_eq!(cart.quantity(ProductId::new(3)), 2);
        assert_eq!(cart.quantity(ProductId::new(4)), 0);
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut cart = CartLedger::new(10);
        cart.increment(ProductId::new(1)).unwrap();
        assert_eq!(cart.decrement(ProductId::new(1)).unwrap(), 0);
        // Already zero: no-op, still zero, not an error
        assert_eq!(cart.decrement(ProductId::new(1)).unwrap(), 0);
        assert_eq!(cart.quantity(ProductId::new(1)), 0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut cart = CartLedger::new(10);
        assert!(matches!(
            cart.increment(ProductId::new(10)),
            Err(CartError::OutOfRange { .. })
        ));
        assert!(matches!(
            cart.increment(ProductId::new(-1)),
            Err(CartError::OutOfRange { .. })
        ));
        assert!(matches!(
            cart.decrement(ProductId::new(999)),
            Err(CartError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_dense_view_includes_zero_slots() {
        let mut cart = CartLedger::new(5);
        cart.increment(ProductId::new(2)).unwrap();

        let dense = cart.dense();
        assert_eq!(dense.len(), 5);
        assert_eq!(dense[&ProductId::new(2)], 1);
        assert_eq!(dense[&ProductId::new(0)], 0);
        assert_eq!(dense[&ProductId::new(4)], 0);
    }

    #[test]
    fn test_non_zero_iterates_in_id_order() {
        let mut cart = CartLedger::new(10);
        cart.increment(ProductId::new(7)).unwrap();
        cart.increment(ProductId::new(2)).unwrap();
        cart.increment(ProductId::new(2)).unwrap();

        let entries: Vec<_> = cart.non_zero().collect();
        assert_eq!(entries, vec![(ProductId::new(2), 2), (ProductId::new(7), 1)]);
    }

    #[test]
    fn test_clear() {
        let mut cart = CartLedger::new(10);
        cart.increment(ProductId::new(1)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
    }
}
