//! Wishlist index: a flat list of `(customer, product)` pairs.

use crate::activity_log::ActivityLog;
use crate::clock::Clock;
use crate::codec::DataFile;
use crate::error::BusinessError;
use crate::models::WishlistItem;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Wishlist {
    items: Vec<WishlistItem>,
    file: DataFile<WishlistItem>,
    clock: Arc<dyn Clock>,
    log: ActivityLog,
}

impl Wishlist {
    pub fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>, log: ActivityLog) -> Self {
        let file = DataFile::new(path, log.clone());
        let items = file.load();
        Self { items, file, clock, log }
    }

    /// Writes the list, or puts `before` back if the write fails.
    fn commit(&mut self, before: Vec<WishlistItem>) -> Result<(), BusinessError> {
        if let Err(e) = self.file.try_save(&self.items) {
            self.items = before;
            return Err(e);
        }
        Ok(())
    }

    pub fn contains(&self, customer_id: i32, product_id: i32) -> bool {
        self.items.iter().any(|item| item.matches(customer_id, product_id))
    }

    /// Adds a pair. Returns `Ok(false)` if it is already present.
    pub fn add(&mut self, customer_id: i32, product_id: i32) -> Result<bool, BusinessError> {
        if self.contains(customer_id, product_id) {
            return Ok(false);
        }
        let before = self.items.clone();
        self.items
            .push(WishlistItem::new(customer_id, product_id, self.clock.now_string()));
        self.commit(before)?;

        self.log.info(&format!(
            "Product {} added to wishlist of customer {}",
            product_id, customer_id
        ));
        Ok(true)
    }

    /// Removes a pair. Returns `Ok(false)` if it was absent.
    pub fn remove(&mut self, customer_id: i32, product_id: i32) -> Result<bool, BusinessError> {
        let Some(pos) = self
            .items
            .iter()
            .position(|item| item.matches(customer_id, product_id))
        else {
            return Ok(false);
        };
        let before = self.items.clone();
        self.items.remove(pos);
        self.commit(before)?;

        self.log.info(&format!(
            "Product {} removed from wishlist of customer {}",
            product_id, customer_id
        ));
        Ok(true)
    }

    /// Removes every item of a customer and returns how many were removed.
    pub fn clear_for_customer(&mut self, customer_id: i32) -> Result<usize, BusinessError> {
        let before = self.items.clone();
        self.items.retain(|item| item.customer_id != customer_id);
        let removed = before.len() - self.items.len();
        if removed > 0 {
            self.commit(before)?;
            self.log.info(&format!("Wishlist cleared for customer {}", customer_id));
        }
        Ok(removed)
    }

    /// Product ids on a customer's wishlist, in insertion order.
    pub fn products_for(&self, customer_id: i32) -> Vec<i32> {
        self.items
            .iter()
            .filter(|item| item.customer_id == customer_id)
            .map(|item| item.product_id)
            .collect()
    }

    /// Customers wishing for `product_id`.
    pub fn customers_for(&self, product_id: i32) -> Vec<i32> {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.customer_id)
            .collect()
    }

    pub fn all(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn count_for(&self, customer_id: i32) -> usize {
        self.items.iter().filter(|item| item.customer_id == customer_id).count()
    }

    /// Drops every item pointing at a deleted product.
    pub fn remove_product(&mut self, product_id: i32) -> Result<usize, BusinessError> {
        let before = self.items.clone();
        self.items.retain(|item| item.product_id != product_id);
        let removed = before.len() - self.items.len();
        if removed > 0 {
            self.commit(before)?;
        }
        Ok(removed)
    }
}
