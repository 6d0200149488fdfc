//! Catalog, discount and sale bookkeeping.
//!
//! The store owns the in-memory product, discount and sale collections.
//! Every mutation rewrites the affected data file in full.

use crate::activity_log::ActivityLog;
use crate::clock::Clock;
use crate::codec::DataFile;
use crate::config::DataPaths;
use crate::error::BusinessError;
use crate::filters::{Filter, FilterChain, FilterKind, ProductFilter};
use crate::models::{Discount, Product, ProductDraft, Sale, SaleItem};
use crate::sequence::{self, IdSequence};
use std::sync::Arc;
use tracing::debug;

/// Stock level below which a product counts as running low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

/// Resolves the price a customer pays for a product right now.
pub trait Pricing {
    /// Highest currently-valid discount percentage for `product`, or 0.
    fn best_discount_percent(&self, product: &Product) -> f64;

    /// Base price reduced by the best discount. Discounts never stack.
    fn discounted_price(&self, product: &Product) -> f64 {
        let percent = self.best_discount_percent(product);
        if percent <= 0.0 {
            product.base_price
        } else {
            product.base_price * (1.0 - percent / 100.0)
        }
    }

    /// `(base - discounted) / base`, 0 for free products.
    fn discount_fraction(&self, product: &Product) -> f64 {
        if product.base_price <= 0.0 {
            return 0.0;
        }
        (product.base_price - self.discounted_price(product)) / product.base_price
    }
}

/// Outcome of a restock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRestock {
    pub product_id: i32,
    pub title: String,
    pub previous: u32,
    pub current: u32,
}

impl KeyRestock {
    /// True when the product went from no keys to some keys.
    pub fn back_in_stock(&self) -> bool {
        self.previous == 0 && self.current > 0
    }
}

pub struct Store {
    products: Vec<Product>,
    discounts: Vec<Discount>,
    sales: Vec<Sale>,
    product_file: DataFile<Product>,
    discount_file: DataFile<Discount>,
    sale_file: DataFile<Sale>,
    ids: IdSequence,
    low_stock_threshold: u32,
    clock: Arc<dyn Clock>,
    log: ActivityLog,
}

impl Store {
    /// Opens the store and loads every collection from disk.
    pub fn open(paths: &DataPaths, clock: Arc<dyn Clock>, log: ActivityLog) -> Self {
        let mut store = Self {
            products: Vec::new(),
            discounts: Vec::new(),
            sales: Vec::new(),
            product_file: DataFile::new(&paths.products, log.clone()),
            discount_file: DataFile::new(&paths.discounts, log.clone()),
            sale_file: DataFile::new(&paths.sales, log.clone()),
            ids: IdSequence::open(&paths.sequences, log.clone()),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            clock,
            log,
        };
        store.load_data();
        store
    }

    /// Sets the stock level used for low-key warnings.
    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn low_stock_threshold(&self) -> u32 {
        self.low_stock_threshold
    }

    /// Re-reads products, discounts and sales from disk.
    pub fn load_data(&mut self) {
        self.products = self.product_file.load();
        self.discounts = self.discount_file.load();
        self.sales = self.sale_file.load();

        debug!(
            "Store loaded: {} products, {} discounts, {} sales",
            self.products.len(),
            self.discounts.len(),
            self.sales.len()
        );
    }

    fn save_products(&self) -> Result<(), BusinessError> {
        self.product_file.try_save(&self.products)
    }

    fn save_discounts(&self) -> Result<(), BusinessError> {
        self.discount_file.try_save(&self.discounts)
    }

    fn save_sales(&self) -> Result<(), BusinessError> {
        self.sale_file.try_save(&self.sales)
    }

    /// Product ids still referenced anywhere, including sold lines.
    fn known_product_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.products
            .iter()
            .map(|p| p.id)
            .chain(self.sales.iter().flat_map(|s| s.items.iter().map(|i| i.product_id)))
    }

    // ---- Catalog ----

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: i32) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Adds a product under a fresh id and returns the id.
    ///
    /// Ids are never reused, not even after a restart.
    pub fn add_product(&mut self, draft: &ProductDraft) -> Result<i32, BusinessError> {
        let existing: Vec<i32> = self.known_product_ids().collect();
        let id = self.ids.next(sequence::PRODUCTS, existing.into_iter())?;
        self.products.push(Product::from_draft(id, draft));
        if let Err(e) = self.save_products() {
            self.products.pop();
            return Err(e);
        }

        self.log.info(&format!("Product added: {} (ID {})", draft.title, id));
        Ok(id)
    }

    /// Overwrites a product's editable fields. `Ok(false)` if not found.
    pub fn update_product(&mut self, id: i32, draft: &ProductDraft) -> Result<bool, BusinessError> {
        let Some(pos) = self.products.iter().position(|p| p.id == id) else {
            return Ok(false);
        };
        let previous = self.products[pos].clone();
        self.products[pos].apply_draft(draft);
        if let Err(e) = self.save_products() {
            self.products[pos] = previous;
            return Err(e);
        }

        self.log.info(&format!("Product updated: {} (ID {})", draft.title, id));
        Ok(true)
    }

    /// Removes a product. `Ok(false)` if not found.
    pub fn delete_product(&mut self, id: i32) -> Result<bool, BusinessError> {
        let Some(pos) = self.products.iter().position(|p| p.id == id) else {
            return Ok(false);
        };
        let removed = self.products.remove(pos);
        if let Err(e) = self.save_products() {
            self.products.insert(pos, removed);
            return Err(e);
        }

        self.log.info(&format!("Product deleted: {} (ID {})", removed.title, id));
        Ok(true)
    }

    /// Case-insensitive title substring search, in catalog order.
    pub fn search_products<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Product> + 'a {
        let needle = query.to_lowercase();
        self.products
            .iter()
            .filter(move |p| p.title.to_lowercase().contains(&needle))
    }

    /// Single-criterion filter. `value` is ignored by the flag kinds.
    pub fn filter_products(&self, kind: FilterKind, value: &str) -> Vec<&Product> {
        let filter = ProductFilter::new(kind, value);
        self.products.iter().filter(|p| filter.matches(p, self)).collect()
    }

    /// Applies every filter in `chain`.
    pub fn filter_with(&self, chain: &FilterChain) -> Vec<&Product> {
        chain.apply(&self.products, self)
    }

    /// Increases a product's stock.
    pub fn add_keys(&mut self, id: i32, count: i32) -> Result<KeyRestock, BusinessError> {
        let count = u32::try_from(count).map_err(|_| BusinessError::NegativeKeyCount(count))?;
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(BusinessError::ProductNotFound(id))?;

        let previous = product.activation_keys();
        product.add_keys(count);
        let restock = KeyRestock {
            product_id: id,
            title: product.title.clone(),
            previous,
            current: product.activation_keys(),
        };
        if let Err(e) = self.save_products() {
            if let Some(product) = self.products.iter_mut().find(|p| p.id == id) {
                product.set_activation_keys(previous);
            }
            return Err(e);
        }

        if restock.current < self.low_stock_threshold {
            self.log.warning(&format!(
                "Low keys for product: {} ({} left)",
                restock.title, restock.current
            ));
        } else {
            self.log.info(&format!(
                "Keys added for product: {} (+{}, now {})",
                restock.title, count, restock.current
            ));
        }
        Ok(restock)
    }

    /// Products with fewer than `threshold` keys.
    pub fn low_stock(&self, threshold: u32) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.activation_keys() < threshold)
            .collect()
    }

    /// Distinct genres in first-seen catalog order.
    pub fn unique_genres(&self) -> Vec<String> {
        unique_in_order(self.products.iter().map(|p| p.genre.as_str()))
    }

    /// Distinct developers in first-seen catalog order.
    pub fn unique_developers(&self) -> Vec<String> {
        unique_in_order(self.products.iter().map(|p| p.developer.as_str()))
    }

    // ---- Discounts ----

    pub fn discounts(&self) -> &[Discount] {
        &self.discounts
    }

    /// Discounts whose window contains the current time.
    pub fn active_discounts(&self) -> Vec<&Discount> {
        let now = self.clock.now_string();
        self.discounts.iter().filter(|d| d.is_valid_at(&now)).collect()
    }

    fn validate_discount(discount: &Discount) -> Result<(), BusinessError> {
        if !(1.0..=100.0).contains(&discount.percentage) {
            return Err(BusinessError::InvalidPercentage(discount.percentage));
        }
        if !discount.window().is_ordered() {
            return Err(BusinessError::InvalidDiscountWindow {
                start: discount.start_date.clone(),
                end: discount.end_date.clone(),
            });
        }
        Ok(())
    }

    pub fn add_discount(&mut self, discount: Discount) -> Result<(), BusinessError> {
        Self::validate_discount(&discount)?;

        let summary = format!(
            "Discount added: {}% on {} [{}] ({})",
            discount.percentage,
            discount.kind,
            discount.targets.join(", "),
            discount.window().label()
        );
        self.discounts.push(discount);
        if let Err(e) = self.save_discounts() {
            self.discounts.pop();
            return Err(e);
        }
        self.log.info(&summary);
        Ok(())
    }

    /// Replaces the discount at `index` (0-based).
    pub fn update_discount(&mut self, index: usize, discount: Discount) -> Result<(), BusinessError> {
        Self::validate_discount(&discount)?;
        let slot = self
            .discounts
            .get_mut(index)
            .ok_or(BusinessError::DiscountIndex(index))?;
        let previous = std::mem::replace(slot, discount);
        if let Err(e) = self.save_discounts() {
            self.discounts[index] = previous;
            return Err(e);
        }

        self.log.info(&format!("Discount updated at position {}", index + 1));
        Ok(())
    }

    /// Removes and returns the discount at `index` (0-based).
    pub fn delete_discount(&mut self, index: usize) -> Result<Discount, BusinessError> {
        if index >= self.discounts.len() {
            return Err(BusinessError::DiscountIndex(index));
        }
        let removed = self.discounts.remove(index);
        if let Err(e) = self.save_discounts() {
            self.discounts.insert(index, removed);
            return Err(e);
        }

        self.log.info(&format!("Discount deleted at position {}", index + 1));
        Ok(removed)
    }

    // ---- Sales ----

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn sales_for_customer(&self, customer_id: i32) -> Vec<&Sale> {
        self.sales.iter().filter(|s| s.customer_id == customer_id).collect()
    }

    /// Validates every line, then records the sale and takes the keys.
    ///
    /// Nothing is changed unless every product exists and has enough keys
    /// for the summed quantity of its lines. Line prices are the discounted
    /// prices at the time of sale; `extra_discount` is recorded separately.
    /// A sale that cannot be written to disk is not recorded either.
    pub fn process_sale(
        &mut self,
        customer_id: i32,
        items: &[SaleItem],
        extra_discount: f64,
    ) -> Result<Sale, BusinessError> {
        let mut requested: Vec<(i32, i64)> = Vec::new();
        let mut total = 0.0;

        for item in items {
            if item.quantity < 1 {
                return Err(BusinessError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
            let product = self
                .product(item.product_id)
                .ok_or(BusinessError::ProductNotFound(item.product_id))?;
            total += self.discounted_price(product) * f64::from(item.quantity);

            match requested.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, quantity)) => *quantity += i64::from(item.quantity),
                None => requested.push((item.product_id, i64::from(item.quantity))),
            }
        }

        for &(product_id, quantity) in &requested {
            let product = self
                .product(product_id)
                .ok_or(BusinessError::ProductNotFound(product_id))?;
            let available = product.activation_keys();
            if !product.has_keys() || quantity > i64::from(available) {
                return Err(BusinessError::InsufficientStock {
                    product_id,
                    title: product.title.clone(),
                    requested: quantity,
                    available: i32::try_from(available).unwrap_or(i32::MAX),
                });
            }
        }

        let existing: Vec<i32> = self.sales.iter().map(|s| s.sale_id).collect();
        let sale_id = self.ids.next(sequence::SALES, existing.into_iter())?;
        let sale = Sale::new(
            sale_id,
            customer_id,
            self.clock.now_string(),
            items.to_vec(),
            total,
            extra_discount,
        );

        let stock_before = self.products.clone();
        for (product_id, quantity) in requested {
            if let Some(product) = self.products.iter_mut().find(|p| p.id == product_id) {
                // Checked above; the quantity fits in u32
                product.reserve_keys(u32::try_from(quantity).unwrap_or(u32::MAX));
            }
        }
        self.sales.push(sale.clone());

        if let Err(e) = self.save_products() {
            self.products = stock_before;
            self.sales.pop();
            return Err(e);
        }
        if let Err(e) = self.save_sales() {
            self.products = stock_before;
            self.sales.pop();
            if self.save_products().is_err() {
                self.log.critical(&format!("Stock for sale {} could not be restored on disk", sale_id));
            }
            return Err(e);
        }

        self.log.info(&format!(
            "Sale completed: ID {}, customer {}, total {:.2}",
            sale.sale_id,
            customer_id,
            sale.final_amount()
        ));
        Ok(sale)
    }
}

impl Pricing for Store {
    fn best_discount_percent(&self, product: &Product) -> f64 {
        let now = self.clock.now_string();
        self.discounts
            .iter()
            .filter(|d| d.is_valid_at(&now) && d.applies_to(product))
            .map(|d| d.percentage)
            .fold(0.0, f64::max)
    }
}

fn unique_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}
