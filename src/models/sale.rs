//! Completed sales.

use crate::codec::{wire, CodecError, Record};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Status given to every sale recorded by the store.
pub const STATUS_COMPLETED: &str = "completed";

/// One line of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: i32,
    pub quantity: i32,
}

impl SaleItem {
    pub fn new(product_id: i32, quantity: i32) -> Self {
        Self { product_id, quantity }
    }
}

impl From<(i32, i32)> for SaleItem {
    fn from((product_id, quantity): (i32, i32)) -> Self {
        Self { product_id, quantity }
    }
}

/// A recorded purchase.
///
/// `total_amount` holds the discounted prices in effect at the time of sale
/// and is never recomputed. `discount_amount` is only the extra discount
/// passed in by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub sale_id: i32,
    pub customer_id: i32,
    pub sale_date_time: String,
    pub items: Vec<SaleItem>,
    pub total_amount: f64,
    pub discount_amount: f64,
    pub status: String,
}

impl Sale {
    /// Creates a completed sale. The item list is kept as passed.
    pub fn new(
        sale_id: i32,
        customer_id: i32,
        sale_date_time: impl Into<String>,
        items: Vec<SaleItem>,
        total_amount: f64,
        discount_amount: f64,
    ) -> Self {
        Self {
            sale_id,
            customer_id,
            sale_date_time: sale_date_time.into(),
            items,
            total_amount,
            discount_amount,
            status: STATUS_COMPLETED.to_string(),
        }
    }

    pub fn final_amount(&self) -> f64 {
        self.total_amount - self.discount_amount
    }

    /// Adds a line, merging with an existing line for the same product.
    pub fn add_item(&mut self, product_id: i32, quantity: i32) {
        match self.items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => item.quantity += quantity,
            None => self.items.push(SaleItem::new(product_id, quantity)),
        }
    }

    /// Removes every line for `product_id`. Returns false if none existed.
    pub fn remove_item(&mut self, product_id: i32) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        self.items.len() != before
    }

    /// Total quantity bought of `product_id` across all lines.
    pub fn item_quantity(&self, product_id: i32) -> i32 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .sum()
    }

    pub fn contains_product(&self, product_id: i32) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }

    pub fn total_items(&self) -> i32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

impl Record for Sale {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        wire::write_i32(w, self.sale_id)?;
        wire::write_i32(w, self.customer_id)?;
        wire::write_str(w, &self.sale_date_time)?;
        wire::write_len(w, self.items.len())?;
        for item in &self.items {
            wire::write_i32(w, item.product_id)?;
            wire::write_i32(w, item.quantity)?;
        }
        wire::write_f64(w, self.total_amount)?;
        wire::write_f64(w, self.discount_amount)?;
        wire::write_str(w, &self.status)
    }

    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let sale_id = wire::read_i32(r)?;
        let customer_id = wire::read_i32(r)?;
        let sale_date_time = wire::read_str(r)?;

        let count = wire::read_len(r)?;
        let mut items = Vec::with_capacity(count.min(64) as usize);
        for _ in 0..count {
            let product_id = wire::read_i32(r)?;
            let quantity = wire::read_i32(r)?;
            items.push(SaleItem { product_id, quantity });
        }

        Ok(Self {
            sale_id,
            customer_id,
            sale_date_time,
            items,
            total_amount: wire::read_f64(r)?,
            discount_amount: wire::read_f64(r)?,
            status: wire::read_str(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_sale() -> Sale {
        Sale::new(
            3,
            7,
            "10.06.2024 12:00:00",
            vec![SaleItem::new(1, 2), SaleItem::new(4, 1)],
            120.0,
            20.0,
        )
    }

    #[test]
    fn test_new_sale_is_completed() {
        let sale = make_sale();
        assert_eq!(sale.status, "completed");
        assert_eq!(sale.final_amount(), 100.0);
    }

    #[test]
    fn test_construction_keeps_duplicate_lines() {
        let sale = Sale::new(1, 1, "", vec![(1, 1).into(), (1, 2).into()], 0.0, 0.0);
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.item_quantity(1), 3);
    }

    #[test]
    fn test_add_item_merges() {
        let mut sale = make_sale();
        sale.add_item(1, 3);
        sale.add_item(9, 1);

        assert_eq!(sale.items.len(), 3);
        assert_eq!(sale.item_quantity(1), 5);
        assert_eq!(sale.total_items(), 7);
    }

    #[test]
    fn test_remove_item() {
        let mut sale = make_sale();
        assert!(sale.remove_item(4));
        assert!(!sale.remove_item(4));
        assert!(!sale.contains_product(4));
        assert!(sale.contains_product(1));
    }

    #[test]
    fn test_record_layout() {
        let sale = Sale::new(1, 2, "", vec![SaleItem::new(5, 6)], 0.0, 0.0);
        let mut buf = Vec::new();
        sale.encode(&mut buf).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&1i32.to_ne_bytes());
        expected.extend_from_slice(&2i32.to_ne_bytes());
        expected.extend_from_slice(&0u64.to_ne_bytes());
        expected.extend_from_slice(&1u64.to_ne_bytes());
        expected.extend_from_slice(&5i32.to_ne_bytes());
        expected.extend_from_slice(&6i32.to_ne_bytes());
        expected.extend_from_slice(&0f64.to_ne_bytes());
        expected.extend_from_slice(&0f64.to_ne_bytes());
        expected.extend_from_slice(&9u64.to_ne_bytes());
        expected.extend_from_slice(b"completed");
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_record_round_trip() {
        let sale = make_sale();
        let mut buf = Vec::new();
        sale.encode(&mut buf).unwrap();
        assert_eq!(Sale::decode(&mut Cursor::new(buf)).unwrap(), sale);
    }

    #[test]
    fn test_round_trip_no_items() {
        let mut sale = Sale::new(0, 0, "", Vec::new(), 0.0, 0.0);
        sale.status = String::new();
        let mut buf = Vec::new();
        sale.encode(&mut buf).unwrap();
        assert_eq!(Sale::decode(&mut Cursor::new(buf)).unwrap(), sale);
    }
}
