//! Wishlist entries.

use crate::codec::{wire, CodecError, Record};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// A customer's interest in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub customer_id: i32,
    pub product_id: i32,
    pub added_date: String,
}

impl WishlistItem {
    pub fn new(customer_id: i32, product_id: i32, added_date: impl Into<String>) -> Self {
        Self { customer_id, product_id, added_date: added_date.into() }
    }

    pub fn matches(&self, customer_id: i32, product_id: i32) -> bool {
        self.customer_id == customer_id && self.product_id == product_id
    }
}

impl Record for WishlistItem {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        wire::write_i32(w, self.customer_id)?;
        wire::write_i32(w, self.product_id)?;
        wire::write_str(w, &self.added_date)
    }

    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            customer_id: wire::read_i32(r)?,
            product_id: wire::read_i32(r)?,
            added_date: wire::read_str(r)?,
        })
    }
}
