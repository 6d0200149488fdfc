//! Price range filter.

use super::Filter;
use crate::models::Product;
use crate::store::Pricing;

/// Filters products by the price a customer would pay now.
pub struct PriceFilter {
    min: Option<f64>,
    max: Option<f64>,
}

impl PriceFilter {
    /// Creates a new price filter with optional min/max bounds.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Creates a filter with both min and max.
    pub fn range(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }
}

impl Filter for PriceFilter {
    fn matches(&self, product: &Product, pricing: &dyn Pricing) -> bool {
        let price = pricing.discounted_price(product);

        if let Some(min) = self.min {
            if price < min {
                return false;
            }
        }

        if let Some(max) = self.max {
            if price > max {
                return false;
            }
        }

        true
    }

    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Price: {:.2} - {:.2}", min, max),
            (Some(min), None) => format!("Price: >= {:.2}", min),
            (None, Some(max)) => format!("Price: <= {:.2}", max),
            (None, None) => "Price: any".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{make_product, HalfPriceGenre, ListPrice};
    use super::*;

    #[test]
    fn test_price_range() {
        let filter = PriceFilter::range(10.0, 50.0);
        assert!(filter.matches(&make_product("A", 10.0, "RPG", 1), &ListPrice));
        assert!(filter.matches(&make_product("A", 50.0, "RPG", 1), &ListPrice));
        assert!(!filter.matches(&make_product("A", 9.99, "RPG", 1), &ListPrice));
        assert!(!filter.matches(&make_product("A", 50.01, "RPG", 1), &ListPrice));
    }

    #[test]
    fn test_price_uses_discounted_price() {
        let filter = PriceFilter::new(None, Some(30.0));
        let product = make_product("A", 40.0, "RPG", 1);
        assert!(!filter.matches(&product, &ListPrice));
        assert!(filter.matches(&product, &HalfPriceGenre("RPG")));
    }

    #[test]
    fn test_price_description() {
        assert_eq!(PriceFilter::range(10.0, 50.0).description(), "Price: 10.00 - 50.00");
        assert_eq!(PriceFilter::new(Some(5.0), None).description(), "Price: >= 5.00");
        assert_eq!(PriceFilter::new(None, Some(5.0)).description(), "Price: <= 5.00");
        assert_eq!(PriceFilter::new(None, None).description(), "Price: any");
    }
}
