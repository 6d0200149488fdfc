//! Minimum rating filter.

use super::Filter;
use crate::models::Product;
use crate::store::Pricing;

/// Filters products by minimum average rating.
pub struct RatingFilter {
    min_stars: f64,
}

impl RatingFilter {
    /// Creates a new rating filter with minimum stars.
    pub fn new(min_stars: f64) -> Self {
        Self { min_stars: min_stars.clamp(0.0, 5.0) }
    }
}

impl Filter for RatingFilter {
    fn matches(&self, product: &Product, _pricing: &dyn Pricing) -> bool {
        product.average_rating >= self.min_stars
    }

    fn description(&self) -> String {
        format!("Rating: >= {:.1} stars", self.min_stars)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{make_product, ListPrice};
    use super::*;

    #[test]
    fn test_rating_filter() {
        let filter = RatingFilter::new(4.0);
        let mut product = make_product("A", 1.0, "RPG", 1);

        product.average_rating = 4.5;
        assert!(filter.matches(&product, &ListPrice));

        product.average_rating = 4.0;
        assert!(filter.matches(&product, &ListPrice));

        product.average_rating = 3.9;
        assert!(!filter.matches(&product, &ListPrice));
    }

    #[test]
    fn test_rating_clamped() {
        assert_eq!(RatingFilter::new(9.0).description(), "Rating: >= 5.0 stars");
        assert_eq!(RatingFilter::new(-1.0).description(), "Rating: >= 0.0 stars");
    }
}
