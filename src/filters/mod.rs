//! Catalog filtering with composable filters.

pub mod attribute;
pub mod keyword;
pub mod price;
pub mod rating;

use crate::models::Product;
use crate::store::Pricing;

pub use attribute::{FilterKind, ProductFilter};
pub use keyword::KeywordFilter;
pub use price::PriceFilter;
pub use rating::RatingFilter;

/// Trait for filtering catalog products.
pub trait Filter: Send + Sync {
    /// Returns true if the product passes the filter. `pricing` resolves the
    /// discounted price for filters that depend on it.
    fn matches(&self, product: &Product, pricing: &dyn Pricing) -> bool;

    /// Returns a description of this filter.
    fn description(&self) -> String;
}

/// A chain of filters that must all pass.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty filter chain.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Adds a filter to the chain.
    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Checks if a product passes all filters.
    pub fn matches(&self, product: &Product, pricing: &dyn Pricing) -> bool {
        self.filters.iter().all(|f| f.matches(product, pricing))
    }

    /// Keeps the matching products, in catalog order.
    pub fn apply<'a>(&self, products: &'a [Product], pricing: &dyn Pricing) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p, pricing)).collect()
    }

    /// Returns true if no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns descriptions of all filters.
    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a FilterChain from command-line options.
pub struct FilterChainBuilder {
    chain: FilterChain,
}

impl FilterChainBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self { chain: FilterChain::new() }
    }

    /// Adds an attribute filter when a value is given.
    pub fn attribute(mut self, kind: FilterKind, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.chain.add(ProductFilter::new(kind, value));
        }
        self
    }

    /// Adds a flag-style filter (`has_discount`, `in_stock`, `out_of_stock`).
    pub fn flag(mut self, kind: FilterKind, enabled: bool) -> Self {
        if enabled {
            self.chain.add(ProductFilter::new(kind, ""));
        }
        self
    }

    /// Adds a price range filter on the discounted price.
    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if min.is_some() || max.is_some() {
            self.chain.add(PriceFilter::new(min, max));
        }
        self
    }

    /// Adds a minimum rating filter.
    pub fn min_rating(mut self, min: Option<f64>) -> Self {
        if let Some(min) = min {
            self.chain.add(RatingFilter::new(min));
        }
        self
    }

    /// Adds required title keywords.
    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        if !keywords.is_empty() {
            self.chain.add(KeywordFilter::required(keywords));
        }
        self
    }

    /// Builds the filter chain.
    pub fn build(self) -> FilterChain {
        self.chain
    }
}

impl Default for FilterChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
