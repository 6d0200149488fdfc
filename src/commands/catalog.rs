//! Catalog browsing. Open to everyone.

use crate::filters::{FilterChainBuilder, FilterKind};
use crate::format::Formatter;
use crate::models::Product;
use crate::shop::Shop;
use anyhow::{anyhow, Result};
use tracing::{debug, info};

/// Criteria for `catalog filter`. Every given criterion must match.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub genre: Option<String>,
    pub developer: Option<String>,
    pub tag: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub keywords: Vec<String>,
    pub in_stock: bool,
    pub discounted: bool,
}

pub struct CatalogCommand<'a> {
    shop: &'a Shop,
    formatter: Formatter,
}

impl<'a> CatalogCommand<'a> {
    pub fn new(shop: &'a Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    fn render(&self, products: &[&Product]) -> String {
        self.formatter.format_products(products, self.shop.store())
    }

    pub fn list(&self) -> Result<String> {
        let products: Vec<&Product> = self.shop.store().products().iter().collect();
        Ok(self.render(&products))
    }

    pub fn search(&self, query: &str) -> Result<String> {
        info!("Searching catalog for: {}", query);
        let products: Vec<&Product> = self.shop.store().search_products(query).collect();
        Ok(self.render(&products))
    }

    /// Single criterion, e.g. `genre RPG` or `in-stock`.
    pub fn filter_by(&self, kind: &str, value: Option<&str>) -> Result<String> {
        let kind: FilterKind = kind.parse().map_err(|e: String| anyhow!(e))?;
        let value = value.unwrap_or_default();
        if !kind.is_flag() && value.is_empty() {
            anyhow::bail!("Filter '{}' needs a value", kind);
        }
        let products = self.shop.store().filter_products(kind, value);
        Ok(self.render(&products))
    }

    pub fn filter(&self, query: &CatalogQuery) -> Result<String> {
        let filters = FilterChainBuilder::new()
            .attribute(FilterKind::Genre, query.genre.clone())
            .attribute(FilterKind::Developer, query.developer.clone())
            .attribute(FilterKind::Tag, query.tag.clone())
            .price_range(query.min_price, query.max_price)
            .min_rating(query.min_rating)
            .keywords(query.keywords.clone())
            .flag(FilterKind::InStock, query.in_stock)
            .flag(FilterKind::HasDiscount, query.discounted)
            .build();

        if !filters.is_empty() {
            debug!("Active filters: {}", filters.descriptions().join(", "));
        }

        let products = self.shop.store().filter_with(&filters);
        Ok(self.render(&products))
    }

    pub fn show(&self, id: i32) -> Result<String> {
        let product = self
            .shop
            .store()
            .product(id)
            .ok_or_else(|| anyhow!("Product not found: ID {}", id))?;
        Ok(self.formatter.format_product(product, self.shop.store()))
    }

    pub fn genres(&self) -> Result<String> {
        Ok(self.formatter.format_names("Genres", &self.shop.store().unique_genres()))
    }

    pub fn developers(&self) -> Result<String> {
        Ok(self
            .formatter
            .format_names("Developers", &self.shop.store().unique_developers()))
    }

    pub fn discounted(&self) -> Result<String> {
        let products = self.shop.recommender().discounted_products();
        Ok(self.render(&products))
    }
}
