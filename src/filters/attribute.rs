//! Attribute and stock filters used by catalog browsing.

use super::Filter;
use crate::models::Product;
use crate::store::Pricing;
use std::fmt;
use std::str::FromStr;

/// The property a [`ProductFilter`] checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Exact genre match
    Genre,
    /// Exact developer match
    Developer,
    /// Tag membership
    Tag,
    /// Discounted price below base price
    HasDiscount,
    InStock,
    OutOfStock,
}

impl FilterKind {
    /// True for kinds that ignore the filter value.
    pub fn is_flag(&self) -> bool {
        matches!(self, FilterKind::HasDiscount | FilterKind::InStock | FilterKind::OutOfStock)
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "genre" => Ok(FilterKind::Genre),
            "developer" => Ok(FilterKind::Developer),
            "tag" => Ok(FilterKind::Tag),
            "has_discount" | "discounted" => Ok(FilterKind::HasDiscount),
            "in_stock" => Ok(FilterKind::InStock),
            "out_of_stock" => Ok(FilterKind::OutOfStock),
            _ => Err(format!(
                "Unknown filter: {}. Use: genre, developer, tag, has_discount, in_stock, out_of_stock",
                s
            )),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Genre => write!(f, "genre"),
            FilterKind::Developer => write!(f, "developer"),
            FilterKind::Tag => write!(f, "tag"),
            FilterKind::HasDiscount => write!(f, "has_discount"),
            FilterKind::InStock => write!(f, "in_stock"),
            FilterKind::OutOfStock => write!(f, "out_of_stock"),
        }
    }
}

/// A single `(kind, value)` catalog filter.
pub struct ProductFilter {
    kind: FilterKind,
    value: String,
}

impl ProductFilter {
    pub fn new(kind: FilterKind, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }
}

impl Filter for ProductFilter {
    fn matches(&self, product: &Product, pricing: &dyn Pricing) -> bool {
        match self.kind {
            FilterKind::Genre => product.genre == self.value,
            FilterKind::Developer => product.developer == self.value,
            FilterKind::Tag => product.has_tag(&self.value),
            FilterKind::HasDiscount => pricing.discounted_price(product) < product.base_price,
            FilterKind::InStock => product.has_keys(),
            FilterKind::OutOfStock => !product.has_keys(),
        }
    }

    fn description(&self) -> String {
        match self.kind {
            FilterKind::Genre => format!("Genre: {}", self.value),
            FilterKind::Developer => format!("Developer: {}", self.value),
            FilterKind::Tag => format!("Tag: {}", self.value),
            FilterKind::HasDiscount => "Discounted only".to_string(),
            FilterKind::InStock => "In stock".to_string(),
            FilterKind::OutOfStock => "Out of stock".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{make_product, HalfPriceGenre, ListPrice};
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("genre".parse::<FilterKind>().unwrap(), FilterKind::Genre);
        assert_eq!("HAS_DISCOUNT".parse::<FilterKind>().unwrap(), FilterKind::HasDiscount);
        assert_eq!("in-stock".parse::<FilterKind>().unwrap(), FilterKind::InStock);
        assert_eq!("out_of_stock".parse::<FilterKind>().unwrap(), FilterKind::OutOfStock);
        assert!("price".parse::<FilterKind>().is_err());
    }

    #[test]
    fn test_kind_display_round_trip() {
        for kind in [
            FilterKind::Genre,
            FilterKind::Developer,
            FilterKind::Tag,
            FilterKind::HasDiscount,
            FilterKind::InStock,
            FilterKind::OutOfStock,
        ] {
            assert_eq!(kind.to_string().parse::<FilterKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_genre_is_exact() {
        let filter = ProductFilter::new(FilterKind::Genre, "RPG");
        assert!(filter.matches(&make_product("A", 1.0, "RPG", 1), &ListPrice));
        assert!(!filter.matches(&make_product("A", 1.0, "rpg", 1), &ListPrice));
        assert!(!filter.matches(&make_product("A", 1.0, "Action RPG", 1), &ListPrice));
    }

    #[test]
    fn test_developer_and_tag() {
        let product = make_product("A", 1.0, "RPG", 1);
        assert!(ProductFilter::new(FilterKind::Developer, "Studio").matches(&product, &ListPrice));
        assert!(ProductFilter::new(FilterKind::Tag, "Indie").matches(&product, &ListPrice));
        assert!(!ProductFilter::new(FilterKind::Tag, "Horror").matches(&product, &ListPrice));
    }

    #[test]
    fn test_stock_flags() {
        let stocked = make_product("A", 1.0, "RPG", 2);
        let empty = make_product("B", 1.0, "RPG", 0);

        let in_stock = ProductFilter::new(FilterKind::InStock, "");
        let out_of_stock = ProductFilter::new(FilterKind::OutOfStock, "");

        assert!(in_stock.matches(&stocked, &ListPrice));
        assert!(!in_stock.matches(&empty, &ListPrice));
        assert!(out_of_stock.matches(&empty, &ListPrice));
        assert!(!out_of_stock.matches(&stocked, &ListPrice));
    }

    #[test]
    fn test_has_discount() {
        let filter = ProductFilter::new(FilterKind::HasDiscount, "");
        assert!(filter.matches(&make_product("A", 10.0, "RPG", 1), &HalfPriceGenre("RPG")));
        assert!(!filter.matches(&make_product("A", 10.0, "Racing", 1), &HalfPriceGenre("RPG")));
        // Free games can never be discounted
        assert!(!filter.matches(&make_product("A", 0.0, "RPG", 1), &HalfPriceGenre("RPG")));
    }

    #[test]
    fn test_is_flag() {
        assert!(FilterKind::InStock.is_flag());
        assert!(!FilterKind::Tag.is_flag());
    }
}
