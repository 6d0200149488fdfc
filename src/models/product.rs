//! Catalog products.

use crate::codec::{wire, CodecError, Record};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Concrete product variant, written as a tag before the product fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductKind {
    #[default]
    Game,
}

impl ProductKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ProductKind::Game => "Game",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Game" => Some(ProductKind::Game),
            _ => None,
        }
    }
}

/// Editable product fields, used to create and update catalog entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub base_price: f64,
    pub developer: String,
    pub publisher: String,
    pub genre: String,
    pub age_rating: i32,
    pub description: String,
    /// Only used on creation; releases are never re-dated.
    pub release_date: String,
    pub tags: Vec<String>,
    pub activation_keys: u32,
}

/// A sellable catalog entry. Stock is counted in activation keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned id; 0 until added to the catalog
    pub id: i32,
    pub kind: ProductKind,
    pub title: String,
    pub base_price: f64,
    pub developer: String,
    pub publisher: String,
    pub genre: String,
    /// Minimum player age (0-21)
    pub age_rating: i32,
    pub description: String,
    /// `DD.MM.YYYY HH:MM:SS`
    pub release_date: String,
    /// Star rating (0.0 - 5.0)
    pub average_rating: f64,
    /// Ordered, duplicates allowed
    pub tags: Vec<String>,
    activation_keys: u32,
}

impl Product {
    /// Builds a catalog entry from a draft. Average rating starts at zero.
    pub fn from_draft(id: i32, draft: &ProductDraft) -> Self {
        Self {
            id,
            kind: ProductKind::Game,
            title: draft.title.clone(),
            base_price: draft.base_price,
            developer: draft.developer.clone(),
            publisher: draft.publisher.clone(),
            genre: draft.genre.clone(),
            age_rating: draft.age_rating,
            description: draft.description.clone(),
            release_date: draft.release_date.clone(),
            average_rating: 0.0,
            tags: draft.tags.clone(),
            activation_keys: draft.activation_keys,
        }
    }

    /// Overwrites every editable field except the release date.
    pub fn apply_draft(&mut self, draft: &ProductDraft) {
        self.title = draft.title.clone();
        self.base_price = draft.base_price;
        self.developer = draft.developer.clone();
        self.publisher = draft.publisher.clone();
        self.genre = draft.genre.clone();
        self.age_rating = draft.age_rating;
        self.description = draft.description.clone();
        self.tags = draft.tags.clone();
        self.activation_keys = draft.activation_keys;
    }

    /// Returns the editable fields as a draft.
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            title: self.title.clone(),
            base_price: self.base_price,
            developer: self.developer.clone(),
            publisher: self.publisher.clone(),
            genre: self.genre.clone(),
            age_rating: self.age_rating,
            description: self.description.clone(),
            release_date: self.release_date.clone(),
            tags: self.tags.clone(),
            activation_keys: self.activation_keys,
        }
    }

    pub fn activation_keys(&self) -> u32 {
        self.activation_keys
    }

    pub fn set_activation_keys(&mut self, keys: u32) {
        self.activation_keys = keys;
    }

    pub fn has_keys(&self) -> bool {
        self.activation_keys > 0
    }

    /// Takes `count` keys out of stock. Leaves stock untouched if short.
    pub fn reserve_keys(&mut self, count: u32) -> bool {
        if self.activation_keys >= count {
            self.activation_keys -= count;
            true
        } else {
            false
        }
    }

    pub fn add_keys(&mut self, count: u32) {
        self.activation_keys = self.activation_keys.saturating_add(count);
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    /// Removes every occurrence of `tag`.
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    fn encode_fields<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        wire::write_i32(w, self.id)?;
        wire::write_str(w, &self.title)?;
        wire::write_f64(w, self.base_price)?;
        wire::write_str(w, &self.developer)?;
        wire::write_str(w, &self.publisher)?;
        wire::write_str(w, &self.genre)?;
        wire::write_i32(w, self.age_rating)?;
        wire::write_str(w, &self.description)?;
        wire::write_str(w, &self.release_date)?;
        wire::write_f64(w, self.average_rating)?;
        wire::write_i32(w, i32::try_from(self.activation_keys).unwrap_or(i32::MAX))?;
        wire::write_str_list(w, &self.tags)
    }

    fn decode_fields<R: Read>(kind: ProductKind, r: &mut R) -> Result<Self, CodecError> {
        let mut product = Self {
            id: wire::read_i32(r)?,
            kind,
            title: wire::read_str(r)?,
            base_price: wire::read_f64(r)?,
            developer: wire::read_str(r)?,
            publisher: wire::read_str(r)?,
            genre: wire::read_str(r)?,
            age_rating: wire::read_i32(r)?,
            description: wire::read_str(r)?,
            release_date: wire::read_str(r)?,
            average_rating: wire::read_f64(r)?,
            activation_keys: 0,
            tags: Vec::new(),
        };
        let keys = wire::read_i32(r)?;
        product.activation_keys = u32::try_from(keys)
            .map_err(|_| CodecError::NegativeCount { field: "activation key count", value: keys })?;
        product.tags = wire::read_str_list(r)?;
        Ok(product)
    }
}

/// Tagged record: `[kind tag][fields]`.
impl Record for Product {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        wire::write_str(w, self.kind.tag())?;
        self.encode_fields(w)
    }

    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let tag = wire::read_str(r)?;
        let kind = ProductKind::from_tag(&tag)
            .ok_or(CodecError::UnknownTag { kind: "product", tag })?;
        Self::decode_fields(kind, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_draft() -> ProductDraft {
        ProductDraft {
            title: "The Witcher 3".to_string(),
            base_price: 29.99,
            developer: "CD Projekt Red".to_string(),
            publisher: "CD Projekt".to_string(),
            genre: "RPG".to_string(),
            age_rating: 18,
            description: "Monster hunting".to_string(),
            release_date: "19.05.2015 00:00:00".to_string(),
            tags: vec!["Open World".to_string(), "Fantasy".to_string()],
            activation_keys: 10,
        }
    }

    #[test]
    fn test_from_draft() {
        let product = Product::from_draft(3, &make_draft());
        assert_eq!(product.id, 3);
        assert_eq!(product.kind, ProductKind::Game);
        assert_eq!(product.title, "The Witcher 3");
        assert_eq!(product.average_rating, 0.0);
        assert_eq!(product.activation_keys(), 10);
        assert_eq!(product.to_draft(), make_draft());
    }

    #[test]
    fn test_apply_draft_keeps_release_date_and_rating() {
        let mut product = Product::from_draft(1, &make_draft());
        product.average_rating = 4.5;

        let mut draft = make_draft();
        draft.title = "Witcher 3 GOTY".to_string();
        draft.release_date = "01.01.2030 00:00:00".to_string();
        draft.activation_keys = 2;
        product.apply_draft(&draft);

        assert_eq!(product.title, "Witcher 3 GOTY");
        assert_eq!(product.release_date, "19.05.2015 00:00:00");
        assert_eq!(product.average_rating, 4.5);
        assert_eq!(product.activation_keys(), 2);
    }

    #[test]
    fn test_keys() {
        let mut product = Product::from_draft(1, &make_draft());
        assert!(product.has_keys());

        assert!(product.reserve_keys(4));
        assert_eq!(product.activation_keys(), 6);

        assert!(!product.reserve_keys(7));
        assert_eq!(product.activation_keys(), 6);

        assert!(product.reserve_keys(6));
        assert!(!product.has_keys());

        product.add_keys(3);
        assert_eq!(product.activation_keys(), 3);
    }

    #[test]
    fn test_tags() {
        let mut product = Product::from_draft(1, &make_draft());
        assert!(product.has_tag("Fantasy"));
        assert!(!product.has_tag("fantasy"));

        product.add_tag("Fantasy");
        assert_eq!(product.tags.len(), 3);

        product.remove_tag("Fantasy");
        assert_eq!(product.tags, vec!["Open World"]);
    }

    #[test]
    fn test_record_starts_with_tag() {
        let product = Product::from_draft(1, &make_draft());
        let mut buf = Vec::new();
        product.encode(&mut buf).unwrap();

        assert_eq!(&buf[..8], &4u64.to_ne_bytes());
        assert_eq!(&buf[8..12], b"Game");
        assert_eq!(&buf[12..16], &1i32.to_ne_bytes());
    }

    #[test]
    fn test_record_round_trip() {
        let mut product = Product::from_draft(42, &make_draft());
        product.average_rating = 4.8;

        let mut buf = Vec::new();
        product.encode(&mut buf).unwrap();
        let decoded = Product::decode(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, product);
    }

    #[test]
    fn test_record_empty_fields() {
        let product = Product::from_draft(0, &ProductDraft::default());
        let mut buf = Vec::new();
        product.encode(&mut buf).unwrap();
        let decoded = Product::decode(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, product);
        assert!(decoded.tags.is_empty());
    }

    #[test]
    fn test_negative_key_count_is_rejected() {
        let product = Product::from_draft(1, &ProductDraft::default());
        let mut buf = Vec::new();
        product.encode(&mut buf).unwrap();

        // Key count sits right before the empty tag list
        let keys_at = buf.len() - 12;
        buf[keys_at..keys_at + 4].copy_from_slice(&(-3i32).to_ne_bytes());

        let err = Product::decode(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, CodecError::NegativeCount { value: -3, .. }));
    }

    #[test]
    fn test_unknown_tag() {
        let mut buf = Vec::new();
        wire::write_str(&mut buf, "Movie").unwrap();
        let err = Product::decode(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, CodecError::UnknownTag { kind: "product", .. }));
    }

    #[test]
    fn test_product_serde() {
        let product = Product::from_draft(5, &make_draft());
        let json = serde_json::to_string(&product).unwrap();
        assert!(json.contains("The Witcher 3"));
        assert!(json.contains("\"activation_keys\":10"));

        let parsed: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, product);
    }
}
