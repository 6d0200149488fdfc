//! Time-boxed percentage discounts.

use crate::clock::DateWindow;
use crate::codec::{wire, CodecError, Record};
use crate::models::Product;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// What a discount's targets refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Targets are stringified product ids
    Product,
    Genre,
    Tag,
    Developer,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Product => "product",
            DiscountType::Genre => "genre",
            DiscountType::Tag => "tag",
            DiscountType::Developer => "developer",
        }
    }
}

impl FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "product" => Ok(DiscountType::Product),
            "genre" => Ok(DiscountType::Genre),
            "tag" => Ok(DiscountType::Tag),
            "developer" => Ok(DiscountType::Developer),
            _ => Err(format!(
                "Unknown discount type: {}. Use: product, genre, tag, developer",
                s
            )),
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    #[serde(rename = "type")]
    pub kind: DiscountType,
    pub targets: Vec<String>,
    /// 1-100
    pub percentage: f64,
    pub start_date: String,
    pub end_date: String,
}

impl Discount {
    pub fn new(
        kind: DiscountType,
        targets: Vec<String>,
        percentage: f64,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            targets,
            percentage,
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date.clone(), self.end_date.clone())
    }

    /// True if `now` falls within `[start_date, end_date]`.
    pub fn is_valid_at(&self, now: &str) -> bool {
        self.window().contains(now)
    }

    pub fn has_target(&self, target: &str) -> bool {
        self.targets.iter().any(|t| t == target)
    }

    /// True if this discount's targets cover `product`, ignoring the date window.
    pub fn applies_to(&self, product: &Product) -> bool {
        match self.kind {
            DiscountType::Product => self.has_target(&product.id.to_string()),
            DiscountType::Genre => self.has_target(&product.genre),
            DiscountType::Developer => self.has_target(&product.developer),
            DiscountType::Tag => product.tags.iter().any(|tag| self.has_target(tag)),
        }
    }
}

impl Record for Discount {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        wire::write_str(w, self.kind.as_str())?;
        wire::write_str_list(w, &self.targets)?;
        wire::write_f64(w, self.percentage)?;
        wire::write_str(w, &self.start_date)?;
        wire::write_str(w, &self.end_date)
    }

    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let tag = wire::read_str(r)?;
        let kind = DiscountType::from_str(&tag)
            .map_err(|_| CodecError::UnknownTag { kind: "discount type", tag })?;

        Ok(Self {
            kind,
            targets: wire::read_str_list(r)?,
            percentage: wire::read_f64(r)?,
            start_date: wire::read_str(r)?,
            end_date: wire::read_str(r)?,
        })
    }
}
