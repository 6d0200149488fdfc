//! gamehub - digital game key store
//!
//! Catalog, discounts, sales, wishlists, accounts and reports over compact
//! binary data files, driven from a command-line front end.

pub mod activity_log;
pub mod clock;
pub mod codec;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod filters;
pub mod format;
pub mod models;
pub mod notifications;
pub mod recommend;
pub mod reports;
pub mod sequence;
pub mod shop;
pub mod store;
pub mod users;
pub mod vocabulary;
pub mod wishlist;

pub use activity_log::{ActivityLog, LogLevel};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, OutputFormat};
pub use error::{AuthError, BusinessError};
pub use models::{Discount, DiscountType, Product, ProductDraft, Sale, SaleItem, User};
pub use shop::Shop;
pub use store::{Pricing, Store};
