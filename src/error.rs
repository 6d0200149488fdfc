//! Error types shared across the store core.

use thiserror::Error;

/// Business rule violations. These interrupt a multi-step operation before
/// any state is touched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BusinessError {
    #[error("Product not found: ID {0}")]
    ProductNotFound(i32),

    #[error("Not enough keys for product: {title} (requested {requested}, available {available})")]
    InsufficientStock { product_id: i32, title: String, requested: i64, available: i32 },

    #[error("Invalid quantity {quantity} for product ID {product_id}")]
    InvalidQuantity { product_id: i32, quantity: i32 },

    #[error("Key count must not be negative: {0}")]
    NegativeKeyCount(i32),

    #[error("Cannot remove or demote the last administrator")]
    LastAdmin,

    #[error("Administrator already exists")]
    AdminExists,

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Discount percentage must be between 1 and 100, got {0}")]
    InvalidPercentage(f64),

    #[error("Discount end date must be after start date: {start} - {end}")]
    InvalidDiscountWindow { start: String, end: String },

    #[error("No discount at position {0}")]
    DiscountIndex(usize),

    #[error("Block duration out of range: {0} days")]
    InvalidBlockDuration(i64),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Failed to save data to {0}")]
    PersistFailed(String),
}

/// Login and permission failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("User not found: {0}")]
    UnknownUser(String),

    #[error("Wrong password")]
    WrongPassword,

    #[error("Account blocked until: {0}")]
    Blocked(String),

    #[error("Stored credential has an invalid format")]
    MalformedCredential,

    #[error("Account awaits administrator approval")]
    NotApproved,

    #[error("This action requires the {0} role")]
    Forbidden(&'static str),

    /// The account check passed but the change could not be saved.
    #[error("{0}")]
    Storage(String),
}

impl From<BusinessError> for AuthError {
    fn from(err: BusinessError) -> Self {
        AuthError::Storage(err.to_string())
    }
}
