//! Unified error types for the storefront state container.
//!
//! Soft rejections from the cart and wishlist (duplicate deal purchase, deal
//! quantity increase, ...) are not errors; they are reported as
//! [`crate::core::cart::CartOutcome`] values. Everything here is a hard
//! failure that callers are expected to surface or propagate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// No signed-in session; callers redirect to login.
    #[error("You must be signed in to do that")]
    NotAuthenticated,

    #[error("Cannot place an order with an empty cart")]
    EmptyCart,

    #[error("Product not found: {id}")]
    ProductNotFound { id: String },

    #[error("No {collection} entry with id {id}")]
    EntryNotFound { collection: String, id: String },

    /// A required text field was empty or whitespace.
    #[error("The {field} cannot be empty")]
    BlankField { field: &'static str },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Rating must be between 1 and 5, got {rating}")]
    InvalidRating { rating: u8 },

    #[error("Remote cart sync failed: {message}")]
    Sync { message: String },

    #[error("Help request failed: {message}")]
    Help { message: String },
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
