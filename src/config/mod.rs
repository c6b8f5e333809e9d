/// Database configuration and connection management
pub mod database;

/// Storefront configuration and seed catalog loading from storefront.toml
pub mod storefront;
