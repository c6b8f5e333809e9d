//! Database configuration module for the storefront.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! The same database holds the local key-value state (`local_state`) and the
//! tables standing in for the remote document store (`cart_documents`,
//! `order_documents`, `product_documents`). Tables are generated from the entity
//! definitions with `Schema::create_table_from_entity`, so the schema always
//! matches the Rust structs.

use crate::entities::{CartDocument, LocalState, OrderDocument, ProductDocument};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, or the
/// default local `SQLite` file if it is not set.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all storefront tables if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut local_state_table = schema.create_table_from_entity(LocalState);
    let mut cart_table = schema.create_table_from_entity(CartDocument);
    let mut order_table = schema.create_table_from_entity(OrderDocument);
    let mut product_table = schema.create_table_from_entity(ProductDocument);

    for table in [
        &mut local_state_table,
        &mut cart_table,
        &mut order_table,
        &mut product_table,
    ] {
        table.if_not_exists();
    }

    db.execute(builder.build(&local_state_table)).await?;
    db.execute(builder.build(&cart_table)).await?;
    db.execute(builder.build(&order_table)).await?;
    db.execute(builder.build(&product_table)).await?;

    info!("Storefront tables ensured.");
    Ok(())
}
