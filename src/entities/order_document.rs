//! Order document entity - The remote `orders/{orderId}` document.
//!
//! Orders are append-only. Line items are snapshots (name and unit price at
//! purchase time), stored as a JSON array.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order document database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_documents")]
pub struct Model {
    /// Order id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// User who placed the order
    pub user_id: Option<String>,
    /// JSON array of order items
    pub items: String,
    /// Sum of line subtotals at creation time
    pub total: f64,
    /// `"placed"`, `"shipped"`, `"delivered"` or `"cancelled"`
    pub status: String,
    /// When the order was placed
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
