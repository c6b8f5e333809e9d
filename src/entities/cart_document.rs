//! Cart document entity - The remote `carts/{uid}` document.
//!
//! Each signed-in user owns at most one cart document. Line items are kept as a
//! JSON array so the document mirrors the `{ items, updatedAt }` shape.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cart document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cart_documents")]
pub struct Model {
    /// Owning user id (document key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// JSON array of cart items
    pub items: String,
    /// When the document was last written
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
