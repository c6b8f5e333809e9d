//! Product document entity - The remote `products/{id}` document.
//!
//! The full product record is stored as JSON; order placement only needs to
//! resolve it by id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_documents")]
pub struct Model {
    /// Product id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Serialized product record
    pub data: String,
    /// When the document was last written
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
