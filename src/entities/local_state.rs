//! Local state entity - The flat key-value store behind the persistence adapter.
//!
//! One row per logical collection (`products`, `cart`, `orders`, ...). The value
//! is the versioned JSON envelope written by [`crate::core::persistence`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Local state database model - one serialized collection per key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "local_state")]
pub struct Model {
    /// Collection key (e.g., `"cart"`, `"editRequests"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Serialized collection
    pub value: String,
    /// When this key was last written
    pub updated_at: DateTimeUtc,
}

/// `LocalState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
