//! Persistence adapter - Reads and writes whole collections to a flat key-value store.
//!
//! Every tracked collection lives under its own key (`products`, `cart`,
//! `editRequests`, ...). Values are written in a versioned envelope:
//!
//! ```json
//! { "version": 2, "data": [ ... ] }
//! ```
//!
//! On load the envelope is unwrapped and migrated forward to
//! [`CURRENT_VERSION`]. Values written before versioning existed (a bare array or
//! object) are treated as version 1. A missing key, unreadable JSON, a failed
//! migration or a version newer than this build understands all fall back to the
//! caller's seed value; the failure is logged and never surfaced.

use crate::entities::{LocalState, local_state};
use crate::errors::Result;
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

/// Version written by this build.
pub const CURRENT_VERSION: u32 = 2;

/// Logical collections tracked by the state container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Deals,
    Cart,
    Wishlist,
    Orders,
    EditRequests,
    Users,
    Ratings,
    Settings,
    MenuEntries,
}

impl Collection {
    pub const ALL: [Self; 10] = [
        Self::Products,
        Self::Deals,
        Self::Cart,
        Self::Wishlist,
        Self::Orders,
        Self::EditRequests,
        Self::Users,
        Self::Ratings,
        Self::Settings,
        Self::MenuEntries,
    ];

    /// Storage key for this collection.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Deals => "deals",
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
            Self::Orders => "orders",
            Self::EditRequests => "editRequests",
            Self::Users => "users",
            Self::Ratings => "appRatings",
            Self::Settings => "appSettings",
            Self::MenuEntries => "menuEntries",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A string-keyed store of serialized values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Store backed by the `local_state` table.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db: DatabaseConnection,
}

impl SqliteKeyValueStore {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = LocalState::find_by_id(key.to_string()).one(&self.db).await?;
        Ok(row.map(|model| model.value))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let row = local_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(chrono::Utc::now()),
        };
        // UPSERT on the key
        LocalState::insert(row)
            .on_conflict(
                OnConflict::column(local_state::Column::Key)
                    .update_columns([local_state::Column::Value, local_state::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        debug!("Wrote {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        LocalState::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

/// Versioned read/write of whole collections over a [`KeyValueStore`].
#[derive(Debug)]
pub struct StatePersistence<S> {
    store: S,
}

impl<S: KeyValueStore> StatePersistence<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Serializes `value` in full under the collection's key.
    pub async fn save<T: Serialize + Sync>(&self, collection: Collection, value: &T) -> Result<()> {
        let envelope = json!({
            "version": CURRENT_VERSION,
            "data": serde_json::to_value(value)?,
        });
        self.store
            .set(collection.key(), &serde_json::to_string(&envelope)?)
            .await
    }

    /// Loads a collection, falling back to `seed` when the stored value is
    /// missing or cannot be read.
    pub async fn load_or<T: DeserializeOwned>(&self, collection: Collection, seed: T) -> T {
        match self.load(collection).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("No stored value for '{}', using seed data", collection);
                seed
            }
            Err(reason) => {
                warn!(
                    "Stored value for '{}' is unreadable ({}), using seed data",
                    collection, reason
                );
                seed
            }
        }
    }

    /// Loads and migrates a collection. `Ok(None)` means the key is absent.
    pub async fn load<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> std::result::Result<Option<T>, LoadError> {
        let raw = self
            .store
            .get(collection.key())
            .await
            .map_err(|e| LoadError::Store(e.to_string()))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let parsed: Value = serde_json::from_str(&raw).map_err(LoadError::Json)?;
        let (version, data) = unwrap_envelope(parsed);
        let data = migrate(collection, version, data)?;
        serde_json::from_value(data)
            .map(Some)
            .map_err(LoadError::Json)
    }

    pub async fn clear(&self, collection: Collection) -> Result<()> {
        self.store.remove(collection.key()).await
    }
}

/// Why a stored value could not be used.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("store read failed: {0}")]
    Store(String),
    #[error("invalid JSON: {0}")]
    Json(serde_json::Error),
    #[error("version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Splits a stored value into `(version, data)`. Anything that is not an
/// envelope is a version 1 value.
fn unwrap_envelope(value: Value) -> (u32, Value) {
    match value {
        Value::Object(mut map) if map.len() == 2 && map.contains_key("data") => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok());
            match version {
                Some(version) => (version, map.remove("data").unwrap_or(Value::Null)),
                None => (1, Value::Object(map)),
            }
        }
        other => (1, other),
    }
}

/// Runs migrations from `version` up to [`CURRENT_VERSION`].
fn migrate(
    collection: Collection,
    mut version: u32,
    mut data: Value,
) -> std::result::Result<Value, LoadError> {
    if version > CURRENT_VERSION {
        return Err(LoadError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }
    while version < CURRENT_VERSION {
        data = match version {
            1 => migrate_v1_images(collection, data),
            _ => data,
        };
        version += 1;
        debug!("Migrated '{}' to version {}", collection, version);
    }
    Ok(data)
}

/// Version 1 catalog entries carried a single `image` string; version 2 keeps a
/// list of image records.
fn migrate_v1_images(collection: Collection, mut data: Value) -> Value {
    if !matches!(collection, Collection::Products | Collection::Deals) {
        return data;
    }
    if let Value::Array(entries) = &mut data {
        for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
            if entry.contains_key("images") {
                entry.remove("image");
                continue;
            }
            let images = match entry.remove("image") {
                Some(Value::String(url)) if !url.is_empty() => vec![json!({ "url": url, "alt": "" })],
                _ => Vec::new(),
            };
            entry.insert("images".to_string(), Value::Array(images));
        }
    }
    data
}
