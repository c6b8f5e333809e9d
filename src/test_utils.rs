//! Shared test utilities for the storefront.
//!
//! This module provides a small seeded catalog, order builders and a
//! notifier that records what it was asked to show.

use crate::{
    core::{
        models::{DealProduct, Order, OrderItem, Product, ProductImage},
        notify::{Notification, Notifier},
        persistence::{KeyValueStore, MemoryKeyValueStore},
        slug::slugify,
        state::StoreSnapshot,
    },
    errors::Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("storefront_core=debug")
        .with_test_writer()
        .try_init();
}

/// Fixed timestamp so seeded records compare equal across runs.
#[allow(clippy::unwrap_used)]
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Creates a catalog product with sensible defaults.
///
/// # Defaults
/// * `slug`: derived from `name`
/// * `category`: "invitations"
/// * `images`: one placeholder
pub fn sample_product(id: &str, name: &str, price: f64) -> Product {
    let slug = slugify(name);
    Product {
        id: id.to_string(),
        images: vec![ProductImage::placeholder(&slug)],
        slug,
        name: name.to_string(),
        description: format!("{name} template"),
        price,
        category: "invitations".to_string(),
        created_at: fixed_time(),
        download_file: None,
    }
}

/// Creates a deal with 60 in stock, 20 sold and an offer ending a week out.
pub fn sample_deal(id: &str, name: &str, price: f64, discount_price: f64) -> DealProduct {
    DealProduct {
        product: sample_product(id, name, price),
        discount_price,
        stock: 60,
        sold: 20,
        rating: 4.5,
        offer_ends_at: fixed_time() + Duration::days(7),
    }
}

/// Two products and one deal:
/// * `prod1` "Classic Wedding Invite" at 120
/// * `prod2` "Birthday Party Flyer" at 45
/// * `deal1` "Summer Deal Bundle" at 200, discounted to 150
pub fn sample_snapshot() -> StoreSnapshot {
    StoreSnapshot {
        products: vec![
            sample_product("prod1", "Classic Wedding Invite", 120.0),
            sample_product("prod2", "Birthday Party Flyer", 45.0),
        ],
        deals: vec![sample_deal("deal1", "Summer Deal Bundle", 200.0, 150.0)],
        ..StoreSnapshot::default()
    }
}

/// Builds a placed order from `(product_id, quantity, price)` lines.
/// Line names are the upper-cased product id.
pub fn sample_order(id: &str, lines: &[(&str, u32, f64)]) -> Order {
    let items = lines
        .iter()
        .map(|&(product_id, quantity, price)| OrderItem {
            product_id: product_id.to_string(),
            product_name: product_id.to_uppercase(),
            quantity,
            price,
        })
        .collect();
    Order::place(
        id.to_string(),
        Some("user-1".to_string()),
        items,
        fixed_time(),
    )
}

/// Notifier that keeps every notification for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Returns and clears the recorded notifications.
    #[allow(clippy::unwrap_used)]
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    #[allow(clippy::unwrap_used)]
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// In-memory key-value store whose writes to one chosen key fail.
#[derive(Debug, Default)]
pub struct FailingKeyValueStore {
    inner: MemoryKeyValueStore,
    failing_key: Mutex<Option<String>>,
}

impl FailingKeyValueStore {
    /// Makes every later `set` on `key` fail.
    #[allow(clippy::unwrap_used)]
    pub fn fail_writes_to(&self, key: &str) {
        *self.failing_key.lock().unwrap() = Some(key.to_string());
    }

    #[allow(clippy::unwrap_used)]
    pub fn recover(&self) {
        *self.failing_key.lock().unwrap() = None;
    }
}

#[async_trait]
impl KeyValueStore for FailingKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    #[allow(clippy::unwrap_used)]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let fails = self.failing_key.lock().unwrap().as_deref() == Some(key);
        if fails {
            return Err(std::io::Error::other(format!("write to '{key}' refused")).into());
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}
