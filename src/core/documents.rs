//! Remote document store consumed by the signed-in cart and order placement.
//!
//! Three collections are modelled: `carts/{uid}`, `orders/{id}` and
//! `products/{id}`. Deals live in `products/{id}` too, with their discount
//! terms stored next to the product fields.
//!
//! [`SeaOrmDocumentStore`] keeps the collections in `SQLite` tables;
//! [`MemoryDocumentStore`] keeps them in process and can be told to fail
//! writes.

use crate::core::models::{CartItem, DealProduct, Order, OrderStatus, Product};
use crate::entities::{
    CartDocument, OrderDocument, ProductDocument, cart_document, order_document,
    product_document,
};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Contents of a `carts/{uid}` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRecord {
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

/// Contents of a `products/{id}` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogRecord {
    Deal(DealProduct),
    Product(Product),
}

impl CatalogRecord {
    #[must_use]
    pub const fn product(&self) -> &Product {
        match self {
            Self::Deal(deal) => &deal.product,
            Self::Product(product) => product,
        }
    }

    /// Price charged per unit: the discount price for deals.
    #[must_use]
    pub const fn unit_price(&self) -> f64 {
        match self {
            Self::Deal(deal) => deal.discount_price,
            Self::Product(product) => product.price,
        }
    }

    #[must_use]
    pub const fn is_deal(&self) -> bool {
        matches!(self, Self::Deal(_))
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.product().id
    }
}

impl From<Product> for CatalogRecord {
    fn from(product: Product) -> Self {
        Self::Product(product)
    }
}

impl From<DealProduct> for CatalogRecord {
    fn from(deal: DealProduct) -> Self {
        Self::Deal(deal)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_cart(&self, user_id: &str) -> Result<Option<CartRecord>>;
    /// Overwrites the user's cart document with `items`.
    async fn put_cart(&self, user_id: &str, items: &[CartItem]) -> Result<()>;
    async fn delete_cart(&self, user_id: &str) -> Result<()>;
    async fn get_product(&self, id: &str) -> Result<Option<CatalogRecord>>;
    /// Overwrites `products/{id}` with a regular or deal record.
    async fn put_product(&self, record: &CatalogRecord) -> Result<()>;
    async fn create_order(&self, order: &Order) -> Result<()>;
    /// Orders for one user, newest first.
    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>>;
}

/// Document store backed by the `*_documents` tables.
#[derive(Debug, Clone)]
pub struct SeaOrmDocumentStore {
    db: DatabaseConnection,
}

impl SeaOrmDocumentStore {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn order_from_model(model: order_document::Model) -> Result<Order> {
    let status = OrderStatus::parse(&model.status).ok_or_else(|| Error::Sync {
        message: format!("order {} has unknown status '{}'", model.id, model.status),
    })?;
    Ok(Order {
        items: serde_json::from_str(&model.items)?,
        id: model.id,
        user_id: model.user_id,
        total: model.total,
        status,
        created_at: model.created_at,
    })
}

#[async_trait]
impl DocumentStore for SeaOrmDocumentStore {
    #[instrument(skip(self))]
    async fn get_cart(&self, user_id: &str) -> Result<Option<CartRecord>> {
        let Some(model) = CartDocument::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(CartRecord {
            items: serde_json::from_str(&model.items)?,
            updated_at: model.updated_at,
        }))
    }

    #[instrument(skip(self, items), fields(lines = items.len()))]
    async fn put_cart(&self, user_id: &str, items: &[CartItem]) -> Result<()> {
        let row = cart_document::ActiveModel {
            user_id: Set(user_id.to_string()),
            items: Set(serde_json::to_string(items)?),
            updated_at: Set(Utc::now()),
        };
        CartDocument::insert(row)
            .on_conflict(
                OnConflict::column(cart_document::Column::UserId)
                    .update_columns([
                        cart_document::Column::Items,
                        cart_document::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        debug!("Wrote cart document for {}", user_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_cart(&self, user_id: &str) -> Result<()> {
        CartDocument::delete_by_id(user_id.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: &str) -> Result<Option<CatalogRecord>> {
        let model = ProductDocument::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        model
            .map(|m| serde_json::from_str(&m.data).map_err(Error::from))
            .transpose()
    }

    #[instrument(skip(self, record), fields(id = %record.id(), deal = record.is_deal()))]
    async fn put_product(&self, record: &CatalogRecord) -> Result<()> {
        let row = product_document::ActiveModel {
            id: Set(record.id().to_string()),
            data: Set(serde_json::to_string(record)?),
            updated_at: Set(Utc::now()),
        };
        ProductDocument::insert(row)
            .on_conflict(
                OnConflict::column(product_document::Column::Id)
                    .update_columns([
                        product_document::Column::Data,
                        product_document::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, order), fields(id = %order.id))]
    async fn create_order(&self, order: &Order) -> Result<()> {
        let row = order_document::ActiveModel {
            id: Set(order.id.clone()),
            user_id: Set(order.user_id.clone()),
            items: Set(serde_json::to_string(&order.items)?),
            total: Set(order.total),
            status: Set(order.status.as_str().to_string()),
            created_at: Set(order.created_at),
        };
        OrderDocument::insert(row).exec(&self.db).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        OrderDocument::find()
            .filter(order_document::Column::UserId.eq(user_id))
            .order_by_desc(order_document::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(order_from_model)
            .collect()
    }
}

/// In-process document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    carts: RwLock<HashMap<String, CartRecord>>,
    products: RwLock<HashMap<String, CatalogRecord>>,
    orders: RwLock<Vec<Order>>,
    cart_writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `products/{id}` with the given catalog.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self::with_catalog(products.into_iter().map(CatalogRecord::from))
    }

    /// Seeds `products/{id}` with regular and deal records.
    #[must_use]
    pub fn with_catalog(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        let products = records
            .into_iter()
            .map(|record| (record.id().to_string(), record))
            .collect();
        Self {
            products: RwLock::new(products),
            ..Self::default()
        }
    }

    /// Number of successful `put_cart` calls.
    pub fn cart_writes(&self) -> usize {
        self.cart_writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent cart write fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_cart(&self, user_id: &str) -> Result<Option<CartRecord>> {
        Ok(self.carts.read().await.get(user_id).cloned())
    }

    async fn put_cart(&self, user_id: &str, items: &[CartItem]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Sync {
                message: format!("cart write for {user_id} rejected"),
            });
        }
        self.carts.write().await.insert(
            user_id.to_string(),
            CartRecord {
                items: items.to_vec(),
                updated_at: Utc::now(),
            },
        );
        self.cart_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_cart(&self, user_id: &str) -> Result<()> {
        self.carts.write().await.remove(user_id);
        Ok(())
    }

    async fn get_product(&self, id: &str) -> Result<Option<CatalogRecord>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn put_product(&self, record: &CatalogRecord) -> Result<()> {
        self.products
            .write()
            .await
            .insert(record.id().to_string(), record.clone());
        Ok(())
    }

    async fn create_order(&self, order: &Order) -> Result<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .iter()
            .filter(|order| order.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
