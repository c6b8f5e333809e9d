//! Storefront data model.
//!
//! These are the records held by the state container and written to the
//! persistence adapter. Field names serialize in camelCase (`productId`,
//! `createdAt`, `offerEndsAt`, ...) and dates serialize as RFC 3339 strings, so a
//! stored collection deserializes straight back into `DateTime<Utc>` values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An image attached to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Location of the image
    pub url: String,
    /// Alternative text / generation hint
    #[serde(default)]
    pub alt: String,
}

impl ProductImage {
    /// Builds the placeholder image record attached to newly created catalog entries.
    #[must_use]
    pub fn placeholder(slug: &str) -> Self {
        Self {
            url: format!("https://placehold.co/600x400?text={slug}"),
            alt: slug.replace('-', " "),
        }
    }
}

/// A design sold in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub category: String,
    pub created_at: DateTime<Utc>,
    /// Downloadable design file delivered after purchase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_file: Option<String>,
}

/// A time-boxed discounted product with stock counters.
///
/// `sold <= stock` and `discount_price <= price` are conventions only; neither
/// is enforced when a deal is created or updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealProduct {
    #[serde(flatten)]
    pub product: Product,
    pub discount_price: f64,
    pub stock: u32,
    #[serde(default)]
    pub sold: u32,
    #[serde(default)]
    pub rating: f32,
    pub offer_ends_at: DateTime<Utc>,
}

impl DealProduct {
    /// Units still available to sell, saturating at zero.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.stock.saturating_sub(self.sold)
    }

    /// Whether the offer window has closed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.offer_ends_at <= now
    }
}

/// One line of a cart. At most one line exists per product id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
    /// Set when the line was added under deal rules; such lines stay at one unit.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deal: bool,
}

impl CartItem {
    #[must_use]
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            deal: false,
        }
    }

    /// A single-unit deal line.
    #[must_use]
    pub fn deal(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            quantity: 1,
            deal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: String,
    pub added_at: DateTime<Utc>,
}

/// Lifecycle of an order. Orders start as `Placed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Placed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the stored lowercase form; unknown strings yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "placed" => Some(Self::Placed),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// A purchased line, captured at order time.
///
/// `product_name` and `price` are snapshots; later catalog edits or deletions do
/// not change them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price: f64,
}

impl OrderItem {
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// An immutable order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a `Placed` order whose total is the sum of its line subtotals.
    #[must_use]
    pub fn place(
        id: String,
        user_id: Option<String>,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let total = items.iter().map(OrderItem::subtotal).sum();
        Self {
            id,
            user_id,
            items,
            total,
            status: OrderStatus::Placed,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Successful,
}

/// A customer's request to customize a purchased design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub product_id: String,
    pub product_name: String,
    pub request_details: String,
    pub turnaround_time: String,
    #[serde(default)]
    pub status: EditRequestStatus,
    pub requested_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A 1-5 star rating of the app with an optional comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRating {
    pub id: String,
    pub user_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub share_link: String,
}

/// An admin-managed navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    pub id: String,
    pub slug: String,
    pub label: String,
    pub href: String,
    pub created_at: DateTime<Utc>,
}
