//! Admin mutation surface - Catalog, menu, edit request and settings management.
//!
//! Create operations take a synthetic id from the caller, derive the slug from
//! the name, and give catalog entries a placeholder image. Updates merge the
//! fields that are set and re-derive the slug only when the name changes.
//! Deletes filter the entry out; orders, carts and wishlists that still
//! reference it are left alone (orders keep their own name/price snapshot).

use crate::core::models::{
    AppRating, AppUser, DealProduct, EditRequest, EditRequestStatus, MenuEntry, Product,
    ProductImage,
};
use crate::core::slug::slugify;
use crate::core::state::StoreState;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use tracing::info;

/// Fields for a new product.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub images: Vec<ProductImage>,
    pub download_file: Option<String>,
}

/// Partial product update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub images: Option<Vec<ProductImage>>,
    pub download_file: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct NewDeal {
    pub product: NewProduct,
    pub discount_price: f64,
    pub stock: u32,
    pub rating: f32,
    pub offer_ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct DealPatch {
    pub product: ProductPatch,
    pub discount_price: Option<f64>,
    pub stock: Option<u32>,
    pub sold: Option<u32>,
    pub rating: Option<f32>,
    pub offer_ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewMenuEntry {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Default)]
pub struct MenuEntryPatch {
    pub label: Option<String>,
    pub href: Option<String>,
}

/// A customer's customization request for a design.
#[derive(Debug, Clone, Default)]
pub struct NewEditRequest {
    pub user_id: String,
    pub product_id: String,
    pub request_details: String,
    pub turnaround_time: String,
}

fn validate_text(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::BlankField { field });
    }
    Ok(value.to_string())
}

fn validate_price(price: f64) -> Result<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }
    Ok(price)
}

fn build_product(id: String, input: NewProduct, now: DateTime<Utc>) -> Result<Product> {
    let name = validate_text("name", &input.name)?;
    let price = validate_price(input.price)?;
    let slug = slugify(&name);
    let mut images = input.images;
    images.push(ProductImage::placeholder(&slug));

    Ok(Product {
        id,
        slug,
        name,
        description: input.description,
        price,
        images,
        category: input.category,
        created_at: now,
        download_file: input.download_file,
    })
}

fn apply_product_patch(product: &mut Product, patch: ProductPatch) -> Result<()> {
    // Validate everything before touching the record
    let name = patch
        .name
        .as_deref()
        .map(|name| validate_text("name", name))
        .transpose()?;
    let price = patch.price.map(validate_price).transpose()?;

    if let Some(name) = name.filter(|name| *name != product.name) {
        product.slug = slugify(&name);
        product.name = name;
    }
    if let Some(price) = price {
        product.price = price;
    }
    if let Some(description) = patch.description {
        product.description = description;
    }
    if let Some(category) = patch.category {
        product.category = category;
    }
    if let Some(images) = patch.images {
        product.images = images;
    }
    if let Some(download_file) = patch.download_file {
        product.download_file = download_file;
    }
    Ok(())
}

fn not_found(collection: &str, id: &str) -> Error {
    Error::EntryNotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

impl StoreState {
    pub fn create_product(
        &mut self,
        id: String,
        input: NewProduct,
        now: DateTime<Utc>,
    ) -> Result<&Product> {
        let product = build_product(id, input, now)?;
        info!("Created product '{}' ({})", product.name, product.id);
        let index = self.products.len();
        self.products.push(product);
        Ok(&self.products[index])
    }

    pub fn update_product(&mut self, id: &str, patch: ProductPatch) -> Result<&Product> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::ProductNotFound { id: id.to_string() })?;
        apply_product_patch(product, patch)?;
        Ok(&*product)
    }

    /// Removes a product. Returns whether anything was removed.
    pub fn delete_product(&mut self, id: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        before != self.products.len()
    }

    pub fn create_deal(
        &mut self,
        id: String,
        input: NewDeal,
        now: DateTime<Utc>,
    ) -> Result<&DealProduct> {
        let discount_price = validate_price(input.discount_price)?;
        let product = build_product(id, input.product, now)?;
        info!("Created deal '{}' ({})", product.name, product.id);
        let index = self.deals.len();
        self.deals.push(DealProduct {
            product,
            discount_price,
            stock: input.stock,
            sold: 0,
            rating: input.rating,
            offer_ends_at: input.offer_ends_at,
        });
        Ok(&self.deals[index])
    }

    pub fn update_deal(&mut self, id: &str, patch: DealPatch) -> Result<&DealProduct> {
        let discount_price = patch.discount_price.map(validate_price).transpose()?;
        let deal = self
            .deals
            .iter_mut()
            .find(|d| d.product.id == id)
            .ok_or_else(|| Error::ProductNotFound { id: id.to_string() })?;
        apply_product_patch(&mut deal.product, patch.product)?;
        if let Some(discount_price) = discount_price {
            deal.discount_price = discount_price;
        }
        if let Some(stock) = patch.stock {
            deal.stock = stock;
        }
        if let Some(sold) = patch.sold {
            deal.sold = sold;
        }
        if let Some(rating) = patch.rating {
            deal.rating = rating;
        }
        if let Some(offer_ends_at) = patch.offer_ends_at {
            deal.offer_ends_at = offer_ends_at;
        }
        Ok(&*deal)
    }

    pub fn delete_deal(&mut self, id: &str) -> bool {
        let before = self.deals.len();
        self.deals.retain(|d| d.product.id != id);
        before != self.deals.len()
    }

    pub fn create_menu_entry(
        &mut self,
        id: String,
        input: NewMenuEntry,
        now: DateTime<Utc>,
    ) -> Result<&MenuEntry> {
        let label = validate_text("label", &input.label)?;
        let index = self.menu_entries.len();
        self.menu_entries.push(MenuEntry {
            id,
            slug: slugify(&label),
            label,
            href: input.href,
            created_at: now,
        });
        Ok(&self.menu_entries[index])
    }

    pub fn update_menu_entry(&mut self, id: &str, patch: MenuEntryPatch) -> Result<&MenuEntry> {
        let label = patch
            .label
            .as_deref()
            .map(|label| validate_text("label", label))
            .transpose()?;
        let entry = self
            .menu_entries
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| not_found("menuEntries", id))?;
        if let Some(label) = label.filter(|label| *label != entry.label) {
            entry.slug = slugify(&label);
            entry.label = label;
        }
        if let Some(href) = patch.href {
            entry.href = href;
        }
        Ok(&*entry)
    }

    pub fn delete_menu_entry(&mut self, id: &str) -> bool {
        let before = self.menu_entries.len();
        self.menu_entries.retain(|m| m.id != id);
        before != self.menu_entries.len()
    }

    /// Files a customization request. The product name is taken from the
    /// catalog, or from the order history if the design was since removed.
    pub fn submit_edit_request(
        &mut self,
        id: String,
        input: NewEditRequest,
        now: DateTime<Utc>,
    ) -> Result<&EditRequest> {
        let product_name = self
            .find_entry(&input.product_id)
            .map(|entry| entry.name().to_string())
            .or_else(|| {
                self.orders
                    .iter()
                    .flat_map(|order| order.items.iter())
                    .find(|item| item.product_id == input.product_id)
                    .map(|item| item.product_name.clone())
            })
            .ok_or_else(|| Error::ProductNotFound {
                id: input.product_id.clone(),
            })?;

        let index = self.edit_requests.len();
        self.edit_requests.push(EditRequest {
            id,
            user_id: input.user_id,
            product_id: input.product_id,
            product_name,
            request_details: input.request_details,
            turnaround_time: input.turnaround_time,
            status: EditRequestStatus::Pending,
            requested_at: now,
            updated_at: now,
        });
        Ok(&self.edit_requests[index])
    }

    /// Moves an edit request to any status; transitions are not constrained.
    pub fn set_edit_request_status(
        &mut self,
        id: &str,
        status: EditRequestStatus,
        now: DateTime<Utc>,
    ) -> Result<&EditRequest> {
        let request = self
            .edit_requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("editRequests", id))?;
        request.status = status;
        request.updated_at = now;
        Ok(&*request)
    }

    pub fn submit_rating(
        &mut self,
        id: String,
        user_id: &str,
        rating: u8,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<&AppRating> {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidRating { rating });
        }
        let index = self.ratings.len();
        self.ratings.push(AppRating {
            id,
            user_id: user_id.to_string(),
            rating,
            comment: comment.trim().to_string(),
            created_at: now,
        });
        Ok(&self.ratings[index])
    }

    pub fn delete_rating(&mut self, id: &str) -> bool {
        let before = self.ratings.len();
        self.ratings.retain(|r| r.id != id);
        before != self.ratings.len()
    }

    /// Mean star rating, or `None` when nobody has rated the app.
    #[must_use]
    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let sum: u32 = self.ratings.iter().map(|r| u32::from(r.rating)).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = self.ratings.len() as f64;
        Some(f64::from(sum) / count)
    }

    /// Inserts a user or replaces the record with the same id.
    pub fn upsert_user(&mut self, user: AppUser) {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
    }

    #[must_use]
    pub fn find_user_by_email(&self, email: &str) -> Option<&AppUser> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn set_share_link(&mut self, share_link: &str) {
        self.settings.share_link = share_link.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{sample_order, sample_snapshot};

    fn state() -> StoreState {
        StoreState::from_snapshot(sample_snapshot())
    }

    fn new_product(name: &str, price: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: "A design".to_string(),
            price,
            category: "wedding".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_product_assigns_slug_and_placeholder() {
        let mut state = state();
        let now = Utc::now();
        let product = state
            .create_product("1700000000000".to_string(), new_product("  Rose Gold Invite ", 95.0), now)
            .unwrap();

        assert_eq!(product.id, "1700000000000");
        assert_eq!(product.name, "Rose Gold Invite");
        assert_eq!(product.slug, "rose-gold-invite");
        assert_eq!(product.images.len(), 1);
        assert!(product.images[0].url.contains("rose-gold-invite"));
        assert_eq!(product.created_at, now);
        assert!(state.find_entry("1700000000000").is_some());
    }

    #[test]
    fn test_create_product_validation() {
        let mut state = state();
        let now = Utc::now();
        let count = state.products().len();

        assert!(matches!(
            state.create_product("a".to_string(), new_product("   ", 10.0), now),
            Err(Error::BlankField { field: "name" })
        ));
        assert!(matches!(
            state.create_product("b".to_string(), new_product("Card", -1.0), now),
            Err(Error::InvalidAmount { amount }) if amount == -1.0
        ));
        assert!(matches!(
            state.create_product("c".to_string(), new_product("Card", f64::NAN), now),
            Err(Error::InvalidAmount { .. })
        ));
        assert_eq!(state.products().len(), count);
    }

    #[test]
    fn test_update_product_rederives_slug_only_on_rename() {
        let mut state = state();
        // Hand-edited slug survives an update that keeps the name
        state.products[0].slug = "custom-slug".to_string();
        let product = state
            .update_product(
                "prod1",
                ProductPatch {
                    price: Some(99.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(product.slug, "custom-slug");
        assert_eq!(product.price, 99.0);

        let product = state
            .update_product(
                "prod1",
                ProductPatch {
                    name: Some("Navy Wedding Suite".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(product.slug, "navy-wedding-suite");
        assert_eq!(product.price, 99.0);
    }

    #[test]
    fn test_update_product_invalid_patch_changes_nothing() {
        let mut state = state();
        let before = state.products()[0].clone();
        let result = state.update_product(
            "prod1",
            ProductPatch {
                name: Some("Renamed".to_string()),
                price: Some(-5.0),
                ..Default::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(state.products()[0], before);
    }

    #[test]
    fn test_update_missing_product() {
        let mut state = state();
        assert!(matches!(
            state.update_product("ghost", ProductPatch::default()),
            Err(Error::ProductNotFound { id }) if id == "ghost"
        ));
    }

    #[test]
    fn test_delete_product_leaves_orders_intact() {
        let mut snapshot = sample_snapshot();
        snapshot.orders.push(sample_order("o1", &[("prod1", 2, 120.0)]));
        let mut state = StoreState::from_snapshot(snapshot);

        assert!(state.delete_product("prod1"));
        assert!(!state.delete_product("prod1"));
        assert!(state.find_entry("prod1").is_none());
        assert_eq!(state.orders()[0].items[0].product_name, "PROD1");
        assert_eq!(state.orders()[0].total, 240.0);
    }

    #[test]
    fn test_deal_lifecycle() {
        let mut state = state();
        let now = Utc::now();
        let deal = state
            .create_deal(
                "d2".to_string(),
                NewDeal {
                    product: new_product("Spring Bundle", 300.0),
                    discount_price: 210.0,
                    stock: 10,
                    rating: 4.0,
                    offer_ends_at: now + chrono::Duration::days(7),
                },
                now,
            )
            .unwrap();
        assert_eq!(deal.sold, 0);
        assert_eq!(deal.product.slug, "spring-bundle");

        let deal = state
            .update_deal(
                "d2",
                DealPatch {
                    stock: Some(12),
                    discount_price: Some(199.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(deal.stock, 12);
        assert_eq!(deal.discount_price, 199.0);
        assert_eq!(deal.product.slug, "spring-bundle");

        assert!(state.delete_deal("d2"));
        assert!(!state.is_deal("d2"));
    }

    #[test]
    fn test_menu_entries() {
        let mut state = state();
        let now = Utc::now();
        state
            .create_menu_entry(
                "m1".to_string(),
                NewMenuEntry {
                    label: "Baby Shower".to_string(),
                    href: "/category/baby-shower".to_string(),
                },
                now,
            )
            .unwrap();
        let entry = state
            .update_menu_entry(
                "m1",
                MenuEntryPatch {
                    label: Some("Baby & Kids".to_string()),
                    href: None,
                },
            )
            .unwrap();
        assert_eq!(entry.slug, "baby-kids");
        assert_eq!(entry.href, "/category/baby-shower");

        assert!(matches!(
            state.update_menu_entry(
                "m1",
                MenuEntryPatch {
                    label: Some(" ".to_string()),
                    href: None,
                },
            ),
            Err(Error::BlankField { field: "label" })
        ));
        assert_eq!(state.menu_entries()[0].label, "Baby & Kids");
        assert!(matches!(
            state.update_menu_entry("m9", MenuEntryPatch::default()),
            Err(Error::EntryNotFound { .. })
        ));
        assert!(state.delete_menu_entry("m1"));
        assert!(state.menu_entries().is_empty());
    }

    #[test]
    fn test_edit_request_status_is_unconstrained() {
        let mut state = state();
        let now = Utc::now();
        let request = state
            .submit_edit_request(
                "er1".to_string(),
                NewEditRequest {
                    user_id: "u1".to_string(),
                    product_id: "prod1".to_string(),
                    request_details: "Swap the date".to_string(),
                    turnaround_time: "24 hours".to_string(),
                },
                now,
            )
            .unwrap();
        assert_eq!(request.status, EditRequestStatus::Pending);
        assert_eq!(request.product_name, "Classic Wedding Invite");

        let later = now + chrono::Duration::hours(1);
        for status in [
            EditRequestStatus::Successful,
            EditRequestStatus::Pending,
            EditRequestStatus::Rejected,
            EditRequestStatus::Approved,
        ] {
            let request = state.set_edit_request_status("er1", status, later).unwrap();
            assert_eq!(request.status, status);
            assert_eq!(request.updated_at, later);
        }
        assert_eq!(state.edit_requests().len(), 1);
    }

    #[test]
    fn test_edit_request_for_removed_product_uses_order_snapshot() {
        let mut snapshot = sample_snapshot();
        snapshot.orders.push(sample_order("o1", &[("retired", 1, 50.0)]));
        let mut state = StoreState::from_snapshot(snapshot);
        let request = state
            .submit_edit_request(
                "er2".to_string(),
                NewEditRequest {
                    product_id: "retired".to_string(),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(request.product_name, "RETIRED");

        assert!(matches!(
            state.submit_edit_request(
                "er3".to_string(),
                NewEditRequest {
                    product_id: "never-sold".to_string(),
                    ..Default::default()
                },
                Utc::now(),
            ),
            Err(Error::ProductNotFound { .. })
        ));
    }

    #[test]
    fn test_ratings() {
        let mut state = state();
        let now = Utc::now();
        assert_eq!(state.average_rating(), None);
        assert!(matches!(
            state.submit_rating("r0".to_string(), "u1", 0, "", now),
            Err(Error::InvalidRating { rating: 0 })
        ));
        assert!(state.submit_rating("r6".to_string(), "u1", 6, "", now).is_err());

        state.submit_rating("r1".to_string(), "u1", 5, " Lovely ", now).unwrap();
        state.submit_rating("r2".to_string(), "u2", 4, "", now).unwrap();
        assert_eq!(state.ratings()[0].comment, "Lovely");
        assert_eq!(state.average_rating(), Some(4.5));

        assert!(state.delete_rating("r1"));
        assert_eq!(state.average_rating(), Some(4.0));
    }

    #[test]
    fn test_users_and_settings() {
        let mut state = state();
        let now = Utc::now();
        let user = AppUser {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            avatar: None,
            created_at: now,
        };
        state.upsert_user(user.clone());
        state.upsert_user(AppUser {
            name: "Ada L.".to_string(),
            ..user
        });
        assert_eq!(state.users().len(), 1);
        assert_eq!(
            state.find_user_by_email("ADA@example.com").map(|u| u.name.as_str()),
            Some("Ada L.")
        );

        state.set_share_link(" https://shop.example/share ");
        assert_eq!(state.settings().share_link, "https://shop.example/share");
    }
}
