//! In-memory storefront state and the catalog-aware cart/wishlist rules.
//!
//! [`StoreState`] is a plain value: every mutation is a synchronous method on
//! `&mut self`, so calls apply strictly in order. Persistence and notifications
//! are layered on top by [`crate::core::store::Storefront`].
//!
//! Deal products follow a purchase-once rule. Instead of scanning the whole
//! order history on every add, the state keeps an index of purchased product
//! ids that is rebuilt on load and extended whenever an order is recorded.

use crate::core::cart::{Cart, CartOutcome, WishlistToggle};
use crate::core::models::{
    AppRating, AppSettings, AppUser, CartItem, DealProduct, EditRequest, MenuEntry, Order,
    OrderItem, Product, WishlistItem,
};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Every collection of the storefront, as loaded from storage or seed data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub products: Vec<Product>,
    pub deals: Vec<DealProduct>,
    pub cart: Vec<CartItem>,
    pub wishlist: Vec<WishlistItem>,
    pub orders: Vec<Order>,
    pub edit_requests: Vec<EditRequest>,
    pub users: Vec<AppUser>,
    pub ratings: Vec<AppRating>,
    pub settings: AppSettings,
    pub menu_entries: Vec<MenuEntry>,
}

/// A catalog lookup result spanning regular products and deals.
#[derive(Debug, Clone, Copy)]
pub enum CatalogEntry<'a> {
    Product(&'a Product),
    Deal(&'a DealProduct),
}

impl CatalogEntry<'_> {
    #[must_use]
    pub fn product(&self) -> &Product {
        match self {
            Self::Product(product) => product,
            Self::Deal(deal) => &deal.product,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.product().name
    }

    /// Price charged at checkout: the discount price for deals.
    #[must_use]
    pub const fn unit_price(&self) -> f64 {
        match self {
            Self::Product(product) => product.price,
            Self::Deal(deal) => deal.discount_price,
        }
    }

    #[must_use]
    pub const fn is_deal(&self) -> bool {
        matches!(self, Self::Deal(_))
    }
}

/// A deal line of a placed order, used to bump the deal's `sold` counter.
#[derive(Debug, Clone, PartialEq)]
pub struct DealStockUpdate {
    pub id: String,
    pub quantity: u32,
    pub discount_price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub(crate) products: Vec<Product>,
    pub(crate) deals: Vec<DealProduct>,
    pub(crate) cart: Cart,
    pub(crate) wishlist: Vec<WishlistItem>,
    pub(crate) orders: Vec<Order>,
    pub(crate) edit_requests: Vec<EditRequest>,
    pub(crate) users: Vec<AppUser>,
    pub(crate) ratings: Vec<AppRating>,
    pub(crate) settings: AppSettings,
    pub(crate) menu_entries: Vec<MenuEntry>,
    purchased: HashSet<String>,
}

impl StoreState {
    #[must_use]
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let purchased = snapshot
            .orders
            .iter()
            .flat_map(|order| order.items.iter().map(|item| item.product_id.clone()))
            .collect();

        let mut wishlist: Vec<WishlistItem> = Vec::with_capacity(snapshot.wishlist.len());
        for item in snapshot.wishlist {
            if !wishlist.iter().any(|w| w.product_id == item.product_id) {
                wishlist.push(item);
            }
        }

        Self {
            products: snapshot.products,
            deals: snapshot.deals,
            cart: Cart::from_items(snapshot.cart),
            wishlist,
            orders: snapshot.orders,
            edit_requests: snapshot.edit_requests,
            users: snapshot.users,
            ratings: snapshot.ratings,
            settings: snapshot.settings,
            menu_entries: snapshot.menu_entries,
            purchased,
        }
    }

    #[must_use]
    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            products: self.products.clone(),
            deals: self.deals.clone(),
            cart: self.cart.items().to_vec(),
            wishlist: self.wishlist.clone(),
            orders: self.orders.clone(),
            edit_requests: self.edit_requests.clone(),
            users: self.users.clone(),
            ratings: self.ratings.clone(),
            settings: self.settings.clone(),
            menu_entries: self.menu_entries.clone(),
        }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn deals(&self) -> &[DealProduct] {
        &self.deals
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &[WishlistItem] {
        &self.wishlist
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn edit_requests(&self) -> &[EditRequest] {
        &self.edit_requests
    }

    #[must_use]
    pub fn users(&self) -> &[AppUser] {
        &self.users
    }

    #[must_use]
    pub fn ratings(&self) -> &[AppRating] {
        &self.ratings
    }

    #[must_use]
    pub const fn settings(&self) -> &AppSettings {
        &self.settings
    }

    #[must_use]
    pub fn menu_entries(&self) -> &[MenuEntry] {
        &self.menu_entries
    }

    /// Looks a product id up in the product catalog, then the deal catalog.
    #[must_use]
    pub fn find_entry(&self, product_id: &str) -> Option<CatalogEntry<'_>> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .map(CatalogEntry::Product)
            .or_else(|| {
                self.deals
                    .iter()
                    .find(|d| d.product.id == product_id)
                    .map(CatalogEntry::Deal)
            })
    }

    #[must_use]
    pub fn find_by_slug(&self, slug: &str) -> Option<CatalogEntry<'_>> {
        self.products
            .iter()
            .find(|p| p.slug == slug)
            .map(CatalogEntry::Product)
            .or_else(|| {
                self.deals
                    .iter()
                    .find(|d| d.product.slug == slug)
                    .map(CatalogEntry::Deal)
            })
    }

    #[must_use]
    pub fn is_deal(&self, product_id: &str) -> bool {
        self.deals.iter().any(|d| d.product.id == product_id)
    }

    /// Whether the product appears in any recorded order.
    #[must_use]
    pub fn has_purchased(&self, product_id: &str) -> bool {
        self.purchased.contains(product_id)
    }

    /// Adds a product to the cart.
    ///
    /// A product counts as a deal when `is_deal` is set or it is listed in the
    /// deal catalog. Deals are rejected when already purchased or already in
    /// the cart, and are otherwise added with quantity 1 whatever positive
    /// quantity was requested.
    pub fn add_to_cart(&mut self, product_id: &str, quantity: u32, is_deal: bool) -> CartOutcome {
        let Some(entry) = self.find_entry(product_id) else {
            return CartOutcome::UnknownProduct {
                product_id: product_id.to_string(),
            };
        };

        if is_deal || entry.is_deal() {
            if self.has_purchased(product_id) {
                return CartOutcome::AlreadyPurchased {
                    product_id: product_id.to_string(),
                };
            }
            if self.cart.contains(product_id) {
                return CartOutcome::AlreadyInCart {
                    product_id: product_id.to_string(),
                };
            }
            if quantity == 0 {
                return CartOutcome::InvalidQuantity {
                    product_id: product_id.to_string(),
                };
            }
            return self.cart.add_deal(product_id);
        }

        self.cart.add(product_id, quantity)
    }

    /// Adds one unit. Lines added as deals, and lines for deal catalog
    /// entries, stay at one unit.
    pub fn increase_cart_quantity(&mut self, product_id: &str) -> CartOutcome {
        if self.is_deal(product_id) && self.cart.contains(product_id) {
            return CartOutcome::DealLimit {
                product_id: product_id.to_string(),
            };
        }
        self.cart.increase(product_id)
    }

    pub fn decrease_cart_quantity(&mut self, product_id: &str) -> CartOutcome {
        self.cart.decrease(product_id)
    }

    pub fn remove_from_cart(&mut self, product_id: &str) -> CartOutcome {
        self.cart.remove(product_id)
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Flips wishlist membership and reports which way it went.
    pub fn toggle_wishlist(&mut self, product_id: &str, now: DateTime<Utc>) -> WishlistToggle {
        if self.is_in_wishlist(product_id) {
            self.wishlist.retain(|item| item.product_id != product_id);
            WishlistToggle::Removed
        } else {
            self.wishlist.push(WishlistItem {
                product_id: product_id.to_string(),
                added_at: now,
            });
            WishlistToggle::Added
        }
    }

    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &str) -> bool {
        self.wishlist.iter().any(|item| item.product_id == product_id)
    }

    /// Resolves every cart line against the catalog, capturing name and unit
    /// price. Fails without side effects if any line is unknown.
    pub fn order_items_from_cart(&self) -> Result<Vec<OrderItem>> {
        self.cart
            .items()
            .iter()
            .map(|line| {
                let entry =
                    self.find_entry(&line.product_id)
                        .ok_or_else(|| Error::ProductNotFound {
                            id: line.product_id.clone(),
                        })?;
                Ok(OrderItem {
                    product_id: line.product_id.clone(),
                    product_name: entry.name().to_string(),
                    quantity: line.quantity,
                    price: entry.unit_price(),
                })
            })
            .collect()
    }

    /// Appends an order and indexes its products for the purchase-once rule.
    pub fn record_order(&mut self, order: Order) {
        self.purchased
            .extend(order.items.iter().map(|item| item.product_id.clone()));
        debug!("Recorded order {} with {} lines", order.id, order.items.len());
        self.orders.push(order);
    }

    /// Deal lines of an order, for [`Self::update_deal_stock_on_order`].
    #[must_use]
    pub fn deal_updates_for(&self, order: &Order) -> Vec<DealStockUpdate> {
        order
            .items
            .iter()
            .filter(|item| self.is_deal(&item.product_id))
            .map(|item| DealStockUpdate {
                id: item.product_id.clone(),
                quantity: item.quantity,
                discount_price: item.price,
            })
            .collect()
    }

    /// Adds each update's quantity to the matching deal's `sold` counter.
    /// Unknown ids are skipped. Returns how many deals changed.
    pub fn update_deal_stock_on_order(&mut self, updates: &[DealStockUpdate]) -> usize {
        let mut changed = 0;
        for update in updates {
            let Some(deal) = self.deals.iter_mut().find(|d| d.product.id == update.id) else {
                debug!("Skipping stock update for unknown deal {}", update.id);
                continue;
            };
            deal.sold = deal.sold.saturating_add(update.quantity);
            if deal.sold > deal.stock {
                warn!(
                    "Deal {} oversold: sold {} of {} in stock",
                    deal.product.id, deal.sold, deal.stock
                );
            }
            changed += 1;
        }
        changed
    }
}
