//! The storefront state container.
//!
//! [`Storefront`] is constructed once per session and handed to whoever needs
//! it. It owns the in-memory [`StoreState`], writes every touched collection
//! through the persistence adapter after each mutation, and raises a
//! notification for every cart and wishlist action.

use crate::core::admin::{
    DealPatch, MenuEntryPatch, NewDeal, NewEditRequest, NewMenuEntry, NewProduct, ProductPatch,
};
use crate::core::cart::{CartOutcome, WishlistToggle};
use crate::core::ids::IdGenerator;
use crate::core::models::{
    AppRating, AppUser, DealProduct, EditRequest, EditRequestStatus, MenuEntry, Order, Product,
};
use crate::core::notify::{Notification, NotificationKind, Notifier};
use crate::core::persistence::{Collection, KeyValueStore, StatePersistence};
use crate::core::session::Session;
use crate::core::state::{DealStockUpdate, StoreSnapshot, StoreState};
use crate::errors::{Error, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct Storefront<S> {
    state: StoreState,
    persistence: StatePersistence<S>,
    notifier: Arc<dyn Notifier>,
    ids: IdGenerator,
}

impl<S> std::fmt::Debug for Storefront<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> Storefront<S> {
    /// Loads every collection from `store`, using the matching part of `seed`
    /// for collections that are absent or unreadable.
    #[instrument(skip_all)]
    pub async fn open(store: S, seed: StoreSnapshot, notifier: Arc<dyn Notifier>) -> Self {
        let persistence = StatePersistence::new(store);
        let snapshot = StoreSnapshot {
            products: persistence.load_or(Collection::Products, seed.products).await,
            deals: persistence.load_or(Collection::Deals, seed.deals).await,
            cart: persistence.load_or(Collection::Cart, seed.cart).await,
            wishlist: persistence.load_or(Collection::Wishlist, seed.wishlist).await,
            orders: persistence.load_or(Collection::Orders, seed.orders).await,
            edit_requests: persistence
                .load_or(Collection::EditRequests, seed.edit_requests)
                .await,
            users: persistence.load_or(Collection::Users, seed.users).await,
            ratings: persistence.load_or(Collection::Ratings, seed.ratings).await,
            settings: persistence.load_or(Collection::Settings, seed.settings).await,
            menu_entries: persistence
                .load_or(Collection::MenuEntries, seed.menu_entries)
                .await,
        };
        info!(
            "Storefront opened: {} products, {} deals, {} orders",
            snapshot.products.len(),
            snapshot.deals.len(),
            snapshot.orders.len()
        );

        Self {
            state: StoreState::from_snapshot(snapshot),
            persistence,
            notifier,
            ids: IdGenerator::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &StoreState {
        &self.state
    }

    #[must_use]
    pub const fn persistence(&self) -> &StatePersistence<S> {
        &self.persistence
    }

    /// Writes every collection, e.g. to store freshly seeded data.
    pub async fn persist_all(&self) -> Result<()> {
        for collection in Collection::ALL {
            self.persist(collection).await?;
        }
        Ok(())
    }

    async fn persist(&self, collection: Collection) -> Result<()> {
        self.persist_state(&self.state, collection).await
    }

    async fn persist_state(&self, state: &StoreState, collection: Collection) -> Result<()> {
        match collection {
            Collection::Products => self.persistence.save(collection, &state.products).await,
            Collection::Deals => self.persistence.save(collection, &state.deals).await,
            Collection::Cart => self.persistence.save(collection, &state.cart).await,
            Collection::Wishlist => self.persistence.save(collection, &state.wishlist).await,
            Collection::Orders => self.persistence.save(collection, &state.orders).await,
            Collection::EditRequests => {
                self.persistence
                    .save(collection, &state.edit_requests)
                    .await
            }
            Collection::Users => self.persistence.save(collection, &state.users).await,
            Collection::Ratings => self.persistence.save(collection, &state.ratings).await,
            Collection::Settings => self.persistence.save(collection, &state.settings).await,
            Collection::MenuEntries => {
                self.persistence
                    .save(collection, &state.menu_entries)
                    .await
            }
        }?;
        debug!("Persisted '{}'", collection);
        Ok(())
    }

    fn product_name(&self, product_id: &str) -> String {
        self.state
            .find_entry(product_id)
            .map_or_else(|| product_id.to_string(), |entry| entry.name().to_string())
    }

    async fn finish_cart_change(&self, outcome: CartOutcome) -> Result<CartOutcome> {
        let name = self.product_name(outcome.product_id());
        self.notifier.notify(Notification::for_cart(&outcome, &name));
        if outcome.is_applied() {
            self.persist(Collection::Cart).await?;
        }
        Ok(outcome)
    }

    // --- Cart & wishlist ---

    pub async fn add_to_cart(
        &mut self,
        product_id: &str,
        quantity: u32,
        is_deal: bool,
    ) -> Result<CartOutcome> {
        let outcome = self.state.add_to_cart(product_id, quantity, is_deal);
        self.finish_cart_change(outcome).await
    }

    pub async fn increase_cart_quantity(&mut self, product_id: &str) -> Result<CartOutcome> {
        let outcome = self.state.increase_cart_quantity(product_id);
        self.finish_cart_change(outcome).await
    }

    pub async fn decrease_cart_quantity(&mut self, product_id: &str) -> Result<CartOutcome> {
        let outcome = self.state.decrease_cart_quantity(product_id);
        self.finish_cart_change(outcome).await
    }

    pub async fn remove_from_cart(&mut self, product_id: &str) -> Result<CartOutcome> {
        let outcome = self.state.remove_from_cart(product_id);
        self.finish_cart_change(outcome).await
    }

    pub async fn toggle_wishlist(&mut self, product_id: &str) -> Result<WishlistToggle> {
        let toggle = self.state.toggle_wishlist(product_id, Utc::now());
        let name = self.product_name(product_id);
        self.notifier
            .notify(Notification::for_wishlist(toggle, &name));
        self.persist(Collection::Wishlist).await?;
        Ok(toggle)
    }

    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &str) -> bool {
        self.state.is_in_wishlist(product_id)
    }

    // --- Orders ---

    /// Turns the local cart into an order.
    ///
    /// Requires a session and a non-empty cart, and every line must still be
    /// in the catalog; otherwise nothing changes. On success the order is
    /// recorded, deal `sold` counters are bumped and the cart is cleared.
    ///
    /// The new state is written before it replaces the in-memory one. If any
    /// write fails, collections already written are put back and the
    /// storefront keeps its previous state.
    #[instrument(skip(self, session))]
    pub async fn checkout(&mut self, session: Option<&Session>) -> Result<Order> {
        let session = session.ok_or(Error::NotAuthenticated)?;
        if self.state.cart().is_empty() {
            return Err(Error::EmptyCart);
        }
        let items = self.state.order_items_from_cart()?;
        let order = Order::place(
            uuid::Uuid::new_v4().to_string(),
            Some(session.uid.clone()),
            items,
            Utc::now(),
        );

        let mut next = self.state.clone();
        let deal_updates = next.deal_updates_for(&order);
        next.update_deal_stock_on_order(&deal_updates);
        next.record_order(order.clone());
        next.clear_cart();

        let touched = [Collection::Orders, Collection::Deals, Collection::Cart];
        for (written, collection) in touched.iter().enumerate() {
            if let Err(error) = self.persist_state(&next, *collection).await {
                warn!("Checkout aborted, '{}' not written: {}", collection, error);
                self.rewrite(&touched[..written]).await;
                return Err(error);
            }
        }
        self.state = next;

        info!(
            "Order {} placed by {} for {:.2}",
            order.id, session.uid, order.total
        );
        self.notifier.notify(Notification::new(
            NotificationKind::Success,
            format!("Order placed: {:.2}", order.total),
        ));
        Ok(order)
    }

    /// Writes the current state of `collections` back after a failed
    /// multi-collection write.
    async fn rewrite(&self, collections: &[Collection]) {
        for collection in collections {
            if let Err(error) = self.persist(*collection).await {
                warn!("Could not restore '{}': {}", collection, error);
            }
        }
    }

    pub async fn update_deal_stock_on_order(&mut self, updates: &[DealStockUpdate]) -> Result<usize> {
        let changed = self.state.update_deal_stock_on_order(updates);
        if changed > 0 {
            self.persist(Collection::Deals).await?;
        }
        Ok(changed)
    }

    /// Orders placed by one user, newest first.
    #[must_use]
    pub fn orders_for(&self, user_id: &str) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self
            .state
            .orders()
            .iter()
            .filter(|order| order.user_id.as_deref() == Some(user_id))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    // --- Admin ---

    pub async fn create_product(&mut self, input: NewProduct) -> Result<Product> {
        let id = self.ids.next_id();
        let product = self.state.create_product(id, input, Utc::now())?.clone();
        self.persist(Collection::Products).await?;
        Ok(product)
    }

    pub async fn update_product(&mut self, id: &str, patch: ProductPatch) -> Result<Product> {
        let product = self.state.update_product(id, patch)?.clone();
        self.persist(Collection::Products).await?;
        Ok(product)
    }

    pub async fn delete_product(&mut self, id: &str) -> Result<bool> {
        let removed = self.state.delete_product(id);
        if removed {
            self.persist(Collection::Products).await?;
        }
        Ok(removed)
    }

    pub async fn create_deal(&mut self, input: NewDeal) -> Result<DealProduct> {
        let id = self.ids.next_id();
        let deal = self.state.create_deal(id, input, Utc::now())?.clone();
        self.persist(Collection::Deals).await?;
        Ok(deal)
    }

    pub async fn update_deal(&mut self, id: &str, patch: DealPatch) -> Result<DealProduct> {
        let deal = self.state.update_deal(id, patch)?.clone();
        self.persist(Collection::Deals).await?;
        Ok(deal)
    }

    pub async fn delete_deal(&mut self, id: &str) -> Result<bool> {
        let removed = self.state.delete_deal(id);
        if removed {
            self.persist(Collection::Deals).await?;
        }
        Ok(removed)
    }

    pub async fn create_menu_entry(&mut self, input: NewMenuEntry) -> Result<MenuEntry> {
        let id = self.ids.next_id();
        let entry = self.state.create_menu_entry(id, input, Utc::now())?.clone();
        self.persist(Collection::MenuEntries).await?;
        Ok(entry)
    }

    pub async fn update_menu_entry(&mut self, id: &str, patch: MenuEntryPatch) -> Result<MenuEntry> {
        let entry = self.state.update_menu_entry(id, patch)?.clone();
        self.persist(Collection::MenuEntries).await?;
        Ok(entry)
    }

    pub async fn delete_menu_entry(&mut self, id: &str) -> Result<bool> {
        let removed = self.state.delete_menu_entry(id);
        if removed {
            self.persist(Collection::MenuEntries).await?;
        }
        Ok(removed)
    }

    pub async fn submit_edit_request(&mut self, input: NewEditRequest) -> Result<EditRequest> {
        let id = self.ids.next_id();
        let request = self
            .state
            .submit_edit_request(id, input, Utc::now())?
            .clone();
        self.persist(Collection::EditRequests).await?;
        Ok(request)
    }

    pub async fn set_edit_request_status(
        &mut self,
        id: &str,
        status: EditRequestStatus,
    ) -> Result<EditRequest> {
        let request = self
            .state
            .set_edit_request_status(id, status, Utc::now())?
            .clone();
        self.persist(Collection::EditRequests).await?;
        Ok(request)
    }

    pub async fn submit_rating(
        &mut self,
        user_id: &str,
        rating: u8,
        comment: &str,
    ) -> Result<AppRating> {
        let id = self.ids.next_id();
        let rating = self
            .state
            .submit_rating(id, user_id, rating, comment, Utc::now())?
            .clone();
        self.persist(Collection::Ratings).await?;
        Ok(rating)
    }

    pub async fn delete_rating(&mut self, id: &str) -> Result<bool> {
        let removed = self.state.delete_rating(id);
        if removed {
            self.persist(Collection::Ratings).await?;
        }
        Ok(removed)
    }

    pub async fn upsert_user(&mut self, user: AppUser) -> Result<()> {
        self.state.upsert_user(user);
        self.persist(Collection::Users).await
    }

    pub async fn set_share_link(&mut self, share_link: &str) -> Result<()> {
        self.state.set_share_link(share_link);
        self.persist(Collection::Settings).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::models::CartItem;
    use crate::core::persistence::{MemoryKeyValueStore, SqliteKeyValueStore};
    use crate::test_utils::{
        FailingKeyValueStore, RecordingNotifier, sample_order, sample_snapshot, setup_test_db,
    };

    async fn open_store() -> (Storefront<MemoryKeyValueStore>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Storefront::open(
            MemoryKeyValueStore::new(),
            sample_snapshot(),
            shared(&notifier),
        )
        .await;
        (store, notifier)
    }

    fn session() -> Session {
        Session::new("user-1")
    }

    fn shared(notifier: &Arc<RecordingNotifier>) -> Arc<dyn Notifier> {
        Arc::<RecordingNotifier>::clone(notifier)
    }

    #[tokio::test]
    async fn test_open_uses_seed_when_store_is_empty() {
        let (store, _) = open_store().await;
        assert_eq!(store.state().products().len(), 2);
        assert_eq!(store.state().deals().len(), 1);
        assert!(store.state().cart().is_empty());
    }

    #[tokio::test]
    async fn test_cart_changes_are_persisted_and_reloaded() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = Arc::new(RecordingNotifier::default());
        {
            let mut store = Storefront::open(
                SqliteKeyValueStore::new(db.clone()),
                sample_snapshot(),
                shared(&notifier),
            )
            .await;
            store.add_to_cart("prod1", 2, false).await?;
            store.add_to_cart("prod1", 3, false).await?;
            store.toggle_wishlist("prod2").await?;
        }

        let reopened = Storefront::open(
            SqliteKeyValueStore::new(db),
            StoreSnapshot::default(),
            notifier,
        )
        .await;
        assert_eq!(reopened.state().cart().items(), &[CartItem::new("prod1", 5)]);
        assert!(reopened.is_in_wishlist("prod2"));
        // Catalog was never written, so the empty seed is used
        assert!(reopened.state().products().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_rejections_notify_without_persisting() -> Result<()> {
        let (mut store, notifier) = open_store().await;
        let mut snapshot = sample_snapshot();
        snapshot.orders.push(sample_order("o1", &[("deal1", 1, 150.0)]));
        store.state = StoreState::from_snapshot(snapshot);

        let outcome = store.add_to_cart("deal1", 1, true).await?;
        assert!(matches!(outcome, CartOutcome::AlreadyPurchased { .. }));
        assert!(store.persistence().store().get("cart").await?.is_none());

        let notes = notifier.take();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Rejected);
        assert!(notes[0].message.contains("Summer Deal Bundle"));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_notifies_success() -> Result<()> {
        let (mut store, notifier) = open_store().await;
        store.add_to_cart("prod1", 1, false).await?;
        let notes = notifier.take();
        assert_eq!(notes[0].kind, NotificationKind::Success);
        assert_eq!(notes[0].message, "Classic Wedding Invite added to cart");
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_requires_session() -> Result<()> {
        let (mut store, _) = open_store().await;
        store.add_to_cart("prod1", 1, false).await?;
        assert!(matches!(
            store.checkout(None).await,
            Err(Error::NotAuthenticated)
        ));
        assert_eq!(store.state().cart().len(), 1);
        assert!(store.state().orders().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_creates_no_order() {
        let (mut store, _) = open_store().await;
        let result = store.checkout(Some(&session())).await;
        assert!(matches!(result, Err(Error::EmptyCart)));
        assert!(store.state().orders().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_missing_product_leaves_cart_untouched() -> Result<()> {
        let (mut store, _) = open_store().await;
        store.add_to_cart("prod1", 1, false).await?;
        store.add_to_cart("prod2", 1, false).await?;
        store.delete_product("prod2").await?;

        let result = store.checkout(Some(&session())).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id }) if id == "prod2"));
        assert_eq!(store.state().cart().len(), 2);
        assert!(store.state().orders().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_records_order_and_updates_deals() -> Result<()> {
        let (mut store, _) = open_store().await;
        store.add_to_cart("prod1", 2, false).await?;
        store.add_to_cart("deal1", 1, true).await?;

        let order = store.checkout(Some(&session())).await?;
        assert_eq!(order.total, 2.0 * 120.0 + 150.0);
        assert_eq!(order.user_id.as_deref(), Some("user-1"));
        assert!(store.state().cart().is_empty());
        assert_eq!(store.state().deals()[0].sold, 21);
        assert_eq!(store.orders_for("user-1").len(), 1);

        // The deal can no longer be bought
        let outcome = store.add_to_cart("deal1", 1, true).await?;
        assert!(matches!(outcome, CartOutcome::AlreadyPurchased { .. }));
        Ok(())
    }

    async fn open_failing_store() -> Storefront<FailingKeyValueStore> {
        let notifier: Arc<dyn Notifier> = Arc::new(RecordingNotifier::default());
        Storefront::open(FailingKeyValueStore::default(), sample_snapshot(), notifier).await
    }

    #[tokio::test]
    async fn test_failed_checkout_write_keeps_previous_state() -> Result<()> {
        let mut store = open_failing_store().await;
        store.add_to_cart("deal1", 1, true).await?;
        store.persistence().store().fail_writes_to("orders");

        assert!(matches!(
            store.checkout(Some(&session())).await,
            Err(Error::Io(_))
        ));
        assert!(store.state().orders().is_empty());
        assert!(store.state().cart().contains("deal1"));
        assert_eq!(store.state().deals()[0].sold, 20);
        assert!(!store.state().has_purchased("deal1"));
        assert!(matches!(
            store.add_to_cart("deal1", 1, true).await?,
            CartOutcome::AlreadyInCart { .. }
        ));

        store.persistence().store().recover();
        let order = store.checkout(Some(&session())).await?;
        assert_eq!(order.total, 150.0);
        assert_eq!(store.state().deals()[0].sold, 21);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_cart_write_restores_written_collections() -> Result<()> {
        let mut store = open_failing_store().await;
        store.add_to_cart("prod1", 2, false).await?;
        store.add_to_cart("deal1", 1, true).await?;
        store.persistence().store().fail_writes_to("cart");

        assert!(store.checkout(Some(&session())).await.is_err());
        assert_eq!(store.state().cart().len(), 2);

        let persistence = store.persistence();
        assert!(persistence.store().get("orders").await?.is_some());
        let orders: Vec<Order> = persistence.load_or(Collection::Orders, Vec::new()).await;
        assert!(orders.is_empty());
        let deals: Vec<DealProduct> = persistence.load_or(Collection::Deals, Vec::new()).await;
        assert_eq!(deals[0].sold, 20);
        Ok(())
    }

    #[tokio::test]
    async fn test_order_total_is_not_recomputed_after_price_change() -> Result<()> {
        let (mut store, _) = open_store().await;
        store.add_to_cart("prod1", 3, false).await?;
        let order = store.checkout(Some(&session())).await?;

        store
            .update_product(
                "prod1",
                ProductPatch {
                    price: Some(1.0),
                    ..Default::default()
                },
            )
            .await?;
        let stored = &store.state().orders()[0];
        assert_eq!(stored.total, order.total);
        assert_eq!(stored.total, 360.0);
        assert_eq!(stored.items[0].price, 120.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_deal_stock_on_order_persists() -> Result<()> {
        let (mut store, _) = open_store().await;
        let changed = store
            .update_deal_stock_on_order(&[DealStockUpdate {
                id: "deal1".to_string(),
                quantity: 5,
                discount_price: 150.0,
            }])
            .await?;
        assert_eq!(changed, 1);
        assert_eq!(store.state().deals()[0].sold, 25);

        let deals: Vec<DealProduct> = store
            .persistence()
            .load(Collection::Deals)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(deals[0].sold, 25);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_create_assigns_distinct_ids() -> Result<()> {
        let (mut store, _) = open_store().await;
        let first = store
            .create_product(NewProduct {
                name: "Thank You Card".to_string(),
                price: 15.0,
                ..Default::default()
            })
            .await?;
        let second = store
            .create_product(NewProduct {
                name: "Thank You Card".to_string(),
                price: 15.0,
                ..Default::default()
            })
            .await?;
        assert_ne!(first.id, second.id);
        // Same name, same slug
        assert_eq!(first.slug, second.slug);
        assert_eq!(store.state().products().len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_request_flow() -> Result<()> {
        let (mut store, _) = open_store().await;
        let request = store
            .submit_edit_request(NewEditRequest {
                user_id: "user-1".to_string(),
                product_id: "prod1".to_string(),
                request_details: "Use navy ink".to_string(),
                turnaround_time: "3 days".to_string(),
            })
            .await?;
        let updated = store
            .set_edit_request_status(&request.id, EditRequestStatus::Successful)
            .await?;
        assert_eq!(updated.status, EditRequestStatus::Successful);
        assert!(updated.updated_at >= request.requested_at);

        let stored: Vec<EditRequest> = store
            .persistence()
            .load(Collection::EditRequests)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored[0].status, EditRequestStatus::Successful);
        Ok(())
    }

    #[tokio::test]
    async fn test_settings_and_ratings_persist() -> Result<()> {
        let (mut store, _) = open_store().await;
        store.set_share_link("https://shop.example/s/abc").await?;
        store.submit_rating("user-1", 5, "Great").await?;
        assert!(store.submit_rating("user-1", 9, "").await.is_err());

        let raw = store.persistence().store().get("appSettings").await?.unwrap();
        assert!(raw.contains("https://shop.example/s/abc"));
        let raw = store.persistence().store().get("appRatings").await?.unwrap();
        assert!(raw.contains("Great"));
        Ok(())
    }

    #[tokio::test]
    async fn test_persist_all_writes_every_key() -> Result<()> {
        let (store, _) = open_store().await;
        store.persist_all().await?;
        for collection in Collection::ALL {
            assert!(
                store
                    .persistence()
                    .store()
                    .get(collection.key())
                    .await?
                    .is_some(),
                "missing key {collection}"
            );
        }
        Ok(())
    }
}
