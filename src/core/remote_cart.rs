//! Server-authoritative cart for signed-in users.
//!
//! The local copy is mirrored from `carts/{uid}` at sign-in and updated
//! optimistically; every applied change schedules a debounced write of the
//! whole cart through a [`CartSyncQueue`].
//!
//! Deal lines are pinned to one unit and cannot be increased; the pin is
//! stored on the line so it survives the round trip through `carts/{uid}`.
//! Purchase history is the server's concern and is not checked here.

use crate::core::cart::{Cart, CartOutcome};
use crate::core::checkout;
use crate::core::documents::DocumentStore;
use crate::core::models::{CartItem, Order};
use crate::core::session::Session;
use crate::core::sync::CartSyncQueue;
use crate::errors::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

pub struct RemoteCart<D: ?Sized> {
    documents: Arc<D>,
    debounce: Duration,
    session: Option<Session>,
    cart: Cart,
    queue: Option<CartSyncQueue>,
}

impl<D: ?Sized> std::fmt::Debug for RemoteCart<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCart")
            .field("session", &self.session)
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

impl<D> RemoteCart<D>
where
    D: DocumentStore + ?Sized + 'static,
{
    #[must_use]
    pub const fn new(documents: Arc<D>, debounce: Duration) -> Self {
        Self {
            documents,
            debounce,
            session: None,
            cart: Cart::new(),
            queue: None,
        }
    }

    /// Reacts to the identity provider reporting a new auth state.
    pub async fn on_auth_state_changed(&mut self, session: Option<Session>) -> Result<()> {
        match session {
            Some(session) => self.sign_in(session).await,
            None => self.sign_out().await,
        }
    }

    /// Loads the user's cart document and starts syncing changes back.
    #[instrument(skip_all, fields(user = %session.uid))]
    pub async fn sign_in(&mut self, session: Session) -> Result<()> {
        if self.session.as_ref().is_some_and(|s| s.uid == session.uid) {
            return Ok(());
        }
        if self.session.is_some() {
            self.sign_out().await?;
        }

        let items = self
            .documents
            .get_cart(&session.uid)
            .await?
            .map(|record| record.items)
            .unwrap_or_default();
        self.cart = Cart::from_items(items);
        self.queue = Some(CartSyncQueue::spawn(
            Arc::clone(&self.documents),
            session.uid.clone(),
            self.debounce,
        ));
        info!("Mirrored {} remote cart lines", self.cart.len());
        self.session = Some(session);
        Ok(())
    }

    /// Sends any pending write, then clears local state.
    ///
    /// Local state is cleared even when the final write fails; the error is
    /// still returned.
    pub async fn sign_out(&mut self) -> Result<()> {
        let result = match self.queue.take() {
            Some(queue) => queue.shutdown().await,
            None => Ok(()),
        };
        self.session = None;
        self.cart.clear();
        result
    }

    /// Clears local state without sending the pending write.
    pub fn abandon(&mut self) {
        if let Some(queue) = self.queue.take() {
            queue.abandon();
        }
        self.session = None;
        self.cart.clear();
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// True while a cart write is in flight.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.queue.as_ref().is_some_and(CartSyncQueue::is_writing)
    }

    fn queue(&self) -> Result<&CartSyncQueue> {
        self.queue.as_ref().ok_or(Error::NotAuthenticated)
    }

    fn apply(&mut self, change: impl FnOnce(&mut Cart) -> CartOutcome) -> Result<CartOutcome> {
        self.queue()?;
        let outcome = change(&mut self.cart);
        if outcome.is_applied() {
            self.queue()?.schedule(self.cart.items().to_vec())?;
        }
        Ok(outcome)
    }

    /// Adds a line. Deals go in as one unit and only when not already present.
    pub fn add(&mut self, product_id: &str, quantity: u32, is_deal: bool) -> Result<CartOutcome> {
        self.apply(|cart| {
            if !is_deal {
                return cart.add(product_id, quantity);
            }
            if quantity == 0 {
                return CartOutcome::InvalidQuantity {
                    product_id: product_id.to_string(),
                };
            }
            cart.add_deal(product_id)
        })
    }

    pub fn increase(&mut self, product_id: &str) -> Result<CartOutcome> {
        self.apply(|cart| cart.increase(product_id))
    }

    pub fn decrease(&mut self, product_id: &str) -> Result<CartOutcome> {
        self.apply(|cart| cart.decrease(product_id))
    }

    pub fn remove(&mut self, product_id: &str) -> Result<CartOutcome> {
        self.apply(|cart| cart.remove(product_id))
    }

    pub fn clear(&mut self) -> Result<()> {
        let queue = self.queue()?;
        queue.schedule(Vec::new())?;
        self.cart.clear();
        Ok(())
    }

    /// Flushes the pending write and places an order from the remote cart.
    /// The local cart is cleared only when the order was created.
    pub async fn place_order(&mut self) -> Result<Order> {
        self.queue()?.flush().await?;
        let order =
            checkout::place_order(self.session.as_ref(), self.documents.as_ref()).await?;
        self.cart.clear();
        Ok(order)
    }
}
