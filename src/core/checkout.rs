//! Order placement against the remote document store.
//!
//! The signed-in user's `carts/{uid}` document is turned into an `orders/{id}`
//! document and then deleted. Every line must resolve to a product; if one
//! does not, nothing is written and the cart document is left as it was.
//!
//! Deal documents are charged at their discount price, and deal lines (by
//! document or by the line's own marker) are ordered as a single unit.

use crate::core::documents::DocumentStore;
use crate::core::models::{Order, OrderItem};
use crate::core::session::Session;
use crate::errors::{Error, Result};
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[instrument(skip_all, fields(user = session.map(|s| s.uid.as_str())))]
pub async fn place_order<D>(session: Option<&Session>, documents: &D) -> Result<Order>
where
    D: DocumentStore + ?Sized,
{
    let session = session.ok_or(Error::NotAuthenticated)?;
    let items = documents
        .get_cart(&session.uid)
        .await?
        .map(|record| record.items)
        .unwrap_or_default();
    if items.is_empty() {
        return Err(Error::EmptyCart);
    }

    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let Some(record) = documents.get_product(&item.product_id).await? else {
            warn!(
                "Order aborted: cart line {} has no product",
                item.product_id
            );
            return Err(Error::ProductNotFound {
                id: item.product_id.clone(),
            });
        };
        let quantity = if record.is_deal() || item.deal {
            1
        } else {
            item.quantity
        };
        lines.push(OrderItem {
            product_id: record.id().to_string(),
            product_name: record.product().name.clone(),
            quantity,
            price: record.unit_price(),
        });
    }

    let order = Order::place(
        Uuid::new_v4().to_string(),
        Some(session.uid.clone()),
        lines,
        Utc::now(),
    );
    documents.create_order(&order).await?;
    documents.delete_cart(&session.uid).await?;

    info!(
        "Order {} placed: {} lines, total {:.2}",
        order.id,
        order.items.len(),
        order.total
    );
    Ok(order)
}
