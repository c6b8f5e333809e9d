//! User-facing notifications raised by cart, wishlist and checkout actions.
//!
//! The state container never renders anything itself; it hands a
//! [`Notification`] to whatever [`Notifier`] it was built with.

use crate::core::cart::{CartOutcome, WishlistToggle};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Message for a cart mutation; success and each rejection read differently.
    #[must_use]
    pub fn for_cart(outcome: &CartOutcome, product_name: &str) -> Self {
        match outcome {
            CartOutcome::Added { .. } => {
                Self::new(NotificationKind::Success, format!("{product_name} added to cart"))
            }
            CartOutcome::Updated { quantity, .. } => Self::new(
                NotificationKind::Success,
                format!("{product_name} quantity is now {quantity}"),
            ),
            CartOutcome::Removed { .. } => Self::new(
                NotificationKind::Info,
                format!("{product_name} removed from cart"),
            ),
            CartOutcome::AlreadyPurchased { .. } => Self::new(
                NotificationKind::Rejected,
                format!("You have already purchased {product_name}; deals are limited to one purchase"),
            ),
            CartOutcome::AlreadyInCart { .. } => Self::new(
                NotificationKind::Rejected,
                format!("{product_name} is already in your cart"),
            ),
            CartOutcome::DealLimit { .. } => Self::new(
                NotificationKind::Rejected,
                format!("Deals are limited to one per customer ({product_name})"),
            ),
            CartOutcome::UnknownProduct { product_id } => Self::new(
                NotificationKind::Rejected,
                format!("Product {product_id} is not available"),
            ),
            CartOutcome::NotInCart { .. } => Self::new(
                NotificationKind::Rejected,
                format!("{product_name} is not in your cart"),
            ),
            CartOutcome::InvalidQuantity { .. } => Self::new(
                NotificationKind::Rejected,
                "Quantity must be at least 1",
            ),
        }
    }

    #[must_use]
    pub fn for_wishlist(toggle: WishlistToggle, product_name: &str) -> Self {
        match toggle {
            WishlistToggle::Added => Self::new(
                NotificationKind::Success,
                format!("{product_name} added to wishlist"),
            ),
            WishlistToggle::Removed => Self::new(
                NotificationKind::Info,
                format!("{product_name} removed from wishlist"),
            ),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives notifications for display.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Rejected => warn!(target: "storefront::notify", "{}", notification),
            NotificationKind::Success | NotificationKind::Info => {
                info!(target: "storefront::notify", "{}", notification);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_notifications_distinguish_rejections() {
        let added = Notification::for_cart(
            &CartOutcome::Added {
                product_id: "p".to_string(),
                quantity: 1,
            },
            "Floral Invite",
        );
        assert_eq!(added.kind, NotificationKind::Success);
        assert_eq!(added.message, "Floral Invite added to cart");

        let purchased = Notification::for_cart(
            &CartOutcome::AlreadyPurchased {
                product_id: "d".to_string(),
            },
            "Summer Set",
        );
        assert_eq!(purchased.kind, NotificationKind::Rejected);
        assert!(purchased.message.contains("already purchased"));

        let in_cart = Notification::for_cart(
            &CartOutcome::AlreadyInCart {
                product_id: "d".to_string(),
            },
            "Summer Set",
        );
        assert_ne!(purchased.message, in_cart.message);
    }

    #[test]
    fn test_wishlist_notifications() {
        let added = Notification::for_wishlist(WishlistToggle::Added, "Menu Card");
        let removed = Notification::for_wishlist(WishlistToggle::Removed, "Menu Card");
        assert_eq!(added.kind, NotificationKind::Success);
        assert_eq!(removed.kind, NotificationKind::Info);
        assert_eq!(removed.to_string(), "Menu Card removed from wishlist");
    }
}
