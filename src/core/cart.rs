//! Cart line bookkeeping shared by the local and remote-synced carts.
//!
//! [`Cart`] only knows about product ids, quantities and the per-line deal
//! marker that pins a line to one unit. Catalog-aware rules (deal catalog,
//! purchase history) live in [`crate::core::state`].

use crate::core::models::CartItem;
use serde::{Deserialize, Serialize};

/// Result of a cart or wishlist mutation.
///
/// Rejections are soft: the state is left unchanged and the outcome is
/// reported to the user as a notification, never raised as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOutcome {
    /// A new line was appended.
    Added { product_id: String, quantity: u32 },
    /// An existing line changed quantity.
    Updated { product_id: String, quantity: u32 },
    /// The line was evicted.
    Removed { product_id: String },
    /// A deal product already appears in the order history.
    AlreadyPurchased { product_id: String },
    /// A deal product is already in the cart.
    AlreadyInCart { product_id: String },
    /// Deal lines are limited to one unit.
    DealLimit { product_id: String },
    /// The id is in neither the product nor the deal catalog.
    UnknownProduct { product_id: String },
    /// The id has no line in the cart.
    NotInCart { product_id: String },
    /// Zero units were requested.
    InvalidQuantity { product_id: String },
}

impl CartOutcome {
    /// Whether the mutation changed the cart.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(
            self,
            Self::Added { .. } | Self::Updated { .. } | Self::Removed { .. }
        )
    }

    #[must_use]
    pub fn product_id(&self) -> &str {
        match self {
            Self::Added { product_id, .. }
            | Self::Updated { product_id, .. }
            | Self::Removed { product_id }
            | Self::AlreadyPurchased { product_id }
            | Self::AlreadyInCart { product_id }
            | Self::DealLimit { product_id }
            | Self::UnknownProduct { product_id }
            | Self::NotInCart { product_id }
            | Self::InvalidQuantity { product_id } => product_id,
        }
    }
}

/// Which way a wishlist toggle went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistToggle {
    Added,
    Removed,
}

/// Ordered cart lines with one line per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Builds a cart from stored lines, merging duplicate product ids and
    /// dropping zero-quantity lines.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::default();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            if item.deal {
                cart.add_deal(&item.product_id);
            } else {
                cart.add(&item.product_id, item.quantity);
            }
        }
        cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.get(product_id).is_some()
    }

    /// Adds `quantity` units, summing into an existing line or appending a new one.
    pub fn add(&mut self, product_id: &str, quantity: u32) -> CartOutcome {
        if quantity == 0 {
            return CartOutcome::InvalidQuantity {
                product_id: product_id.to_string(),
            };
        }
        if let Some(item) = self.line_mut(product_id) {
            if item.deal {
                return CartOutcome::DealLimit {
                    product_id: product_id.to_string(),
                };
            }
            item.quantity = item.quantity.saturating_add(quantity);
            return CartOutcome::Updated {
                product_id: product_id.to_string(),
                quantity: item.quantity,
            };
        }
        self.items.push(CartItem::new(product_id, quantity));
        CartOutcome::Added {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    /// Appends a single-unit deal line. An existing line for the id, deal or
    /// not, is left alone and reported as `AlreadyInCart`.
    pub fn add_deal(&mut self, product_id: &str) -> CartOutcome {
        if self.contains(product_id) {
            return CartOutcome::AlreadyInCart {
                product_id: product_id.to_string(),
            };
        }
        self.items.push(CartItem::deal(product_id));
        CartOutcome::Added {
            product_id: product_id.to_string(),
            quantity: 1,
        }
    }

    pub fn increase(&mut self, product_id: &str) -> CartOutcome {
        match self.line_mut(product_id) {
            Some(item) if item.deal => CartOutcome::DealLimit {
                product_id: product_id.to_string(),
            },
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                CartOutcome::Updated {
                    product_id: product_id.to_string(),
                    quantity: item.quantity,
                }
            }
            None => CartOutcome::NotInCart {
                product_id: product_id.to_string(),
            },
        }
    }

    /// Decrements a line, evicting it instead of leaving a zero quantity.
    pub fn decrease(&mut self, product_id: &str) -> CartOutcome {
        let Some(item) = self.line_mut(product_id) else {
            return CartOutcome::NotInCart {
                product_id: product_id.to_string(),
            };
        };
        if item.quantity > 1 {
            item.quantity -= 1;
            return CartOutcome::Updated {
                product_id: product_id.to_string(),
                quantity: item.quantity,
            };
        }
        self.remove(product_id)
    }

    /// Evicts a line. Removing an absent id reports `NotInCart` and changes nothing.
    pub fn remove(&mut self, product_id: &str) -> CartOutcome {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        if self.items.len() == before {
            CartOutcome::NotInCart {
                product_id: product_id.to_string(),
            }
        } else {
            CartOutcome::Removed {
                product_id: product_id.to_string(),
            }
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn line_mut(&mut self, product_id: &str) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
    }
}
