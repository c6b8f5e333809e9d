//! Core storefront logic - framework-agnostic state, persistence and sync.
//!
//! [`store::Storefront`] is the local state container; [`remote_cart::RemoteCart`]
//! is the server-authoritative cart used while signed in.

/// Admin create/update/delete over catalog and content collections
pub mod admin;
/// Cart lines and the outcomes of cart mutations
pub mod cart;
/// Order placement from the remote cart document
pub mod checkout;
/// Remote document store (`carts`, `orders`, `products`)
pub mod documents;
/// Customer help chat over a hosted model
pub mod help;
/// Time-based synthetic ids
pub mod ids;
/// Domain records: products, deals, orders, edit requests, ...
pub mod models;
/// User-facing notifications for cart and wishlist actions
pub mod notify;
/// Versioned key-value persistence of whole collections
pub mod persistence;
/// Signed-in cart with debounced remote writes
pub mod remote_cart;
/// Catalog and order summaries
pub mod report;
/// Signed-in session
pub mod session;
/// Slug derivation from display names
pub mod slug;
/// In-memory store state and its cart/wishlist rules
pub mod state;
/// The storefront state container
pub mod store;
/// Debounced cart write queue
pub mod sync;
