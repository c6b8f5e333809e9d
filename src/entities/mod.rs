//! Entity module - Contains all SeaORM entity definitions for the database.
//! `local_state` backs the local key-value store; the `*_document` tables back
//! the remote document store (`carts/{uid}`, `orders/{id}`, `products/{id}`).

pub mod cart_document;
pub mod local_state;
pub mod order_document;
pub mod product_document;

// Re-export specific types to avoid conflicts
pub use cart_document::{
    Column as CartDocumentColumn, Entity as CartDocument, Model as CartDocumentModel,
};
pub use local_state::{Column as LocalStateColumn, Entity as LocalState, Model as LocalStateModel};
pub use order_document::{
    Column as OrderDocumentColumn, Entity as OrderDocument, Model as OrderDocumentModel,
};
pub use product_document::{
    Column as ProductDocumentColumn, Entity as ProductDocument, Model as ProductDocumentModel,
};
