//! VTEX storefront integration: search client, page parsing, and item
//! matching. Every supported competitor runs VTEX, so this one module tree
//! covers all of them.

pub mod client;
pub mod matcher;
pub mod models;
pub mod parser;

pub use client::{StorefrontSearch, VtexClient};
pub use models::{Offer, VtexProduct};
