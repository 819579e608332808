//! comparador - Batch price-comparison API for Uruguayan VTEX storefronts
//!
//! Takes a list of grocery item names over HTTP, looks each one up on a
//! competitor supermarket's VTEX storefront, and answers with per-item price
//! matches. Built to back a conversational assistant Action, so the wire
//! format stays small and stable.

pub mod cache;
pub mod compare;
pub mod competitors;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod vtex;

pub use competitors::Competitor;
pub use config::Config;
pub use models::{CompareRequest, CompareResponse, ItemResult, ItemStatus};
