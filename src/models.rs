//! Request and response wire types for the comparison endpoint.

use serde::{Deserialize, Serialize};

/// Hard cap on the pagination limit accepted per call.
pub const MAX_LIMIT: usize = 300;

/// Default pagination limit when the request leaves it unset.
pub const DEFAULT_LIMIT: usize = 50;

/// Body of `POST /compare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    /// Competitor key (tata | eldorado | elclon | mily)
    pub competitor: String,
    /// Branch hint, e.g. "Durazno" (best-effort, echoed back)
    pub store: String,
    /// Index of the first item to process
    #[serde(default)]
    pub offset: usize,
    /// Maximum number of items to process (1..=300)
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Item names to look up, in order; duplicates allowed
    #[serde(default)]
    pub items: Vec<String>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Per-item match outcome.
///
/// Existing Action configurations key off these exact strings, so they are
/// part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Sin stock")]
    OutOfStock,
    #[serde(rename = "No disponible")]
    NotAvailable,
}

/// Result for a single input item: a matched product or a non-match marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    /// The item name exactly as given in the request
    pub input: String,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "listPrice", default, skip_serializing_if = "Option::is_none")]
    pub list_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ItemResult {
    /// A priced match; availability decides between `OK` and `Sin stock`.
    pub fn matched(
        input: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        list_price: f64,
        url: Option<String>,
        available: bool,
    ) -> Self {
        Self {
            input: input.into(),
            status: if available { ItemStatus::Ok } else { ItemStatus::OutOfStock },
            name: Some(name.into()),
            price: Some(price),
            list_price: Some(list_price),
            url,
            notes: None,
        }
    }

    /// No candidate matched the item at all.
    pub fn not_found(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            status: ItemStatus::NotAvailable,
            name: None,
            price: None,
            list_price: None,
            url: None,
            notes: Some("Sin coincidencias".to_string()),
        }
    }

    /// A candidate matched but carried no price.
    pub fn unpriced(input: impl Into<String>, name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            input: input.into(),
            status: ItemStatus::NotAvailable,
            name: Some(name.into()),
            price: None,
            list_price: None,
            url,
            notes: Some("Sin precio".to_string()),
        }
    }
}

/// Body of a successful `POST /compare` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResponse {
    /// Competitor key, echoed back uppercased
    pub competitor: String,
    pub store: String,
    pub offset: usize,
    pub limit: usize,
    /// Number of entries in `results`
    pub count: usize,
    pub results: Vec<ItemResult>,
}

impl CompareResponse {
    /// Assembles a response, deriving `count` from the results.
    pub fn new(
        competitor: &str,
        store: impl Into<String>,
        offset: usize,
        limit: usize,
        results: Vec<ItemResult>,
    ) -> Self {
        Self {
            competitor: competitor.to_uppercase(),
            store: store.into(),
            offset,
            limit,
            count: results.len(),
            results,
        }
    }
}
