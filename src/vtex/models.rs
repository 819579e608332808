//! Data models for VTEX catalog search responses.

use crate::vtex::matcher::normalize;
use serde::{Deserialize, Serialize};

/// A product record from the VTEX catalog search API.
///
/// Only the fields the comparison pipeline needs are mapped; the catalog
/// returns many more, which serde ignores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VtexProduct {
    #[serde(rename = "productName", default)]
    pub product_name: String,
    /// URL slug of the product detail page
    #[serde(rename = "linkText", default)]
    pub link_text: String,
    #[serde(default)]
    pub items: Vec<VtexItem>,
}

/// An SKU entry within a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VtexItem {
    #[serde(default)]
    pub sellers: Vec<VtexSeller>,
}

/// A seller entry within an SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VtexSeller {
    /// VTEX's historical field spelling, kept as-is on the wire
    #[serde(rename = "commertialOffer", default)]
    pub commertial_offer: Option<VtexOffer>,
}

/// Pricing data for a seller's offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VtexOffer {
    #[serde(rename = "Price", default)]
    pub price: Option<f64>,
    #[serde(rename = "ListPrice", default)]
    pub list_price: Option<f64>,
    #[serde(rename = "IsAvailable", default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// The extracted pricing for a product: first seller offer carrying a price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offer {
    pub price: f64,
    pub list_price: f64,
    pub available: bool,
}

impl VtexProduct {
    /// Builds a catalog-shaped record from SSR scraping output, so both
    /// cascade stages feed the same downstream pipeline.
    pub fn synthetic(slug: impl Into<String>, name: impl Into<String>, price: Option<f64>) -> Self {
        Self {
            product_name: name.into(),
            link_text: slug.into(),
            items: vec![VtexItem {
                sellers: vec![VtexSeller {
                    commertial_offer: Some(VtexOffer {
                        price,
                        list_price: price,
                        is_available: true,
                    }),
                }],
            }],
        }
    }

    /// Returns the first seller offer that carries a price.
    pub fn offer(&self) -> Option<Offer> {
        for item in &self.items {
            for seller in &item.sellers {
                let Some(offer) = &seller.commertial_offer else {
                    continue;
                };
                if let Some(price) = offer.price {
                    return Some(Offer {
                        price,
                        list_price: offer.list_price.unwrap_or(price),
                        available: offer.is_available,
                    });
                }
            }
        }
        None
    }

    /// Human-readable product name, falling back to the slug.
    pub fn display_name(&self) -> String {
        let name = self.product_name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        normalize(&self.link_text)
    }

    /// Product detail page URL: `{base}/{slug}/p`.
    pub fn pdp_url(&self, base: &str) -> Option<String> {
        let slug = self.link_text.trim_matches('/');
        if slug.is_empty() {
            return None;
        }
        Some(format!("{}/{}/p", base.trim_end_matches('/'), slug))
    }
}
