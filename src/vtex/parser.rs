//! Server-side-rendered `/busca` page parsing, used when the catalog JSON
//! API returns nothing.

use crate::vtex::matcher::normalize;
use crate::vtex::models::VtexProduct;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

/// CSS selectors for VTEX search result pages.
mod selectors {
    use super::*;

    /// Product detail links always end in "/p" on VTEX storefronts
    pub static PRODUCT_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[href$='/p']").unwrap());
}

/// A peso amount like "$ 1.234,56" in rendered text.
static PRICE_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([0-9][0-9.,]*)").unwrap());

/// How many ancestors of a product link to scan for a rendered price. Result
/// cards keep the price within a couple of wrapper divs of the link.
const PRICE_SEARCH_DEPTH: usize = 3;

/// Extracts product records from a rendered search page.
///
/// Names are guessed from the link slug and prices scraped from the
/// surrounding card, so records from this path are less precise than
/// catalog API ones. Duplicate slugs are collapsed.
pub fn parse_search_page(html: &str) -> Vec<VtexProduct> {
    let document = Html::parse_document(html);
    let mut seen: HashSet<String> = HashSet::new();
    let mut products = Vec::new();

    for anchor in document.select(&selectors::PRODUCT_LINK) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(slug) = slug_from_href(href) else {
            continue;
        };
        if !seen.insert(slug.to_string()) {
            continue;
        }

        let name = normalize(slug);
        let price = price_near(anchor);
        products.push(VtexProduct::synthetic(slug, name, price));
    }

    products
}

/// First path segment of a product link, e.g.
/// "/arroz-blanco-1-kg/p" -> "arroz-blanco-1-kg".
fn slug_from_href(href: &str) -> Option<&str> {
    let path = match href.find("://") {
        Some(idx) => {
            let after_scheme = &href[idx + 3..];
            match after_scheme.find('/') {
                Some(slash) => &after_scheme[slash..],
                None => return None,
            }
        }
        None => href,
    };

    let slug = path.trim_matches('/').split('/').next()?;
    if slug.is_empty() || slug == "p" {
        return None;
    }
    Some(slug)
}

/// Scans the link text and a few enclosing elements for a rendered price.
fn price_near(anchor: ElementRef) -> Option<f64> {
    let own_text: String = anchor.text().collect();
    if let Some(price) = price_in_text(&own_text) {
        return Some(price);
    }

    for node in anchor.ancestors().take(PRICE_SEARCH_DEPTH) {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let text: String = element.text().collect();
        if let Some(price) = price_in_text(&text) {
            return Some(price);
        }
    }

    None
}

fn price_in_text(text: &str) -> Option<f64> {
    let captures = PRICE_TEXT_RE.captures(text)?;
    parse_price(captures.get(1)?.as_str())
}

/// Parses a localized price string into a float.
///
/// Uruguayan storefronts render "1.234,56", but catalog data occasionally
/// carries "1,234.56"; the last separator decides which one is the decimal
/// mark.
pub fn parse_price(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',').collect();
    if digits.is_empty() {
        return None;
    }

    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => {
            // "1.234,56": dots group thousands, comma is decimal
            digits.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => {
            // "1,234.56"
            digits.replace(',', "")
        }
        (None, Some(_)) => digits.replace(',', "."),
        _ => digits,
    };

    normalized.parse::<f64>().ok()
}
