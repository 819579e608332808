//! Text normalization, query generation, and candidate scoring for grocery
//! item matching.
//!
//! Input items are free-form Spanish grocery names ("ARROZ 0000 1KG"), and
//! catalog names rarely match them verbatim. Matching works on normalized
//! token overlap plus brand and package-size signals.

use crate::vtex::models::VtexProduct;
use regex_lite::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Mass sizes, captured as "(number)(kg|g|gr)" with optional whitespace.
static MASS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(kg|gr|g)").unwrap());

/// Volume sizes, captured as "(number)(ml|l)".
static VOLUME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(ml|l)").unwrap());

/// A bare size token like "1kg" or "500 ml", noise on its own.
static SIZE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s*(kg|gr|g|ml|l)$").unwrap());

/// Multiplier tokens like "x6".
static MULTIPLIER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^x\d+$").unwrap());

/// Spanish function words that carry no matching signal.
const STOPWORDS: &[&str] = &[
    "de", "la", "el", "los", "las", "un", "una", "con", "en", "a", "y", "x", "sin", "al", "por",
    "para", "del",
];

/// Packaging descriptors that vary freely between catalogs.
const PACKAGING: &[&str] = &["pack", "pct", "bolsa", "frasco", "bot", "pet", "unidad", "un"];

/// Local and regional grocery brands worth a scoring bonus when both sides
/// mention them.
const BRANDS: &[&str] = &[
    "emigrante", "shiva", "maggi", "knorr", "costa", "cololo", "cocinero", "alco", "himalaya",
    "bella", "union", "bella union", "arcor", "nativa", "yerba", "delicias", "cimarron",
    "marolio", "adonis", "san remo",
];

/// Score at which a candidate is considered a confident match and the
/// remaining query attempts are skipped.
pub const EARLY_EXIT_SCORE: i32 = 3;

/// Lowercases, folds Spanish accents, replaces non-alphanumerics with spaces,
/// and collapses whitespace.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .map(fold_accent)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        _ => c,
    }
}

/// Extracts package sizes from normalized text as (grams, milliliters).
pub fn extract_sizes(text: &str) -> (BTreeSet<u32>, BTreeSet<u32>) {
    let mut masses = BTreeSet::new();
    for captures in MASS_RE.captures_iter(text) {
        let (Some(number), Some(unit)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let Ok(value) = number.as_str().parse::<u32>() else {
            continue;
        };
        let grams = if unit.as_str() == "kg" { value.saturating_mul(1000) } else { value };
        masses.insert(grams);
    }

    let mut volumes = BTreeSet::new();
    for captures in VOLUME_RE.captures_iter(text) {
        let (Some(number), Some(unit)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let Ok(value) = number.as_str().parse::<u32>() else {
            continue;
        };
        let ml = if unit.as_str() == "l" { value.saturating_mul(1000) } else { value };
        volumes.insert(ml);
    }

    (masses, volumes)
}

/// True for tokens that should not drive a catalog search: stopwords,
/// bare sizes, multipliers, and packaging descriptors.
pub fn is_noise(token: &str) -> bool {
    STOPWORDS.contains(&token)
        || PACKAGING.contains(&token)
        || SIZE_TOKEN_RE.is_match(token)
        || MULTIPLIER_RE.is_match(token)
}

fn is_brand(token: &str) -> bool {
    BRANDS.contains(&token)
}

/// Builds the ordered list of search queries to attempt for an item, from
/// most to least specific. Deduplicated, preserving first occurrence.
pub fn build_tries(item: &str) -> Vec<String> {
    let normalized = normalize(item);
    let mut tokens: Vec<&str> = normalized.split_whitespace().collect();

    // "0000" is a flour grade; outside a flour item it is catalog noise
    if tokens.contains(&"0000") && !tokens.contains(&"harina") {
        tokens.retain(|t| *t != "0000");
    }

    let clean: Vec<&str> = tokens.iter().copied().filter(|t| !is_noise(t)).collect();

    let mut tries: Vec<String> = Vec::new();
    let push = |query: String, tries: &mut Vec<String>| {
        if !query.is_empty() && !tries.contains(&query) {
            tries.push(query);
        }
    };

    push(tokens.join(" "), &mut tries);
    push(clean.join(" "), &mut tries);

    if clean.len() >= 2 {
        push(clean[..2].join(" "), &mut tries);
        push(format!("{} {}", clean[1], clean[0]), &mut tries);
    }

    if let Some(brand) = clean.iter().find(|t| is_brand(t)) {
        push((*brand).to_string(), &mut tries);
    }

    for token in &clean {
        if token.len() >= 4 {
            push((*token).to_string(), &mut tries);
        }
    }

    tries
}

/// The signals extracted once from an input item, reused to score every
/// candidate the searches return.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    tokens: Vec<String>,
    masses: BTreeSet<u32>,
    volumes: BTreeSet<u32>,
    has_brand: bool,
}

impl MatchQuery {
    pub fn new(item: &str) -> Self {
        let normalized = normalize(item);
        let tokens: Vec<String> =
            normalized.split_whitespace().map(str::to_string).collect();
        let (masses, volumes) = extract_sizes(&normalized);
        let has_brand = tokens.iter().any(|t| is_brand(t));

        Self { tokens, masses, volumes, has_brand }
    }
}

/// Scores a candidate against the query signals: +1 per query token found in
/// the candidate name, +2 for a shared brand, +2 / +1 for a package size
/// within 10% / 20% of the requested one.
pub fn score(product: &VtexProduct, query: &MatchQuery) -> i32 {
    let name = normalize(&format!("{} {}", product.product_name, product.link_text));

    let mut total = 0;
    for token in &query.tokens {
        if name.contains(token.as_str()) {
            total += 1;
        }
    }

    if query.has_brand && BRANDS.iter().any(|b| name.contains(b)) {
        total += 2;
    }

    let (masses, volumes) = extract_sizes(&name);
    total += size_proximity(&query.masses, &masses);
    total += size_proximity(&query.volumes, &volumes);

    total
}

/// Proximity bonus between requested and candidate sizes, relative to the
/// smallest requested size.
fn size_proximity(wanted: &BTreeSet<u32>, found: &BTreeSet<u32>) -> i32 {
    let Some(&reference) = wanted.first() else {
        return 0;
    };
    if reference == 0 || found.is_empty() {
        return 0;
    }

    let mut best_diff = u32::MAX;
    for &w in wanted {
        for &f in found {
            best_diff = best_diff.min(w.abs_diff(f));
        }
    }

    let ratio = f64::from(best_diff) / f64::from(reference);
    if ratio <= 0.10 {
        2
    } else if ratio <= 0.20 {
        1
    } else {
        0
    }
}
