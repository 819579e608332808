//! The comparison pipeline: window the requested items, find the best
//! storefront match for each one, and map matches to wire results.

use crate::cache::MatchCache;
use crate::competitors::Competitor;
use crate::error::ApiError;
use crate::models::ItemResult;
use crate::vtex::client::StorefrontSearch;
use crate::vtex::matcher::{self, MatchQuery, EARLY_EXIT_SCORE};
use crate::vtex::models::VtexProduct;
use anyhow::Result;
use tracing::debug;

/// Looks up the `[offset, offset+limit)` window of `items` on a competitor's
/// storefront, in request order.
///
/// A window outside the item list is empty, not an error. Lookups run
/// sequentially so the pacing configured on the client applies across the
/// whole batch.
pub async fn compare_items(
    client: &impl StorefrontSearch,
    cache: &MatchCache,
    competitor: Competitor,
    items: &[String],
    offset: usize,
    limit: usize,
) -> Result<Vec<ItemResult>, ApiError> {
    let start = offset.min(items.len());
    let end = start.saturating_add(limit).min(items.len());

    let mut results = Vec::with_capacity(end - start);
    for item in &items[start..end] {
        let best = best_match(client, cache, competitor, item).await.map_err(ApiError::Upstream)?;
        results.push(to_result(client.base_url(), item, best));
    }

    Ok(results)
}

/// Finds the best-scoring product for one item, trying progressively looser
/// queries and stopping early once a candidate scores confidently.
///
/// The outcome, including "nothing matched", is cached per competitor.
pub async fn best_match(
    client: &impl StorefrontSearch,
    cache: &MatchCache,
    competitor: Competitor,
    item: &str,
) -> Result<Option<VtexProduct>> {
    let key = MatchCache::key(competitor, item);
    if let Some(cached) = cache.get(&key) {
        debug!("Cache hit for '{}'", item);
        return Ok(cached);
    }

    let query = MatchQuery::new(item);
    let mut best: Option<(VtexProduct, i32)> = None;

    for attempt in matcher::build_tries(item) {
        let products = client.search(&attempt).await?;

        for product in products {
            let score = matcher::score(&product, &query);
            if best.as_ref().map_or(true, |(_, top)| score > *top) {
                best = Some((product, score));
            }
        }

        if let Some((_, top)) = &best {
            if *top >= EARLY_EXIT_SCORE {
                debug!("Early exit for '{}' at score {}", item, top);
                break;
            }
        }
    }

    let outcome = best.map(|(product, _)| product);
    cache.insert(key, outcome.clone());
    Ok(outcome)
}

fn to_result(base_url: &str, input: &str, best: Option<VtexProduct>) -> ItemResult {
    let Some(product) = best else {
        return ItemResult::not_found(input);
    };

    let name = product.display_name();
    let url = product.pdp_url(base_url);

    match product.offer() {
        Some(offer) => {
            ItemResult::matched(input, name, offer.price, offer.list_price, url, offer.available)
        }
        None => ItemResult::unpriced(input, name, url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Mock storefront returning a fixed product list for every query.
    struct MockStorefront {
        products: Vec<VtexProduct>,
        should_fail: bool,
        calls: AtomicUsize,
    }

    impl MockStorefront {
        fn with_products(products: Vec<VtexProduct>) -> Self {
            Self { products, should_fail: false, calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { products: Vec::new(), should_fail: true, calls: AtomicUsize::new(0) }
        }

        fn empty() -> Self {
            Self::with_products(Vec::new())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StorefrontSearch for MockStorefront {
        async fn search(&self, _query: &str) -> Result<Vec<VtexProduct>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                anyhow::bail!("connection refused");
            }
            Ok(self.products.clone())
        }

        fn base_url(&self) -> &str {
            "http://storefront.test"
        }
    }

    fn cache() -> MatchCache {
        MatchCache::new(Duration::from_secs(60))
    }

    fn arroz() -> VtexProduct {
        VtexProduct::synthetic("arroz-blanco-1-kg", "Arroz Blanco 1 kg", Some(78.0))
    }

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_match_found_ok() {
        let client = MockStorefront::with_products(vec![arroz()]);
        let cache = cache();

        let results =
            compare_items(&client, &cache, Competitor::Tata, &items(&["ARROZ 1KG"]), 0, 50)
                .await
                .unwrap();

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.input, "ARROZ 1KG");
        assert_eq!(result.status, ItemStatus::Ok);
        assert_eq!(result.name.as_deref(), Some("Arroz Blanco 1 kg"));
        assert_eq!(result.price, Some(78.0));
        assert_eq!(
            result.url.as_deref(),
            Some("http://storefront.test/arroz-blanco-1-kg/p")
        );
    }

    #[tokio::test]
    async fn test_match_out_of_stock() {
        let mut product = arroz();
        if let Some(offer) = &mut product.items[0].sellers[0].commertial_offer {
            offer.is_available = false;
        }
        let client = MockStorefront::with_products(vec![product]);
        let cache = cache();

        let results =
            compare_items(&client, &cache, Competitor::Tata, &items(&["ARROZ 1KG"]), 0, 50)
                .await
                .unwrap();

        assert_eq!(results[0].status, ItemStatus::OutOfStock);
        assert_eq!(results[0].price, Some(78.0));
    }

    #[tokio::test]
    async fn test_match_without_price() {
        let product = VtexProduct::synthetic("arroz-blanco-1-kg", "Arroz Blanco 1 kg", None);
        let client = MockStorefront::with_products(vec![product]);
        let cache = cache();

        let results =
            compare_items(&client, &cache, Competitor::Tata, &items(&["ARROZ 1KG"]), 0, 50)
                .await
                .unwrap();

        assert_eq!(results[0].status, ItemStatus::NotAvailable);
        assert_eq!(results[0].name.as_deref(), Some("Arroz Blanco 1 kg"));
        assert_eq!(results[0].notes.as_deref(), Some("Sin precio"));
    }

    #[tokio::test]
    async fn test_no_candidates_anywhere() {
        let client = MockStorefront::empty();
        let cache = cache();

        let results =
            compare_items(&client, &cache, Competitor::Tata, &items(&["ARROZ 1KG"]), 0, 50)
                .await
                .unwrap();

        assert_eq!(results[0].status, ItemStatus::NotAvailable);
        assert_eq!(results[0].notes.as_deref(), Some("Sin coincidencias"));
        // "ARROZ 1KG" generates two query attempts, both searched
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_api_error() {
        let client = MockStorefront::failing();
        let cache = cache();

        let result =
            compare_items(&client, &cache, Competitor::Tata, &items(&["ARROZ 1KG"]), 0, 50).await;

        assert!(matches!(result, Err(ApiError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_early_exit_skips_remaining_tries() {
        // The fixture scores 3 (token + exact size) on the first attempt
        let client = MockStorefront::with_products(vec![arroz()]);
        let cache = cache();

        best_match(&client, &cache, Competitor::Tata, "ARROZ 1KG").await.unwrap();
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_prevents_repeat_lookups() {
        let client = MockStorefront::with_products(vec![arroz()]);
        let cache = cache();

        let first =
            compare_items(&client, &cache, Competitor::Tata, &items(&["ARROZ 1KG"]), 0, 50)
                .await
                .unwrap();
        let calls_after_first = client.calls();

        let second =
            compare_items(&client, &cache, Competitor::Tata, &items(&["arroz 1kg"]), 0, 50)
                .await
                .unwrap();

        // Second run is served from cache, including the normalized-spelling variant
        assert_eq!(client.calls(), calls_after_first);
        assert_eq!(first[0].name, second[0].name);
    }

    #[tokio::test]
    async fn test_negative_outcome_cached() {
        let client = MockStorefront::empty();
        let cache = cache();

        best_match(&client, &cache, Competitor::Tata, "INEXISTENTE").await.unwrap();
        let calls_after_first = client.calls();

        let cached = best_match(&client, &cache, Competitor::Tata, "INEXISTENTE").await.unwrap();
        assert!(cached.is_none());
        assert_eq!(client.calls(), calls_after_first);
    }

    #[tokio::test]
    async fn test_best_scoring_candidate_wins() {
        let client = MockStorefront::with_products(vec![
            VtexProduct::synthetic("arroz-blanco-5-kg", "Arroz Blanco 5 kg", Some(300.0)),
            VtexProduct::synthetic("arroz-blanco-1-kg", "Arroz Blanco 1 kg", Some(78.0)),
        ]);
        let cache = cache();

        let best = best_match(&client, &cache, Competitor::Tata, "ARROZ 1KG").await.unwrap();
        assert_eq!(best.unwrap().link_text, "arroz-blanco-1-kg");
    }

    #[tokio::test]
    async fn test_windowing() {
        let client = MockStorefront::empty();
        let cache = cache();
        let all = items(&["A", "B", "C", "D"]);

        let results =
            compare_items(&client, &cache, Competitor::Tata, &all, 1, 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].input, "B");
        assert_eq!(results[1].input, "C");

        // Limit past the end is clamped
        let results =
            compare_items(&client, &cache, Competitor::Tata, &all, 3, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].input, "D");

        // Offset past the end yields an empty result set
        let results =
            compare_items(&client, &cache, Competitor::Tata, &all, 10, 10).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_results_preserve_request_order() {
        let client = MockStorefront::empty();
        let cache = cache();
        let all = items(&["ZETA", "ALFA", "ZETA"]);

        let results =
            compare_items(&client, &cache, Competitor::Tata, &all, 0, 50).await.unwrap();
        let inputs: Vec<&str> = results.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(inputs, vec!["ZETA", "ALFA", "ZETA"]);
    }
}
