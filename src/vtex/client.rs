//! HTTP client for VTEX storefronts using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::vtex::models::VtexProduct;
use crate::vtex::parser;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Trait for storefront product search - enables mocking for tests.
#[async_trait]
pub trait StorefrontSearch: Send + Sync {
    /// Runs the full search cascade for a query. Returns an empty vec when
    /// the storefront answered but had no results; errors only when it never
    /// answered at all.
    async fn search(&self, query: &str) -> Result<Vec<VtexProduct>>;

    /// Storefront base URL, used to build product page links.
    fn base_url(&self) -> &str;
}

/// HTTP client for one VTEX storefront, with browser impersonation and
/// request pacing.
pub struct VtexClient {
    client: Client,
    base_url: String,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl VtexClient {
    /// Creates a client for the given storefront base URL.
    pub fn new(config: &Config, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Performs a GET request with browser emulation.
    async fn get(&self, url: &str) -> Result<wreq::Response> {
        self.delay().await;

        debug!("GET {}", url);

        self.client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "application/json, text/html;q=0.9, */*;q=0.8")
            .header("Accept-Language", "es-UY,es;q=0.9")
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))
    }

    /// Adds a random delay between upstream requests.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl StorefrontSearch for VtexClient {
    /// Search cascade: the catalog JSON API in its two URL shapes, then the
    /// server-rendered `/busca` page. Any HTTP answer counts as the
    /// storefront being reachable; only transport failures across every
    /// stage surface as an error.
    async fn search(&self, query: &str) -> Result<Vec<VtexProduct>> {
        let encoded = urlencoding::encode(query);
        let mut reachable = false;
        let mut last_error: Option<anyhow::Error> = None;

        let catalog_urls = [
            format!(
                "{}/api/catalog_system/pub/products/search?ft={}&_from=0&_to=99&O=OrderByScoreDESC",
                self.base_url, encoded
            ),
            format!(
                "{}/api/catalog_system/pub/products/search/{}?_from=0&_to=99&O=OrderByScoreDESC",
                self.base_url, encoded
            ),
        ];

        for url in &catalog_urls {
            let response = match self.get(url).await {
                Ok(response) => response,
                Err(err) => {
                    warn!("Catalog request failed: {:#}", err);
                    last_error = Some(err);
                    continue;
                }
            };
            reachable = true;

            let status = response.status();
            if !status.is_success() {
                debug!("Catalog returned status {}, trying next stage", status);
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    warn!("Failed to read catalog response: {:#}", err);
                    last_error = Some(err.into());
                    continue;
                }
            };

            match serde_json::from_str::<Vec<VtexProduct>>(&body) {
                Ok(products) if !products.is_empty() => {
                    debug!("Catalog returned {} products for '{}'", products.len(), query);
                    return Ok(products);
                }
                Ok(_) => {}
                Err(err) => debug!("Catalog response was not a product list: {}", err),
            }
        }

        let busca_urls = [
            format!("{}/busca?ft={}&O=OrderByScoreDESC", self.base_url, encoded),
            format!("{}/busca?ft={}", self.base_url, encoded),
        ];

        for url in &busca_urls {
            let response = match self.get(url).await {
                Ok(response) => response,
                Err(err) => {
                    warn!("Search page request failed: {:#}", err);
                    last_error = Some(err);
                    continue;
                }
            };
            reachable = true;

            if !response.status().is_success() {
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    last_error = Some(err.into());
                    continue;
                }
            };

            let products = parser::parse_search_page(&body);
            if !products.is_empty() {
                debug!("Search page yielded {} products for '{}'", products.len(), query);
                return Ok(products);
            }
        }

        if !reachable {
            if let Some(err) = last_error {
                return Err(err)
                    .with_context(|| format!("Storefront {} is unreachable", self.base_url));
            }
        }

        Ok(Vec::new())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
