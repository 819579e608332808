//! Axum HTTP server: router, API-key middleware, handlers, graceful shutdown.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::MatchCache;
use crate::compare;
use crate::competitors::Competitor;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{CompareRequest, CompareResponse, MAX_LIMIT};
use crate::vtex::client::VtexClient;

const API_KEY_HEADER: &str = "x-api-key";

/// One HTTP client per storefront, so cookies and pacing are kept separate.
pub struct Clients {
    tata: VtexClient,
    eldorado: VtexClient,
    elclon: VtexClient,
    mily: VtexClient,
}

impl Clients {
    fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            tata: VtexClient::new(config, config.bases.get(Competitor::Tata))?,
            eldorado: VtexClient::new(config, config.bases.get(Competitor::ElDorado))?,
            elclon: VtexClient::new(config, config.bases.get(Competitor::ElClon))?,
            mily: VtexClient::new(config, config.bases.get(Competitor::Mily))?,
        })
    }

    pub fn get(&self, competitor: Competitor) -> &VtexClient {
        match competitor {
            Competitor::Tata => &self.tata,
            Competitor::ElDorado => &self.eldorado,
            Competitor::ElClon => &self.elclon,
            Competitor::Mily => &self.mily,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub clients: Arc<Clients>,
    pub cache: Arc<MatchCache>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let clients = Clients::new(&config)?;
        let cache = MatchCache::new(std::time::Duration::from_secs(config.cache_ttl_secs));

        Ok(Self {
            config: Arc::new(config),
            clients: Arc::new(clients),
            cache: Arc::new(cache),
        })
    }
}

/// Builds the application router. The comparison endpoint sits behind the
/// API-key check; the status endpoint does not.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/compare", post(handle_compare))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/", get(handle_status))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build and run the HTTP server.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let listen_addr = state.config.listen_address.clone();
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "comparador listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("comparador shut down gracefully");
    Ok(())
}

/// Rejects requests whose `x-api-key` header does not match the configured
/// secret. Runs before body parsing, so a bad key is a 401 no matter what
/// the payload looks like.
async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.api_key.as_deref() else {
        return Err(ApiError::Unauthorized);
    };

    let provided =
        request.headers().get(API_KEY_HEADER).and_then(|value| value.to_str().ok());

    if provided != Some(expected) {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// `POST /compare`: look up a window of items on one competitor's storefront.
async fn handle_compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, ApiError> {
    if request.limit == 0 || request.limit > MAX_LIMIT {
        return Err(ApiError::InvalidRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let competitor: Competitor = request.competitor.parse()?;
    let client = state.clients.get(competitor);

    tracing::info!(
        competitor = %competitor,
        items = request.items.len(),
        offset = request.offset,
        limit = request.limit,
        "Comparing items"
    );

    let results = compare::compare_items(
        client,
        &state.cache,
        competitor,
        &request.items,
        request.offset,
        request.limit,
    )
    .await?;

    tracing::info!(competitor = %competitor, count = results.len(), "Comparison complete");

    Ok(Json(CompareResponse::new(
        &request.competitor,
        request.store,
        request.offset,
        request.limit,
        results,
    )))
}

/// `GET /`: unauthenticated status document with the configured storefronts.
async fn handle_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);

    Json(serde_json::json!({
        "status": "ok",
        "service": "comparador",
        "bases": state.config.bases,
        "ts": ts,
    }))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install shutdown signal handler");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
