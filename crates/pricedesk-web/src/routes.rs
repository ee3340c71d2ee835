use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use pricedesk_core::{
    AssetKind, AssetPrice, Symbol, UtcDateTime, DEFAULT_HISTORY_DAYS,
};
use pricedesk_store::{AssetRecord, AssetStore, NewPricePoint};

use crate::error::ApiError;
use crate::state::AppState;

/// Assemble the API router.
///
/// `/prices/bitcoin` is a static segment and wins over the dynamic
/// `/prices/:symbol` match.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/prices", get(all_prices))
        .route("/prices/bitcoin", get(bitcoin_overview))
        .route("/prices/:symbol", get(single_price))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /prices/:symbol: live quote for one registered asset, with a
/// non-blocking history append.
async fn single_price(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let symbol = Symbol::parse(&symbol)
        .map_err(|_| ApiError::NotFound(format!("Asset not found: {symbol}")))?;

    let asset = state
        .store
        .asset_by_symbol(&symbol)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Asset not found: {symbol}")))?;

    let price = state.prices.asset_price(&asset.symbol, asset.kind).await?;
    let timestamp = UtcDateTime::now();

    record_observation(state.store.clone(), &asset, price, timestamp);

    Ok(Json(price_entry(&asset, price, timestamp)))
}

/// GET /prices: concurrent fetch of every registered asset; failures are
/// counted and omitted, never fatal to the batch.
async fn all_prices(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let assets = state.store.assets().await?;
    if assets.is_empty() {
        return Ok(Json(json!({
            "message": "No assets registered",
            "prices": [],
        })));
    }

    let requests: Vec<(Symbol, AssetKind)> = assets
        .iter()
        .map(|asset| (asset.symbol.clone(), asset.kind))
        .collect();
    let results = state.prices.batch_prices(&requests).await;
    let timestamp = UtcDateTime::now();

    let mut prices = Vec::with_capacity(results.len());
    for (asset, result) in assets.iter().zip(results) {
        let Some(entry) = result else {
            continue;
        };

        record_observation(state.store.clone(), asset, entry.price, timestamp);
        prices.push(price_entry(asset, entry.price, timestamp));
    }

    let fetched = prices.len();
    Ok(Json(json!({
        "success": true,
        "total": assets.len(),
        "fetched": fetched,
        "failed": assets.len() - fetched,
        "prices": prices,
        "timestamp": timestamp,
    })))
}

/// GET /prices/bitcoin: current BTC quote joined with its 7-day chart.
async fn bitcoin_overview(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let bitcoin = Symbol::parse("BTC").expect("static symbol is valid");

    let (price, history) = tokio::join!(
        state.prices.asset_price(&bitcoin, AssetKind::Crypto),
        state
            .prices
            .asset_history(&bitcoin, AssetKind::Crypto, DEFAULT_HISTORY_DAYS),
    );
    let price = price?;
    let history = history?;

    let chart_data: Vec<Value> = history
        .iter()
        .map(|point| {
            json!({
                "timestamp": point.timestamp.unix_millis(),
                "price": point.price_jpy,
            })
        })
        .collect();

    Ok(Json(json!({
        "currentPrice": {
            "usd": price.price_usd,
            "jpy": price.price_jpy,
            "change_24h": price.change_24h,
        },
        "chartData": chart_data,
    })))
}

fn price_entry(asset: &AssetRecord, price: AssetPrice, timestamp: UtcDateTime) -> Value {
    json!({
        "symbol": asset.symbol,
        "name": asset.name,
        "type": asset.kind,
        "price_usd": price.price_usd,
        "price_jpy": price.price_jpy,
        "change_24h": price.change_24h,
        "timestamp": timestamp,
    })
}

/// Append the observation without blocking the response; a failed write is
/// logged and otherwise dropped.
fn record_observation(
    store: Arc<dyn AssetStore>,
    asset: &AssetRecord,
    price: AssetPrice,
    timestamp: UtcDateTime,
) {
    let point = NewPricePoint {
        asset_id: asset.id.clone(),
        price_usd: price.price_usd,
        price_jpy: price.price_jpy,
        volume: None,
        timestamp,
    };
    let symbol = asset.symbol.clone();

    tokio::spawn(async move {
        if let Err(error) = store.add_price_point(point).await {
            tracing::error!(%symbol, %error, "failed to persist price history");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use pricedesk_core::{
        AlphaVantageAdapter, CoinGeckoAdapter, FixedRateSource, HttpClient, HttpResponse,
        PriceService, SlidingWindowLimiter, StubHttpClient,
    };
    use pricedesk_store::{MemoryStore, NewAsset};

    const BTC_BODY: &str = r#"{"bitcoin":{"usd":65000.0,"jpy":9750000.0,"usd_24h_change":1.2}}"#;

    fn service_with(stub: StubHttpClient) -> PriceService {
        let http: Arc<dyn HttpClient> = Arc::new(stub);
        PriceService::new(
            CoinGeckoAdapter::new(http.clone(), None),
            AlphaVantageAdapter::new(
                http,
                Some(String::from("test-key")),
                SlidingWindowLimiter::new(),
            ),
            Arc::new(FixedRateSource::default()),
        )
    }

    async fn seeded_state(stub: StubHttpClient) -> Arc<AppState> {
        let store = Arc::new(MemoryStore::new());
        store
            .create_asset(NewAsset {
                symbol: Symbol::parse("BTC").expect("valid symbol"),
                name: String::from("Bitcoin"),
                kind: AssetKind::Crypto,
            })
            .await
            .expect("seed asset");

        Arc::new(AppState {
            prices: service_with(stub),
            store,
        })
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
        let app = api_router().with_state(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("handler runs");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let value = serde_json::from_slice(&bytes).expect("body is json");
        (status, value)
    }

    #[tokio::test]
    async fn unknown_symbol_is_404() {
        let state = seeded_state(StubHttpClient::new()).await;
        let (status, body) = get_json(state, "/prices/DOGE").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Asset not found: DOGE");
    }

    #[tokio::test]
    async fn single_price_returns_canonical_shape_and_persists_history() {
        let stub =
            StubHttpClient::new().with_response("simple/price", HttpResponse::ok_json(BTC_BODY));
        let state = seeded_state(stub).await;
        let store = state.store.clone();

        let (status, body) = get_json(state, "/prices/btc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "BTC");
        assert_eq!(body["type"], "crypto");
        assert_eq!(body["price_usd"], 65_000.0);
        assert_eq!(body["price_jpy"], 9_750_000.0);
        assert_eq!(body["change_24h"], 1.2);

        // The write is spawned; yield until it lands.
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
        let assets = store.assets().await.expect("assets");
        let history = store
            .price_history(&assets[0].id, None)
            .await
            .expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price_usd, 65_000.0);
    }

    #[tokio::test]
    async fn fetch_failure_maps_to_500_with_details() {
        let stub = StubHttpClient::new().with_response(
            "simple/price",
            HttpResponse {
                status: 503,
                body: String::from("upstream down"),
            },
        );
        let state = seeded_state(stub).await;

        let (status, body) = get_json(state, "/prices/BTC").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch price");
        assert!(body["details"].as_str().expect("details").contains("503"));
    }

    #[tokio::test]
    async fn batch_reports_counts_and_omits_failures() {
        let stub =
            StubHttpClient::new().with_response("simple/price", HttpResponse::ok_json(BTC_BODY));
        let state = seeded_state(stub).await;
        state
            .store
            .create_asset(NewAsset {
                symbol: Symbol::parse("AAPL").expect("valid symbol"),
                name: String::from("Apple Inc."),
                kind: AssetKind::Stock,
            })
            .await
            .expect("seed stock");

        let (status, body) = get_json(state, "/prices").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["total"], 2);
        assert_eq!(body["fetched"], 1);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["prices"].as_array().expect("prices array").len(), 1);
    }

    #[tokio::test]
    async fn empty_store_returns_message_not_error() {
        let state = Arc::new(AppState {
            prices: service_with(StubHttpClient::new()),
            store: Arc::new(MemoryStore::new()),
        });

        let (status, body) = get_json(state, "/prices").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prices"].as_array().expect("prices array").len(), 0);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn bitcoin_overview_combines_quote_and_chart() {
        let stub = StubHttpClient::new()
            .with_response("simple/price", HttpResponse::ok_json(BTC_BODY))
            .with_response(
                "market_chart",
                HttpResponse::ok_json(
                    r#"{"prices":[[1704067200000,42000.0],[1704153600000,43000.0]]}"#,
                ),
            );
        let state = seeded_state(stub).await;

        let (status, body) = get_json(state, "/prices/bitcoin").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentPrice"]["usd"], 65_000.0);
        let chart = body["chartData"].as_array().expect("chart array");
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0]["timestamp"], 1_704_067_200_000_i64);
    }
}
