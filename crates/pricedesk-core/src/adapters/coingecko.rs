use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::fx::{self, USD_JPY_FALLBACK};
use crate::http::{HttpClient, HttpRequest};
use crate::source::ProviderId;
use crate::{AssetPrice, FetchError, HistoryPoint, Symbol, UtcDateTime};

const API_BASE: &str = "https://api.coingecko.com/api/v3";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko quote adapter for crypto assets.
///
/// The provider quotes USD and JPY in one call, so the live path needs no
/// FX normalization. Runs without a key in the provider's anonymous mode.
#[derive(Clone)]
pub struct CoinGeckoAdapter {
    http: Arc<dyn HttpClient>,
    api_key: Option<String>,
}

impl CoinGeckoAdapter {
    pub fn new(http: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            tracing::warn!("coingecko api key is not set; using anonymous mode (rate-limited)");
        }
        Self { http, api_key }
    }

    /// Current USD/JPY price and 24h change for a crypto symbol.
    pub async fn price(&self, symbol: &Symbol) -> Result<AssetPrice, FetchError> {
        let coin_id = coin_id(symbol);
        let url = format!(
            "{API_BASE}/simple/price?ids={}&vs_currencies=usd,jpy&include_24hr_change=true",
            urlencoding::encode(&coin_id)
        );

        let body = self.execute(url).await?;
        let parsed: HashMap<String, SimplePriceEntry> =
            serde_json::from_str(&body).map_err(|e| decode(e.to_string()))?;

        let entry = parsed.get(&coin_id).ok_or_else(|| FetchError::DataNotFound {
            provider: ProviderId::CoinGecko,
            symbol: symbol.as_str().to_owned(),
        })?;

        Ok(AssetPrice::new(entry.usd, entry.jpy, entry.usd_24h_change)?)
    }

    /// Daily-or-finer USD price series for the trailing `days` days.
    ///
    /// JPY values are derived with the fixed fallback rate; unlike the live
    /// quote, this endpoint returns USD only and no historical FX source
    /// exists.
    pub async fn history(&self, symbol: &Symbol, days: u32) -> Result<Vec<HistoryPoint>, FetchError> {
        let coin_id = coin_id(symbol);
        let url = format!(
            "{API_BASE}/coins/{}/market_chart?vs_currency=usd&days={days}",
            urlencoding::encode(&coin_id)
        );

        let body = self.execute(url).await?;
        let parsed: MarketChartResponse =
            serde_json::from_str(&body).map_err(|e| decode(e.to_string()))?;

        let Some(prices) = parsed.prices else {
            return Err(FetchError::DataNotFound {
                provider: ProviderId::CoinGecko,
                symbol: symbol.as_str().to_owned(),
            });
        };

        let mut points = Vec::with_capacity(prices.len());
        for (millis, price_usd) in prices {
            let timestamp = UtcDateTime::from_unix_millis(millis)
                .map_err(|e| decode(format!("bad chart timestamp: {e}")))?;
            points.push(HistoryPoint {
                timestamp,
                price_usd,
                price_jpy: fx::usd_to_jpy(price_usd, USD_JPY_FALLBACK),
                volume: None,
            });
        }

        Ok(points)
    }

    async fn execute(&self, url: String) -> Result<String, FetchError> {
        let mut request = HttpRequest::get(url);
        if let Some(key) = &self.api_key {
            request = request.with_header(API_KEY_HEADER, key);
        }

        let response = self.http.get(request).await.map_err(|e| FetchError::Transport {
            provider: ProviderId::CoinGecko,
            message: e.message().to_owned(),
        })?;

        if !response.is_success() {
            return Err(FetchError::Provider {
                provider: ProviderId::CoinGecko,
                status: response.status,
                body: response.body,
            });
        }

        Ok(response.body)
    }
}

/// Map a ticker to the provider's canonical coin id. Unmapped symbols fall
/// back to the lowercased ticker, which works for coins whose id equals
/// their name.
fn coin_id(symbol: &Symbol) -> String {
    match symbol.as_str() {
        "BTC" => "bitcoin",
        "ETH" => "ethereum",
        "BNB" => "binancecoin",
        "XRP" => "ripple",
        "ADA" => "cardano",
        "DOGE" => "dogecoin",
        "SOL" => "solana",
        "DOT" => "polkadot",
        "MATIC" => "matic-network",
        "LINK" => "chainlink",
        other => return other.to_ascii_lowercase(),
    }
    .to_owned()
}

#[derive(Debug, Deserialize)]
struct SimplePriceEntry {
    usd: f64,
    jpy: f64,
    #[serde(default)]
    usd_24h_change: f64,
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Option<Vec<(i64, f64)>>,
}

fn decode(message: String) -> FetchError {
    FetchError::Decode {
        provider: ProviderId::CoinGecko,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, StubHttpClient};

    fn symbol(s: &str) -> Symbol {
        Symbol::parse(s).expect("valid symbol")
    }

    #[test]
    fn maps_known_symbols_and_lowercases_the_rest() {
        assert_eq!(coin_id(&symbol("BTC")), "bitcoin");
        assert_eq!(coin_id(&symbol("doge")), "dogecoin");
        assert_eq!(coin_id(&symbol("PEPE")), "pepe");
    }

    #[tokio::test]
    async fn price_parses_dual_currency_quote() {
        let stub = Arc::new(StubHttpClient::new().with_response(
            "simple/price?ids=bitcoin",
            HttpResponse::ok_json(
                r#"{"bitcoin":{"usd":65000.0,"jpy":9750000.0,"usd_24h_change":-1.4}}"#,
            ),
        ));
        let adapter = CoinGeckoAdapter::new(stub, None);

        let price = adapter.price(&symbol("BTC")).await.expect("quote parses");
        assert_eq!(price.price_usd, 65_000.0);
        assert_eq!(price.price_jpy, 9_750_000.0);
        assert_eq!(price.change_24h, -1.4);
    }

    #[tokio::test]
    async fn price_sends_api_key_header_when_configured() {
        let stub = Arc::new(StubHttpClient::new().with_response(
            "simple/price",
            HttpResponse::ok_json(r#"{"bitcoin":{"usd":1.0,"jpy":150.0,"usd_24h_change":0.0}}"#),
        ));
        let adapter = CoinGeckoAdapter::new(stub.clone(), Some(String::from("demo-key")));

        adapter.price(&symbol("BTC")).await.expect("quote parses");

        let requests = stub.recorded_requests();
        assert_eq!(
            requests[0].headers.get(API_KEY_HEADER).map(String::as_str),
            Some("demo-key")
        );
    }

    #[tokio::test]
    async fn missing_coin_entry_is_data_not_found() {
        let stub = Arc::new(
            StubHttpClient::new().with_response("simple/price", HttpResponse::ok_json("{}")),
        );
        let adapter = CoinGeckoAdapter::new(stub, None);

        let err = adapter.price(&symbol("NOPE")).await.expect_err("must fail");
        assert!(matches!(err, FetchError::DataNotFound { .. }));
    }

    #[tokio::test]
    async fn upstream_error_status_carries_status_and_body() {
        let stub = Arc::new(StubHttpClient::new().with_response(
            "simple/price",
            HttpResponse {
                status: 429,
                body: String::from("Throttled"),
            },
        ));
        let adapter = CoinGeckoAdapter::new(stub, None);

        let err = adapter.price(&symbol("BTC")).await.expect_err("must fail");
        match err {
            FetchError::Provider { status, body, .. } => {
                assert_eq!(status, 429);
                assert_eq!(body, "Throttled");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn history_applies_fallback_rate_per_point() {
        let stub = Arc::new(StubHttpClient::new().with_response(
            "market_chart",
            HttpResponse::ok_json(
                r#"{"prices":[[1704067200000,42000.0],[1704153600000,43500.5]]}"#,
            ),
        ));
        let adapter = CoinGeckoAdapter::new(stub, None);

        let points = adapter.history(&symbol("BTC"), 7).await.expect("series parses");
        assert_eq!(points.len(), 2);
        for point in &points {
            assert_eq!(point.price_jpy, point.price_usd * USD_JPY_FALLBACK);
            assert!(point.volume.is_none());
        }
        assert_eq!(points[0].timestamp.unix_millis(), 1_704_067_200_000);
    }
}
