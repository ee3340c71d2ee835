use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::adapters::{AlphaVantageAdapter, CoinGeckoAdapter};
use crate::config::ProviderCredentials;
use crate::fx::{self, FixedRateSource, RateSource};
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::throttling::SlidingWindowLimiter;
use crate::{AssetKind, AssetPrice, FetchError, HistoryPoint, Symbol};

/// Default trailing window for history queries.
pub const DEFAULT_HISTORY_DAYS: u32 = 7;

/// A batch result entry: the requested symbol plus its price.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolPrice {
    pub symbol: Symbol,
    #[serde(flatten)]
    pub price: AssetPrice,
}

/// Unified entry point over the per-class quote adapters.
///
/// Callers ask for a symbol and an asset class; which upstream answers, and
/// whether FX normalization is needed, stays behind this facade. No retries
/// happen here; a transient provider failure surfaces immediately.
#[derive(Clone)]
pub struct PriceService {
    crypto: CoinGeckoAdapter,
    stocks: AlphaVantageAdapter,
    fx: Arc<dyn RateSource>,
}

impl PriceService {
    pub fn new(
        crypto: CoinGeckoAdapter,
        stocks: AlphaVantageAdapter,
        fx: Arc<dyn RateSource>,
    ) -> Self {
        Self { crypto, stocks, fx }
    }

    /// Production wiring: reqwest transport, credentials from the
    /// environment, one limiter for the equities provider, fixed FX rate.
    pub fn from_env() -> Self {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
        let credentials = ProviderCredentials::from_env();

        Self::new(
            CoinGeckoAdapter::new(http.clone(), credentials.coingecko_api_key),
            AlphaVantageAdapter::new(
                http,
                credentials.alpha_vantage_api_key,
                SlidingWindowLimiter::new(),
            ),
            Arc::new(FixedRateSource::default()),
        )
    }

    /// Current canonical price for one asset.
    ///
    /// Crypto quotes arrive dual-currency from the provider and pass through
    /// untouched; stock quotes are USD-only and get their JPY side computed
    /// with one rate read taken at call time, so both currencies always
    /// describe the same instant.
    pub async fn asset_price(
        &self,
        symbol: &Symbol,
        kind: AssetKind,
    ) -> Result<AssetPrice, FetchError> {
        match kind {
            AssetKind::Crypto => self.crypto.price(symbol).await,
            AssetKind::Stock => {
                let quote = self.stocks.quote(symbol).await?;
                let rate = self.fx.usd_to_jpy().await?;
                Ok(AssetPrice::new(
                    quote.price_usd,
                    fx::usd_to_jpy(quote.price_usd, rate),
                    quote.change_percent,
                )?)
            }
        }
    }

    /// Historical series for one asset, newest data as the provider orders
    /// it (crypto: ascending timestamps; stocks: newest first).
    ///
    /// The stock path reads the FX rate once and applies it to every point;
    /// there is no historical rate source, so the series is an approximation
    /// in its JPY column.
    pub async fn asset_history(
        &self,
        symbol: &Symbol,
        kind: AssetKind,
        days: u32,
    ) -> Result<Vec<HistoryPoint>, FetchError> {
        match kind {
            AssetKind::Crypto => self.crypto.history(symbol, days).await,
            AssetKind::Stock => {
                let closes = self.stocks.daily_history(symbol, days).await?;
                let rate = self.fx.usd_to_jpy().await?;

                Ok(closes
                    .into_iter()
                    .map(|close| HistoryPoint {
                        timestamp: close.date,
                        price_usd: close.close,
                        price_jpy: fx::usd_to_jpy(close.close, rate),
                        volume: close.volume,
                    })
                    .collect())
            }
        }
    }

    /// Fetch every requested asset concurrently.
    ///
    /// One failing symbol yields `None` at its position and a warn log; the
    /// batch itself never fails.
    pub async fn batch_prices(
        &self,
        assets: &[(Symbol, AssetKind)],
    ) -> Vec<Option<SymbolPrice>> {
        let fetches = assets.iter().map(|(symbol, kind)| async move {
            match self.asset_price(symbol, *kind).await {
                Ok(price) => Some(SymbolPrice {
                    symbol: symbol.clone(),
                    price,
                }),
                Err(error) => {
                    tracing::warn!(symbol = %symbol, %error, "price fetch failed in batch");
                    None
                }
            }
        });

        join_all(fetches).await
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::http::{HttpResponse, StubHttpClient};

    /// Rate source that counts how often the facade consults it.
    struct CountingRateSource {
        rate: f64,
        reads: AtomicUsize,
    }

    impl CountingRateSource {
        fn new(rate: f64) -> Self {
            Self {
                rate,
                reads: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl RateSource for CountingRateSource {
        fn usd_to_jpy<'a>(
            &'a self,
        ) -> Pin<Box<dyn Future<Output = Result<f64, FetchError>> + Send + 'a>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let rate = self.rate;
            Box::pin(async move { Ok(rate) })
        }
    }

    fn symbol(s: &str) -> Symbol {
        Symbol::parse(s).expect("valid symbol")
    }

    fn service_with(stub: Arc<StubHttpClient>, fx: Arc<CountingRateSource>) -> PriceService {
        let http: Arc<dyn HttpClient> = stub;
        PriceService::new(
            CoinGeckoAdapter::new(http.clone(), None),
            AlphaVantageAdapter::new(
                http,
                Some(String::from("test-key")),
                SlidingWindowLimiter::new(),
            ),
            fx,
        )
    }

    #[tokio::test]
    async fn crypto_path_never_consults_the_rate_source() {
        let stub = Arc::new(StubHttpClient::new().with_response(
            "simple/price",
            HttpResponse::ok_json(
                r#"{"bitcoin":{"usd":65000.0,"jpy":9790000.0,"usd_24h_change":2.1}}"#,
            ),
        ));
        let fx = Arc::new(CountingRateSource::new(150.0));
        let service = service_with(stub, fx.clone());

        let price = service
            .asset_price(&symbol("BTC"), AssetKind::Crypto)
            .await
            .expect("crypto quote");

        // Provider-native JPY, not a derived conversion.
        assert_eq!(price.price_jpy, 9_790_000.0);
        assert_eq!(fx.reads(), 0);
    }

    #[tokio::test]
    async fn stock_path_derives_jpy_from_one_rate_read() {
        let stub = Arc::new(StubHttpClient::new().with_response(
            "GLOBAL_QUOTE",
            HttpResponse::ok_json(
                r#"{"Global Quote": {"05. price": "200.00", "10. change percent": "1.25%"}}"#,
            ),
        ));
        let fx = Arc::new(CountingRateSource::new(151.5));
        let service = service_with(stub, fx.clone());

        let price = service
            .asset_price(&symbol("AAPL"), AssetKind::Stock)
            .await
            .expect("stock quote");

        assert_eq!(price.price_usd, 200.0);
        assert_eq!(price.price_jpy, 200.0 * 151.5);
        assert_eq!(price.change_24h, 1.25);
        assert_eq!(fx.reads(), 1);
    }

    #[tokio::test]
    async fn stock_history_uses_a_single_rate_for_the_whole_series() {
        let stub = Arc::new(StubHttpClient::new().with_response(
            "TIME_SERIES_DAILY",
            HttpResponse::ok_json(
                r#"{
                    "Time Series (Daily)": {
                        "2024-01-02": {"4. close": "100.0", "5. volume": "1000"},
                        "2024-01-03": {"4. close": "110.0", "5. volume": "1100"}
                    }
                }"#,
            ),
        ));
        let fx = Arc::new(CountingRateSource::new(149.0));
        let service = service_with(stub, fx.clone());

        let points = service
            .asset_history(&symbol("AAPL"), AssetKind::Stock, 7)
            .await
            .expect("stock history");

        assert_eq!(points.len(), 2);
        for point in &points {
            assert_eq!(point.price_jpy, point.price_usd * 149.0);
        }
        assert_eq!(fx.reads(), 1);
    }

    #[tokio::test]
    async fn batch_isolates_per_item_failures() {
        let stub = Arc::new(StubHttpClient::new().with_response(
            "simple/price",
            HttpResponse::ok_json(
                r#"{"bitcoin":{"usd":65000.0,"jpy":9750000.0,"usd_24h_change":0.4}}"#,
            ),
        ));
        // GLOBAL_QUOTE is unrouted: the stub answers 404 and the stock leg
        // fails while the crypto leg succeeds.
        let fx = Arc::new(CountingRateSource::new(150.0));
        let service = service_with(stub, fx);

        let results = service
            .batch_prices(&[
                (symbol("BTC"), AssetKind::Crypto),
                (symbol("INVALID"), AssetKind::Stock),
            ])
            .await;

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().expect("crypto leg succeeds");
        assert_eq!(first.symbol.as_str(), "BTC");
        assert!(results[1].is_none());
    }
}
