use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use time::{Date, OffsetDateTime, Time, UtcOffset};

use crate::config::ALPHA_VANTAGE_API_KEY_VAR;
use crate::http::{HttpClient, HttpRequest};
use crate::source::ProviderId;
use crate::throttling::SlidingWindowLimiter;
use crate::{FetchError, Symbol, UtcDateTime};

const API_BASE: &str = "https://www.alphavantage.co/query";

/// Free-tier admission policy: 5 requests per rolling minute.
pub const QUOTA_LIMIT: u32 = 5;
pub const QUOTA_WINDOW: Duration = Duration::from_secs(60);

/// Current equity quote, USD only; JPY normalization happens in the facade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockQuote {
    pub price_usd: f64,
    pub change_percent: f64,
}

/// One daily close from the provider's time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyClose {
    pub date: UtcDateTime,
    pub close: f64,
    pub volume: Option<u64>,
}

/// Alpha Vantage quote adapter for equities.
///
/// Every call is gated by the injected sliding-window limiter before any
/// network traffic; a denied call fails fast with the computed wait time.
/// The limiter instance is expected to be shared by everything that talks
/// to this provider in the process.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http: Arc<dyn HttpClient>,
    api_key: Option<String>,
    limiter: SlidingWindowLimiter,
}

impl AlphaVantageAdapter {
    pub fn new(
        http: Arc<dyn HttpClient>,
        api_key: Option<String>,
        limiter: SlidingWindowLimiter,
    ) -> Self {
        Self {
            http,
            api_key,
            limiter,
        }
    }

    /// Current price and day-over-day change percentage for a ticker.
    pub async fn quote(&self, symbol: &Symbol) -> Result<StockQuote, FetchError> {
        let url = self.endpoint("GLOBAL_QUOTE", symbol)?;
        let body = self.execute(url).await?;

        let parsed: GlobalQuoteResponse =
            serde_json::from_str(&body).map_err(|e| decode(e.to_string()))?;

        let Some(quote) = parsed.quote else {
            return Err(self.no_data(symbol));
        };
        let (Some(price), Some(change)) = (quote.price, quote.change_percent) else {
            // The provider answers 200 with an empty quote object both for
            // unknown symbols and when it is silently throttling the key.
            return Err(self.no_data(symbol));
        };

        Ok(StockQuote {
            price_usd: parse_number(&price)?,
            change_percent: parse_number(change.trim_end_matches('%'))?,
        })
    }

    /// Daily closes, newest first, truncated to `days` entries.
    pub async fn daily_history(
        &self,
        symbol: &Symbol,
        days: u32,
    ) -> Result<Vec<DailyClose>, FetchError> {
        let url = self.endpoint("TIME_SERIES_DAILY", symbol)?;
        let body = self.execute(url).await?;

        let parsed: TimeSeriesResponse =
            serde_json::from_str(&body).map_err(|e| decode(e.to_string()))?;

        let Some(series) = parsed.series else {
            return Err(self.no_data(symbol));
        };

        // Keys are ISO dates, so the BTreeMap's ascending order is
        // chronological; walk it backwards for newest-first.
        let mut closes = Vec::with_capacity(days as usize);
        for (date, bar) in series.iter().rev().take(days as usize) {
            closes.push(DailyClose {
                date: parse_date(date)?,
                close: parse_number(&bar.close)?,
                volume: bar.volume.as_deref().and_then(|v| v.parse().ok()),
            });
        }

        Ok(closes)
    }

    fn endpoint(&self, function: &str, symbol: &Symbol) -> Result<String, FetchError> {
        let Some(key) = &self.api_key else {
            return Err(FetchError::Configuration {
                name: ALPHA_VANTAGE_API_KEY_VAR,
            });
        };

        Ok(format!(
            "{API_BASE}?function={function}&symbol={}&apikey={key}",
            urlencoding::encode(symbol.as_str())
        ))
    }

    async fn execute(&self, url: String) -> Result<String, FetchError> {
        if !self.limiter.try_acquire(QUOTA_LIMIT, QUOTA_WINDOW) {
            return Err(FetchError::RateLimited {
                provider: ProviderId::AlphaVantage,
                retry_after: self.limiter.wait_time(QUOTA_LIMIT, QUOTA_WINDOW),
            });
        }

        let response = self
            .http
            .get(HttpRequest::get(url))
            .await
            .map_err(|e| FetchError::Transport {
                provider: ProviderId::AlphaVantage,
                message: e.message().to_owned(),
            })?;

        if !response.is_success() {
            return Err(FetchError::Provider {
                provider: ProviderId::AlphaVantage,
                status: response.status,
                body: response.body,
            });
        }

        Ok(response.body)
    }

    fn no_data(&self, symbol: &Symbol) -> FetchError {
        FetchError::DataNotFound {
            provider: ProviderId::AlphaVantage,
            symbol: symbol.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    quote: Option<GlobalQuotePayload>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuotePayload {
    #[serde(rename = "05. price", default)]
    price: Option<String>,
    #[serde(rename = "10. change percent", default)]
    change_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)", default)]
    series: Option<BTreeMap<String, DailyBarPayload>>,
}

#[derive(Debug, Deserialize)]
struct DailyBarPayload {
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume", default)]
    volume: Option<String>,
}

fn parse_number(value: &str) -> Result<f64, FetchError> {
    value
        .trim()
        .parse()
        .map_err(|_| decode(format!("expected a numeric field, got '{value}'")))
}

fn parse_date(value: &str) -> Result<UtcDateTime, FetchError> {
    let format = time::format_description::parse("[year]-[month]-[day]")
        .expect("static date format is valid");
    let date = Date::parse(value, &format)
        .map_err(|_| decode(format!("expected an ISO date, got '{value}'")))?;

    let midnight = OffsetDateTime::new_in_offset(date, Time::MIDNIGHT, UtcOffset::UTC);
    UtcDateTime::from_offset_datetime(midnight).map_err(|e| decode(e.to_string()))
}

fn decode(message: String) -> FetchError {
    FetchError::Decode {
        provider: ProviderId::AlphaVantage,
        message,
    }
}
