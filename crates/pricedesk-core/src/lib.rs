//! Multi-source asset price aggregation for pricedesk.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - The sliding-window rate limiter and its clock seam
//! - Quote adapters for the crypto and equity providers
//! - The FX-rate seam and the aggregation facade

pub mod adapters;
pub mod aggregator;
pub mod config;
pub mod domain;
pub mod error;
pub mod fx;
pub mod http;
pub mod source;
pub mod throttling;

pub use adapters::{AlphaVantageAdapter, CoinGeckoAdapter, DailyClose, StockQuote};
pub use aggregator::{PriceService, SymbolPrice, DEFAULT_HISTORY_DAYS};
pub use config::ProviderCredentials;
pub use domain::{AssetKind, AssetPrice, HistoryPoint, Symbol, UtcDateTime};
pub use error::{FetchError, ValidationError};
pub use fx::{FixedRateSource, RateSource, USD_JPY_FALLBACK};
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StubHttpClient};
pub use source::ProviderId;
pub use throttling::{Clock, ManualClock, SlidingWindowLimiter, SystemClock};
