pub mod alphavantage;
pub mod coingecko;

pub use alphavantage::{AlphaVantageAdapter, DailyClose, StockQuote};
pub use coingecko::CoinGeckoAdapter;
