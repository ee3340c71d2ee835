use std::future::Future;
use std::pin::Pin;

use crate::FetchError;

/// Fallback USD/JPY rate, also applied to crypto history series where no
/// per-point historical rate exists.
pub const USD_JPY_FALLBACK: f64 = 150.0;

/// Exchange-rate source for USD → JPY normalization.
///
/// The stock quote path reads this once per facade call; crypto quotes never
/// consult it because the provider returns both currencies natively.
pub trait RateSource: Send + Sync {
    fn usd_to_jpy<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<f64, FetchError>> + Send + 'a>>;
}

/// Constant-rate source.
///
/// Placeholder pending a live FX feed; swapping one in only requires
/// another `RateSource` implementation.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateSource {
    rate: f64,
}

impl FixedRateSource {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl Default for FixedRateSource {
    fn default() -> Self {
        Self::new(USD_JPY_FALLBACK)
    }
}

impl RateSource for FixedRateSource {
    fn usd_to_jpy<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<f64, FetchError>> + Send + 'a>> {
        let rate = self.rate;
        Box::pin(async move { Ok(rate) })
    }
}

/// Convert a USD amount with the given rate.
pub fn usd_to_jpy(amount_usd: f64, rate: f64) -> f64 {
    amount_usd * rate
}
