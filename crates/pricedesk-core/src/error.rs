use std::time::Duration;

use thiserror::Error;

use crate::source::ProviderId;

/// Validation and contract errors exposed by `pricedesk-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid asset kind '{value}', expected one of crypto, stock")]
    InvalidAssetKind { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
}

/// Failure taxonomy for a single price or history fetch.
///
/// Nothing in this layer retries: every variant propagates to the caller
/// as-is, and the HTTP boundary decides the status code.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A required provider credential is absent from the environment.
    #[error("missing required credential {name}")]
    Configuration { name: &'static str },

    /// The upstream answered with a non-success HTTP status.
    #[error("{provider} returned status {status}: {body}")]
    Provider {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    /// The upstream answered successfully but the expected quote or series
    /// field was absent. For Alpha Vantage this is ambiguous between an
    /// unknown symbol and a silent server-side rate limit; the upstream
    /// returns 200 in both cases.
    #[error("no data for symbol '{symbol}' from {provider}; the symbol may be unknown or the provider may be rate limiting")]
    DataNotFound {
        provider: ProviderId,
        symbol: String,
    },

    /// The local admission gate denied the call before any network traffic.
    #[error("{provider} rate limit exceeded; retry in {} second(s)", .retry_after.as_secs_f64().ceil())]
    RateLimited {
        provider: ProviderId,
        retry_after: Duration,
    },

    /// Transport-level failure (connect, timeout, body read).
    #[error("{provider} transport error: {message}")]
    Transport {
        provider: ProviderId,
        message: String,
    },

    /// The upstream body did not parse into the expected shape.
    #[error("{provider} returned an unparseable response: {message}")]
    Decode {
        provider: ProviderId,
        message: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl FetchError {
    /// Stable machine-readable code, used in API error payloads.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "fetch.configuration",
            Self::Provider { .. } => "fetch.provider",
            Self::DataNotFound { .. } => "fetch.data_not_found",
            Self::RateLimited { .. } => "fetch.rate_limited",
            Self::Transport { .. } => "fetch.transport",
            Self::Decode { .. } => "fetch.decode",
            Self::Validation(_) => "fetch.validation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_message_rounds_seconds_up() {
        let error = FetchError::RateLimited {
            provider: ProviderId::AlphaVantage,
            retry_after: Duration::from_millis(30_500),
        };

        assert_eq!(
            error.to_string(),
            "alphavantage rate limit exceeded; retry in 31 second(s)"
        );
    }

    #[test]
    fn codes_are_stable() {
        let error = FetchError::Configuration { name: "X" };
        assert_eq!(error.code(), "fetch.configuration");
    }
}
