use std::env;

/// API credentials for the upstream quote providers, read from the
/// process environment.
///
/// The CoinGecko key is optional: without it the adapter runs in the
/// provider's anonymous mode, which is more aggressively rate limited
/// upstream but otherwise works. The Alpha Vantage key is required; its
/// absence is reported as a configuration error on first use of the
/// equity path, not at startup.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub coingecko_api_key: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
}

pub const COINGECKO_API_KEY_VAR: &str = "PRICEDESK_COINGECKO_API_KEY";
pub const ALPHA_VANTAGE_API_KEY_VAR: &str = "PRICEDESK_ALPHA_VANTAGE_API_KEY";

impl ProviderCredentials {
    pub fn from_env() -> Self {
        Self {
            coingecko_api_key: env_opt(COINGECKO_API_KEY_VAR),
            alpha_vantage_api_key: env_opt(ALPHA_VANTAGE_API_KEY_VAR),
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
