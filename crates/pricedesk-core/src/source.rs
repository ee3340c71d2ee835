use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Canonical identifiers for the upstream quote providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    CoinGecko,
    AlphaVantage,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CoinGecko => "coingecko",
            Self::AlphaVantage => "alphavantage",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
