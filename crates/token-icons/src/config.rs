use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::source::parse_base_url;

pub const DEFAULT_ADDRESS_REPOSITORY_URL: &str =
    "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains";
pub const DEFAULT_METADATA_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_TOKEN_LIST_URL: &str = "https://tokens.uniswap.org";

/// Resolver configuration.
///
/// Every field is optional in JSON; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Base of the address-keyed asset repository.
    pub address_repository_url: String,

    /// Chain directory inside the asset repository (e.g. `ethereum`).
    pub chain_segment: String,

    /// Base of the search-by-symbol metadata API.
    pub metadata_api_url: String,

    /// Token-list document URL.
    pub token_list_url: String,

    pub cache_ttl_secs: u64,

    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout_secs: u64,

    /// Cache "not found" results for the TTL as well.
    pub cache_negative: bool,

    /// Extra symbol → URL entries layered over the built-in table.
    pub static_icons: HashMap<String, String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            address_repository_url: DEFAULT_ADDRESS_REPOSITORY_URL.to_string(),
            chain_segment: "ethereum".to_string(),
            metadata_api_url: DEFAULT_METADATA_API_URL.to_string(),
            token_list_url: DEFAULT_TOKEN_LIST_URL.to_string(),
            cache_ttl_secs: 60 * 60,
            request_timeout_secs: 5,
            cache_negative: true,
            static_icons: HashMap::new(),
        }
    }
}

impl ResolverConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.cache_ttl_secs == 0 {
            return Err(Error::Config("cacheTtlSecs must be positive".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("requestTimeoutSecs must be positive".to_string()));
        }
        if self.chain_segment.trim().is_empty() {
            return Err(Error::Config("chainSegment is empty".to_string()));
        }
        parse_base_url(&self.address_repository_url)?;
        parse_base_url(&self.metadata_api_url)?;
        parse_base_url(&self.token_list_url)?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
