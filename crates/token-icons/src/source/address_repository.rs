use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{join_segments, parse_base_url, IconSource};
use crate::error::{Error, SourceError};
use crate::token::{checksum_address, TokenKey};
use crate::transport::HttpTransport;

/// Asset repository keyed by chain address:
/// `{base}/{chain}/assets/{address}/logo.png`.
///
/// The URL is only trusted after a HEAD request answers 200.
pub struct AddressRepository {
    transport: Arc<dyn HttpTransport>,
    base: Url,
    chain_segment: String,
}

impl AddressRepository {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: &str,
        chain_segment: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            transport,
            base: parse_base_url(base_url)?,
            chain_segment: chain_segment.to_string(),
        })
    }

    /// Candidate logo URL; EVM addresses are checksummed first.
    pub fn logo_url(&self, address: &str) -> String {
        let address = checksum_address(address).unwrap_or_else(|| address.to_string());
        join_segments(
            &self.base,
            &[&self.chain_segment, "assets", &address, "logo.png"],
        )
        .into()
    }
}

#[async_trait]
impl IconSource for AddressRepository {
    fn name(&self) -> &'static str {
        "address-repository"
    }

    async fn lookup(&self, key: &TokenKey) -> Result<Option<String>, SourceError> {
        let Some(address) = key.address() else {
            return Ok(None);
        };

        let url = self.logo_url(address);
        let status = self.transport.head(&url).await?;
        if status == 200 {
            Ok(Some(url))
        } else {
            debug!(%key, status, "no repository asset");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    const BASE: &str = "https://assets.example.com/blockchains";
    const USDT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
    const USDT_LOGO: &str = "https://assets.example.com/blockchains/ethereum/assets/0xdAC17F958D2ee523a2206206994597C13D831ec7/logo.png";

    #[tokio::test]
    async fn test_existing_asset() {
        let transport = Arc::new(MockTransport::new().with_head(USDT_LOGO, 200));
        let repo = AddressRepository::new(transport.clone(), BASE, "ethereum").unwrap();

        let key = TokenKey::new("USDT", Some(USDT)).unwrap();
        assert_eq!(repo.lookup(&key).await.unwrap().as_deref(), Some(USDT_LOGO));
        assert_eq!(transport.calls(), vec![USDT_LOGO.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_asset_is_miss() {
        let transport = Arc::new(MockTransport::new());
        let repo = AddressRepository::new(transport, BASE, "ethereum").unwrap();

        let key = TokenKey::new("USDT", Some(USDT)).unwrap();
        assert_eq!(repo.lookup(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_no_address_skips_network() {
        let transport = Arc::new(MockTransport::new());
        let repo = AddressRepository::new(transport.clone(), BASE, "ethereum").unwrap();

        let key = TokenKey::symbol("USDT").unwrap();
        assert_eq!(repo.lookup(&key).await.unwrap(), None);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_network_error_surfaces() {
        let transport = Arc::new(MockTransport::new().with_failure(USDT_LOGO, SourceError::Timeout));
        let repo = AddressRepository::new(transport, BASE, "ethereum").unwrap();

        let key = TokenKey::new("USDT", Some(USDT)).unwrap();
        assert_eq!(repo.lookup(&key).await, Err(SourceError::Timeout));
    }

    #[test]
    fn test_non_evm_address_verbatim() {
        let repo =
            AddressRepository::new(Arc::new(MockTransport::new()), BASE, "solana").unwrap();
        assert_eq!(
            repo.logo_url("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            "https://assets.example.com/blockchains/solana/assets/EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v/logo.png"
        );
    }
}
