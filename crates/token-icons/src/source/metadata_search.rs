use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{join_segments, parse_base_url, IconSource};
use crate::error::{Error, SourceError};
use crate::token::TokenKey;
use crate::transport::HttpTransport;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    #[serde(default)]
    image: Option<CoinImage>,
}

#[derive(Debug, Deserialize)]
struct CoinImage {
    #[serde(default)]
    large: Option<String>,
}

/// Search-by-symbol metadata API.
///
/// `GET {base}/search?query={symbol}`; when that request fails outright,
/// `GET {base}/coins/{symbol in lowercase}` is tried instead.
pub struct MetadataSearch {
    transport: Arc<dyn HttpTransport>,
    base: Url,
}

impl MetadataSearch {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            transport,
            base: parse_base_url(base_url)?,
        })
    }

    pub fn search_url(&self, symbol: &str) -> String {
        let mut url = join_segments(&self.base, &["search"]);
        url.query_pairs_mut().append_pair("query", symbol);
        url.into()
    }

    pub fn coin_url(&self, symbol: &str) -> String {
        join_segments(&self.base, &["coins", &symbol.to_lowercase()]).into()
    }

    async fn search(&self, symbol: &str) -> Result<Option<String>, SourceError> {
        let body = self.transport.get_json(&self.search_url(symbol)).await?;
        let response: SearchResponse =
            serde_json::from_value(body).map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(response
            .coins
            .into_iter()
            .filter(|coin| coin.symbol.eq_ignore_ascii_case(symbol))
            .find_map(|coin| coin.large.filter(|url| !url.is_empty())))
    }

    async fn coin_by_id(&self, symbol: &str) -> Result<Option<String>, SourceError> {
        let body = self.transport.get_json(&self.coin_url(symbol)).await?;
        let response: CoinResponse =
            serde_json::from_value(body).map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(response
            .image
            .and_then(|image| image.large)
            .filter(|url| !url.is_empty()))
    }
}

#[async_trait]
impl IconSource for MetadataSearch {
    fn name(&self) -> &'static str {
        "metadata-search"
    }

    async fn lookup(&self, key: &TokenKey) -> Result<Option<String>, SourceError> {
        let symbol = key.raw_symbol();
        match self.search(symbol).await {
            Ok(found) => Ok(found),
            Err(e) => {
                debug!(%key, error = %e, "search failed, trying direct lookup");
                self.coin_by_id(symbol).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::MockTransport;

    const BASE: &str = "https://api.example.com/api/v3";
    const SEARCH_PEPE: &str = "https://api.example.com/api/v3/search?query=pepe";
    const COIN_PEPE: &str = "https://api.example.com/api/v3/coins/pepe";

    fn source(transport: &Arc<MockTransport>) -> MetadataSearch {
        MetadataSearch::new(transport.clone(), BASE).unwrap()
    }

    #[tokio::test]
    async fn test_exact_symbol_match_wins() {
        let transport = Arc::new(MockTransport::new().with_json(
            SEARCH_PEPE,
            json!({
                "coins": [
                    { "symbol": "PEPECOIN", "large": "https://img.example.com/pepecoin.png" },
                    { "symbol": "PEPE", "large": "https://img.example.com/pepe.png" }
                ]
            }),
        ));

        let key = TokenKey::symbol("pepe").unwrap();
        assert_eq!(
            source(&transport).lookup(&key).await.unwrap().as_deref(),
            Some("https://img.example.com/pepe.png")
        );
        assert_eq!(transport.calls_to(COIN_PEPE), 0);
    }

    #[tokio::test]
    async fn test_no_exact_match_is_miss_without_fallback() {
        let transport = Arc::new(MockTransport::new().with_json(
            SEARCH_PEPE,
            json!({ "coins": [{ "symbol": "PEPE2", "large": "https://img.example.com/p2.png" }] }),
        ));

        let key = TokenKey::symbol("pepe").unwrap();
        assert_eq!(source(&transport).lookup(&key).await.unwrap(), None);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_search_falls_back_to_coin_lookup() {
        let transport = Arc::new(
            MockTransport::new()
                .with_get_status(SEARCH_PEPE, 429)
                .with_json(
                    COIN_PEPE,
                    json!({ "id": "pepe", "image": { "large": "https://img.example.com/pepe-large.png" } }),
                ),
        );

        let key = TokenKey::symbol("pepe").unwrap();
        assert_eq!(
            source(&transport).lookup(&key).await.unwrap().as_deref(),
            Some("https://img.example.com/pepe-large.png")
        );
        assert_eq!(transport.calls(), vec![SEARCH_PEPE.to_string(), COIN_PEPE.to_string()]);
    }

    #[test]
    fn test_urls() {
        let source = source(&Arc::new(MockTransport::new()));
        assert_eq!(source.search_url("PEPE"), "https://api.example.com/api/v3/search?query=PEPE");
        assert_eq!(source.search_url("a b"), "https://api.example.com/api/v3/search?query=a+b");
        assert_eq!(source.coin_url("PEPE"), COIN_PEPE);
    }

    #[tokio::test]
    async fn test_both_calls_failing_is_an_error() {
        let transport = Arc::new(MockTransport::new().with_failure(SEARCH_PEPE, SourceError::Timeout));

        let key = TokenKey::symbol("pepe").unwrap();
        assert_eq!(
            source(&transport).lookup(&key).await,
            Err(SourceError::Status(404))
        );
    }

    #[tokio::test]
    async fn test_malformed_search_body_falls_back() {
        let transport = Arc::new(
            MockTransport::new()
                .with_json(SEARCH_PEPE, json!({ "coins": "oops" }))
                .with_json(COIN_PEPE, json!({ "image": { "large": "https://img.example.com/pepe.png" } })),
        );

        let key = TokenKey::symbol("pepe").unwrap();
        assert_eq!(
            source(&transport).lookup(&key).await.unwrap().as_deref(),
            Some("https://img.example.com/pepe.png")
        );
    }
}
