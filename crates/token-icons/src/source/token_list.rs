use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use super::{is_image_url, parse_base_url, IconSource};
use crate::error::{Error, SourceError};
use crate::token::TokenKey;
use crate::transport::HttpTransport;

/// One token of a token-list document.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenListEntry {
    #[serde(default)]
    address: String,
    #[serde(default)]
    symbol: String,
    #[serde(rename = "logoURI")]
    #[serde(default)]
    logo_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenListDocument {
    #[serde(default)]
    tokens: Vec<TokenListEntry>,
}

#[derive(Debug)]
struct FetchedList {
    fetched_at: Instant,
    tokens: Arc<Vec<TokenListEntry>>,
}

/// Generic token-list API.
///
/// The document is downloaded once per `ttl` and matched in memory, by
/// address first and then by symbol. Failed downloads are not cached.
pub struct TokenList {
    transport: Arc<dyn HttpTransport>,
    url: Url,
    ttl: Duration,
    document: RwLock<Option<FetchedList>>,
    fetch_gate: Mutex<()>,
}

impl TokenList {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: &str,
        ttl: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            transport,
            url: parse_base_url(base_url)?,
            ttl,
            document: RwLock::new(None),
            fetch_gate: Mutex::new(()),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    fn cached(&self) -> Option<Arc<Vec<TokenListEntry>>> {
        let guard = self.document.read().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|doc| doc.fetched_at.elapsed() < self.ttl)
            .map(|doc| doc.tokens.clone())
    }

    async fn tokens(&self) -> Result<Arc<Vec<TokenListEntry>>, SourceError> {
        if let Some(tokens) = self.cached() {
            return Ok(tokens);
        }

        // Collapse concurrent downloads onto whichever caller got here first.
        let _gate = self.fetch_gate.lock().await;
        if let Some(tokens) = self.cached() {
            return Ok(tokens);
        }

        let body = self.transport.get_json(self.url.as_str()).await?;
        let document: TokenListDocument =
            serde_json::from_value(body).map_err(|e| SourceError::Parse(e.to_string()))?;
        debug!(url = %self.url, tokens = document.tokens.len(), "token list fetched");

        let tokens = Arc::new(document.tokens);
        *self.document.write().unwrap_or_else(|e| e.into_inner()) = Some(FetchedList {
            fetched_at: Instant::now(),
            tokens: tokens.clone(),
        });
        Ok(tokens)
    }
}

fn find_entry<'a>(tokens: &'a [TokenListEntry], key: &TokenKey) -> Option<&'a TokenListEntry> {
    let by_address = key.address().and_then(|address| {
        tokens
            .iter()
            .find(|t| t.address.eq_ignore_ascii_case(address))
    });

    by_address.or_else(|| {
        tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(key.raw_symbol()))
    })
}

#[async_trait]
impl IconSource for TokenList {
    fn name(&self) -> &'static str {
        "token-list"
    }

    async fn lookup(&self, key: &TokenKey) -> Result<Option<String>, SourceError> {
        let tokens = self.tokens().await?;

        let Some(logo) = find_entry(&tokens, key).and_then(|t| t.logo_uri.as_deref()) else {
            return Ok(None);
        };

        if is_image_url(logo) {
            Ok(Some(logo.to_string()))
        } else {
            debug!(%key, logo, "rejecting non-image logo");
            Ok(None)
        }
    }

    fn reset(&self) {
        *self.document.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
