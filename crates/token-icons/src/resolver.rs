use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::OnceCell;
use tracing::{debug, info, trace, warn};

use crate::cache::{CacheStats, IconCache};
use crate::config::ResolverConfig;
use crate::error::Error;
use crate::fallback::{FallbackGlyph, IconDisplay};
use crate::source::{AddressRepository, IconSource, MetadataSearch, StaticTable, TokenList};
use crate::token::TokenKey;
use crate::transport::HttpTransport;

/// Symbols warmed by [`IconResolver::preload_popular`].
pub const POPULAR_SYMBOLS: &[&str] = &[
    "ETH", "WETH", "BTC", "WBTC", "USDC", "USDT", "DAI", "BNB", "MATIC", "LINK", "UNI", "AAVE",
    "ARB", "OP", "CRV", "MKR",
];

type InFlight = Arc<OnceCell<Option<String>>>;

/// Resolves token icons through an ordered chain of sources with a TTL cache
/// in front.
///
/// Resolution never fails once the key is valid: every source error is logged
/// and treated as a miss, and the worst case is `None`.
pub struct IconResolver {
    sources: Vec<Box<dyn IconSource>>,
    cache: IconCache,
    cache_negative: bool,
    in_flight: DashMap<String, InFlight>,
    /// Bumped by `clear`; lookups started before it must not write back.
    generation: AtomicU64,
}

impl IconResolver {
    /// Resolver over `sources`, tried in the given order.
    pub fn new(sources: Vec<Box<dyn IconSource>>, ttl: Duration) -> Self {
        Self {
            sources,
            cache: IconCache::new(ttl),
            cache_negative: true,
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether "not found" results are cached for the TTL. On by default.
    pub fn with_negative_caching(mut self, enabled: bool) -> Self {
        self.cache_negative = enabled;
        self
    }

    /// Standard chain (static table, address repository, metadata search,
    /// token list) over the given transport.
    pub fn with_transport(
        config: &ResolverConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, Error> {
        config.validate()?;

        let mut table = StaticTable::builtin();
        for (symbol, url) in &config.static_icons {
            table.insert(symbol, url);
        }

        let sources: Vec<Box<dyn IconSource>> = vec![
            Box::new(table),
            Box::new(AddressRepository::new(
                transport.clone(),
                &config.address_repository_url,
                &config.chain_segment,
            )?),
            Box::new(MetadataSearch::new(transport.clone(), &config.metadata_api_url)?),
            Box::new(TokenList::new(
                transport,
                &config.token_list_url,
                config.cache_ttl(),
            )?),
        ];

        Ok(Self::new(sources, config.cache_ttl()).with_negative_caching(config.cache_negative))
    }

    /// Standard chain over a `reqwest` client with the configured timeout.
    #[cfg(feature = "http")]
    pub fn from_config(config: &ResolverConfig) -> Result<Self, Error> {
        let transport = crate::transport::ReqwestTransport::new(config.request_timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Icon URL for a token, or `None` when no source knows it.
    ///
    /// Errors only on an empty symbol, before any I/O.
    pub async fn resolve_icon(
        &self,
        symbol: &str,
        address: Option<&str>,
    ) -> Result<Option<String>, Error> {
        let key = TokenKey::new(symbol, address)?;
        Ok(self.resolve(&key).await)
    }

    /// Like [`resolve_icon`](Self::resolve_icon) for an already-built key.
    pub async fn resolve(&self, key: &TokenKey) -> Option<String> {
        let cache_key = key.cache_key();
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(%key, found = cached.is_some(), "icon cache hit");
            return cached;
        }

        // Concurrent callers for the same key share one resolution.
        let cell = self.in_flight.entry(cache_key.clone()).or_default().clone();
        let url = cell
            .get_or_init(|| self.resolve_uncached(key, &cache_key))
            .await
            .clone();
        self.in_flight
            .remove_if(&cache_key, |_, current| Arc::ptr_eq(current, &cell));
        url
    }

    async fn resolve_uncached(&self, key: &TokenKey, cache_key: &str) -> Option<String> {
        let generation = self.generation.load(Ordering::Acquire);
        for source in &self.sources {
            match source.lookup(key).await {
                Ok(Some(url)) => {
                    debug!(%key, source = source.name(), %url, "icon resolved");
                    self.store(generation, cache_key, Some(url.clone()));
                    return Some(url);
                }
                Ok(None) => trace!(%key, source = source.name(), "source miss"),
                Err(e) => debug!(%key, source = source.name(), error = %e, "source unavailable"),
            }
        }

        debug!(%key, "no icon found");
        if self.cache_negative {
            self.store(generation, cache_key, None);
        }
        None
    }

    fn store(&self, generation: u64, cache_key: &str, url: Option<String>) {
        if self.generation.load(Ordering::Acquire) == generation {
            self.cache.insert(cache_key.to_string(), url);
        } else {
            debug!(cache_key, "cache cleared during lookup, dropping result");
        }
    }

    /// Icon URL, or a generated glyph when nothing resolves.
    pub async fn resolve_display(
        &self,
        symbol: &str,
        address: Option<&str>,
    ) -> Result<IconDisplay, Error> {
        Ok(match self.resolve_icon(symbol, address).await? {
            Some(url) => IconDisplay::Url(url),
            None => IconDisplay::Glyph(FallbackGlyph::for_symbol(symbol)),
        })
    }

    /// Resolve every symbol concurrently; returns once all attempts settle.
    ///
    /// Failures are logged, never propagated.
    pub async fn preload<S: AsRef<str>>(&self, symbols: &[S]) {
        let attempts = symbols.iter().map(|symbol| async move {
            let symbol = symbol.as_ref();
            match self.resolve_icon(symbol, None).await {
                Ok(url) => url.is_some(),
                Err(e) => {
                    warn!(symbol, error = %e, "skipping icon preload");
                    false
                }
            }
        });

        let results = join_all(attempts).await;
        let resolved = results.iter().filter(|found| **found).count();
        info!(
            resolved,
            unresolved = results.len() - resolved,
            "icon preload finished"
        );
    }

    pub async fn preload_popular(&self) {
        self.preload(POPULAR_SYMBOLS).await;
    }

    /// Forget every cached icon and any source-side state.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.in_flight.clear();
        self.cache.clear();
        for source in &self.sources {
            source.reset();
        }
        info!("icon cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
