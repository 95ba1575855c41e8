//! Token icon resolution.
//!
//! [`IconResolver`] maps a token symbol (and optionally its chain address) to
//! a display icon URL by trying, in order:
//!
//! 1. a compiled-in [`StaticTable`],
//! 2. an address-keyed asset repository ([`AddressRepository`]),
//! 3. a search-by-symbol metadata API ([`MetadataSearch`]),
//! 4. a generic token-list document ([`TokenList`]).
//!
//! Results, including "not found", are cached for a TTL (one hour by
//! default). Source failures are logged through `tracing` and treated as
//! misses, so resolution never fails for a valid key.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `http` | yes | `reqwest`-backed transport and [`IconResolver::from_config`]. |
//! | `test-utils` | no | Exposes [`transport::MockTransport`] to downstream tests. |

pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod resolver;
pub mod source;
pub mod token;
pub mod transport;

// Re-exports for convenience
pub use cache::{CacheStats, IconCache, IconCacheEntry};
pub use config::ResolverConfig;
pub use error::{Error, SourceError};
pub use fallback::{FallbackGlyph, IconDisplay};
pub use resolver::{IconResolver, POPULAR_SYMBOLS};
pub use source::{AddressRepository, IconSource, MetadataSearch, StaticTable, TokenList};
pub use token::TokenKey;
pub use transport::HttpTransport;

/// Resolver with the default configuration and HTTP transport.
#[cfg(feature = "http")]
pub fn default_resolver() -> Result<IconResolver, Error> {
    IconResolver::from_config(&ResolverConfig::default())
}
