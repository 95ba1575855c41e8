//! Icon sources, tried in priority order by the resolver.

mod address_repository;
mod metadata_search;
mod static_table;
mod token_list;

pub use address_repository::AddressRepository;
pub use metadata_search::MetadataSearch;
pub use static_table::StaticTable;
pub use token_list::TokenList;

use async_trait::async_trait;
use url::Url;

use crate::error::{Error, SourceError};
use crate::token::TokenKey;

/// A named strategy that maps a token to an icon URL.
///
/// `Ok(None)` is a miss. `Err` means the source could not answer; the
/// resolver treats it as a miss too, but logs it.
#[async_trait]
pub trait IconSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, key: &TokenKey) -> Result<Option<String>, SourceError>;

    /// Drop any internal state derived from earlier lookups.
    fn reset(&self) {}
}

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Whether `candidate` is an http(s) URL whose path names an image file.
pub fn is_image_url(candidate: &str) -> bool {
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return false;
    }
    let path = url.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Parse a configured base URL, rejecting ones that cannot carry a path.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid base url {raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("base url {raw:?} cannot carry a path")));
    }
    Ok(url)
}

/// `base` with `segments` appended as percent-encoded path segments.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        path.extend(segments);
    }
    url
}
