use tiny_keccak::{Hasher, Keccak};

use crate::error::Error;

/// Token identity used for lookup and caching.
///
/// Symbols and addresses compare case-insensitively. The address keeps its
/// original casing for building URLs, only the cache key is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenKey {
    symbol: String,
    address: Option<String>,
}

impl TokenKey {
    /// Create a key from a symbol and an optional chain address.
    ///
    /// An empty address is treated as absent; an empty symbol is rejected.
    pub fn new(symbol: &str, address: Option<&str>) -> Result<Self, Error> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(Error::InvalidArgument("token symbol is empty".to_string()));
        }

        let address = address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Ok(Self {
            symbol: symbol.to_string(),
            address,
        })
    }

    /// Key for a symbol only.
    pub fn symbol(symbol: &str) -> Result<Self, Error> {
        Self::new(symbol, None)
    }

    /// Symbol as given by the caller.
    pub fn raw_symbol(&self) -> &str {
        &self.symbol
    }

    pub fn upper_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Cache key: the lowercased address when known, else the uppercased symbol.
    pub fn cache_key(&self) -> String {
        match &self.address {
            Some(addr) => addr.to_lowercase(),
            None => self.upper_symbol(),
        }
    }
}

impl std::fmt::Display for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.address {
            Some(addr) => write!(f, "{} ({})", self.symbol, addr),
            None => write!(f, "{}", self.symbol),
        }
    }
}

/// EIP-55 checksum for an EVM address (`0x` + 40 hex chars).
///
/// Returns `None` for anything that is not an EVM address.
pub fn checksum_address(address: &str) -> Option<String> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))?;
    if hex_part.len() != 40 || hex::decode(hex_part).is_err() {
        return None;
    }

    let lower = hex_part.to_ascii_lowercase();
    let mut hasher = Keccak::v256();
    hasher.update(lower.as_bytes());
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Some(out)
}
