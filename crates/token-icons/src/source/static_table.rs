use std::collections::HashMap;

use async_trait::async_trait;

use super::IconSource;
use crate::error::SourceError;
use crate::token::TokenKey;

const BUILTIN_ICONS: &[(&str, &str)] = &[
    ("ETH", "https://assets.coingecko.com/coins/images/279/large/ethereum.png"),
    ("WETH", "https://assets.coingecko.com/coins/images/2518/large/weth.png"),
    ("BTC", "https://assets.coingecko.com/coins/images/1/large/bitcoin.png"),
    ("WBTC", "https://assets.coingecko.com/coins/images/7598/large/wrapped_bitcoin_wbtc.png"),
    ("USDC", "https://assets.coingecko.com/coins/images/6319/large/usdc.png"),
    ("USDT", "https://assets.coingecko.com/coins/images/325/large/Tether.png"),
    ("DAI", "https://assets.coingecko.com/coins/images/9956/large/Badge_Dai.png"),
    ("BNB", "https://assets.coingecko.com/coins/images/825/large/bnb-icon2_2x.png"),
    ("MATIC", "https://assets.coingecko.com/coins/images/4713/large/polygon.png"),
    ("LINK", "https://assets.coingecko.com/coins/images/877/large/chainlink-new-logo.png"),
    ("UNI", "https://assets.coingecko.com/coins/images/12504/large/uni.jpg"),
    ("AAVE", "https://assets.coingecko.com/coins/images/12645/large/AAVE.png"),
    ("ARB", "https://assets.coingecko.com/coins/images/16547/large/arb.jpg"),
    ("OP", "https://assets.coingecko.com/coins/images/25244/large/Optimism.png"),
    ("CRV", "https://assets.coingecko.com/coins/images/12124/large/Curve.png"),
    ("MKR", "https://assets.coingecko.com/coins/images/1364/large/Mark_Maker.png"),
];

/// Compiled-in symbol → icon table. No I/O.
#[derive(Debug, Clone, Default)]
pub struct StaticTable {
    icons: HashMap<String, String>,
}

impl StaticTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-filled with the built-in icons.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (symbol, url) in BUILTIN_ICONS {
            table.insert(symbol, url);
        }
        table
    }

    /// Add or override an entry.
    pub fn insert(&mut self, symbol: &str, url: &str) {
        self.icons.insert(symbol.to_uppercase(), url.to_string());
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.icons.get(&symbol.to_uppercase()).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

#[async_trait]
impl IconSource for StaticTable {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn lookup(&self, key: &TokenKey) -> Result<Option<String>, SourceError> {
        Ok(self.get(key.raw_symbol()).map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_lookup_case_insensitive() {
        let table = StaticTable::builtin();
        let key = TokenKey::symbol("eth").unwrap();
        assert_eq!(
            table.lookup(&key).await.unwrap().as_deref(),
            Some("https://assets.coingecko.com/coins/images/279/large/ethereum.png")
        );
    }

    #[tokio::test]
    async fn test_miss() {
        let table = StaticTable::new();
        let key = TokenKey::symbol("ETH").unwrap();
        assert_eq!(table.lookup(&key).await.unwrap(), None);
    }

    #[test]
    fn test_insert_overrides_builtin() {
        let mut table = StaticTable::builtin();
        table.insert("eth", "https://cdn.example.com/eth.svg");
        assert_eq!(table.get("ETH"), Some("https://cdn.example.com/eth.svg"));
    }
}
