use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// All blockchains supported by Walletscope
pub enum Chain {
    #[serde(rename = "ethereum", alias = "eth")]
    Ethereum,
    #[serde(rename = "polygon")]
    Polygon,
    #[serde(rename = "arbitrum", alias = "arb")]
    Arbitrum,
    #[serde(rename = "base")]
    Base,
    #[serde(rename = "avalanche", alias = "avaxc")]
    Avalanche,
    #[serde(rename = "optimism", alias = "op")]
    Optimism,
    #[serde(rename = "linea")]
    Linea,
    #[serde(rename = "tron", alias = "tr20", alias = "trc20", alias = "usdt")]
    Tron,
    #[serde(rename = "btc", alias = "bitcoin")]
    Bitcoin,
    #[serde(rename = "solana", alias = "sol")]
    Solana,
}

/// The upstream API family a chain is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    Evm,
    Tron,
    Bitcoin,
    Solana,
}

impl Chain {
    pub const ALL: [Chain; 10] = [
        Chain::Ethereum,
        Chain::Polygon,
        Chain::Arbitrum,
        Chain::Base,
        Chain::Avalanche,
        Chain::Optimism,
        Chain::Linea,
        Chain::Tron,
        Chain::Bitcoin,
        Chain::Solana,
    ];

    /// Canonical identifier, as used in URLs and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Polygon => "polygon",
            Chain::Arbitrum => "arbitrum",
            Chain::Base => "base",
            Chain::Avalanche => "avalanche",
            Chain::Optimism => "optimism",
            Chain::Linea => "linea",
            Chain::Tron => "tron",
            Chain::Bitcoin => "btc",
            Chain::Solana => "solana",
        }
    }

    pub fn family(self) -> ChainFamily {
        match self {
            Chain::Tron => ChainFamily::Tron,
            Chain::Bitcoin => ChainFamily::Bitcoin,
            Chain::Solana => ChainFamily::Solana,
            _ => ChainFamily::Evm,
        }
    }

    /// https://docs.etherscan.io/supported-chains
    pub fn evm_chain_id(self) -> Option<u64> {
        match self {
            Chain::Ethereum => Some(1),
            Chain::Polygon => Some(137),
            Chain::Arbitrum => Some(42161),
            Chain::Base => Some(8453),
            Chain::Avalanche => Some(43114),
            Chain::Optimism => Some(10),
            Chain::Linea => Some(59144),
            Chain::Tron | Chain::Bitcoin | Chain::Solana => None,
        }
    }

    /// Number of decimals between the smallest on-chain unit and the native coin.
    pub fn native_decimals(self) -> u32 {
        match self.family() {
            ChainFamily::Evm => 18,
            ChainFamily::Tron => 6,
            ChainFamily::Bitcoin => 8,
            ChainFamily::Solana => 9,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported chain: {0}")]
pub struct UnknownChain(pub String);

impl FromStr for Chain {
    type Err = UnknownChain;

    /// Case-insensitive; accepts the aliases used by the historical
    /// per-chain routes (`tr20`, `btc`, `sol`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chain = match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Chain::Ethereum,
            "polygon" | "matic" => Chain::Polygon,
            "arbitrum" | "arb" => Chain::Arbitrum,
            "base" => Chain::Base,
            "avalanche" | "avaxc" | "avax" => Chain::Avalanche,
            "optimism" | "op" => Chain::Optimism,
            "linea" => Chain::Linea,
            "tron" | "tr20" | "trc20" | "usdt" => Chain::Tron,
            "btc" | "bitcoin" => Chain::Bitcoin,
            "solana" | "sol" => Chain::Solana,
            _ => return Err(UnknownChain(s.to_string())),
        };
        Ok(chain)
    }
}
