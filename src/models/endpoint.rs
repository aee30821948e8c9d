//! Network identifiers and RPC endpoint descriptors.

use crate::utils::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cluster an endpoint serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Mainnet,
    Devnet,
    Testnet,
    Localnet,
}

impl NetworkId {
    pub const ALL: [NetworkId; 4] = [
        NetworkId::Mainnet,
        NetworkId::Devnet,
        NetworkId::Testnet,
        NetworkId::Localnet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "mainnet",
            NetworkId::Devnet => "devnet",
            NetworkId::Testnet => "testnet",
            NetworkId::Localnet => "localnet",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(NetworkId::Mainnet),
            "devnet" => Ok(NetworkId::Devnet),
            "testnet" => Ok(NetworkId::Testnet),
            "localnet" | "localhost" => Ok(NetworkId::Localnet),
            _ => Err(ConfigError::UnknownNetwork(s.to_string())),
        }
    }
}

/// One RPC endpoint in the static catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub id: String,
    pub url: String,
    pub network: NetworkId,
    /// Lower values are tried first
    pub priority: u32,
}

impl EndpointDescriptor {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        network: NetworkId,
        priority: u32,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            network,
            priority,
        }
    }
}
