use std::{env, str::FromStr};

use crate::greenfield::{Error, Result};

pub const REST_URL_ENV: &str = "GREENFIELD_REST_URL";
pub const CHAIN_ID_ENV: &str = "GREENFIELD_CHAIN_ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl Network {
    pub fn get_url(&self) -> String {
        match self {
            Network::Mainnet => "https://greenfield-chain.bnbchain.org".to_string(),
            Network::Testnet => "https://gnfd-testnet-fullnode-tendermint-us.bnbchain.org".to_string(),
            Network::Devnet => "http://localhost:1317".to_string(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1017,
            Network::Testnet => 5600,
            Network::Devnet => 9000,
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" | "local" => Ok(Network::Devnet),
            other => Err(Error::Config(format!("unknown network {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub rest_url: String,
    pub chain_id: u64,
}

impl NetworkConfig {
    pub fn from_network(network: Network) -> Self {
        Self {
            rest_url: network.get_url(),
            chain_id: network.chain_id(),
        }
    }

    /// Starts from `network` and applies `GREENFIELD_REST_URL` / `GREENFIELD_CHAIN_ID`.
    pub fn from_env(network: Network) -> Result<Self> {
        Self::from_lookup(network, |key| env::var(key).ok())
    }

    fn from_lookup(network: Network, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::from_network(network);
        if let Some(url) = lookup(REST_URL_ENV).filter(|url| !url.is_empty()) {
            config.rest_url = url.trim_end_matches('/').to_string();
        }
        if let Some(chain_id) = lookup(CHAIN_ID_ENV).filter(|id| !id.is_empty()) {
            config.chain_id = chain_id
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("{CHAIN_ID_ENV}={chain_id}: {e}")))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_presets() {
        assert_eq!(Network::Testnet.chain_id(), 5600);
        assert_eq!(Network::from_str("MAINNET").unwrap(), Network::Mainnet);
        assert!(Network::from_str("moon").is_err());
    }

    #[test]
    fn test_overrides() {
        let config = NetworkConfig::from_lookup(Network::Testnet, |key| match key {
            REST_URL_ENV => Some("http://127.0.0.1:1317/".to_string()),
            CHAIN_ID_ENV => Some("9000".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(
            config,
            NetworkConfig {
                rest_url: "http://127.0.0.1:1317".to_string(),
                chain_id: 9000,
            }
        );

        let bad = NetworkConfig::from_lookup(Network::Testnet, |key| {
            (key == CHAIN_ID_ENV).then(|| "greenfield_5600-1".to_string())
        });
        assert!(matches!(bad, Err(Error::Config(_))));
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = NetworkConfig::from_lookup(Network::Mainnet, |_| None).unwrap();
        assert_eq!(config, NetworkConfig::from_network(Network::Mainnet));
    }
}
