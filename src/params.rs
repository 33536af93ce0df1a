//! Network parameters and per-chain defaults.
//!
//! | chain | network | name | rpc port | coin type |
//! |-------|---------|------|----------|-----------|
//! | bitcoin | mainnet | mainnet | 8334 | 0 |
//! | bitcoin | testnet | testnet3 | 18334 | 1 |
//! | bitcoin | regtest | regtest | 18334 | 1 |
//! | bitcoin | simnet | simnet | 18556 | 1 |
//! | litecoin | mainnet | mainnet | 9334 | 2 |
//! | litecoin | testnet | testnet4 | 19334 | 1 |
//! | litecoin | regtest | regtest | 18334 | 1 |
//! | litecoin | simnet | simnet | 18556 | 1 |
//!
//! The rpc ports follow the btcd convention; bitcoind listens two below.

use bitcoin::FeeRate;
use serde::{Deserialize, Serialize};

/// Well-known bitcoind regtest rpc port, used when the derived port is dead.
pub const REGTEST_FALLBACK_PORT: u16 = 18443;

/// Offset between the btcd-style rpc port and the bitcoind rpc port.
pub const BITCOIND_PORT_OFFSET: u16 = 2;

pub const COIN_TYPE_BITCOIN: u32 = 0;
pub const COIN_TYPE_TESTNET: u32 = 1;
pub const COIN_TYPE_LITECOIN: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainCode {
    #[default]
    Bitcoin,
    Litecoin,
}

impl ChainCode {
    pub fn as_str(&self) -> &'static str {
        match self { ChainCode::Bitcoin => "bitcoin", ChainCode::Litecoin => "litecoin" }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bitcoin" | "btc" => Some(ChainCode::Bitcoin),
            "litecoin" | "ltc" => Some(ChainCode::Litecoin),
            _ => None,
        }
    }

    /// Default fee rate when no live estimator is available.
    pub fn static_fee_rate(&self) -> FeeRate {
        match self {
            ChainCode::Bitcoin => FeeRate::from_sat_per_vb_u32(50),
            ChainCode::Litecoin => FeeRate::from_sat_per_vb_u32(200),
        }
    }

    pub fn default_routing_policy(&self) -> ForwardingPolicy {
        match self {
            ChainCode::Bitcoin => ForwardingPolicy { min_htlc_msat: 1000, base_fee_msat: 1000, fee_rate_ppm: 1, time_lock_delta: 144 },
            ChainCode::Litecoin => ForwardingPolicy { min_htlc_msat: 1000, base_fee_msat: 1000, fee_rate_ppm: 1, time_lock_delta: 576 },
        }
    }

    pub fn channel_constraints(&self) -> ChannelConstraints {
        match self {
            ChainCode::Bitcoin => ChannelConstraints { dust_limit_sat: 573, max_accepted_htlcs: 483 },
            ChainCode::Litecoin => ChannelConstraints { dust_limit_sat: 54_600, max_accepted_htlcs: 483 },
        }
    }
}

impl std::fmt::Display for ChainCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
    Simnet,
}

impl NetworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::Mainnet => "mainnet",
            NetworkKind::Testnet => "testnet",
            NetworkKind::Regtest => "regtest",
            NetworkKind::Simnet => "simnet",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "main" => Some(NetworkKind::Mainnet),
            "testnet" | "testnet3" | "testnet4" | "test" => Some(NetworkKind::Testnet),
            "regtest" => Some(NetworkKind::Regtest),
            "simnet" => Some(NetworkKind::Simnet),
            _ => None,
        }
    }
}

/// Forwarding policy advertised for channels on the primary chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingPolicy {
    pub min_htlc_msat: u64,
    pub base_fee_msat: u64,
    /// Proportional fee in millionths.
    pub fee_rate_ppm: u64,
    pub time_lock_delta: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConstraints {
    pub dust_limit_sat: u64,
    pub max_accepted_htlcs: u16,
}

/// Parameters of the active network on the primary chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkParams {
    pub chain: ChainCode,
    pub kind: NetworkKind,
    /// Chain-parameter name, e.g. `testnet3`.
    pub name: &'static str,
    /// Canonical (btcd-style) rpc port.
    pub rpc_port: u16,
    pub coin_type: u32,
}

impl NetworkParams {
    pub fn new(chain: ChainCode, kind: NetworkKind) -> Self {
        let (name, rpc_port, coin_type) = match (chain, kind) {
            (ChainCode::Bitcoin, NetworkKind::Mainnet) => ("mainnet", 8334, COIN_TYPE_BITCOIN),
            (ChainCode::Bitcoin, NetworkKind::Testnet) => ("testnet3", 18334, COIN_TYPE_TESTNET),
            (ChainCode::Litecoin, NetworkKind::Mainnet) => ("mainnet", 9334, COIN_TYPE_LITECOIN),
            (ChainCode::Litecoin, NetworkKind::Testnet) => ("testnet4", 19334, COIN_TYPE_TESTNET),
            (_, NetworkKind::Regtest) => ("regtest", 18334, COIN_TYPE_TESTNET),
            (_, NetworkKind::Simnet) => ("simnet", 18556, COIN_TYPE_TESTNET),
        };
        Self { chain, kind, name, rpc_port, coin_type }
    }

    pub fn bitcoin(kind: NetworkKind) -> Self {
        Self::new(ChainCode::Bitcoin, kind)
    }

    /// Simulation networks never expose discoverable credentials.
    pub fn is_simulation(&self) -> bool {
        self.kind == NetworkKind::Simnet
    }

    /// Private networks have no fee market worth estimating.
    pub fn is_private(&self) -> bool {
        matches!(self.kind, NetworkKind::Regtest | NetworkKind::Simnet)
    }

    pub fn is_regtest(&self) -> bool {
        self.kind == NetworkKind::Regtest
    }

    /// Sub-directory of a node data dir holding this network's files (cookie).
    pub fn cookie_subdir(&self) -> &'static str {
        match self.name {
            "testnet3" => "testnet3",
            "testnet4" => "testnet4",
            "regtest" => "regtest",
            _ => "",
        }
    }

    /// Directory name used under the chain dir, all testnets collapse to `testnet`.
    pub fn normalized_name(&self) -> &'static str {
        if self.name.starts_with("testnet") { "testnet" } else { self.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testnets_normalize() {
        let btc = NetworkParams::new(ChainCode::Bitcoin, NetworkKind::Testnet);
        let ltc = NetworkParams::new(ChainCode::Litecoin, NetworkKind::Testnet);
        assert_eq!(btc.name, "testnet3");
        assert_eq!(ltc.name, "testnet4");
        assert_eq!(btc.normalized_name(), "testnet");
        assert_eq!(ltc.normalized_name(), "testnet");
        assert_eq!(btc.cookie_subdir(), "testnet3");
    }

    #[test]
    fn mainnet_cookie_lives_in_datadir_root() {
        let params = NetworkParams::bitcoin(NetworkKind::Mainnet);
        assert_eq!(params.cookie_subdir(), "");
        assert_eq!(params.coin_type, COIN_TYPE_BITCOIN);
    }

    #[test]
    fn private_and_simulation_networks() {
        assert!(NetworkParams::bitcoin(NetworkKind::Regtest).is_private());
        assert!(!NetworkParams::bitcoin(NetworkKind::Regtest).is_simulation());
        assert!(NetworkParams::bitcoin(NetworkKind::Simnet).is_simulation());
        assert!(!NetworkParams::bitcoin(NetworkKind::Testnet).is_private());
    }

    #[test]
    fn chain_defaults() {
        assert_eq!(ChainCode::Bitcoin.static_fee_rate().to_sat_per_vb_floor(), 50);
        assert_eq!(ChainCode::Litecoin.static_fee_rate().to_sat_per_vb_floor(), 200);
        assert_eq!(ChainCode::Litecoin.default_routing_policy().time_lock_delta, 576);
        assert_eq!(ChainCode::from_str("LTC"), Some(ChainCode::Litecoin));
        assert_eq!(NetworkKind::from_str("testnet3"), Some(NetworkKind::Testnet));
    }
}
