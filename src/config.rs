//! Chain configuration - passed from higher layers or loaded from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroizing;

use crate::error::ConfigError;
use crate::params::{ChainCode, ForwardingPolicy, NetworkKind, NetworkParams};

const DEFAULT_RPC_HOST: &str = "localhost";
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Which chain backend feeds the wallet. Exactly one is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// Full node over rpc plus a push-event (zmq) channel.
    #[serde(rename = "bitcoind")]
    FullNodeEvent,
    /// Full node over a persistent TLS websocket session.
    #[serde(rename = "btcd")]
    FullNodeStream,
    /// Embedded compact-filter light client.
    #[default]
    #[serde(rename = "neutrino")]
    LightClient,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::FullNodeEvent => "bitcoind",
            BackendKind::FullNodeStream => "btcd",
            BackendKind::LightClient => "neutrino",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bitcoind" | "litecoind" | "event" => Some(BackendKind::FullNodeEvent),
            "btcd" | "ltcd" | "stream" => Some(BackendKind::FullNodeStream),
            "neutrino" | "light" | "spv" => Some(BackendKind::LightClient),
            _ => None,
        }
    }

    pub fn is_full_node(&self) -> bool {
        !matches!(self, BackendKind::LightClient)
    }
}

/// Connection settings for a bitcoind-style node (rpc + zmq).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventNodeConfig {
    /// Directory holding the node's own config file.
    pub dir: Option<PathBuf>,
    pub rpc_host: String,
    pub rpc_user: String,
    pub rpc_pass: String,
    /// zmq endpoint publishing raw blocks.
    pub zmq_path: String,
}

impl Default for EventNodeConfig {
    fn default() -> Self {
        Self { dir: None, rpc_host: DEFAULT_RPC_HOST.into(), rpc_user: String::new(), rpc_pass: String::new(), zmq_path: String::new() }
    }
}

/// Connection settings for a btcd-style node (websocket + TLS).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamNodeConfig {
    pub dir: Option<PathBuf>,
    pub rpc_host: String,
    pub rpc_user: String,
    pub rpc_pass: String,
    /// Path to the node's rpc certificate.
    pub rpc_cert: Option<PathBuf>,
    /// Hex-encoded certificate, wins over `rpc_cert`.
    pub raw_rpc_cert: Option<String>,
}

impl Default for StreamNodeConfig {
    fn default() -> Self {
        Self { dir: None, rpc_host: DEFAULT_RPC_HOST.into(), rpc_user: String::new(), rpc_pass: String::new(), rpc_cert: None, raw_rpc_cert: None }
    }
}

/// Light client tunables. Passed to the chain service, never set globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightClientConfig {
    /// Peers added alongside discovered ones.
    pub add_peers: Vec<String>,
    /// Peers to connect to exclusively.
    pub connect_peers: Vec<String>,
    pub max_peers: u32,
    pub ban_duration_secs: u64,
    pub filter_header_wait_ms: u64,
}

impl Default for LightClientConfig {
    fn default() -> Self {
        Self { add_peers: Vec::new(), connect_peers: Vec::new(), max_peers: 8, ban_duration_secs: 5, filter_header_wait_ms: 1_000 }
    }
}

impl LightClientConfig {
    pub fn ban_duration(&self) -> Duration { Duration::from_secs(self.ban_duration_secs) }
    pub fn filter_header_wait(&self) -> Duration { Duration::from_millis(self.filter_header_wait_ms) }
}

/// Chain configuration. Higher layers construct this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub chain: ChainCode,
    pub network: NetworkKind,
    pub backend: BackendKind,
    /// Wallet and light client data for the primary chain.
    pub chain_dir: Option<PathBuf>,
    pub bitcoind: EventNodeConfig,
    pub btcd: StreamNodeConfig,
    pub neutrino: LightClientConfig,
    /// Overrides the chain's default forwarding policy.
    pub routing_policy: Option<ForwardingPolicy>,
    /// Bound on the regtest port probe.
    pub probe_timeout_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain: ChainCode::default(),
            network: NetworkKind::default(),
            backend: BackendKind::default(),
            chain_dir: None,
            bitcoind: EventNodeConfig::default(),
            btcd: StreamNodeConfig::default(),
            neutrino: LightClientConfig::default(),
            routing_policy: None,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl ChainConfig {
    pub fn new(chain: ChainCode, network: NetworkKind, backend: BackendKind) -> Self {
        Self { chain, network, backend, ..Default::default() }
    }
    pub fn with_chain_dir(mut self, dir: impl Into<PathBuf>) -> Self { self.chain_dir = Some(dir.into()); self }
    pub fn with_bitcoind(mut self, c: EventNodeConfig) -> Self { self.bitcoind = c; self }
    pub fn with_btcd(mut self, c: StreamNodeConfig) -> Self { self.btcd = c; self }
    pub fn with_neutrino(mut self, c: LightClientConfig) -> Self { self.neutrino = c; self }
    pub fn with_routing_policy(mut self, p: ForwardingPolicy) -> Self { self.routing_policy = Some(p); self }
    pub fn with_probe_timeout(mut self, t: Duration) -> Self { self.probe_timeout_ms = t.as_millis() as u64; self }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn params(&self) -> NetworkParams {
        NetworkParams::new(self.chain, self.network)
    }

    pub fn routing_policy(&self) -> ForwardingPolicy {
        self.routing_policy.unwrap_or_else(|| self.chain.default_routing_policy())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn chain_dir(&self) -> PathBuf {
        self.chain_dir.clone().unwrap_or_else(|| default_chain_dir(self.chain))
    }
}

/// Wallet unlock and rescan parameters, consumed by the wallet core.
pub struct WalletParams {
    pub private_passphrase: Zeroizing<Vec<u8>>,
    pub public_passphrase: Zeroizing<Vec<u8>>,
    /// Earliest time the wallet could have seen activity.
    pub birthday: DateTime<Utc>,
    /// Number of unused addresses scanned ahead during recovery.
    pub recovery_window: u32,
}

impl WalletParams {
    pub fn new(private_passphrase: impl Into<Vec<u8>>, public_passphrase: impl Into<Vec<u8>>) -> Self {
        Self {
            private_passphrase: Zeroizing::new(private_passphrase.into()),
            public_passphrase: Zeroizing::new(public_passphrase.into()),
            birthday: Utc::now(),
            recovery_window: 0,
        }
    }
    pub fn with_birthday(mut self, birthday: DateTime<Utc>) -> Self { self.birthday = birthday; self }
    pub fn with_recovery_window(mut self, window: u32) -> Self { self.recovery_window = window; self }
}

impl std::fmt::Debug for WalletParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletParams")
            .field("birthday", &self.birthday)
            .field("recovery_window", &self.recovery_window)
            .finish_non_exhaustive()
    }
}

/// Root for beechain data, `BEECHAIN_ROOT` overrides the platform default.
pub fn default_root() -> PathBuf {
    std::env::var("BEECHAIN_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("beechain"))
}

pub fn default_chain_dir(chain: ChainCode) -> PathBuf {
    default_root().join("data").join("chain").join(chain.as_str())
}

/// `~/.<name>`, where full nodes keep their config by default.
pub fn default_daemon_dir(name: &str) -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(format!(".{name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_config_fills_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(&path, r#"{"chain":"litecoin","network":"testnet","backend":"btcd","btcd":{"rpc_user":"u","rpc_pass":"p"}}"#).unwrap();

        let config = ChainConfig::from_json_file(&path).unwrap();
        assert_eq!(config.chain, ChainCode::Litecoin);
        assert_eq!(config.backend, BackendKind::FullNodeStream);
        assert_eq!(config.btcd.rpc_host, "localhost");
        assert_eq!(config.btcd.rpc_user, "u");
        assert_eq!(config.neutrino.max_peers, 8);
        assert_eq!(config.probe_timeout(), Duration::from_secs(2));
        assert_eq!(config.routing_policy().time_lock_delta, 576);
    }

    #[test]
    fn bad_json_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(ChainConfig::from_json_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn backend_aliases() {
        assert_eq!(BackendKind::from_str("litecoind"), Some(BackendKind::FullNodeEvent));
        assert_eq!(BackendKind::from_str("spv"), Some(BackendKind::LightClient));
        assert!(BackendKind::FullNodeStream.is_full_node());
        assert!(!BackendKind::LightClient.is_full_node());
    }

    #[test]
    fn wallet_params_debug_hides_passphrases() {
        let params = WalletParams::new(b"hunter2".to_vec(), b"public".to_vec()).with_recovery_window(250);
        let shown = format!("{params:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("250"));
    }
}
