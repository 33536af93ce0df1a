//! Narrow interfaces onto the external chain and wallet libraries.
//!
//! Bootstrap only wires these together. Implementations come from a
//! [`FullNodeDriver`], a [`LightClientDriver`] and a [`WalletCore`] supplied
//! by the caller.

use anyhow::Result;
use async_trait::async_trait;
use bitcoin::FeeRate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::WalletParams;
use crate::connection::NodeConnection;
use crate::net::{NameResolver, NetworkProvider};
use crate::params::{ChannelConstraints, NetworkParams};

/// Block and transaction notifications.
pub trait ChainNotifier: Send + Sync {}

/// Chain changes touching a watched set of outputs.
pub trait FilteredChainView: Send + Sync {}

/// Chain data for the wallet controller.
pub trait ChainSource: Send + Sync {}

#[async_trait]
pub trait FeeEstimator: Send + Sync {
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
    /// Fee rate for confirmation within `target_blocks`.
    async fn estimate(&self, target_blocks: u32) -> Result<FeeRate>;
}

/// On-chain wallet. Holds the wallet database open until `close`.
#[async_trait]
pub trait WalletController: Send + Sync {
    async fn close(&self) -> Result<()>;
}

pub trait Signer: Send + Sync {}
pub trait MessageSigner: Send + Sync {}
pub trait ChainIo: Send + Sync {}

/// Payment-channel wallet built on top of the controller.
#[async_trait]
pub trait LightningWallet: Send + Sync {
    async fn startup(&self) -> Result<()>;
    fn is_started(&self) -> bool;
}

/// How the wallet chain source talks to a full node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainSourceOptions {
    /// RPC plus push events, polling at `interval`.
    EventPoll { interval: Duration },
    /// Dedicated streaming session, giving up after `reconnect_attempts`.
    Stream { reconnect_attempts: u32 },
}

/// Builds capabilities from a full node connection.
#[async_trait]
pub trait FullNodeDriver: Send + Sync {
    async fn new_notifier(&self, conn: &NodeConnection) -> Result<Arc<dyn ChainNotifier>>;
    async fn new_chain_view(&self, conn: &NodeConnection) -> Result<Arc<dyn FilteredChainView>>;
    async fn new_chain_source(&self, conn: &NodeConnection, opts: &ChainSourceOptions) -> Result<Arc<dyn ChainSource>>;
    /// Live estimator, returned unstarted.
    async fn new_fee_estimator(&self, conn: &NodeConnection, fallback: FeeRate) -> Result<Arc<dyn FeeEstimator>>;
    fn supports_live_fees(&self) -> bool { true }
}

/// On-disk header and filter index of the light client.
#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn close(&self) -> Result<()>;
}

/// Background chain sync service of the light client.
#[async_trait]
pub trait ChainService: Send + Sync {
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
}

/// Everything the light client service is constructed from.
#[derive(Clone)]
pub struct LightClientServiceConfig {
    pub data_dir: PathBuf,
    pub index: Arc<dyn IndexStore>,
    pub params: NetworkParams,
    pub add_peers: Vec<String>,
    pub connect_peers: Vec<String>,
    pub dialer: Arc<dyn NetworkProvider>,
    pub resolver: NameResolver,
    pub filter_header_wait: Duration,
    pub max_peers: u32,
    pub ban_duration: Duration,
}

#[async_trait]
pub trait LightClientDriver: Send + Sync {
    async fn open_index(&self, path: &Path) -> Result<Arc<dyn IndexStore>>;
    async fn new_chain_service(&self, cfg: LightClientServiceConfig) -> Result<Arc<dyn ChainService>>;
    async fn new_notifier(&self, service: &Arc<dyn ChainService>) -> Result<Arc<dyn ChainNotifier>>;
    async fn new_chain_view(&self, service: &Arc<dyn ChainService>) -> Result<Arc<dyn FilteredChainView>>;
    async fn new_chain_source(&self, service: &Arc<dyn ChainService>) -> Result<Arc<dyn ChainSource>>;
}

/// Wallet controller construction input.
pub struct WalletControllerConfig<'a> {
    pub wallet: &'a WalletParams,
    pub data_dir: PathBuf,
    pub params: NetworkParams,
    pub coin_type: u32,
    pub fee_estimator: Arc<dyn FeeEstimator>,
    pub chain_source: Arc<dyn ChainSource>,
}

/// The controller also serves as signer, message signer and chain IO.
#[derive(Clone)]
pub struct WalletHandles {
    pub controller: Arc<dyn WalletController>,
    pub signer: Arc<dyn Signer>,
    pub message_signer: Arc<dyn MessageSigner>,
    pub chain_io: Arc<dyn ChainIo>,
}

pub struct LightningWalletConfig {
    pub notifier: Arc<dyn ChainNotifier>,
    pub handles: WalletHandles,
    pub fee_estimator: Arc<dyn FeeEstimator>,
    pub constraints: ChannelConstraints,
    pub params: NetworkParams,
}

#[async_trait]
pub trait WalletCore: Send + Sync {
    async fn open_wallet_controller(&self, cfg: WalletControllerConfig<'_>) -> Result<WalletHandles>;
    async fn new_lightning_wallet(&self, cfg: LightningWalletConfig) -> Result<Arc<dyn LightningWallet>>;
}
