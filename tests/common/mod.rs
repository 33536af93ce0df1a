//! Recording collaborators for bootstrap tests.
//!
//! Every call is appended to a shared journal; `fail_at` makes the named
//! step return an error.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use beechain::capabilities::*;
use beechain::{NetworkProvider, NodeConnection};
use bitcoin::FeeRate;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).push(entry.into());
    }
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }
    /// Position of `entry`, panics if absent.
    pub fn index(&self, entry: &str) -> usize {
        self.entries().iter().position(|e| e == entry).unwrap_or_else(|| panic!("{entry} not in journal"))
    }
}

fn step(journal: &Journal, fail_at: Option<&'static str>, name: &'static str) -> Result<()> {
    journal.push(name);
    if fail_at == Some(name) {
        return Err(anyhow!("{name} refused"));
    }
    Ok(())
}

/// Stands in for the chain capabilities.
pub struct Capability;
impl ChainNotifier for Capability {}
impl FilteredChainView for Capability {}
impl ChainSource for Capability {}

/// Wallet controller that journals its close.
pub struct MockController(Journal);
impl Signer for MockController {}
impl MessageSigner for MockController {}
impl ChainIo for MockController {}

#[async_trait]
impl WalletController for MockController {
    async fn close(&self) -> Result<()> { step(&self.0, None, "controller_close") }
}

pub struct MockFeeEstimator {
    journal: Journal,
    fail_at: Option<&'static str>,
    rate: FeeRate,
}

#[async_trait]
impl FeeEstimator for MockFeeEstimator {
    async fn start(&self) -> Result<()> { step(&self.journal, self.fail_at, "fee_start") }
    async fn stop(&self) -> Result<()> { step(&self.journal, None, "fee_stop") }
    async fn estimate(&self, _target_blocks: u32) -> Result<FeeRate> { Ok(self.rate) }
}

pub struct MockFullNode {
    pub journal: Journal,
    pub fail_at: Option<&'static str>,
    pub live_fees: bool,
    pub connections: Mutex<Vec<NodeConnection>>,
    pub source_options: Mutex<Option<ChainSourceOptions>>,
}

impl MockFullNode {
    pub fn new(journal: &Journal) -> Self {
        Self { journal: journal.clone(), fail_at: None, live_fees: true, connections: Mutex::new(Vec::new()), source_options: Mutex::new(None) }
    }
    pub fn failing_at(mut self, name: &'static str) -> Self { self.fail_at = Some(name); self }
    pub fn without_live_fees(mut self) -> Self { self.live_fees = false; self }
    pub fn last_connection(&self) -> Option<NodeConnection> {
        self.connections.lock().unwrap_or_else(|p| p.into_inner()).last().cloned()
    }
    fn record(&self, conn: &NodeConnection) {
        self.connections.lock().unwrap_or_else(|p| p.into_inner()).push(conn.clone());
    }
}

#[async_trait]
impl FullNodeDriver for MockFullNode {
    async fn new_notifier(&self, conn: &NodeConnection) -> Result<Arc<dyn ChainNotifier>> {
        self.record(conn);
        step(&self.journal, self.fail_at, "notifier")?;
        Ok(Arc::new(Capability))
    }
    async fn new_chain_view(&self, conn: &NodeConnection) -> Result<Arc<dyn FilteredChainView>> {
        self.record(conn);
        step(&self.journal, self.fail_at, "chain_view")?;
        Ok(Arc::new(Capability))
    }
    async fn new_chain_source(&self, conn: &NodeConnection, opts: &ChainSourceOptions) -> Result<Arc<dyn ChainSource>> {
        self.record(conn);
        *self.source_options.lock().unwrap_or_else(|p| p.into_inner()) = Some(*opts);
        step(&self.journal, self.fail_at, "chain_source")?;
        Ok(Arc::new(Capability))
    }
    async fn new_fee_estimator(&self, _conn: &NodeConnection, fallback: FeeRate) -> Result<Arc<dyn FeeEstimator>> {
        step(&self.journal, self.fail_at, "fee_estimator")?;
        Ok(Arc::new(MockFeeEstimator { journal: self.journal.clone(), fail_at: self.fail_at, rate: fallback }))
    }
    fn supports_live_fees(&self) -> bool { self.live_fees }
}

pub struct MockIndex(Journal);

#[async_trait]
impl IndexStore for MockIndex {
    async fn close(&self) -> Result<()> { step(&self.0, None, "index_close") }
}

pub struct MockService {
    journal: Journal,
    fail_at: Option<&'static str>,
    pub running: AtomicBool,
}

#[async_trait]
impl ChainService for MockService {
    async fn start(&self) -> Result<()> {
        step(&self.journal, self.fail_at, "service_start")?;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }
    async fn stop(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        step(&self.journal, None, "service_stop")
    }
}

/// What the light client service was built with.
#[derive(Debug, Clone)]
pub struct SeenServiceConfig {
    pub data_dir: PathBuf,
    pub add_peers: Vec<String>,
    pub connect_peers: Vec<String>,
    pub max_peers: u32,
    pub ban_duration: std::time::Duration,
    pub filter_header_wait: std::time::Duration,
    pub resolved: Vec<std::net::IpAddr>,
}

pub struct MockLightClient {
    pub journal: Journal,
    pub fail_at: Option<&'static str>,
    pub index_path: Mutex<Option<PathBuf>>,
    pub service_config: Mutex<Option<SeenServiceConfig>>,
}

impl MockLightClient {
    pub fn new(journal: &Journal) -> Self {
        Self { journal: journal.clone(), fail_at: None, index_path: Mutex::new(None), service_config: Mutex::new(None) }
    }
    pub fn failing_at(mut self, name: &'static str) -> Self { self.fail_at = Some(name); self }
}

#[async_trait]
impl LightClientDriver for MockLightClient {
    async fn open_index(&self, path: &Path) -> Result<Arc<dyn IndexStore>> {
        *self.index_path.lock().unwrap_or_else(|p| p.into_inner()) = Some(path.to_path_buf());
        step(&self.journal, self.fail_at, "open_index")?;
        Ok(Arc::new(MockIndex(self.journal.clone())))
    }
    async fn new_chain_service(&self, cfg: LightClientServiceConfig) -> Result<Arc<dyn ChainService>> {
        // Name resolution must go through the caller's provider.
        let resolved = cfg.resolver.resolve("seed.example").await.unwrap_or_default();
        *self.service_config.lock().unwrap_or_else(|p| p.into_inner()) = Some(SeenServiceConfig {
            data_dir: cfg.data_dir,
            add_peers: cfg.add_peers,
            connect_peers: cfg.connect_peers,
            max_peers: cfg.max_peers,
            ban_duration: cfg.ban_duration,
            filter_header_wait: cfg.filter_header_wait,
            resolved,
        });
        step(&self.journal, self.fail_at, "service")?;
        Ok(Arc::new(MockService { journal: self.journal.clone(), fail_at: self.fail_at, running: AtomicBool::new(false) }))
    }
    async fn new_notifier(&self, _service: &Arc<dyn ChainService>) -> Result<Arc<dyn ChainNotifier>> {
        step(&self.journal, self.fail_at, "notifier")?;
        Ok(Arc::new(Capability))
    }
    async fn new_chain_view(&self, _service: &Arc<dyn ChainService>) -> Result<Arc<dyn FilteredChainView>> {
        step(&self.journal, self.fail_at, "chain_view")?;
        Ok(Arc::new(Capability))
    }
    async fn new_chain_source(&self, _service: &Arc<dyn ChainService>) -> Result<Arc<dyn ChainSource>> {
        step(&self.journal, self.fail_at, "chain_source")?;
        Ok(Arc::new(Capability))
    }
}

pub struct MockWallet {
    journal: Journal,
    fail_at: Option<&'static str>,
    started: AtomicBool,
}

#[async_trait]
impl LightningWallet for MockWallet {
    async fn startup(&self) -> Result<()> {
        step(&self.journal, self.fail_at, "startup")?;
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }
    fn is_started(&self) -> bool { self.started.load(Ordering::SeqCst) }
}

pub struct MockWalletCore {
    pub journal: Journal,
    pub fail_at: Option<&'static str>,
    pub data_dir: Mutex<Option<PathBuf>>,
    pub coin_type: Mutex<Option<u32>>,
    pub constraints: Mutex<Option<beechain::params::ChannelConstraints>>,
}

impl MockWalletCore {
    pub fn new(journal: &Journal) -> Self {
        Self { journal: journal.clone(), fail_at: None, data_dir: Mutex::new(None), coin_type: Mutex::new(None), constraints: Mutex::new(None) }
    }
    pub fn failing_at(mut self, name: &'static str) -> Self { self.fail_at = Some(name); self }
}

#[async_trait]
impl WalletCore for MockWalletCore {
    async fn open_wallet_controller(&self, cfg: WalletControllerConfig<'_>) -> Result<WalletHandles> {
        *self.data_dir.lock().unwrap_or_else(|p| p.into_inner()) = Some(cfg.data_dir.clone());
        *self.coin_type.lock().unwrap_or_else(|p| p.into_inner()) = Some(cfg.coin_type);
        step(&self.journal, self.fail_at, "controller")?;
        let wc = Arc::new(MockController(self.journal.clone()));
        Ok(WalletHandles { controller: wc.clone(), signer: wc.clone(), message_signer: wc.clone(), chain_io: wc })
    }
    async fn new_lightning_wallet(&self, cfg: LightningWalletConfig) -> Result<Arc<dyn LightningWallet>> {
        *self.constraints.lock().unwrap_or_else(|p| p.into_inner()) = Some(cfg.constraints);
        step(&self.journal, self.fail_at, "wallet")?;
        Ok(Arc::new(MockWallet { journal: self.journal.clone(), fail_at: self.fail_at, started: AtomicBool::new(false) }))
    }
}

/// Refuses every dial; lookups return a fixed list, valid or not.
pub struct OfflineNetwork {
    pub lookups: Vec<&'static str>,
    pub dials: Mutex<Vec<String>>,
}

impl OfflineNetwork {
    pub fn new() -> Self {
        Self { lookups: vec!["192.0.2.7", "bogus", "2001:db8::1"], dials: Mutex::new(Vec::new()) }
    }
    pub fn dialed(&self) -> Vec<String> {
        self.dials.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl NetworkProvider for OfflineNetwork {
    async fn dial(&self, addr: &str) -> std::io::Result<tokio::net::TcpStream> {
        self.dials.lock().unwrap_or_else(|p| p.into_inner()).push(addr.to_string());
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "offline"))
    }
    async fn lookup_host(&self, _host: &str) -> std::io::Result<Vec<String>> {
        Ok(self.lookups.iter().map(|s| s.to_string()).collect())
    }
}
