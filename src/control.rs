//! ChainControl: the capability bundle handed to the wallet and channel core.

use std::sync::{Arc, Mutex};
use tracing::info;

use crate::backend::{
    run_actions, Backend, BuildContext, FullNodeEventBackend, FullNodeStreamBackend, LightClientBackend, ReleaseAction,
};
use crate::capabilities::{
    ChainIo, ChainNotifier, FeeEstimator, FilteredChainView, FullNodeDriver, LightClientDriver, LightningWallet,
    MessageSigner, Signer, WalletController, WalletCore,
};
use crate::config::{BackendKind, ChainConfig, WalletParams};
use crate::connection::ConnectionConfigurer;
use crate::credentials::{CredentialResolver, Credentials};
use crate::error::{ChainResult, ConstructionError};
use crate::net::{ClearNet, NetworkProvider};
use crate::params::ForwardingPolicy;

/// Releases backend-owned resources. Only the first `run` does anything.
pub struct Cleanup {
    actions: Mutex<Option<Vec<ReleaseAction>>>,
}

impl Cleanup {
    pub(crate) fn new(actions: Vec<ReleaseAction>) -> Self {
        Self { actions: Mutex::new(Some(actions)) }
    }

    pub async fn run(&self) {
        let pending = self.actions.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(actions) = pending {
            info!("Releasing chain backend resources");
            run_actions(actions).await;
        }
    }

    pub fn has_run(&self) -> bool {
        self.actions.lock().unwrap_or_else(|p| p.into_inner()).is_none()
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleanup").field("has_run", &self.has_run()).finish()
    }
}

/// External implementations the bootstrap wires together.
#[derive(Clone)]
pub struct ChainDrivers {
    full_node: Option<Arc<dyn FullNodeDriver>>,
    light_client: Option<Arc<dyn LightClientDriver>>,
    wallet_core: Arc<dyn WalletCore>,
    network: Arc<dyn NetworkProvider>,
}

impl ChainDrivers {
    pub fn new(wallet_core: Arc<dyn WalletCore>) -> Self {
        Self { full_node: None, light_client: None, wallet_core, network: Arc::new(ClearNet) }
    }
    pub fn with_full_node(mut self, d: Arc<dyn FullNodeDriver>) -> Self { self.full_node = Some(d); self }
    pub fn with_light_client(mut self, d: Arc<dyn LightClientDriver>) -> Self { self.light_client = Some(d); self }
    pub fn with_network(mut self, n: Arc<dyn NetworkProvider>) -> Self { self.network = n; self }

    fn full_node(&self, backend: BackendKind) -> Result<Arc<dyn FullNodeDriver>, ConstructionError> {
        self.full_node.clone().ok_or(ConstructionError::MissingDriver { backend: backend.as_str() })
    }

    fn light_client(&self) -> Result<Arc<dyn LightClientDriver>, ConstructionError> {
        self.light_client.clone().ok_or(ConstructionError::MissingDriver { backend: BackendKind::LightClient.as_str() })
    }
}

/// Built once per process. Read-only after construction.
pub struct ChainControl {
    backend: BackendKind,
    routing_policy: ForwardingPolicy,
    fee_estimator: Arc<dyn FeeEstimator>,
    chain_notifier: Arc<dyn ChainNotifier>,
    chain_view: Arc<dyn FilteredChainView>,
    wallet_controller: Arc<dyn WalletController>,
    signer: Arc<dyn Signer>,
    message_signer: Arc<dyn MessageSigner>,
    chain_io: Arc<dyn ChainIo>,
    wallet: Arc<dyn LightningWallet>,
}

impl ChainControl {
    /// Resolves credentials and connection, builds the configured backend and
    /// starts the wallet. The Cleanup handle is present only for backends
    /// that keep resources running.
    pub async fn from_config(config: &ChainConfig, wallet: &WalletParams, drivers: &ChainDrivers) -> ChainResult<(ChainControl, Option<Cleanup>)> {
        let params = config.params();
        info!("Primary chain is set to: {}", params.chain);

        let explicit = Credentials::from_config(config);
        let creds = CredentialResolver::from_config(config).resolve(&explicit, &params)?;
        let configurer = ConnectionConfigurer::new(drivers.network.clone()).with_probe_timeout(config.probe_timeout());

        let backend = match config.backend {
            BackendKind::FullNodeEvent => {
                let conn = configurer.event_connection(&config.bitcoind, creds, &params).await?;
                Backend::FullNodeEvent(FullNodeEventBackend::new(drivers.full_node(config.backend)?, conn))
            }
            BackendKind::FullNodeStream => {
                let conn = configurer.stream_connection(&config.btcd, creds, &params).await?;
                Backend::FullNodeStream(FullNodeStreamBackend::new(drivers.full_node(config.backend)?, conn))
            }
            BackendKind::LightClient => Backend::LightClient(LightClientBackend::new(drivers.light_client()?)),
        };

        let ctx = BuildContext {
            config,
            params,
            wallet,
            wallet_core: drivers.wallet_core.as_ref(),
            network: drivers.network.clone(),
        };
        let (output, cleanup) = backend.build(&ctx).await?;

        let control = ChainControl {
            backend: backend.kind(),
            routing_policy: config.routing_policy(),
            fee_estimator: output.fee_estimator,
            chain_notifier: output.notifier,
            chain_view: output.chain_view,
            wallet_controller: output.handles.controller,
            signer: output.handles.signer,
            message_signer: output.handles.message_signer,
            chain_io: output.handles.chain_io,
            wallet: output.wallet,
        };
        Ok((control, cleanup))
    }

    pub fn backend(&self) -> BackendKind { self.backend }
    pub fn routing_policy(&self) -> &ForwardingPolicy { &self.routing_policy }
    pub fn fee_estimator(&self) -> &Arc<dyn FeeEstimator> { &self.fee_estimator }
    pub fn chain_notifier(&self) -> &Arc<dyn ChainNotifier> { &self.chain_notifier }
    pub fn chain_view(&self) -> &Arc<dyn FilteredChainView> { &self.chain_view }
    pub fn wallet_controller(&self) -> &Arc<dyn WalletController> { &self.wallet_controller }
    pub fn signer(&self) -> &Arc<dyn Signer> { &self.signer }
    pub fn message_signer(&self) -> &Arc<dyn MessageSigner> { &self.message_signer }
    pub fn chain_io(&self) -> &Arc<dyn ChainIo> { &self.chain_io }
    pub fn wallet(&self) -> &Arc<dyn LightningWallet> { &self.wallet }
}

impl std::fmt::Debug for ChainControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainControl")
            .field("backend", &self.backend)
            .field("routing_policy", &self.routing_policy)
            .field("wallet_started", &self.wallet.is_started())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn cleanup_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counted = count.clone();
        let mut scope = crate::backend::ResourceScope::new();
        scope.defer("counter", move || async move {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        let cleanup = scope.into_cleanup().unwrap();
        assert!(!cleanup.has_run());
        cleanup.run().await;
        cleanup.run().await;
        assert!(cleanup.has_run());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
