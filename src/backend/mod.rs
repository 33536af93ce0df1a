//! Backend builders.
//!
//! ```text
//! Backend::build
//!   -> builder.build_parts   notifier, chain view, chain source, fee estimator
//!   -> assemble              wallet controller, lightning wallet, startup
//!   -> BackendOutput (+ Cleanup for backends that own resources)
//! ```
//!
//! Every resource opened or started while building is registered with a
//! [`ResourceScope`]. On error the scope is released before the error is
//! returned.

pub mod full_node_event;
pub mod full_node_stream;
pub mod light_client;

pub use full_node_event::FullNodeEventBackend;
pub use full_node_stream::FullNodeStreamBackend;
pub use light_client::LightClientBackend;

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::capabilities::{
    ChainNotifier, ChainSource, FeeEstimator, FilteredChainView, LightningWallet, LightningWalletConfig,
    WalletControllerConfig, WalletCore, WalletHandles,
};
use crate::config::{BackendKind, ChainConfig, WalletParams};
use crate::control::Cleanup;
use crate::error::{BuildStage, ConstructionError};
use crate::fees::SelectedEstimator;
use crate::net::NetworkProvider;
use crate::params::NetworkParams;

pub(crate) type ReleaseFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub(crate) type ReleaseAction = (&'static str, Box<dyn FnOnce() -> ReleaseFuture + Send>);

/// Release actions for resources acquired during one build.
#[derive(Default)]
pub struct ResourceScope {
    actions: Vec<ReleaseAction>,
}

impl ResourceScope {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.actions.len() }
    pub fn is_empty(&self) -> bool { self.actions.is_empty() }

    pub fn defer<F, Fut>(&mut self, label: &'static str, release: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.actions.push((label, Box::new(move || Box::pin(release()) as ReleaseFuture)));
    }

    /// Registers `stop` for a started fee estimator.
    pub fn defer_estimator(&mut self, selected: &SelectedEstimator) {
        if selected.started {
            let estimator = selected.estimator.clone();
            self.defer("fee estimator", move || async move {
                if let Err(e) = estimator.stop().await {
                    warn!("Fee estimator stop failed: {:#}", e);
                }
            });
        }
    }

    /// Runs every action, newest first.
    pub async fn release(self) {
        run_actions(self.actions).await;
    }

    /// Keeps the resources alive, handing their release to the caller.
    pub fn into_cleanup(self) -> Option<Cleanup> {
        (!self.actions.is_empty()).then(|| Cleanup::new(self.actions))
    }

    /// Drops the actions without running them.
    pub fn disarm(self) {
        debug!("Keeping {} scoped resource(s)", self.actions.len());
    }
}

pub(crate) async fn run_actions(actions: Vec<ReleaseAction>) {
    for (label, release) in actions.into_iter().rev() {
        debug!("Releasing {}", label);
        release().await;
    }
}

/// Inputs shared by every builder.
pub struct BuildContext<'a> {
    pub config: &'a ChainConfig,
    pub params: NetworkParams,
    pub wallet: &'a WalletParams,
    pub wallet_core: &'a dyn WalletCore,
    pub network: Arc<dyn NetworkProvider>,
}

/// Chain capabilities a builder produces before the wallet is created.
pub struct BackendParts {
    pub notifier: Arc<dyn ChainNotifier>,
    pub chain_view: Arc<dyn FilteredChainView>,
    pub chain_source: Arc<dyn ChainSource>,
    pub fee_estimator: Arc<dyn FeeEstimator>,
}

/// A fully built backend, wallet started.
pub struct BackendOutput {
    pub notifier: Arc<dyn ChainNotifier>,
    pub chain_view: Arc<dyn FilteredChainView>,
    pub fee_estimator: Arc<dyn FeeEstimator>,
    pub handles: WalletHandles,
    pub wallet: Arc<dyn LightningWallet>,
}

#[async_trait]
pub trait BackendBuilder: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Builds the chain capabilities, registering anything that needs release.
    async fn build_parts(&self, ctx: &BuildContext<'_>, scope: &mut ResourceScope) -> Result<BackendParts, ConstructionError>;

    /// Backends that own resources past construction return a Cleanup handle.
    fn owns_resources(&self) -> bool { false }
}

/// The active backend. Exactly one per process.
pub enum Backend {
    FullNodeEvent(FullNodeEventBackend),
    FullNodeStream(FullNodeStreamBackend),
    LightClient(LightClientBackend),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        self.builder().kind()
    }

    fn builder(&self) -> &dyn BackendBuilder {
        match self {
            Backend::FullNodeEvent(b) => b,
            Backend::FullNodeStream(b) => b,
            Backend::LightClient(b) => b,
        }
    }

    pub async fn build(&self, ctx: &BuildContext<'_>) -> Result<(BackendOutput, Option<Cleanup>), ConstructionError> {
        let builder = self.builder();
        info!("Building {} backend on {} {}", builder.kind().as_str(), ctx.params.chain, ctx.params.name);
        let mut scope = ResourceScope::new();
        let result = match builder.build_parts(ctx, &mut scope).await {
            Ok(parts) => assemble(ctx, parts).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(output) if builder.owns_resources() => Ok((output, scope.into_cleanup())),
            Ok(output) => {
                scope.disarm();
                Ok((output, None))
            }
            Err(e) => {
                warn!("{} backend failed, releasing {} resource(s): {}", builder.kind().as_str(), scope.len(), e);
                scope.release().await;
                Err(e)
            }
        }
    }
}

/// Wallet controller and lightning wallet, common to all backends.
async fn assemble(ctx: &BuildContext<'_>, parts: BackendParts) -> Result<BackendOutput, ConstructionError> {
    let handles = ctx.wallet_core
        .open_wallet_controller(WalletControllerConfig {
            wallet: ctx.wallet,
            data_dir: ctx.config.chain_dir(),
            params: ctx.params.clone(),
            coin_type: ctx.params.coin_type,
            fee_estimator: parts.fee_estimator.clone(),
            chain_source: parts.chain_source.clone(),
        })
        .await
        .map_err(ConstructionError::stage(BuildStage::WalletController))?;

    // The controller outlives a successful build on every backend, so its
    // close only guards the remaining wallet steps.
    let mut wallet_scope = ResourceScope::new();
    let controller = handles.controller.clone();
    wallet_scope.defer("wallet controller", move || async move {
        if let Err(e) = controller.close().await {
            warn!("Wallet controller close failed: {:#}", e);
        }
    });

    let wallet = match start_wallet(ctx, &parts, &handles).await {
        Ok(wallet) => wallet,
        Err(e) => {
            wallet_scope.release().await;
            return Err(e);
        }
    };
    wallet_scope.disarm();
    info!("LightningWallet opened");

    Ok(BackendOutput {
        notifier: parts.notifier,
        chain_view: parts.chain_view,
        fee_estimator: parts.fee_estimator,
        handles,
        wallet,
    })
}

async fn start_wallet(
    ctx: &BuildContext<'_>,
    parts: &BackendParts,
    handles: &WalletHandles,
) -> Result<Arc<dyn LightningWallet>, ConstructionError> {
    let wallet = ctx.wallet_core
        .new_lightning_wallet(LightningWalletConfig {
            notifier: parts.notifier.clone(),
            handles: handles.clone(),
            fee_estimator: parts.fee_estimator.clone(),
            constraints: ctx.params.chain.channel_constraints(),
            params: ctx.params.clone(),
        })
        .await
        .map_err(ConstructionError::stage(BuildStage::Wallet))?;
    wallet.startup().await.map_err(ConstructionError::start(BuildStage::Wallet))?;
    Ok(wallet)
}
