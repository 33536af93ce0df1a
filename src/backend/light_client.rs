//! Embedded compact-filter light client (neutrino).
//!
//! Owns an on-disk index under `<chain_dir>/<network>/neutrino.db` and a
//! background sync service. Both outlive construction and are released by the
//! Cleanup handle: service stopped first, then the index closed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::{BackendBuilder, BackendParts, BuildContext, ResourceScope};
use crate::capabilities::{LightClientDriver, LightClientServiceConfig};
use crate::config::BackendKind;
use crate::error::{BuildStage, ConstructionError};
use crate::fees;
use crate::net::NameResolver;

pub const INDEX_FILE: &str = "neutrino.db";

pub struct LightClientBackend {
    driver: Arc<dyn LightClientDriver>,
}

impl LightClientBackend {
    pub fn new(driver: Arc<dyn LightClientDriver>) -> Self { Self { driver } }
}

/// `<chain_dir>/<normalized network>`.
pub fn index_dir(chain_dir: &Path, network: &str) -> PathBuf {
    chain_dir.join(network)
}

fn create_private_dir(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
    }
    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(path)
    }
}

#[async_trait]
impl BackendBuilder for LightClientBackend {
    fn kind(&self) -> BackendKind { BackendKind::LightClient }

    fn owns_resources(&self) -> bool { true }

    async fn build_parts(&self, ctx: &BuildContext<'_>, scope: &mut ResourceScope) -> Result<BackendParts, ConstructionError> {
        let dir = index_dir(&ctx.config.chain_dir(), ctx.params.normalized_name());
        create_private_dir(&dir).map_err(|source| ConstructionError::IndexDir { path: dir.clone(), source })?;

        let index = self.driver
            .open_index(&dir.join(INDEX_FILE))
            .await
            .map_err(ConstructionError::stage(BuildStage::LightClientIndex))?;
        let closing = index.clone();
        scope.defer("light client index", move || async move {
            if let Err(e) = closing.close().await {
                warn!("Light client index close failed: {:#}", e);
            }
        });

        let tunables = &ctx.config.neutrino;
        let service = self.driver
            .new_chain_service(LightClientServiceConfig {
                data_dir: dir,
                index,
                params: ctx.params.clone(),
                add_peers: tunables.add_peers.clone(),
                connect_peers: tunables.connect_peers.clone(),
                dialer: ctx.network.clone(),
                resolver: NameResolver::new(ctx.network.clone()),
                filter_header_wait: tunables.filter_header_wait(),
                max_peers: tunables.max_peers,
                ban_duration: tunables.ban_duration(),
            })
            .await
            .map_err(ConstructionError::stage(BuildStage::LightClientService))?;
        service.start().await.map_err(ConstructionError::start(BuildStage::LightClientService))?;
        info!("Light client service started");
        let stopping = service.clone();
        scope.defer("light client service", move || async move {
            match stopping.stop().await {
                Ok(()) => info!("Light client service stopped"),
                Err(e) => warn!("Light client service stop failed: {:#}", e),
            }
        });

        let notifier = self.driver.new_notifier(&service).await.map_err(ConstructionError::stage(BuildStage::Notifier))?;
        let chain_view = self.driver.new_chain_view(&service).await.map_err(ConstructionError::stage(BuildStage::ChainView))?;
        let chain_source = self.driver.new_chain_source(&service).await.map_err(ConstructionError::stage(BuildStage::ChainSource))?;
        let selected = fees::select(self.kind(), &ctx.params, None).await?;

        Ok(BackendParts { notifier, chain_view, chain_source, fee_estimator: selected.estimator })
    }
}
