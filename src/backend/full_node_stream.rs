//! Full node over an authenticated websocket session (btcd, ltcd).

use async_trait::async_trait;
use std::sync::Arc;

use super::{BackendBuilder, BackendParts, BuildContext, ResourceScope};
use crate::capabilities::{ChainSourceOptions, FullNodeDriver};
use crate::config::BackendKind;
use crate::connection::NodeConnection;
use crate::error::{BuildStage, ConstructionError};
use crate::fees;

/// Reconnect attempts of the wallet's own streaming session.
pub const RECONNECT_ATTEMPTS: u32 = 20;

pub struct FullNodeStreamBackend {
    driver: Arc<dyn FullNodeDriver>,
    conn: NodeConnection,
}

impl FullNodeStreamBackend {
    pub fn new(driver: Arc<dyn FullNodeDriver>, conn: NodeConnection) -> Self { Self { driver, conn } }
    pub fn connection(&self) -> &NodeConnection { &self.conn }
}

#[async_trait]
impl BackendBuilder for FullNodeStreamBackend {
    fn kind(&self) -> BackendKind { BackendKind::FullNodeStream }

    async fn build_parts(&self, ctx: &BuildContext<'_>, scope: &mut ResourceScope) -> Result<BackendParts, ConstructionError> {
        let notifier = self.driver.new_notifier(&self.conn).await.map_err(ConstructionError::stage(BuildStage::Notifier))?;
        let chain_view = self.driver.new_chain_view(&self.conn).await.map_err(ConstructionError::stage(BuildStage::ChainView))?;
        // Separate session from the notifier's.
        let chain_source = self.driver
            .new_chain_source(&self.conn, &ChainSourceOptions::Stream { reconnect_attempts: RECONNECT_ATTEMPTS })
            .await
            .map_err(ConstructionError::stage(BuildStage::ChainSource))?;

        let selected = fees::select(self.kind(), &ctx.params, Some((self.driver.as_ref(), &self.conn))).await?;
        scope.defer_estimator(&selected);

        Ok(BackendParts { notifier, chain_view, chain_source, fee_estimator: selected.estimator })
    }
}
