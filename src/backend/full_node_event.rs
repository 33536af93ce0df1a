//! Full node over rpc plus a zmq push channel (bitcoind, litecoind).

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{BackendBuilder, BackendParts, BuildContext, ResourceScope};
use crate::capabilities::{ChainSourceOptions, FullNodeDriver};
use crate::config::BackendKind;
use crate::connection::NodeConnection;
use crate::error::{BuildStage, ConstructionError};
use crate::fees;

/// Wallet chain source poll interval.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct FullNodeEventBackend {
    driver: Arc<dyn FullNodeDriver>,
    conn: NodeConnection,
}

impl FullNodeEventBackend {
    pub fn new(driver: Arc<dyn FullNodeDriver>, conn: NodeConnection) -> Self { Self { driver, conn } }
    pub fn connection(&self) -> &NodeConnection { &self.conn }
}

#[async_trait]
impl BackendBuilder for FullNodeEventBackend {
    fn kind(&self) -> BackendKind { BackendKind::FullNodeEvent }

    async fn build_parts(&self, ctx: &BuildContext<'_>, scope: &mut ResourceScope) -> Result<BackendParts, ConstructionError> {
        debug!("Connecting to {} with event stream {:?}", self.conn.host, self.conn.event_stream);
        let notifier = self.driver.new_notifier(&self.conn).await.map_err(ConstructionError::stage(BuildStage::Notifier))?;
        let chain_view = self.driver.new_chain_view(&self.conn).await.map_err(ConstructionError::stage(BuildStage::ChainView))?;
        let chain_source = self.driver
            .new_chain_source(&self.conn, &ChainSourceOptions::EventPoll { interval: POLL_INTERVAL })
            .await
            .map_err(ConstructionError::stage(BuildStage::ChainSource))?;

        let selected = fees::select(self.kind(), &ctx.params, Some((self.driver.as_ref(), &self.conn))).await?;
        scope.defer_estimator(&selected);

        Ok(BackendParts { notifier, chain_view, chain_source, fee_estimator: selected.estimator })
    }
}
