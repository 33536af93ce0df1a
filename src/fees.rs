//! Fee estimator selection.

use anyhow::Result;
use async_trait::async_trait;
use bitcoin::FeeRate;
use std::sync::Arc;
use tracing::info;

use crate::capabilities::{FeeEstimator, FullNodeDriver};
use crate::config::BackendKind;
use crate::connection::NodeConnection;
use crate::error::{BuildStage, ConstructionError};
use crate::params::NetworkParams;

/// Rate the live estimator falls back to until it has data.
pub const LIVE_FALLBACK_SAT_PER_VB: u32 = 25;

/// Always answers with the same rate.
#[derive(Debug, Clone, Copy)]
pub struct StaticFeeEstimator {
    rate: FeeRate,
}

impl StaticFeeEstimator {
    pub fn new(rate: FeeRate) -> Self { Self { rate } }
    pub fn rate(&self) -> FeeRate { self.rate }
}

#[async_trait]
impl FeeEstimator for StaticFeeEstimator {
    async fn start(&self) -> Result<()> { Ok(()) }
    async fn stop(&self) -> Result<()> { Ok(()) }
    async fn estimate(&self, _target_blocks: u32) -> Result<FeeRate> { Ok(self.rate) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeChoice {
    Static(FeeRate),
    Live { fallback: FeeRate },
}

impl FeeChoice {
    pub fn is_live(&self) -> bool { matches!(self, FeeChoice::Live { .. }) }
}

/// Static for the light client, private networks and drivers without live
/// support; live otherwise.
pub fn choose(backend: BackendKind, params: &NetworkParams, live_supported: bool) -> FeeChoice {
    if backend == BackendKind::LightClient || params.is_private() || !live_supported {
        FeeChoice::Static(params.chain.static_fee_rate())
    } else {
        FeeChoice::Live { fallback: FeeRate::from_sat_per_vb_u32(LIVE_FALLBACK_SAT_PER_VB) }
    }
}

/// Selected estimator, and whether it was started (and so must be stopped).
pub struct SelectedEstimator {
    pub estimator: Arc<dyn FeeEstimator>,
    pub started: bool,
}

pub async fn select(
    backend: BackendKind,
    params: &NetworkParams,
    driver: Option<(&dyn FullNodeDriver, &NodeConnection)>,
) -> Result<SelectedEstimator, ConstructionError> {
    let live_supported = driver.is_some_and(|(d, _)| d.supports_live_fees());
    match (choose(backend, params, live_supported), driver) {
        (FeeChoice::Live { fallback }, Some((driver, conn))) => {
            info!("Initializing {} backed fee estimator", backend.as_str());
            let estimator = driver.new_fee_estimator(conn, fallback).await.map_err(ConstructionError::stage(BuildStage::FeeEstimator))?;
            estimator.start().await.map_err(ConstructionError::start(BuildStage::FeeEstimator))?;
            Ok(SelectedEstimator { estimator, started: true })
        }
        (choice, _) => {
            let rate = match choice { FeeChoice::Static(rate) => rate, FeeChoice::Live { .. } => params.chain.static_fee_rate() };
            info!("Using static fee estimator at {} sat/vB", rate.to_sat_per_vb_floor());
            Ok(SelectedEstimator { estimator: Arc::new(StaticFeeEstimator::new(rate)), started: false })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ChainCode, NetworkKind};

    #[test]
    fn decision_table() {
        let main = NetworkParams::bitcoin(NetworkKind::Mainnet);
        let regtest = NetworkParams::bitcoin(NetworkKind::Regtest);
        let simnet = NetworkParams::new(ChainCode::Litecoin, NetworkKind::Simnet);

        assert!(choose(BackendKind::FullNodeEvent, &main, true).is_live());
        assert!(choose(BackendKind::FullNodeStream, &main, true).is_live());
        assert!(!choose(BackendKind::FullNodeEvent, &main, false).is_live());
        assert!(!choose(BackendKind::LightClient, &main, true).is_live());
        assert_eq!(choose(BackendKind::FullNodeEvent, &regtest, true), FeeChoice::Static(FeeRate::from_sat_per_vb_u32(50)));
        assert_eq!(choose(BackendKind::LightClient, &simnet, true), FeeChoice::Static(FeeRate::from_sat_per_vb_u32(200)));
    }

    #[tokio::test]
    async fn static_estimator_answers_fixed_rate() {
        let selected = select(BackendKind::LightClient, &NetworkParams::bitcoin(NetworkKind::Testnet), None).await.unwrap();
        assert!(!selected.started);
        assert_eq!(selected.estimator.estimate(6).await.unwrap().to_sat_per_vb_floor(), 50);
    }
}
