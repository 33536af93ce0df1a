//! Error kinds for chain bootstrap.
//!
//! Every failure is terminal for the current attempt and reaches the caller
//! of [`crate::ChainControl::from_config`] unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// Missing, partial or unreadable credential material.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("please set all or none of {}", qualified(daemon, fields))]
    PartialCredentials { daemon: &'static str, fields: Vec<&'static str> },

    #[error("{daemon}: rpcuser and rpcpass must be set explicitly, cannot auto-discover on private network {network}")]
    PrivateNetwork { daemon: &'static str, network: &'static str },

    #[error("no configuration directory for {daemon}")]
    NoConfigDir { daemon: &'static str },

    #[error("unable to read {}: {source}", path.display())]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error("unable to find {key} in {}", path.display())]
    MissingKey { key: &'static str, path: PathBuf },

    #[error("invalid config pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("config file {}: {source}", path.display())]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
}

fn qualified(daemon: &str, fields: &[&'static str]) -> String {
    fields.iter().map(|f| format!("{daemon}.{f}")).collect::<Vec<_>>().join(", ")
}

/// Host resolution, TLS material and dial failures.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("rpc host is empty")]
    EmptyHost,

    #[error("no rpc certificate: set either rawrpccert or rpccert")]
    MissingCertificate,

    #[error("invalid rawrpccert: {0}")]
    InvalidCertificate(#[from] hex::FromHexError),

    #[error("unable to read rpc certificate {}: {source}", path.display())]
    CertificateRead { path: PathBuf, #[source] source: std::io::Error },

    #[error("rpc certificate {} is empty", path.display())]
    EmptyCertificate { path: PathBuf },
}

/// Step of a backend build, used to label collaborator failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Notifier,
    ChainView,
    ChainSource,
    FeeEstimator,
    WalletController,
    Wallet,
    LightClientIndex,
    LightClientService,
}

impl BuildStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStage::Notifier => "chain notifier",
            BuildStage::ChainView => "filtered chain view",
            BuildStage::ChainSource => "wallet chain source",
            BuildStage::FeeEstimator => "fee estimator",
            BuildStage::WalletController => "wallet controller",
            BuildStage::Wallet => "lightning wallet",
            BuildStage::LightClientIndex => "light client index",
            BuildStage::LightClientService => "light client service",
        }
    }
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any backend-builder or fee-estimator failure.
#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("unable to create {stage}: {source:#}")]
    Stage { stage: BuildStage, #[source] source: anyhow::Error },

    #[error("unable to start {stage}: {source:#}")]
    Start { stage: BuildStage, #[source] source: anyhow::Error },

    #[error("unable to create light client directory {}: {source}", path.display())]
    IndexDir { path: PathBuf, #[source] source: std::io::Error },

    #[error("no driver registered for the {backend} backend")]
    MissingDriver { backend: &'static str },
}

impl ConstructionError {
    pub fn stage(stage: BuildStage) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| ConstructionError::Stage { stage, source }
    }

    pub fn start(stage: BuildStage) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| ConstructionError::Start { stage, source }
    }
}

/// Umbrella error returned by the bootstrap factory.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_credentials_lists_every_field() {
        let err = ConfigError::PartialCredentials {
            daemon: "bitcoind",
            fields: vec!["rpcuser", "rpcpass", "zmqpath"],
        };
        assert_eq!(
            err.to_string(),
            "please set all or none of bitcoind.rpcuser, bitcoind.rpcpass, bitcoind.zmqpath"
        );
    }

    #[test]
    fn stage_errors_name_the_step() {
        let err = ConstructionError::stage(BuildStage::ChainView)(anyhow::anyhow!("refused"));
        assert_eq!(err.to_string(), "unable to create filtered chain view: refused");
        let err: ChainError = err.into();
        assert!(matches!(err, ChainError::Construction(_)));
    }
}
