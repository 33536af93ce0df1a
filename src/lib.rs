//! Beechain: chain backend bootstrap. One ChainControl, three backends.
//!
//! # Architecture
//!
//! ```text
//! ChainControl::from_config
//!   │
//!   ├── CredentialResolver   explicit, cookie file, or rpcuser/rpcpassword scan
//!   ├── ConnectionConfigurer host:port, regtest probe, TLS certificate
//!   │
//!   ├── Backend (one of)
//!   │     ├── FullNodeEvent   bitcoind / litecoind  (rpc + zmq)
//!   │     ├── FullNodeStream  btcd / ltcd           (websocket + TLS)
//!   │     └── LightClient     neutrino              (index + sync service)
//!   │           └── fees::select  static or live estimator
//!   │
//!   └── WalletCore           wallet controller, lightning wallet startup
//! ```
//!
//! # Backends
//!
//! | Backend | Config key | Fees | Cleanup |
//! |---------|------------|------|---------|
//! | FullNodeEvent | `bitcoind` | live (static on regtest/simnet) | none |
//! | FullNodeStream | `btcd` | live (static on regtest/simnet) | none |
//! | LightClient | `neutrino` | static | stops service, closes index |
//!
//! # Usage
//!
//! ```ignore
//! use beechain::{BackendKind, ChainCode, ChainConfig, ChainControl, ChainDrivers, NetworkKind, WalletParams};
//!
//! let config = ChainConfig::new(ChainCode::Bitcoin, NetworkKind::Testnet, BackendKind::LightClient);
//! let drivers = ChainDrivers::new(wallet_core).with_light_client(neutrino);
//! let (control, cleanup) = ChainControl::from_config(&config, &WalletParams::new(pw, pub_pw), &drivers).await?;
//!
//! // ... run the node ...
//! if let Some(cleanup) = cleanup { cleanup.run().await; }
//! ```

pub mod backend;
pub mod capabilities;
pub mod config;
pub mod connection;
pub mod control;
pub mod credentials;
pub mod error;
pub mod fees;
pub mod logging;
pub mod net;
pub mod params;

pub use backend::{Backend, BackendBuilder, ResourceScope};
pub use config::{BackendKind, ChainConfig, EventNodeConfig, LightClientConfig, StreamNodeConfig, WalletParams};
pub use connection::{ConnectionConfigurer, NodeConnection, Transport};
pub use control::{ChainControl, ChainDrivers, Cleanup};
pub use credentials::{CredentialResolver, Credentials};
pub use error::{ChainError, ChainResult, ConfigError, ConnectionError, ConstructionError};
pub use fees::StaticFeeEstimator;
pub use net::{ClearNet, NetworkProvider};
pub use params::{ChainCode, ForwardingPolicy, NetworkKind, NetworkParams};
