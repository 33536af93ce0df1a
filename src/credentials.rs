//! RPC credential resolution.
//!
//! Explicit credentials are used as-is. When none are given, the target
//! node's own config file is read: bitcoind-style daemons are tried via their
//! cookie file first, then `rpcuser` / `rpcpassword` lines. btcd-style daemons
//! only have the key scan.

use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{default_daemon_dir, BackendKind, ChainConfig};
use crate::error::ConfigError;
use crate::params::{ChainCode, NetworkParams};

pub const KEY_RPC_USER: &str = "rpcuser";
pub const KEY_DATADIR: &str = "datadir";
pub const KEY_ZMQ_BLOCKS: &str = "zmqpubrawblock";
pub const COOKIE_FILE: &str = ".cookie";

/// Full node daemon whose config file we may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Daemon {
    pub name: &'static str,
    pub conf_file: &'static str,
    /// Default config directory name under `$HOME`, without the dot.
    pub dir_name: &'static str,
    pub pass_key: &'static str,
    pub writes_cookie: bool,
    pub needs_event_stream: bool,
}

impl Daemon {
    pub const BITCOIND: Daemon = Daemon { name: "bitcoind", conf_file: "bitcoin.conf", dir_name: "bitcoin", pass_key: "rpcpassword", writes_cookie: true, needs_event_stream: true };
    pub const LITECOIND: Daemon = Daemon { name: "litecoind", conf_file: "litecoin.conf", dir_name: "litecoin", pass_key: "rpcpassword", writes_cookie: true, needs_event_stream: true };
    pub const BTCD: Daemon = Daemon { name: "btcd", conf_file: "btcd.conf", dir_name: "btcd", pass_key: "rpcpass", writes_cookie: false, needs_event_stream: false };
    pub const LTCD: Daemon = Daemon { name: "ltcd", conf_file: "ltcd.conf", dir_name: "ltcd", pass_key: "rpcpass", writes_cookie: false, needs_event_stream: false };

    /// None for the light client, which has no daemon.
    pub fn for_backend(backend: BackendKind, chain: ChainCode) -> Option<Daemon> {
        match (backend, chain) {
            (BackendKind::FullNodeEvent, ChainCode::Bitcoin) => Some(Self::BITCOIND),
            (BackendKind::FullNodeEvent, ChainCode::Litecoin) => Some(Self::LITECOIND),
            (BackendKind::FullNodeStream, ChainCode::Bitcoin) => Some(Self::BTCD),
            (BackendKind::FullNodeStream, ChainCode::Litecoin) => Some(Self::LTCD),
            (BackendKind::LightClient, _) => None,
        }
    }

    /// Names of the fields that must be set together.
    pub fn required_fields(&self) -> Vec<&'static str> {
        if self.needs_event_stream { vec!["rpcuser", "rpcpass", "zmqpath"] } else { vec!["rpcuser", "rpcpass"] }
    }
}

/// RPC credentials plus the push-event endpoint for the event backend.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub event_stream: Option<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: password.into(), event_stream: None }
    }
    pub fn with_event_stream(mut self, path: impl Into<String>) -> Self { self.event_stream = Some(path.into()); self }

    /// Credentials explicitly configured for the selected backend.
    pub fn from_config(config: &ChainConfig) -> Self {
        match config.backend {
            BackendKind::FullNodeEvent => {
                let c = &config.bitcoind;
                let zmq = (!c.zmq_path.is_empty()).then(|| c.zmq_path.clone());
                Self { user: c.rpc_user.clone(), password: c.rpc_pass.clone(), event_stream: zmq }
            }
            BackendKind::FullNodeStream => Self::new(config.btcd.rpc_user.clone(), config.btcd.rpc_pass.clone()),
            BackendKind::LightClient => Self::default(),
        }
    }

    fn supplied(&self, needs_event_stream: bool) -> Vec<bool> {
        let mut set = vec![!self.user.is_empty(), !self.password.is_empty()];
        if needs_event_stream {
            set.push(self.event_stream.as_deref().is_some_and(|s| !s.is_empty()));
        }
        set
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("event_stream", &self.event_stream)
            .finish()
    }
}

/// Resolves credentials for one backend on one chain.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    backend: BackendKind,
    chain: ChainCode,
    node_dir: Option<PathBuf>,
}

impl CredentialResolver {
    pub fn new(backend: BackendKind, chain: ChainCode) -> Self { Self { backend, chain, node_dir: None } }
    pub fn with_node_dir(mut self, dir: impl Into<PathBuf>) -> Self { self.node_dir = Some(dir.into()); self }

    pub fn from_config(config: &ChainConfig) -> Self {
        let dir = match config.backend {
            BackendKind::FullNodeEvent => config.bitcoind.dir.clone(),
            BackendKind::FullNodeStream => config.btcd.dir.clone(),
            BackendKind::LightClient => None,
        };
        Self { backend: config.backend, chain: config.chain, node_dir: dir }
    }

    pub fn daemon(&self) -> Option<Daemon> {
        Daemon::for_backend(self.backend, self.chain)
    }

    pub fn resolve(&self, explicit: &Credentials, params: &NetworkParams) -> Result<Credentials, ConfigError> {
        let Some(daemon) = self.daemon() else {
            // The light client takes no rpc credentials at all.
            if explicit.supplied(false).into_iter().any(|s| s) {
                return Err(ConfigError::PartialCredentials { daemon: "neutrino", fields: vec!["rpcuser", "rpcpass"] });
            }
            return Ok(Credentials::default());
        };

        let supplied = explicit.supplied(daemon.needs_event_stream);
        if supplied.iter().all(|s| *s) {
            debug!("Using explicit {} RPC credentials", daemon.name);
            return Ok(explicit.clone());
        }
        if supplied.iter().any(|s| *s) {
            return Err(ConfigError::PartialCredentials { daemon: daemon.name, fields: daemon.required_fields() });
        }
        if params.is_simulation() {
            return Err(ConfigError::PrivateNetwork { daemon: daemon.name, network: params.name });
        }

        info!("Attempting automatic RPC configuration to {}", daemon.name);
        let conf_path = self.config_file()?;
        let text = std::fs::read_to_string(&conf_path)
            .map_err(|source| ConfigError::Read { path: conf_path.clone(), source })?;
        let creds = discover(&daemon, &text, &conf_path, params)?;
        info!("Automatically obtained {}'s RPC credentials", daemon.name);
        Ok(creds)
    }

    /// The daemon config file discovery reads.
    pub fn config_file(&self) -> Result<PathBuf, ConfigError> {
        let daemon = self.daemon().ok_or(ConfigError::NoConfigDir { daemon: "neutrino" })?;
        let dir = match &self.node_dir {
            Some(dir) => dir.clone(),
            None => default_daemon_dir(daemon.dir_name).ok_or(ConfigError::NoConfigDir { daemon: daemon.name })?,
        };
        Ok(dir.join(daemon.conf_file))
    }

    /// Cookie location, honouring a `datadir` override in the config file if one is readable.
    pub fn cookie_file(&self, params: &NetworkParams) -> Result<Option<PathBuf>, ConfigError> {
        match self.daemon() {
            Some(daemon) if daemon.writes_cookie => {
                let conf_path = self.config_file()?;
                let text = std::fs::read_to_string(&conf_path).unwrap_or_default();
                Ok(Some(cookie_path(&text, &conf_path, params)?))
            }
            _ => Ok(None),
        }
    }
}

fn discover(daemon: &Daemon, text: &str, conf_path: &Path, params: &NetworkParams) -> Result<Credentials, ConfigError> {
    let event_stream = if daemon.needs_event_stream {
        let zmq = scan_key(text, KEY_ZMQ_BLOCKS)?
            .ok_or_else(|| ConfigError::MissingKey { key: KEY_ZMQ_BLOCKS, path: conf_path.to_path_buf() })?;
        Some(zmq)
    } else {
        None
    };

    if daemon.writes_cookie {
        let cookie = cookie_path(text, conf_path, params)?;
        if let Some((user, password)) = read_cookie(&cookie) {
            debug!("Using cookie authentication from {}", cookie.display());
            return Ok(Credentials { user, password, event_stream });
        }
    }

    let user = scan_key(text, KEY_RPC_USER)?
        .ok_or_else(|| ConfigError::MissingKey { key: KEY_RPC_USER, path: conf_path.to_path_buf() })?;
    let password = scan_key(text, daemon.pass_key)?
        .ok_or_else(|| ConfigError::MissingKey { key: daemon.pass_key, path: conf_path.to_path_buf() })?;
    Ok(Credentials { user, password, event_stream })
}

fn cookie_path(text: &str, conf_path: &Path, params: &NetworkParams) -> Result<PathBuf, ConfigError> {
    let datadir = match scan_key(text, KEY_DATADIR)? {
        Some(dir) => PathBuf::from(dir),
        None => conf_path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let sub = params.cookie_subdir();
    let base = if sub.is_empty() { datadir } else { datadir.join(sub) };
    Ok(base.join(COOKIE_FILE))
}

/// `user:password`, anything else is ignored.
fn read_cookie(path: &Path) -> Option<(String, String)> {
    let raw = std::fs::read_to_string(path).ok()?;
    let mut fields = raw.trim_end().split(':');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(user), Some(password), None) => Some((user.to_string(), password.to_string())),
        _ => None,
    }
}

/// First `key = value` line wins; the key must start the line.
pub fn scan_key(text: &str, key: &str) -> Result<Option<String>, ConfigError> {
    let pattern = Regex::new(&format!(r"(?m)^[ \t]*{}[ \t]*=[ \t]*(\S+)", regex::escape(key)))?;
    Ok(pattern.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
}
