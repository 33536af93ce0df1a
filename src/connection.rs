//! Host, port and TLS resolution for the full node backends.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{BackendKind, EventNodeConfig, StreamNodeConfig};
use crate::credentials::Credentials;
use crate::error::ConnectionError;
use crate::net::{probe, NetworkProvider};
use crate::params::{NetworkParams, BITCOIND_PORT_OFFSET, REGTEST_FALLBACK_PORT};

/// How a full node rpc session is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Plain HTTP POST per call, no TLS.
    HttpPost,
    /// Persistent websocket session over TLS.
    Websocket,
}

impl Transport {
    pub fn endpoint(&self) -> &'static str {
        match self { Transport::HttpPost => "", Transport::Websocket => "ws" }
    }
    pub fn tls_enabled(&self) -> bool { matches!(self, Transport::Websocket) }
}

/// Where a stream backend's certificate comes from. Inline hex wins.
#[derive(Debug, Clone, Default)]
pub struct TlsSource {
    pub raw_hex: Option<String>,
    pub path: Option<PathBuf>,
}

/// Resolved host:port and certificate bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub tls_cert: Option<Vec<u8>>,
}

/// Everything a full node collaborator needs to open a session.
#[derive(Clone)]
pub struct NodeConnection {
    pub host: String,
    pub user: String,
    pub password: String,
    pub tls_cert: Option<Vec<u8>>,
    pub event_stream: Option<String>,
    pub transport: Transport,
    pub params: NetworkParams,
}

impl NodeConnection {
    fn new(target: ConnectionTarget, creds: Credentials, transport: Transport, params: &NetworkParams) -> Self {
        Self {
            host: target.host,
            user: creds.user,
            password: creds.password,
            tls_cert: target.tls_cert,
            event_stream: creds.event_stream,
            transport,
            params: params.clone(),
        }
    }
}

impl std::fmt::Debug for NodeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConnection")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("tls_cert_len", &self.tls_cert.as_ref().map(Vec::len))
            .field("event_stream", &self.event_stream)
            .field("transport", &self.transport)
            .field("network", &self.params.name)
            .finish_non_exhaustive()
    }
}

pub struct ConnectionConfigurer {
    provider: Arc<dyn NetworkProvider>,
    probe_timeout: Duration,
}

impl ConnectionConfigurer {
    pub fn new(provider: Arc<dyn NetworkProvider>) -> Self {
        Self { provider, probe_timeout: Duration::from_secs(2) }
    }
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self { self.probe_timeout = timeout; self }

    /// Connection to a bitcoind-style node: HTTP POST, no TLS, zmq attached.
    pub async fn event_connection(&self, node: &EventNodeConfig, creds: Credentials, params: &NetworkParams) -> Result<NodeConnection, ConnectionError> {
        let target = self.target(BackendKind::FullNodeEvent, &node.rpc_host, &TlsSource::default(), params).await?;
        Ok(NodeConnection::new(target, creds, Transport::HttpPost, params))
    }

    /// Connection to a btcd-style node: websocket over TLS.
    pub async fn stream_connection(&self, node: &StreamNodeConfig, creds: Credentials, params: &NetworkParams) -> Result<NodeConnection, ConnectionError> {
        let tls = TlsSource { raw_hex: node.raw_rpc_cert.clone(), path: node.rpc_cert.clone() };
        let target = self.target(BackendKind::FullNodeStream, &node.rpc_host, &tls, params).await?;
        Ok(NodeConnection::new(target, creds, Transport::Websocket, params))
    }

    pub async fn target(&self, backend: BackendKind, host: &str, tls: &TlsSource, params: &NetworkParams) -> Result<ConnectionTarget, ConnectionError> {
        let host = host.trim();
        let mut resolved = resolve_host(host, backend, params)?;

        let probe_regtest = backend == BackendKind::FullNodeEvent && params.is_regtest() && !has_port(host);
        if probe_regtest && !probe(self.provider.as_ref(), &resolved, self.probe_timeout).await {
            let fallback = format!("{}:{}", host, REGTEST_FALLBACK_PORT);
            info!("No rpc server at {}, using regtest port {}", resolved, fallback);
            resolved = fallback;
        }

        let tls_cert = match backend {
            BackendKind::FullNodeStream => Some(load_certificate(tls)?),
            _ => None,
        };
        debug!("Resolved {} rpc host {}", backend.as_str(), resolved);
        Ok(ConnectionTarget { host: resolved, tls_cert })
    }
}

fn has_port(host: &str) -> bool {
    host.contains(':')
}

/// A host with a port is kept as-is. Otherwise the network's rpc port is
/// appended, less the bitcoind offset for the event backend.
pub fn resolve_host(host: &str, backend: BackendKind, params: &NetworkParams) -> Result<String, ConnectionError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(ConnectionError::EmptyHost);
    }
    if has_port(host) {
        return Ok(host.to_string());
    }
    let port = match backend {
        BackendKind::FullNodeEvent => params.rpc_port - BITCOIND_PORT_OFFSET,
        _ => params.rpc_port,
    };
    Ok(format!("{}:{}", host, port))
}

pub fn load_certificate(tls: &TlsSource) -> Result<Vec<u8>, ConnectionError> {
    if let Some(raw) = tls.raw_hex.as_deref().filter(|s| !s.trim().is_empty()) {
        let bytes = hex::decode(raw.trim())?;
        if !bytes.is_empty() {
            return Ok(bytes);
        }
    }
    match tls.path.as_deref() {
        Some(path) => read_certificate(path),
        None => Err(ConnectionError::MissingCertificate),
    }
}

fn read_certificate(path: &Path) -> Result<Vec<u8>, ConnectionError> {
    let bytes = std::fs::read(path).map_err(|source| ConnectionError::CertificateRead { path: path.to_path_buf(), source })?;
    if bytes.is_empty() {
        return Err(ConnectionError::EmptyCertificate { path: path.to_path_buf() });
    }
    Ok(bytes)
}
