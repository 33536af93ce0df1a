//! Network indirection. All dials and lookups made during bootstrap go through
//! a [`NetworkProvider`], so a caller can route them over a proxy.

use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

#[async_trait]
pub trait NetworkProvider: Send + Sync {
    async fn dial(&self, addr: &str) -> io::Result<TcpStream>;
    /// Address strings for `host`; entries need not be valid IPs.
    async fn lookup_host(&self, host: &str) -> io::Result<Vec<String>>;
}

/// Direct connections through the OS resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearNet;

#[async_trait]
impl NetworkProvider for ClearNet {
    async fn dial(&self, addr: &str) -> io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }

    async fn lookup_host(&self, host: &str) -> io::Result<Vec<String>> {
        let addrs = tokio::net::lookup_host((host, 0u16)).await?;
        Ok(addrs.map(|a| a.ip().to_string()).collect())
    }
}

/// Name resolver handed to the light client.
#[derive(Clone)]
pub struct NameResolver {
    provider: Arc<dyn NetworkProvider>,
}

impl NameResolver {
    pub fn new(provider: Arc<dyn NetworkProvider>) -> Self { Self { provider } }

    /// Addresses that fail to parse are dropped.
    pub async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let raw = self.provider.lookup_host(host).await?;
        Ok(raw.iter().filter_map(|s| s.parse::<IpAddr>().ok()).collect())
    }
}

/// True if `addr` accepts a TCP connection within `timeout`.
pub async fn probe(provider: &dyn NetworkProvider, addr: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, provider.dial(addr)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            debug!("Probe of {} failed: {}", addr, e);
            false
        }
        Err(_) => {
            debug!("Probe of {} timed out after {:?}", addr, timeout);
            false
        }
    }
}
