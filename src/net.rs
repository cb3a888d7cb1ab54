use std::time::Duration;
use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use crate::config::NetworkConfig;

#[cfg(test)]
use mockall::automock;

/// Connectivity pre-flight used by adapters that require network access.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Decides connectivity by opening a TCP connection to a well-known address
/// within a short deadline.
pub struct TcpProbe {
    probe_address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            probe_address: config.probe_address.clone(),
            timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }
}

#[async_trait]
impl NetworkMonitor for TcpProbe {
    async fn is_online(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.probe_address)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("Connectivity probe to {} failed: {}", self.probe_address, e);
                false
            }
            Err(_) => {
                debug!("Connectivity probe to {} timed out", self.probe_address);
                false
            }
        }
    }
}
