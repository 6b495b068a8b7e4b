//! Connectivity Guard
//!
//! Precondition check run before any provider call. Image uploads are costly,
//! so a scan fails fast when no network path is reachable instead of burning
//! three doomed requests.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

use super::{CoreError, CoreResult};

// =============================================================================
// Connectivity Probe Trait
// =============================================================================

/// Network reachability probe.
///
/// Implementations must be side-effect free beyond the check itself.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Returns `Ok(())` when a network path exists,
    /// `CoreError::NoConnectivity` otherwise.
    async fn check(&self) -> CoreResult<()>;
}

// =============================================================================
// TCP Probe
// =============================================================================

/// Probes reachability by opening a TCP connection to well-known endpoints.
///
/// Any single successful connection counts as online.
pub struct TcpConnectivityProbe {
    endpoints: Vec<String>,
    timeout: Duration,
}

impl TcpConnectivityProbe {
    /// Default probe endpoints (public DNS resolvers)
    pub const DEFAULT_ENDPOINTS: &'static [&'static str] = &["1.1.1.1:443", "8.8.8.8:53"];

    /// Default per-endpoint connect timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    /// Creates a probe against the default endpoints
    pub fn new() -> Self {
        Self {
            endpoints: Self::DEFAULT_ENDPOINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Creates a probe against custom `host:port` endpoints
    pub fn with_endpoints(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-endpoint connect timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for TcpConnectivityProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn check(&self) -> CoreResult<()> {
        for endpoint in &self.endpoints {
            match tokio::time::timeout(self.timeout, TcpStream::connect(endpoint)).await {
                Ok(Ok(_)) => return Ok(()),
                Ok(Err(e)) => {
                    tracing::debug!(endpoint = %endpoint, error = %e, "connectivity probe failed");
                }
                Err(_) => {
                    tracing::debug!(endpoint = %endpoint, "connectivity probe timed out");
                }
            }
        }
        Err(CoreError::NoConnectivity)
    }
}

// =============================================================================
// Static Probe (for testing)
// =============================================================================

/// Probe with a fixed answer, for tests and offline development
pub struct StaticProbe {
    online: bool,
}

impl StaticProbe {
    /// Creates a probe that always reports connectivity
    pub fn online() -> Self {
        Self { online: true }
    }

    /// Creates a probe that always reports no connectivity
    pub fn offline() -> Self {
        Self { online: false }
    }
}

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn check(&self) -> CoreResult<()> {
        if self.online {
            Ok(())
        } else {
            Err(CoreError::NoConnectivity)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
