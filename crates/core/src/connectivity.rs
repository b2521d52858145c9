//! Connectivity gate: decides once, at start-up, whether the chat runs
//! against the live remote feed or the local snapshot.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Which timeline source the screen uses for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Remote feed is the source of truth.
    Live,
    /// Last local snapshot, no live updates.
    Cached,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Live => "live",
            Mode::Cached => "cached",
        }
    }
}

/// One-shot network reachability check.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Returns whether the network is reachable. An `Err` means the probe
    /// itself could not run.
    async fn is_connected(&self) -> Result<bool>;
}

/// Wraps a probe and maps its answer to a [`Mode`].
#[derive(Clone)]
pub struct ConnectivityGate {
    probe: Arc<dyn ConnectivityProbe>,
}

impl ConnectivityGate {
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self { probe }
    }

    /// Evaluate the probe once.
    ///
    /// # Errors
    /// `Error::Startup` if the probe fails; start-up must halt.
    pub async fn determine_mode(&self) -> Result<Mode> {
        let connected = self.probe.is_connected().await.map_err(|e| {
            tracing::error!("Connectivity probe failed: {}", e);
            Error::Startup(format!("connectivity probe failed: {}", e))
        })?;

        let mode = if connected { Mode::Live } else { Mode::Cached };
        tracing::info!("Starting in {} mode", mode.as_str());
        Ok(mode)
    }
}

/// Probe that treats a successful TCP connect as "online".
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn is_connected(&self) -> Result<bool> {
        if self.addr.trim().is_empty() {
            return Err(Error::Config("probe address is empty".to_string()));
        }

        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) => {
                tracing::debug!("Probe connect to {} failed: {}", self.addr, e);
                Ok(false)
            }
            Err(_) => {
                tracing::debug!("Probe connect to {} timed out", self.addr);
                Ok(false)
            }
        }
    }
}
