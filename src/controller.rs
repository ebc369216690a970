//! HTTP transport to the remote controller.
//!
//! Commands are plain GET requests against configured endpoints (the
//! controller exposes one route per maneuver, e.g. `/land`, `/left`, plus the
//! bare base URL for takeoff). Response bodies are logged, never interpreted.
//! gzip/deflate decompression is handled transparently by the client.

use crate::relaylog::SharedRelayLog;
use crossbeam_channel::Receiver;
use std::thread;

/// Remote controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Base URL of the controller, e.g. `http://10.2.10.14:5000`
    pub base_url: String,
}

impl ControllerConfig {
    /// Create a new controller configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Resolve a command path against the base URL.
    ///
    /// An empty path yields the bare base URL, which is the controller's
    /// primary takeoff route.
    pub fn endpoint_url(&self, path: &str) -> String {
        if path.is_empty() || path == "/" {
            format!("{}/", self.base_url)
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Transport error for an outbound command. Recoverable: logged, never retried.
#[derive(Debug)]
pub enum TransportError {
    /// Connection, DNS, or timeout failure
    Network { endpoint: String, message: String },
    /// Controller answered with a non-2xx status
    Status { endpoint: String, status: u16 },
    /// Response body could not be read
    Body { endpoint: String, message: String },
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Network { endpoint, message } => {
                write!(f, "network error for {endpoint}: {message}")
            }
            TransportError::Status { endpoint, status } => {
                write!(f, "controller returned {status} for {endpoint}")
            }
            TransportError::Body { endpoint, message } => {
                write!(f, "failed to read response from {endpoint}: {message}")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Async HTTP client for controller commands.
pub struct ControllerClient {
    client: reqwest::Client,
}

impl ControllerClient {
    /// Create a new controller client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Send one command: GET the endpoint and return the response body.
    pub async fn send(&self, endpoint: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| TransportError::Network {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| TransportError::Body {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// Probe the controller's base URL, for connectivity checks.
    pub async fn probe(&self, config: &ControllerConfig) -> Result<String, TransportError> {
        self.send(&config.endpoint_url("")).await
    }
}

impl Default for ControllerClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking controller client for use in synchronous contexts.
pub struct BlockingControllerClient {
    inner: ControllerClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingControllerClient {
    /// Create a new blocking controller client.
    pub fn new() -> Result<Self, std::io::Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            inner: ControllerClient::new(),
            runtime,
        })
    }

    /// Send one command, blocking until the controller responds.
    pub fn send(&self, endpoint: &str) -> Result<String, TransportError> {
        self.runtime.block_on(self.inner.send(endpoint))
    }

    /// Probe the controller's base URL.
    pub fn probe(&self, config: &ControllerConfig) -> Result<String, TransportError> {
        self.runtime.block_on(self.inner.probe(config))
    }
}

/// An outbound command claimed by the dispatcher, awaiting transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Gesture that triggered the command
    pub gesture_id: String,
    /// Fully resolved endpoint URL
    pub endpoint: String,
}

/// Background worker that drains the command channel and performs the sends.
///
/// Dispatch stays fire-and-forget: the frame handler only enqueues, the relay
/// thread owns the blocking HTTP calls. Failures are logged and counted; the
/// command is never retried here, since a later detection retries naturally
/// once the cooldown expires.
pub struct CommandRelay {
    handle: Option<thread::JoinHandle<()>>,
}

impl CommandRelay {
    /// Spawn the relay worker. The worker exits when the command channel
    /// disconnects (all dispatcher-side senders dropped).
    pub fn spawn(
        client: BlockingControllerClient,
        commands: Receiver<CommandRequest>,
        log: SharedRelayLog,
    ) -> Self {
        let handle = thread::spawn(move || {
            for command in commands.iter() {
                match client.send(&command.endpoint) {
                    Ok(body) => {
                        tracing::info!(
                            gesture = %command.gesture_id,
                            endpoint = %command.endpoint,
                            response = %body.trim(),
                            "command sent"
                        );
                    }
                    Err(e) => {
                        log.record_transport_failure();
                        tracing::warn!(
                            gesture = %command.gesture_id,
                            error = %e,
                            "command failed"
                        );
                    }
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Wait for the worker to drain and exit.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_paths() {
        let config = ControllerConfig::new("http://10.2.10.14:5000");
        assert_eq!(config.endpoint_url(""), "http://10.2.10.14:5000/");
        assert_eq!(config.endpoint_url("/land"), "http://10.2.10.14:5000/land");
        assert_eq!(config.endpoint_url("lift"), "http://10.2.10.14:5000/lift");
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let config = ControllerConfig::new("http://controller:5000/");
        assert_eq!(config.endpoint_url("/left"), "http://controller:5000/left");
        assert_eq!(config.endpoint_url(""), "http://controller:5000/");
    }

    #[test]
    fn test_transport_error_names_endpoint() {
        let err = TransportError::Status {
            endpoint: "http://controller:5000/land".to_string(),
            status: 503,
        };
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("/land"));
    }
}
