//! Adapter configuration (spec §6.4): everything needed to stand up a
//! [`crate::adapter::GraphAdapter`] against a running graph backend.
//!
//! Deliberately narrow — `backend_host`, `backend_port`, `graph_name`, and
//! an optional driver override for tests or a connection shared with other
//! adapters. No CLI, no environment variable lookups: a hosting server
//! reads its own configuration surface and constructs a [`GraphConfig`]
//! from it, not the other way around.

use std::sync::Arc;
#[cfg(feature = "falkordb-backend")]
use storage::FalkorDbDriver;

/// FalkorDB speaks the Redis protocol on this port by default.
const DEFAULT_BACKEND_PORT: u16 = 6379;

/// Connection and graph-selection settings for a [`crate::adapter::GraphAdapter`].
#[derive(Clone, Debug)]
pub struct GraphConfig {
    backend_host: String,
    backend_port: u16,
    graph_name: String,
}

impl GraphConfig {
    /// Start from the default host/port (`localhost:6379`) and graph name
    /// (`"default"`), then customize with the setter methods.
    pub fn new() -> Self {
        GraphConfig::default()
    }

    /// Override the backend host.
    pub fn with_backend_host(mut self, host: impl Into<String>) -> Self {
        self.backend_host = host.into();
        self
    }

    /// Override the backend port.
    pub fn with_backend_port(mut self, port: u16) -> Self {
        self.backend_port = port;
        self
    }

    /// Override the graph name the adapter reads from and writes to.
    pub fn with_graph_name(mut self, graph_name: impl Into<String>) -> Self {
        self.graph_name = graph_name.into();
        self
    }

    /// The configured backend host.
    pub fn backend_host(&self) -> &str {
        &self.backend_host
    }

    /// The configured backend port.
    pub fn backend_port(&self) -> u16 {
        self.backend_port
    }

    /// The configured graph name.
    pub fn graph_name(&self) -> &str {
        &self.graph_name
    }

    fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.backend_host, self.backend_port)
    }

    /// Connect a [`FalkorDbDriver`] using this configuration. Returns the
    /// driver wrapped in an `Arc` so it can be shared across a
    /// [`crate::adapter::GraphAdapter`]'s internal components.
    #[cfg(feature = "falkordb-backend")]
    pub fn connect(&self) -> crate::error::Result<Arc<FalkorDbDriver>> {
        let driver = FalkorDbDriver::connect(&self.redis_url(), self.graph_name.clone())?;
        Ok(Arc::new(driver))
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            backend_host: "localhost".to_string(),
            backend_port: DEFAULT_BACKEND_PORT,
            graph_name: "default".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_falkordb_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.backend_host(), "localhost");
        assert_eq!(config.backend_port(), 6379);
        assert_eq!(config.graph_name(), "default");
    }

    #[test]
    fn test_builder_setters_override_fields() {
        let config = GraphConfig::new()
            .with_backend_host("graph.internal")
            .with_backend_port(7000)
            .with_graph_name("production");

        assert_eq!(config.backend_host(), "graph.internal");
        assert_eq!(config.backend_port(), 7000);
        assert_eq!(config.graph_name(), "production");
    }
}
