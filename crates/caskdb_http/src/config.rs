//! Adapter configuration.

use std::net::SocketAddr;

/// Configuration for the HTTP adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the wiring application should bind to.
    pub bind_addr: SocketAddr,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Creates a configuration for the given bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_body_bytes: 64 * 1024,
        }
    }

    /// Sets the maximum request body size.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8079)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8079);
        assert_eq!(config.max_body_bytes, 64 * 1024);
    }

    #[test]
    fn builder() {
        let config = ServerConfig::default().with_max_body_bytes(1024);
        assert_eq!(config.max_body_bytes, 1024);
    }
}
