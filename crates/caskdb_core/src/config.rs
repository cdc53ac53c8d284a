//! Store configuration.

use crate::error::{CoreError, CoreResult};

/// Default maximum size of the active segment before rotation.
pub const DEFAULT_ACTIVE_SEGMENT_LIMIT: u64 = 10 * 1024 * 1024; // 10 MiB

/// Default capacity of the bounded write queue.
pub const DEFAULT_WRITE_QUEUE_DEPTH: usize = 128;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum size of the active segment file before it is sealed.
    pub active_segment_limit: u64,

    /// Whether the background merge worker runs automatically.
    pub auto_merge: bool,

    /// Capacity of the write queue; bounds outstanding mutations.
    pub write_queue_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_segment_limit: DEFAULT_ACTIVE_SEGMENT_LIMIT,
            auto_merge: true,
            write_queue_depth: DEFAULT_WRITE_QUEUE_DEPTH,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the active segment size limit.
    #[must_use]
    pub const fn active_segment_limit(mut self, limit: u64) -> Self {
        self.active_segment_limit = limit;
        self
    }

    /// Sets whether the background merge worker runs automatically.
    #[must_use]
    pub const fn auto_merge(mut self, value: bool) -> Self {
        self.auto_merge = value;
        self
    }

    /// Sets the write queue capacity.
    #[must_use]
    pub const fn write_queue_depth(mut self, depth: usize) -> Self {
        self.write_queue_depth = depth;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the active segment limit is zero or the
    /// write queue has no capacity.
    pub fn validate(&self) -> CoreResult<()> {
        if self.active_segment_limit == 0 {
            return Err(CoreError::invalid_config(
                "active segment limit must be greater than zero",
            ));
        }
        if self.write_queue_depth == 0 {
            return Err(CoreError::invalid_config(
                "write queue depth must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.active_segment_limit, DEFAULT_ACTIVE_SEGMENT_LIMIT);
        assert!(config.auto_merge);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .active_segment_limit(50)
            .auto_merge(false)
            .write_queue_depth(4);

        assert_eq!(config.active_segment_limit, 50);
        assert!(!config.auto_merge);
        assert_eq!(config.write_queue_depth, 4);
    }

    #[test]
    fn zero_limit_rejected() {
        let config = Config::new().active_segment_limit(0);
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_queue_depth_rejected() {
        let config = Config::new().write_queue_depth(0);
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }
}
