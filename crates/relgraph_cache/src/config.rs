//! Configuration for the resource cache.

/// Configuration for a cache session.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Concurrency bound applied when a query hydrates a set of
    /// resources and the query itself does not specify one.
    /// `0` means unbounded; `1` means strictly sequential.
    pub default_batch_size: usize,
}

impl CacheConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_batch_size: 0,
        }
    }

    /// Sets the default batch size.
    #[must_use]
    pub fn with_default_batch_size(mut self, size: usize) -> Self {
        self.default_batch_size = size;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}
