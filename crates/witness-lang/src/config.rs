//! Search compiler configuration.

use std::time::Duration;

use witness_proto::DEFAULT_SEARCH_LIMIT;

/// Settings consulted while compiling a search.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Inject default conditions for parameters the requester left out.
    pub defaults_enabled: bool,
    /// Radius applied when no location-restricting parameter is given.
    pub default_radius: u32,
    /// Largest radius a requester may ask for without the unlimited permission.
    pub radius_limit: u32,
    /// Lookback window applied when no time parameter is given.
    pub default_search_time: String,
    /// Row cap for every compiled query.
    pub search_limit: usize,
    /// Upper bound on waiting for asynchronous parameter resolution.
    pub compile_timeout: Duration,
    /// Offer the region selection flag when a provider is installed.
    pub selection_integration: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            defaults_enabled: true,
            default_radius: 5,
            radius_limit: 100,
            default_search_time: "3d".to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            compile_timeout: Duration::from_secs(10),
            selection_integration: true,
        }
    }
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults_enabled(mut self, enabled: bool) -> Self {
        self.defaults_enabled = enabled;
        self
    }

    pub fn with_default_radius(mut self, radius: u32) -> Self {
        self.default_radius = radius;
        self
    }

    pub fn with_radius_limit(mut self, limit: u32) -> Self {
        self.radius_limit = limit;
        self
    }

    pub fn with_default_search_time(mut self, time: impl Into<String>) -> Self {
        self.default_search_time = time.into();
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn with_compile_timeout(mut self, timeout: Duration) -> Self {
        self.compile_timeout = timeout;
        self
    }

    pub fn with_selection_integration(mut self, enabled: bool) -> Self {
        self.selection_integration = enabled;
        self
    }
}
