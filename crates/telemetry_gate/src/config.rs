//! Start-up configuration and fixed destinations.

use serde::{Deserialize, Serialize};

/// Analytics destination every tracker binds to.
pub const TRACKING_ID: &str = "G-4QX7B2ZK9M";

/// Analytics library, loaded once per page.
pub const ANALYTICS_SCRIPT_URL: &str = "https://www.googletagmanager.com/gtag/js?id=G-4QX7B2ZK9M";

/// Error-reporting library.
pub const ERROR_REPORTING_SCRIPT_URL: &str = "https://cdn.ravenjs.com/3.27.0/raven.min.js";

/// Error-reporting destination key.
pub const ERROR_REPORTING_DSN: &str = "https://4c1d2e7f9a8b4e3c@sentry.io/1294738";

/// Event category for performance timings.
pub const PERFORMANCE_CATEGORY: &str = "Performance";

/// Group the performance tracker routes its events to.
pub const PERFORMANCE_GROUP: &str = "perf";

/// Features requested by the host when starting telemetry.
///
/// Every field is optional in the host's JSON and defaults to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartConfig {
    /// Load and install the error reporter
    pub error_logging: bool,
    /// Load analytics and bind the main tracker
    pub analytics: bool,
    /// Enable mark/measure forwarding; ignored without `analytics`
    pub performance: bool,
}

impl StartConfig {
    /// Configuration with every feature off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with every feature on.
    pub fn all_enabled() -> Self {
        Self {
            error_logging: true,
            analytics: true,
            performance: true,
        }
    }

    /// Request error logging.
    pub fn with_error_logging(mut self) -> Self {
        self.error_logging = true;
        self
    }

    /// Request analytics.
    pub fn with_analytics(mut self) -> Self {
        self.analytics = true;
        self
    }

    /// Request performance instrumentation.
    pub fn with_performance(mut self) -> Self {
        self.performance = true;
        self
    }

    /// Whether performance will actually be enabled by this configuration.
    pub fn performance_effective(&self) -> bool {
        self.performance && self.analytics
    }
}
