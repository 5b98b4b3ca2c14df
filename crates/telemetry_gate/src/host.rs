//! Collaborators supplied by the host application.

use perf::PerformanceTimeline;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;

use crate::analytics::AnalyticsChannel;
use crate::error::{TelemetryError, TelemetryResult};
use crate::error_reporting::ReporterLookup;
use crate::loader::{ScriptFetcher, ScriptLoader};
use crate::privacy::{PrivacyGate, PrivacySignals};

/// Everything the telemetry service calls out to.
#[derive(Clone)]
pub struct Host {
    pub(crate) gate: PrivacyGate,
    pub(crate) loader: ScriptLoader,
    pub(crate) analytics: Arc<dyn AnalyticsChannel>,
    pub(crate) reporters: Arc<dyn ReporterLookup>,
    pub(crate) timeline: Arc<Mutex<PerformanceTimeline>>,
}

impl Host {
    /// Assemble a host on the current tokio runtime.
    ///
    /// Fails with [`TelemetryError::NoRuntime`] when called outside a
    /// runtime, since script loads could never complete.
    pub fn new(
        signals: Arc<dyn PrivacySignals>,
        fetcher: Arc<dyn ScriptFetcher>,
        analytics: Arc<dyn AnalyticsChannel>,
        reporters: Arc<dyn ReporterLookup>,
    ) -> TelemetryResult<Self> {
        let runtime = Handle::try_current().map_err(|_| TelemetryError::NoRuntime)?;
        Ok(Self::with_runtime(signals, fetcher, analytics, reporters, runtime))
    }

    /// Assemble a host that spawns script loads on `runtime`.
    pub fn with_runtime(
        signals: Arc<dyn PrivacySignals>,
        fetcher: Arc<dyn ScriptFetcher>,
        analytics: Arc<dyn AnalyticsChannel>,
        reporters: Arc<dyn ReporterLookup>,
        runtime: Handle,
    ) -> Self {
        Self {
            gate: PrivacyGate::new(signals),
            loader: ScriptLoader::new(fetcher, runtime),
            analytics,
            reporters,
            timeline: Arc::new(Mutex::new(PerformanceTimeline::new())),
        }
    }

    /// Use an existing timeline as the timing facility.
    pub fn with_timeline(mut self, timeline: Arc<Mutex<PerformanceTimeline>>) -> Self {
        self.timeline = timeline;
        self
    }

    /// The privacy gate built over the host's signals.
    pub fn gate(&self) -> &PrivacyGate {
        &self.gate
    }

    /// The host timing facility.
    pub fn timeline(&self) -> Arc<Mutex<PerformanceTimeline>> {
        self.timeline.clone()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("gate", &self.gate)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}
