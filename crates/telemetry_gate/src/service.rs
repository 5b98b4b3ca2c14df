//! The telemetry service and its one-shot start.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

use crate::analytics::AnalyticsCommand;
use crate::config::{StartConfig, ANALYTICS_SCRIPT_URL, TRACKING_ID};
use crate::error::ScriptLoadError;
use crate::error_reporting::setup_error_logging;
use crate::host::Host;
use crate::performance::Performance;
use crate::privacy::PrivacyGate;
use crate::tracker::{configure_tracker, EventOptions, Tracker, TrackerOptions};

/// Script loads started by [`Telemetry::start`].
///
/// Dropping the handle detaches the loads; they still run to completion.
#[derive(Debug, Default)]
pub struct StartHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl StartHandle {
    /// Number of loads started.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every started load to finish.
    pub async fn settled(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "telemetry setup task did not complete");
            }
        }
    }
}

/// Privacy-gated telemetry service.
///
/// Constructed and owned by the host. [`start`](Self::start) runs at most
/// once for the lifetime of the service.
#[derive(Debug)]
pub struct Telemetry {
    host: Host,
    started: AtomicBool,
    analytics_loaded: Arc<AtomicBool>,
    tracker: OnceLock<Tracker>,
    performance: Performance,
}

impl Telemetry {
    /// Create an unstarted service over the host's collaborators.
    pub fn new(host: Host) -> Self {
        Self {
            host,
            started: AtomicBool::new(false),
            analytics_loaded: Arc::new(AtomicBool::new(false)),
            tracker: OnceLock::new(),
            performance: Performance::new(),
        }
    }

    /// Enable the requested features.
    ///
    /// Only the first call has any effect; later calls are ignored whatever
    /// their configuration. The first call consumes the guard even when
    /// Do-Not-Track suppresses every feature.
    pub fn start(&self, config: StartConfig) -> StartHandle {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!(?config, "telemetry already started; ignoring");
            return StartHandle::default();
        }

        tracing::info!(
            error_logging = config.error_logging,
            analytics = config.analytics,
            performance = config.performance,
            "starting telemetry"
        );

        let mut handle = StartHandle::default();

        if config.error_logging {
            let reporters = self.host.reporters.clone();
            if let Some(task) = setup_error_logging(&self.host.gate, &self.host.loader, reporters) {
                handle.tasks.push(task);
            }
        }

        if config.analytics {
            if let Some(task) = self.setup_analytics() {
                handle.tasks.push(task);
            }
            if config.performance {
                self.performance.enable(
                    &self.host.gate,
                    &self.host.analytics,
                    TRACKING_ID,
                    self.host.timeline.clone(),
                );
            }
        } else if config.performance {
            tracing::debug!("performance requested without analytics; ignoring");
        }

        handle
    }

    fn setup_analytics(&self) -> Option<JoinHandle<()>> {
        let gate = &self.host.gate;
        if gate.is_tracking_disallowed() {
            tracing::debug!("analytics skipped: do-not-track is set");
            return None;
        }

        let loaded = self.analytics_loaded.clone();
        let task = self.host.loader.load(
            ANALYTICS_SCRIPT_URL,
            Some(move |result: Result<(), ScriptLoadError>| match result {
                Ok(()) => loaded.store(true, Ordering::SeqCst),
                Err(e) => tracing::warn!(error = %e, "analytics library failed to load"),
            }),
        );

        self.host.analytics.push(AnalyticsCommand::Js {
            timestamp: Utc::now(),
        });
        let tracker = configure_tracker(
            gate,
            &self.host.analytics,
            TRACKING_ID,
            TrackerOptions::default(),
        );
        if self.tracker.set(tracker).is_err() {
            tracing::debug!("analytics tracker already bound; keeping the first");
        }

        Some(task)
    }

    /// Send an event through the analytics tracker.
    ///
    /// A no-op when analytics was not started or tracking is disallowed.
    pub fn track(&self, event_name: &str, label: Option<&str>, options: EventOptions) {
        if let Some(tracker) = self.tracker.get() {
            tracker.track(event_name, label, options);
        }
    }

    /// The mark/measure API.
    pub fn performance(&self) -> &Performance {
        &self.performance
    }

    /// Whether `start` has been called.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Whether the analytics library reported a successful load.
    pub fn analytics_loaded(&self) -> bool {
        self.analytics_loaded.load(Ordering::SeqCst)
    }

    /// Whether the main analytics tracker is bound.
    pub fn analytics_enabled(&self) -> bool {
        self.tracker.get().is_some_and(Tracker::is_bound)
    }

    /// The privacy gate consulted by every operation.
    pub fn gate(&self) -> &PrivacyGate {
        &self.host.gate
    }

    /// The host collaborators.
    pub fn host(&self) -> &Host {
        &self.host
    }
}
