//! Performance instrumentation forwarding timeline measures to analytics.
//!
//! `mark` and `measure` are always safe to call. Until the controller
//! enables instrumentation, and whenever Do-Not-Track is set, they do
//! nothing at all.

use perf::PerformanceTimeline;
use std::sync::{Arc, Mutex, OnceLock};

use crate::analytics::AnalyticsChannel;
use crate::config::{PERFORMANCE_CATEGORY, PERFORMANCE_GROUP};
use crate::privacy::PrivacyGate;
use crate::tracker::{configure_tracker, EventOptions, Tracker, TrackerOptions};

/// Event name used for forwarded measures.
pub const TIMING_EVENT: &str = "timing_complete";

#[derive(Debug)]
struct Instrumentation {
    gate: PrivacyGate,
    tracker: Tracker,
    timeline: Arc<Mutex<PerformanceTimeline>>,
}

/// Mark/measure API exposed alongside the controller.
#[derive(Debug, Default)]
pub struct Performance {
    instrumentation: OnceLock<Instrumentation>,
}

impl Performance {
    /// Create a disabled instance; every call is a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a performance tracker and start forwarding measures.
    ///
    /// Returns false, binding nothing, when tracking is disallowed or the
    /// instrumentation is already enabled.
    pub(crate) fn enable(
        &self,
        gate: &PrivacyGate,
        channel: &Arc<dyn AnalyticsChannel>,
        destination_id: &str,
        timeline: Arc<Mutex<PerformanceTimeline>>,
    ) -> bool {
        if gate.is_tracking_disallowed() || self.is_enabled() {
            return false;
        }

        let options = TrackerOptions::default()
            .with_groups(PERFORMANCE_GROUP)
            .with_page_view(false);
        let tracker = configure_tracker(gate, channel, destination_id, options);

        self.instrumentation
            .set(Instrumentation {
                gate: gate.clone(),
                tracker,
                timeline,
            })
            .is_ok()
    }

    /// Whether instrumentation has been enabled.
    pub fn is_enabled(&self) -> bool {
        self.instrumentation.get().is_some()
    }

    /// Record a named mark on the timeline.
    pub fn mark(&self, name: &str) {
        let Some(inst) = self.active() else {
            return;
        };

        match inst.timeline.lock() {
            Ok(mut timeline) => {
                timeline.mark(name);
            }
            Err(_) => tracing::warn!(name, "performance timeline is poisoned"),
        }
    }

    /// Measure between two marks and forward the rounded duration.
    pub fn measure(&self, name: &str, start_mark: &str, end_mark: &str) {
        let Some(inst) = self.active() else {
            return;
        };

        let duration_ms = {
            let Ok(mut timeline) = inst.timeline.lock() else {
                tracing::warn!(name, "performance timeline is poisoned");
                return;
            };
            if let Err(e) = timeline.measure(name, start_mark, end_mark) {
                tracing::warn!(name, error = %e, "measure skipped");
                return;
            }
            match timeline.last_entry_by_name(name) {
                Some(entry) => entry.rounded_duration_ms(),
                None => return,
            }
        };

        inst.tracker.track(
            TIMING_EVENT,
            Some(name),
            EventOptions::default()
                .with_category(PERFORMANCE_CATEGORY)
                .with_value(duration_ms)
                .non_interactive(),
        );
    }

    fn active(&self) -> Option<&Instrumentation> {
        let inst = self.instrumentation.get()?;
        if inst.gate.is_tracking_disallowed() {
            tracing::trace!("performance call suppressed by do-not-track");
            return None;
        }
        Some(inst)
    }
}
