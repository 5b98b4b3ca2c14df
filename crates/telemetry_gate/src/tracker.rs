//! Tracker factory binding a single analytics destination.
//!
//! Privacy is checked twice: once when the destination is bound, and again
//! on every send. A tracker bound while tracking was allowed goes silent the
//! moment the Do-Not-Track signal turns on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::analytics::{AnalyticsChannel, AnalyticsCommand};
use crate::privacy::PrivacyGate;

fn is_false(value: &bool) -> bool {
    !*value
}

fn always_true() -> bool {
    true
}

/// Fixed options sent with a destination's `config` command.
///
/// The privacy-relevant fields are always applied and cannot be turned off
/// by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerOptions {
    /// Event group this destination's events are routed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<String>,
    /// Whether configuring the destination records a page view
    pub send_page_view: bool,
    #[serde(skip_deserializing, default = "always_true")]
    anonymize_ip: bool,
    #[serde(skip_deserializing)]
    allow_ad_personalization_signals: bool,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            groups: None,
            send_page_view: true,
            anonymize_ip: true,
            allow_ad_personalization_signals: false,
        }
    }
}

impl TrackerOptions {
    /// Route this destination's events to a group.
    pub fn with_groups(mut self, groups: &str) -> Self {
        self.groups = Some(groups.to_string());
        self
    }

    /// Set whether binding records a page view.
    pub fn with_page_view(mut self, send_page_view: bool) -> Self {
        self.send_page_view = send_page_view;
        self
    }

    /// Whether IP anonymization is requested. Always true.
    pub fn anonymize_ip(&self) -> bool {
        self.anonymize_ip
    }

    /// Whether ad personalization is allowed. Always false.
    pub fn allow_ad_personalization_signals(&self) -> bool {
        self.allow_ad_personalization_signals
    }
}

/// Per-event parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    /// Group the event is delivered to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_to: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub non_interaction: bool,
}

impl EventOptions {
    /// Set the event category.
    pub fn with_category(mut self, category: &str) -> Self {
        self.event_category = Some(category.to_string());
        self
    }

    /// Set the numeric event value.
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    /// Mark the event as not caused by user interaction.
    pub fn non_interactive(mut self) -> Self {
        self.non_interaction = true;
        self
    }
}

struct Binding {
    destination_id: String,
    groups: Option<String>,
    gate: PrivacyGate,
    channel: Arc<dyn AnalyticsChannel>,
}

/// A tracking function bound to one destination.
///
/// Immutable once created. Trackers are not `Clone`; the component that
/// built one owns it.
pub struct Tracker {
    binding: Option<Binding>,
}

impl Tracker {
    /// A tracker that never sends anything.
    pub fn noop() -> Self {
        Self { binding: None }
    }

    /// Whether a destination was bound when this tracker was built.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// The bound destination, if any.
    pub fn destination_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.destination_id.as_str())
    }

    /// Send an event, unless tracking is disallowed right now.
    pub fn track(&self, event_name: &str, label: Option<&str>, mut options: EventOptions) {
        let Some(binding) = &self.binding else {
            return;
        };

        if binding.gate.is_tracking_disallowed() {
            tracing::trace!(event_name, "event suppressed by do-not-track");
            return;
        }

        if let Some(groups) = &binding.groups {
            options.send_to = Some(groups.clone());
        }
        if let Some(label) = label {
            options.event_label = Some(label.to_string());
        }

        binding.channel.push(AnalyticsCommand::Event {
            name: event_name.to_string(),
            params: options,
        });
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("destination_id", &self.destination_id())
            .field("groups", &self.binding.as_ref().and_then(|b| b.groups.as_deref()))
            .finish()
    }
}

/// Bind `destination_id` on `channel` and return its tracker.
///
/// When tracking is disallowed at call time no `config` command is issued
/// and the returned tracker is a no-op for its whole lifetime.
pub fn configure_tracker(
    gate: &PrivacyGate,
    channel: &Arc<dyn AnalyticsChannel>,
    destination_id: &str,
    options: TrackerOptions,
) -> Tracker {
    if gate.is_tracking_disallowed() {
        tracing::debug!(destination_id, "tracker not configured: do-not-track is set");
        return Tracker::noop();
    }

    let groups = options.groups.clone();
    channel.push(AnalyticsCommand::Config {
        destination_id: destination_id.to_string(),
        options,
    });
    tracing::debug!(destination_id, ?groups, "tracker configured");

    Tracker {
        binding: Some(Binding {
            destination_id: destination_id.to_string(),
            groups,
            gate: gate.clone(),
            channel: channel.clone(),
        }),
    }
}
