//! Do-Not-Track gate consulted before every tracking-sensitive operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Value a flag must hold to signal Do-Not-Track.
pub const DNT_ENABLED: &str = "1";

/// The three equivalent places a Do-Not-Track preference may be exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalSource {
    /// `navigator.doNotTrack`
    NavigatorDoNotTrack,
    /// `window.doNotTrack`
    WindowDoNotTrack,
    /// `navigator.msDoNotTrack`
    NavigatorMsDoNotTrack,
}

impl SignalSource {
    /// All sources, in the order they are consulted.
    pub const ALL: [SignalSource; 3] = [
        SignalSource::NavigatorDoNotTrack,
        SignalSource::WindowDoNotTrack,
        SignalSource::NavigatorMsDoNotTrack,
    ];
}

/// Read access to the environment's raw Do-Not-Track flags.
///
/// Implementations return the flag's current value, or `None` when the
/// environment does not expose it. Reads must be cheap; they happen on every
/// gated call.
pub trait PrivacySignals: Send + Sync {
    fn read(&self, source: SignalSource) -> Option<String>;
}

impl<F> PrivacySignals for F
where
    F: Fn(SignalSource) -> Option<String> + Send + Sync,
{
    fn read(&self, source: SignalSource) -> Option<String> {
        self(source)
    }
}

/// In-memory flag board the host mirrors environment state into.
///
/// Clones share the same flags, so the host can keep one handle to update
/// while the gate reads through another.
#[derive(Debug, Clone, Default)]
pub struct SharedSignals {
    flags: Arc<RwLock<HashMap<SignalSource, String>>>,
}

impl SharedSignals {
    /// Create a board with no flags set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag to a raw value.
    pub fn set(&self, source: SignalSource, value: impl Into<String>) {
        if let Ok(mut flags) = self.flags.write() {
            flags.insert(source, value.into());
        }
    }

    /// Remove a flag, making it absent.
    pub fn clear(&self, source: SignalSource) {
        if let Ok(mut flags) = self.flags.write() {
            flags.remove(&source);
        }
    }

    /// Remove every flag.
    pub fn clear_all(&self) {
        if let Ok(mut flags) = self.flags.write() {
            flags.clear();
        }
    }
}

impl PrivacySignals for SharedSignals {
    fn read(&self, source: SignalSource) -> Option<String> {
        // A poisoned board reads as absent rather than panicking
        self.flags.read().ok()?.get(&source).cloned()
    }
}

/// Predicate answering whether tracking is currently disallowed.
///
/// The answer is recomputed from the live flags on every call and is never
/// cached, since the user may change the preference mid-session.
#[derive(Clone)]
pub struct PrivacyGate {
    signals: Arc<dyn PrivacySignals>,
}

impl PrivacyGate {
    /// Create a gate over the given signal source.
    pub fn new(signals: Arc<dyn PrivacySignals>) -> Self {
        Self { signals }
    }

    /// True if any of the three flags currently equals `"1"`.
    pub fn is_tracking_disallowed(&self) -> bool {
        SignalSource::ALL
            .iter()
            .any(|&source| self.signals.read(source).as_deref() == Some(DNT_ENABLED))
    }

    /// Negation of [`is_tracking_disallowed`](Self::is_tracking_disallowed).
    pub fn is_tracking_allowed(&self) -> bool {
        !self.is_tracking_disallowed()
    }
}

impl fmt::Debug for PrivacyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivacyGate")
            .field("disallowed", &self.is_tracking_disallowed())
            .finish()
    }
}
