//! Error-reporting setup.
//!
//! Loads the reporter library, then configures and installs the interface
//! it exposes. Every failure is logged and ends the setup; none reach the
//! caller.

use std::fmt;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;

use crate::config::{ERROR_REPORTING_DSN, ERROR_REPORTING_SCRIPT_URL};
use crate::error::{ScriptLoadError, TelemetryError};
use crate::loader::ScriptLoader;
use crate::privacy::PrivacyGate;

/// Name of the interface the reporter library is expected to expose.
pub const REPORTER_INTERFACE: &str = "Raven";

/// Send-time filter handed to the reporter.
///
/// The reporter consults it before sending each captured error, so errors
/// captured after Do-Not-Track turns on are dropped.
#[derive(Clone, Debug)]
pub struct SendFilter {
    gate: PrivacyGate,
}

impl SendFilter {
    pub fn new(gate: PrivacyGate) -> Self {
        Self { gate }
    }

    /// Whether a captured error may be sent right now.
    pub fn allows_send(&self) -> bool {
        self.gate.is_tracking_allowed()
    }
}

/// Options passed to the reporter when it is configured.
#[derive(Clone, Debug)]
pub struct ReporterOptions {
    pub should_send: SendFilter,
}

/// Interface exposed by a loaded error-reporting library.
pub trait ErrorReporter: Send + Sync {
    /// Point the reporter at its destination.
    fn configure(&self, dsn: &str, options: ReporterOptions) -> Result<(), TelemetryError>;

    /// Install global error capture.
    fn install(&self) -> Result<(), TelemetryError>;
}

/// Resolves the reporter interface once its library has loaded.
pub trait ReporterLookup: Send + Sync {
    fn lookup(&self) -> Option<Arc<dyn ErrorReporter>>;
}

impl<F> ReporterLookup for F
where
    F: Fn() -> Option<Arc<dyn ErrorReporter>> + Send + Sync,
{
    fn lookup(&self) -> Option<Arc<dyn ErrorReporter>> {
        self()
    }
}

/// Slot the host fills when the reporter library exposes its interface.
#[derive(Clone, Default)]
pub struct ReporterSlot {
    reporter: Arc<RwLock<Option<Arc<dyn ErrorReporter>>>>,
}

impl ReporterSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the reporter interface.
    pub fn set(&self, reporter: Arc<dyn ErrorReporter>) {
        if let Ok(mut slot) = self.reporter.write() {
            *slot = Some(reporter);
        }
    }

    /// Whether an interface has been published.
    pub fn is_set(&self) -> bool {
        self.reporter.read().map(|s| s.is_some()).unwrap_or(false)
    }
}

impl ReporterLookup for ReporterSlot {
    fn lookup(&self) -> Option<Arc<dyn ErrorReporter>> {
        self.reporter.read().ok()?.clone()
    }
}

impl fmt::Debug for ReporterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterSlot")
            .field("is_set", &self.is_set())
            .finish()
    }
}

/// Load, configure and install the error reporter.
///
/// Returns `None` without requesting anything when tracking is disallowed.
/// Otherwise returns the handle of the in-flight load.
pub fn setup_error_logging(
    gate: &PrivacyGate,
    loader: &ScriptLoader,
    lookup: Arc<dyn ReporterLookup>,
) -> Option<JoinHandle<()>> {
    if gate.is_tracking_disallowed() {
        tracing::debug!("error logging skipped: do-not-track is set");
        return None;
    }

    let gate = gate.clone();
    let handle = loader.load(
        ERROR_REPORTING_SCRIPT_URL,
        Some(move |result: Result<(), ScriptLoadError>| {
            if let Err(e) = result {
                tracing::warn!(error = %e, "error reporting library failed to load");
                return;
            }
            if gate.is_tracking_disallowed() {
                tracing::trace!("error reporting not installed: do-not-track set during load");
                return;
            }
            if let Err(e) = install_reporter(&gate, lookup.as_ref()) {
                tracing::warn!(error = %e, "error reporting not installed");
            }
        }),
    );
    Some(handle)
}

fn install_reporter(gate: &PrivacyGate, lookup: &dyn ReporterLookup) -> Result<(), TelemetryError> {
    let reporter = lookup
        .lookup()
        .ok_or(TelemetryError::MissingInterface(REPORTER_INTERFACE))?;

    let options = ReporterOptions {
        should_send: SendFilter::new(gate.clone()),
    };
    reporter.configure(ERROR_REPORTING_DSN, options)?;
    reporter.install()?;

    tracing::debug!("error reporting installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::{SharedSignals, SignalSource};
    use crate::testing::{capture_warnings, MockFetcher, RecordingReporter};
    use tokio::runtime::Handle;

    fn gate(signals: &SharedSignals) -> PrivacyGate {
        PrivacyGate::new(Arc::new(signals.clone()))
    }

    #[tokio::test]
    async fn test_setup_configures_and_installs() {
        let signals = SharedSignals::new();
        let fetcher = Arc::new(MockFetcher::succeeding());
        let loader = ScriptLoader::new(fetcher.clone(), Handle::current());
        let reporter = Arc::new(RecordingReporter::default());
        let slot = ReporterSlot::new();
        slot.set(reporter.clone());

        let handle = setup_error_logging(&gate(&signals), &loader, Arc::new(slot)).unwrap();
        handle.await.unwrap();

        assert_eq!(fetcher.requested_urls(), vec![ERROR_REPORTING_SCRIPT_URL]);
        assert_eq!(*reporter.configured.lock().unwrap(), vec![ERROR_REPORTING_DSN]);
        assert_eq!(reporter.install_count(), 1);
    }

    #[tokio::test]
    async fn test_setup_skipped_when_disallowed() {
        let signals = SharedSignals::new();
        signals.set(SignalSource::NavigatorMsDoNotTrack, "1");
        let fetcher = Arc::new(MockFetcher::succeeding());
        let loader = ScriptLoader::new(fetcher.clone(), Handle::current());

        let handle = setup_error_logging(&gate(&signals), &loader, Arc::new(ReporterSlot::new()));

        assert!(handle.is_none());
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_warns_once() {
        let (warnings, _guard) = capture_warnings();
        let signals = SharedSignals::new();
        let fetcher = Arc::new(MockFetcher::failing_for(ERROR_REPORTING_SCRIPT_URL));
        let loader = ScriptLoader::new(fetcher, Handle::current());
        let reporter = Arc::new(RecordingReporter::default());
        let slot = ReporterSlot::new();
        slot.set(reporter.clone());

        let handle = setup_error_logging(&gate(&signals), &loader, Arc::new(slot)).unwrap();
        handle.await.unwrap();

        assert_eq!(warnings.count(), 1);
        assert!(reporter.configured.lock().unwrap().is_empty());
        assert_eq!(reporter.install_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_interface_warns() {
        let (warnings, _guard) = capture_warnings();
        let signals = SharedSignals::new();
        let loader = ScriptLoader::new(Arc::new(MockFetcher::succeeding()), Handle::current());

        let handle =
            setup_error_logging(&gate(&signals), &loader, Arc::new(ReporterSlot::new())).unwrap();
        handle.await.unwrap();

        assert_eq!(warnings.count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_configuration_skips_install() {
        let (warnings, _guard) = capture_warnings();
        let signals = SharedSignals::new();
        let loader = ScriptLoader::new(Arc::new(MockFetcher::succeeding()), Handle::current());
        let reporter = Arc::new(RecordingReporter::rejecting());
        let lookup_target = reporter.clone();
        let lookup = move || Some(lookup_target.clone() as Arc<dyn ErrorReporter>);

        let handle = setup_error_logging(&gate(&signals), &loader, Arc::new(lookup)).unwrap();
        handle.await.unwrap();

        assert_eq!(warnings.count(), 1);
        assert_eq!(reporter.install_count(), 0);
    }

    #[tokio::test]
    async fn test_dnt_set_during_load_skips_install() {
        let signals = SharedSignals::new();
        let fetcher = Arc::new(MockFetcher::succeeding());
        let loader = ScriptLoader::new(fetcher.clone(), Handle::current());
        let reporter = Arc::new(RecordingReporter::default());
        let slot = ReporterSlot::new();
        slot.set(reporter.clone());

        let handle = setup_error_logging(&gate(&signals), &loader, Arc::new(slot)).unwrap();
        signals.set(SignalSource::NavigatorDoNotTrack, "1");
        handle.await.unwrap();

        assert_eq!(fetcher.requested_urls(), vec![ERROR_REPORTING_SCRIPT_URL]);
        assert!(reporter.configured.lock().unwrap().is_empty());
        assert!(reporter.options.lock().unwrap().is_none());
        assert_eq!(reporter.install_count(), 0);
    }

    #[tokio::test]
    async fn test_send_filter_follows_live_signal() {
        let signals = SharedSignals::new();
        let loader = ScriptLoader::new(Arc::new(MockFetcher::succeeding()), Handle::current());
        let reporter = Arc::new(RecordingReporter::default());
        let slot = ReporterSlot::new();
        slot.set(reporter.clone());

        setup_error_logging(&gate(&signals), &loader, Arc::new(slot))
            .unwrap()
            .await
            .unwrap();

        let options = reporter.options.lock().unwrap().clone().unwrap();
        assert!(options.should_send.allows_send());

        signals.set(SignalSource::WindowDoNotTrack, "1");
        assert!(!options.should_send.allows_send());
    }
}
