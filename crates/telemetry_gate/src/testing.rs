//! Test doubles shared by the unit and integration tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::error::{ScriptLoadError, TelemetryError};
use crate::error_reporting::{ErrorReporter, ReporterOptions};
use crate::loader::{ScriptElement, ScriptFetcher};

/// Fetcher that records every request and fails for selected URLs.
#[derive(Debug, Default)]
pub struct MockFetcher {
    failing: HashSet<String>,
    requests: Mutex<Vec<ScriptElement>>,
}

impl MockFetcher {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing_for(url: &str) -> Self {
        let mut fetcher = Self::default();
        fetcher.failing.insert(url.to_string());
        fetcher
    }

    pub fn requested(&self) -> Vec<ScriptElement> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested().into_iter().map(|s| s.src).collect()
    }
}

#[async_trait]
impl ScriptFetcher for MockFetcher {
    async fn fetch(&self, script: &ScriptElement) -> Result<(), ScriptLoadError> {
        self.requests.lock().unwrap().push(script.clone());
        tokio::task::yield_now().await;
        if self.failing.contains(&script.src) {
            Err(ScriptLoadError::NotFound {
                url: script.src.clone(),
            })
        } else {
            Ok(())
        }
    }
}

/// Reporter that records configuration and install calls.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub configured: Mutex<Vec<String>>,
    pub options: Mutex<Option<ReporterOptions>>,
    pub installs: AtomicUsize,
    pub reject_config: bool,
}

impl RecordingReporter {
    pub fn rejecting() -> Self {
        Self {
            reject_config: true,
            ..Default::default()
        }
    }

    pub fn install_count(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }
}

impl ErrorReporter for RecordingReporter {
    fn configure(&self, dsn: &str, options: ReporterOptions) -> Result<(), TelemetryError> {
        if self.reject_config {
            return Err(TelemetryError::Reporter("invalid dsn".to_string()));
        }
        self.configured.lock().unwrap().push(dsn.to_string());
        *self.options.lock().unwrap() = Some(options);
        Ok(())
    }

    fn install(&self) -> Result<(), TelemetryError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Layer counting events logged at WARN level.
#[derive(Debug, Clone, Default)]
pub struct WarnCounter {
    count: Arc<AtomicUsize>,
}

impl WarnCounter {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Install a thread-local subscriber that counts warnings.
///
/// Tests run on a current-thread runtime, so spawned loads log through the
/// same default.
pub fn capture_warnings() -> (WarnCounter, tracing::subscriber::DefaultGuard) {
    let counter = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (counter, guard)
}
