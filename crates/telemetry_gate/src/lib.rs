//! Privacy-Gated Telemetry
//!
//! This crate wraps a third-party analytics library and an error-reporting
//! library behind the user's Do-Not-Track preference. It provides:
//!
//! - A privacy gate re-evaluated on every call, never cached
//! - Asynchronous script loading with a single completion callback
//! - Trackers bound to one destination with fixed privacy options
//! - Performance mark/measure forwarding
//! - Error-reporter setup that never fails the caller
//! - A one-shot start that enables each feature at most once
//!
//! # Privacy
//!
//! Nothing is loaded, configured or sent while any of the three
//! Do-Not-Track flags equals `"1"`. Bindings made while tracking was
//! allowed re-check the flags before every send, so turning Do-Not-Track
//! on mid-session silences them immediately.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use telemetry_gate::{
//!     DataLayer, Host, ReporterSlot, ScriptElement, ScriptFetcher, ScriptLoadError,
//!     SharedSignals, StartConfig, Telemetry,
//! };
//!
//! struct PageFetcher;
//!
//! #[async_trait::async_trait]
//! impl ScriptFetcher for PageFetcher {
//!     async fn fetch(&self, _script: &ScriptElement) -> Result<(), ScriptLoadError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> telemetry_gate::TelemetryResult<()> {
//! let host = Host::new(
//!     Arc::new(SharedSignals::new()),
//!     Arc::new(PageFetcher),
//!     Arc::new(DataLayer::new()),
//!     Arc::new(ReporterSlot::new()),
//! )?;
//! let telemetry = Telemetry::new(host);
//!
//! telemetry.start(StartConfig::new().with_analytics().with_performance());
//! telemetry.performance().mark("app_ready");
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`privacy`] - Do-Not-Track signal sources and the gate
//! - [`loader`] - Script loading
//! - [`analytics`] - Analytics commands and the data layer
//! - [`tracker`] - Destination binding
//! - [`performance`] - Mark/measure instrumentation
//! - [`error_reporting`] - Error-reporter setup
//! - [`config`] - Start configuration and fixed destinations
//! - [`logging`] - Subscriber installation

pub mod analytics;
pub mod config;
mod error;
pub mod error_reporting;
mod host;
pub mod loader;
pub mod logging;
pub mod performance;
pub mod privacy;
mod service;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use analytics::{AnalyticsChannel, AnalyticsCommand, DataLayer, DataLayerConfig};
pub use config::StartConfig;
pub use error::{ScriptLoadError, TelemetryError, TelemetryResult};
pub use error_reporting::{ErrorReporter, ReporterLookup, ReporterOptions, ReporterSlot, SendFilter};
pub use host::Host;
pub use loader::{CrossOrigin, ScriptElement, ScriptFetcher, ScriptLoader};
pub use performance::Performance;
pub use privacy::{PrivacyGate, PrivacySignals, SharedSignals, SignalSource};
pub use service::{StartHandle, Telemetry};
pub use tracker::{configure_tracker, EventOptions, Tracker, TrackerOptions};
