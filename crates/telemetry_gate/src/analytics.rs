//! Analytics command channel.
//!
//! Commands mirror the analytics library's queue protocol: a `js`
//! timestamp, one `config` per bound destination, and `event`s. The
//! [`DataLayer`] buffers them until the host hands them to the loaded
//! library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::error::{TelemetryError, TelemetryResult};
use crate::tracker::{EventOptions, TrackerOptions};

/// A single command for the analytics library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AnalyticsCommand {
    /// Library bootstrap timestamp
    Js { timestamp: DateTime<Utc> },
    /// Bind a destination with fixed options
    Config {
        destination_id: String,
        options: TrackerOptions,
    },
    /// Send an event
    Event { name: String, params: EventOptions },
}

impl AnalyticsCommand {
    /// Check if this is a destination configuration command.
    pub fn is_config(&self) -> bool {
        matches!(self, AnalyticsCommand::Config { .. })
    }

    /// Check if this is an event command.
    pub fn is_event(&self) -> bool {
        matches!(self, AnalyticsCommand::Event { .. })
    }
}

/// Sink for analytics commands.
pub trait AnalyticsChannel: Send + Sync {
    fn push(&self, command: AnalyticsCommand);
}

/// Configuration for the data layer.
#[derive(Debug, Clone)]
pub struct DataLayerConfig {
    /// Maximum commands held before new ones are dropped
    pub max_queue_size: usize,
}

impl Default for DataLayerConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10000,
        }
    }
}

impl DataLayerConfig {
    /// Set the maximum queue size.
    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }
}

/// Bounded in-memory queue of analytics commands.
#[derive(Debug, Default)]
pub struct DataLayer {
    config: DataLayerConfig,
    queue: Mutex<Vec<AnalyticsCommand>>,
}

impl DataLayer {
    /// Create an empty data layer with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a data layer with full configuration.
    pub fn with_config(config: DataLayerConfig) -> Self {
        Self {
            config,
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Queue a command, failing when the queue is full.
    pub fn try_push(&self, command: AnalyticsCommand) -> TelemetryResult<()> {
        let mut queue = self.queue.lock().map_err(|_| TelemetryError::QueueFull)?;
        if queue.len() >= self.config.max_queue_size {
            return Err(TelemetryError::QueueFull);
        }
        queue.push(command);
        Ok(())
    }

    /// Get the number of queued commands.
    pub fn queued_count(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Snapshot of the queued commands.
    pub fn queued(&self) -> Vec<AnalyticsCommand> {
        self.queue.lock().map(|q| q.clone()).unwrap_or_default()
    }

    /// Number of queued `config` commands.
    pub fn config_count(&self) -> usize {
        self.queued().iter().filter(|c| c.is_config()).count()
    }

    /// Number of queued `event` commands.
    pub fn event_count(&self) -> usize {
        self.queued().iter().filter(|c| c.is_event()).count()
    }

    /// Take ownership of queued commands (for handing to the library).
    pub fn take_queued(&self) -> Vec<AnalyticsCommand> {
        self.queue
            .lock()
            .map(|mut q| std::mem::take(&mut *q))
            .unwrap_or_default()
    }

    /// Serialize the queue as a JSON array.
    pub fn to_json(&self) -> TelemetryResult<String> {
        Ok(serde_json::to_string(&self.queued())?)
    }
}

impl AnalyticsChannel for DataLayer {
    fn push(&self, command: AnalyticsCommand) {
        if let Err(e) = self.try_push(command) {
            tracing::warn!(error = %e, "dropping analytics command");
        }
    }
}
