//! Error types for the telemetry gate.

use thiserror::Error;

/// Terminal failure of a single script load.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScriptLoadError {
    /// The request failed at the network level
    #[error("Network error loading {url}: {reason}")]
    Network { url: String, reason: String },

    /// The server answered but the script does not exist
    #[error("Script not found: {url}")]
    NotFound { url: String },

    /// The request was refused by CORS or content policy
    #[error("Script blocked: {url}")]
    Blocked { url: String },
}

impl ScriptLoadError {
    /// URL of the script that failed to load.
    pub fn url(&self) -> &str {
        match self {
            ScriptLoadError::Network { url, .. }
            | ScriptLoadError::NotFound { url }
            | ScriptLoadError::Blocked { url } => url,
        }
    }
}

/// Errors that can occur in the telemetry gate.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to serialize analytics commands
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An external script failed to load
    #[error("Script load failed: {0}")]
    ScriptLoad(#[from] ScriptLoadError),

    /// A library loaded but did not expose its interface
    #[error("Expected interface '{0}' is not available")]
    MissingInterface(&'static str),

    /// The error reporter rejected its configuration
    #[error("Error reporter failure: {0}")]
    Reporter(String),

    /// No async runtime is available to drive script loads
    #[error("No tokio runtime is available")]
    NoRuntime,

    /// Analytics command queue is full
    #[error("Analytics queue is full")]
    QueueFull,

    /// Timeline lookup failed
    #[error("Timeline error: {0}")]
    Timeline(#[from] perf::TimelineError),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::MissingInterface("Raven");
        assert_eq!(err.to_string(), "Expected interface 'Raven' is not available");

        let err = TelemetryError::Reporter("bad dsn".to_string());
        assert_eq!(err.to_string(), "Error reporter failure: bad dsn");
    }

    #[test]
    fn test_script_load_error_conversion() {
        let load_err = ScriptLoadError::NotFound {
            url: "https://cdn.example.com/lib.js".to_string(),
        };
        let err: TelemetryError = load_err.into();
        assert!(matches!(err, TelemetryError::ScriptLoad(_)));
        assert_eq!(
            err.to_string(),
            "Script load failed: Script not found: https://cdn.example.com/lib.js"
        );
    }

    #[test]
    fn test_script_load_error_url() {
        let err = ScriptLoadError::Network {
            url: "https://a.example/x.js".to_string(),
            reason: "reset".to_string(),
        };
        assert_eq!(err.url(), "https://a.example/x.js");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err: Result<(), serde_json::Error> = serde_json::from_str::<()>("invalid json");
        let err: TelemetryError = json_err.unwrap_err().into();
        assert!(matches!(err, TelemetryError::Serialization(_)));
    }

    #[test]
    fn test_timeline_error_conversion() {
        let err: TelemetryError = perf::TimelineError::UnknownMark("start".to_string()).into();
        assert!(matches!(err, TelemetryError::Timeline(_)));
    }
}
