//! Performance Timeline
//!
//! Monotonic mark/measure timeline used as the host timing facility:
//! - Named marks relative to a fixed origin
//! - Named measures between two marks
//! - Lookup of the most recent entry by name
//!
//! # Example
//!
//! ```rust
//! use perf::PerformanceTimeline;
//! use std::time::Duration;
//!
//! let mut timeline = PerformanceTimeline::new();
//! timeline.mark_at("fetch_start", Duration::from_millis(5));
//! timeline.mark_at("fetch_end", Duration::from_millis(47));
//!
//! let entry = timeline.measure("fetch", "fetch_start", "fetch_end").unwrap();
//! assert_eq!(entry.rounded_duration_ms(), 42);
//! ```

mod timeline;

pub use timeline::*;

/// Re-export for convenience
pub use std::time::{Duration, Instant};
