//! Mark/measure timeline backed by a monotonic clock

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised by timeline lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimelineError {
    /// A measure referenced a mark that was never recorded
    #[error("No mark named '{0}' has been recorded")]
    UnknownMark(String),
}

/// Kind of entry stored on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// A named point in time
    Mark,
    /// A named interval between two marks
    Measure,
}

/// A single timeline entry.
///
/// `start_time` is milliseconds since the timeline origin. Marks have a
/// zero duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub name: String,
    pub entry_type: EntryType,
    pub start_time: f64,
    pub duration: f64,
}

impl PerformanceEntry {
    /// Duration rounded to the nearest whole millisecond.
    pub fn rounded_duration_ms(&self) -> i64 {
        self.duration.round() as i64
    }
}

/// Timeline of marks and measures relative to a fixed origin.
///
/// Entries are kept in insertion order. When `max_entries` is reached the
/// oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct PerformanceTimeline {
    origin: Instant,
    entries: Vec<PerformanceEntry>,
    max_entries: usize,
}

impl PerformanceTimeline {
    /// Create a timeline whose origin is now.
    pub fn new() -> Self {
        Self::with_origin(Instant::now())
    }

    /// Create a timeline with an explicit origin.
    pub fn with_origin(origin: Instant) -> Self {
        Self {
            origin,
            entries: Vec::new(),
            max_entries: 1000,
        }
    }

    /// Set the maximum number of retained entries.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Milliseconds elapsed since the origin.
    #[inline]
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    /// Record a mark at the current time.
    pub fn mark(&mut self, name: &str) -> &PerformanceEntry {
        let at = self.now();
        self.mark_at(name, Duration::from_secs_f64(at / 1000.0))
    }

    /// Record a mark at an explicit offset from the origin.
    pub fn mark_at(&mut self, name: &str, offset: Duration) -> &PerformanceEntry {
        self.push(PerformanceEntry {
            name: name.to_string(),
            entry_type: EntryType::Mark,
            start_time: offset.as_secs_f64() * 1000.0,
            duration: 0.0,
        })
    }

    /// Record a measure spanning the latest `start_mark` to the latest `end_mark`.
    pub fn measure(
        &mut self,
        name: &str,
        start_mark: &str,
        end_mark: &str,
    ) -> Result<&PerformanceEntry, TimelineError> {
        let start = self.mark_time(start_mark)?;
        let end = self.mark_time(end_mark)?;

        tracing::trace!(
            target: "perf",
            name,
            start_mark,
            end_mark,
            duration_ms = end - start,
            "measure recorded"
        );

        Ok(self.push(PerformanceEntry {
            name: name.to_string(),
            entry_type: EntryType::Measure,
            start_time: start,
            duration: end - start,
        }))
    }

    /// Most recently recorded entry with the given name, of any type.
    pub fn last_entry_by_name(&self, name: &str) -> Option<&PerformanceEntry> {
        self.entries.iter().rev().find(|e| e.name == name)
    }

    /// All entries with the given name, oldest first.
    pub fn entries_by_name(&self, name: &str) -> Vec<&PerformanceEntry> {
        self.entries.iter().filter(|e| e.name == name).collect()
    }

    /// All entries of the given type, oldest first.
    pub fn entries_by_type(&self, entry_type: EntryType) -> Vec<&PerformanceEntry> {
        self.entries
            .iter()
            .filter(|e| e.entry_type == entry_type)
            .collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the timeline holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all marks, keeping measures.
    pub fn clear_marks(&mut self) {
        self.entries.retain(|e| e.entry_type != EntryType::Mark);
    }

    /// Remove all measures, keeping marks.
    pub fn clear_measures(&mut self) {
        self.entries.retain(|e| e.entry_type != EntryType::Measure);
    }

    fn mark_time(&self, name: &str) -> Result<f64, TimelineError> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.entry_type == EntryType::Mark && e.name == name)
            .map(|e| e.start_time)
            .ok_or_else(|| TimelineError::UnknownMark(name.to_string()))
    }

    fn push(&mut self, entry: PerformanceEntry) -> &PerformanceEntry {
        if self.entries.len() >= self.max_entries {
            self.entries.remove(0);
        }
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }
}

impl Default for PerformanceTimeline {
    fn default() -> Self {
        Self::new()
    }
}
