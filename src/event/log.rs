//! EventLog - append-only record of what happened to a session
//!
//! - Event: envelope with id + timestamp + kind
//! - EventKind: intents and attempt lifecycle, tagged with the generation
//! - EventLog: thread-safe, append-only log

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::instruction::BackgroundOption;

/// Single event in the session log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since session start (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // INTENTS
    // ═══════════════════════════════════════════
    Uploaded {
        generation: u64,
        file_name: String,
        mime_type: String,
    },
    OptionSelected {
        option: BackgroundOption,
    },

    // ═══════════════════════════════════════════
    // ATTEMPT LIFECYCLE
    // ═══════════════════════════════════════════
    /// Trigger refused before any work (no source image)
    AttemptRejected {
        reason: String,
    },
    AttemptStarted {
        generation: u64,
        option: BackgroundOption,
        transformer: String,
    },
    AttemptSucceeded {
        generation: u64,
        payload_len: usize,
        duration_ms: u64,
    },
    AttemptFailed {
        generation: u64,
        error: String,
        duration_ms: u64,
    },
    /// Completion arrived after a newer upload or attempt; ignored
    StaleCompletionDiscarded {
        attempt_generation: u64,
        current_generation: u64,
    },
    /// Attempt future dropped before it completed (task aborted, select lost)
    AttemptAbandoned {
        generation: u64,
    },
}

impl EventKind {
    /// Generation of the attempt or upload this event belongs to
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Uploaded { generation, .. }
            | Self::AttemptStarted { generation, .. }
            | Self::AttemptSucceeded { generation, .. }
            | Self::AttemptFailed { generation, .. }
            | Self::AttemptAbandoned { generation } => Some(*generation),
            Self::StaleCompletionDiscarded {
                attempt_generation, ..
            } => Some(*attempt_generation),
            Self::OptionSelected { .. } | Self::AttemptRejected { .. } => None,
        }
    }

    /// Whether this event closes an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AttemptSucceeded { .. }
                | Self::AttemptFailed { .. }
                | Self::StaleCompletionDiscarded { .. }
                | Self::AttemptAbandoned { .. }
        )
    }
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        self.events.write().push(event);
        id
    }

    /// Get all events (cloned)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Zero-copy access to events via callback
    ///
    /// Holds read lock for duration of callback - keep it short.
    pub fn with_events<T>(&self, f: impl FnOnce(&[Event]) -> T) -> T {
        f(&self.events.read())
    }

    /// Events belonging to one generation
    pub fn filter_generation(&self, generation: u64) -> Vec<Event> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.kind.generation() == Some(generation))
                .cloned()
                .collect()
        })
    }

    /// Serialize to JSON for debugging
    pub fn to_json(&self) -> Value {
        self.with_events(|events| serde_json::to_value(events).unwrap_or(Value::Null))
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .finish()
    }
}
