//! Event Module - audit trail of workflow intents and attempt outcomes
//!
//! Key types:
//! - `Event`: Envelope with id + timestamp + kind
//! - `EventKind`: intents (upload, option) and attempt lifecycle
//! - `EventLog`: Thread-safe, append-only log

mod log;

pub use log::{Event, EventKind, EventLog};
