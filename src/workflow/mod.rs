//! Workflow Module - the upload → encode → transform → present pipeline
//!
//! ```text
//!            upload()                 trigger_process()
//!   Idle ─────────────▶ Idle(source) ─────────────────▶ Processing
//!     ▲                     ▲                              │
//!     │ upload()            │ upload() (any state)         ├─▶ Succeeded (result_ref)
//!     └─────────────────────┴──────────────────────────────┴─▶ Failed (last_error)
//! ```
//!
//! - `WorkflowState`: read-only snapshot for display layers
//! - `WorkflowController`: applies intents, runs attempts, discards stale ones

mod controller;
mod state;

pub use controller::{AttemptOutcome, WorkflowController};
pub use state::{Phase, WorkflowState};
