//! Studio Shot - AI background treatment for product photos
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  instruction/  BackgroundOption → instruction text           │
//! │  encode/       UploadedFile → EncodedPayload (base64)        │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  workflow/     WorkflowController state machine              │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  transformer/  Remote image generation (Gemini, mock)        │
//! │  reference/    Renderable handles (preview, result)          │
//! │  event/        Session audit log                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use studio_shot::{BackgroundOption, MockTransformer, UploadedFile, WorkflowController};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let controller = WorkflowController::new(Arc::new(MockTransformer::new()));
//! controller.upload(UploadedFile::from_bytes("cat.jpg", "image/jpeg", b"jpeg".to_vec()));
//! controller.select_option(BackgroundOption::White);
//!
//! let outcome = controller.trigger_process().await;
//! assert!(outcome.is_success());
//! assert_eq!(
//!     controller.state().result_ref.unwrap().uri(),
//!     "data:image/png;base64,Zm9v"
//! );
//! # }
//! ```

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod encode;
pub mod instruction;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER
// ═══════════════════════════════════════════════════════════════
pub mod workflow;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER
// ═══════════════════════════════════════════════════════════════
pub mod event;
pub mod reference;
pub mod transformer;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use config::{mask_api_key, StudioConfig};
pub use encode::{encode, EncodedPayload, UploadedFile};
pub use error::{ErrorKind, FixSuggestion, StudioError};
pub use event::{Event, EventKind, EventLog};
pub use instruction::{build_instruction, BackgroundOption};
pub use reference::{ImageRef, RefKind, RefStore};
pub use transformer::{create_transformer, GeminiTransformer, MockTransformer, RemoteTransformer};
pub use workflow::{AttemptOutcome, Phase, WorkflowController, WorkflowState};
