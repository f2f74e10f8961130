//! Centralized constants for the enhancement workflow
//!
//! Timeouts, service defaults and the messages surfaced to the user.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
// HTTP Timeouts
// ═══════════════════════════════════════════════════════════════

/// Timeout for a single image-generation request
pub const TRANSFORM_TIMEOUT: Duration = Duration::from_secs(180);

/// Timeout for establishing HTTP connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ═══════════════════════════════════════════════════════════════
// Remote Service Defaults
// ═══════════════════════════════════════════════════════════════

/// Image-capable Gemini model used when nothing else is configured
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Base URL of the Generative Language API
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("studio-shot/", env!("CARGO_PKG_VERSION"));

// ═══════════════════════════════════════════════════════════════
// User-facing Messages
// ═══════════════════════════════════════════════════════════════

/// Shown when processing is triggered before any upload
pub const NO_SOURCE_MESSAGE: &str = "Please upload an image first.";

/// Fallback when a failure carries no usable message
pub const GENERIC_ERROR_MESSAGE: &str = "Failed to process the image. Please try again.";

/// Media type of every result payload
pub const RESULT_MIME_TYPE: &str = "image/png";
