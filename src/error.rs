// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Studio Shot Error Types with Error Codes
//!
//! Error code ranges:
//! - STUDIO-000-009: Validation errors (user-correctable)
//! - STUDIO-010-019: Read/encode errors
//! - STUDIO-020-029: Workflow errors
//! - STUDIO-030-039: Remote transformer errors
//! - STUDIO-040-049: Configuration errors
//! - STUDIO-050-059: Reference/IO errors
//!
//! Every variant collapses onto one [`ErrorKind`], and every error can be
//! rendered as the short string stored in `WorkflowState::last_error`
//! via [`StudioError::user_message`].

use miette::Diagnostic;
use thiserror::Error;

use crate::util::{GENERIC_ERROR_MESSAGE, NO_SOURCE_MESSAGE};

pub type Result<T> = std::result::Result<T, StudioError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Coarse classification used at the workflow boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No source image, or otherwise user-correctable input
    Validation,
    /// Reading/encoding the uploaded file failed
    Read,
    /// The remote transformer failed or answered with something unusable
    Remote,
    /// Configuration, IO and handle errors outside an attempt
    Internal,
}

#[derive(Error, Debug, Diagnostic)]
pub enum StudioError {
    // ═══════════════════════════════════════════
    // VALIDATION ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[STUDIO-001] {reason}")]
    #[diagnostic(code(studio::validation), help("Upload an image before processing"))]
    Validation { reason: String },

    #[error("[STUDIO-002] Unsupported media type: {mime_type}")]
    #[diagnostic(
        code(studio::unsupported_media_type),
        help("Use a PNG, JPEG, WebP, HEIC or HEIF image")
    )]
    UnsupportedMediaType { mime_type: String },

    // ═══════════════════════════════════════════
    // READ ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[STUDIO-010] Failed to read '{source_name}': {reason}")]
    #[diagnostic(code(studio::read_error), help("Check the file exists and is readable"))]
    Read { source_name: String, reason: String },

    // ═══════════════════════════════════════════
    // WORKFLOW ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[STUDIO-020] A processing attempt is already running")]
    #[diagnostic(code(studio::attempt_in_progress))]
    AttemptInProgress,

    #[error("[STUDIO-021] Result discarded: a newer upload replaced the image while processing")]
    #[diagnostic(code(studio::attempt_superseded))]
    Superseded { generation: u64 },

    // ═══════════════════════════════════════════
    // REMOTE ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[STUDIO-030] Remote transformer error: {message}")]
    #[diagnostic(code(studio::remote_error))]
    Remote { message: String },

    #[error("[STUDIO-031] Remote transformer returned an empty image")]
    #[diagnostic(code(studio::empty_payload))]
    EmptyPayload,

    #[error("[STUDIO-032] Missing API key for transformer '{provider}'")]
    #[diagnostic(code(studio::missing_api_key), help("Set GEMINI_API_KEY"))]
    MissingApiKey { provider: String },

    #[error("[STUDIO-033] Unknown transformer: '{name}'. Available: gemini, mock")]
    #[diagnostic(code(studio::unknown_transformer))]
    UnknownTransformer { name: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[STUDIO-040] Configuration error: {reason}")]
    #[diagnostic(code(studio::config_error))]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // REFERENCE / IO ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[STUDIO-050] Invalid image reference: {reason}")]
    #[diagnostic(code(studio::invalid_reference))]
    InvalidReference { reason: String },

    #[error("[STUDIO-051] IO error: {0}")]
    #[diagnostic(code(studio::io_error))]
    Io(#[from] std::io::Error),
}

impl StudioError {
    /// The validation error raised when no image has been uploaded
    pub fn no_source() -> Self {
        Self::Validation {
            reason: NO_SOURCE_MESSAGE.to_string(),
        }
    }

    /// Remote failure with the collaborator's message
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Get the error code (e.g., "STUDIO-001")
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "STUDIO-001",
            Self::UnsupportedMediaType { .. } => "STUDIO-002",
            Self::Read { .. } => "STUDIO-010",
            Self::AttemptInProgress => "STUDIO-020",
            Self::Superseded { .. } => "STUDIO-021",
            Self::Remote { .. } => "STUDIO-030",
            Self::EmptyPayload => "STUDIO-031",
            Self::MissingApiKey { .. } => "STUDIO-032",
            Self::UnknownTransformer { .. } => "STUDIO-033",
            Self::ConfigError { .. } => "STUDIO-040",
            Self::InvalidReference { .. } => "STUDIO-050",
            Self::Io(_) => "STUDIO-051",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::UnsupportedMediaType { .. } => ErrorKind::Validation,
            Self::Read { .. } => ErrorKind::Read,
            Self::Remote { .. }
            | Self::EmptyPayload
            | Self::MissingApiKey { .. }
            | Self::UnknownTransformer { .. } => ErrorKind::Remote,
            Self::AttemptInProgress
            | Self::Superseded { .. }
            | Self::ConfigError { .. }
            | Self::InvalidReference { .. }
            | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Display string stored in `last_error`
    ///
    /// Carries the underlying message without the error code, falling back to
    /// [`GENERIC_ERROR_MESSAGE`] when that message is blank.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Validation { reason } => reason.clone(),
            Self::Read { reason, .. } => reason.clone(),
            Self::Remote { message } => message.clone(),
            Self::Io(e) => e.to_string(),
            other => {
                let full = other.to_string();
                match full.split_once("] ") {
                    Some((_, rest)) => rest.to_string(),
                    None => full,
                }
            }
        };

        if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

impl FixSuggestion for StudioError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            StudioError::Validation { .. } => Some("Upload an image, then trigger processing"),
            StudioError::UnsupportedMediaType { .. } => {
                Some("Convert the photo to PNG or JPEG and upload it again")
            }
            StudioError::Read { .. } => Some("Check the file path and permissions"),
            StudioError::AttemptInProgress => Some("Wait for the running attempt to finish"),
            StudioError::Superseded { .. } => Some("Process the new upload"),
            StudioError::Remote { .. } => {
                Some("Check your API quota and network, then process again")
            }
            StudioError::EmptyPayload => Some("Try again or pick the other background option"),
            StudioError::MissingApiKey { .. } => {
                Some("Set GEMINI_API_KEY or run: studio-shot config set-key <KEY>")
            }
            StudioError::UnknownTransformer { .. } => Some("Use --transformer gemini or mock"),
            StudioError::ConfigError { .. } => {
                Some("Fix or delete the config file (studio-shot config path)")
            }
            StudioError::InvalidReference { .. } => None,
            StudioError::Io(_) => Some("Check file path and permissions"),
        }
    }
}
