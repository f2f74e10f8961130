//! Utilities Module - shared infrastructure
//!
//! - `constants`: Centralized timeouts, defaults and user-facing messages

pub mod constants;

pub use constants::{
    CONNECT_TIMEOUT, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, GENERIC_ERROR_MESSAGE,
    NO_SOURCE_MESSAGE, TRANSFORM_TIMEOUT,
};
