//! # Remote Transformer Abstraction
//!
//! The remote image-generation service is an opaque collaborator: it takes
//! a base64 image, its media type and an instruction, and answers with a
//! base64 PNG or a failure carrying a message.
//!
//! | Transformer | Use Case | Requires |
//! |-------------|----------|----------|
//! | `gemini` | Production | `GEMINI_API_KEY` |
//! | `mock` | Testing | Nothing |
//!
//! ```rust
//! use studio_shot::config::StudioConfig;
//! use studio_shot::transformer::create_transformer;
//!
//! let config = StudioConfig::default();
//! let mock = create_transformer("mock", &config).unwrap();
//! assert_eq!(mock.name(), "mock");
//!
//! assert!(create_transformer("invalid", &config).is_err());
//! ```

mod gemini;
mod mock;

pub use gemini::GeminiTransformer;
pub use mock::{MockTransformer, TransformRequest};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StudioConfig;
use crate::error::{Result, StudioError};

/// Core trait every image-generation backend implements
///
/// Failures should be [`StudioError::Remote`] carrying the service's own
/// message, so it can be shown to the user unchanged.
#[async_trait]
pub trait RemoteTransformer: Send + Sync {
    /// Transformer name (e.g., "gemini", "mock")
    fn name(&self) -> &str;

    /// Transform one image
    ///
    /// * `payload` - base64 of the source image
    /// * `mime_type` - media type of the source image
    /// * `instruction` - natural-language edit instruction
    ///
    /// Returns the base64 of the transformed PNG.
    async fn process_image(&self, payload: &str, mime_type: &str, instruction: &str)
        -> Result<String>;
}

/// Create a transformer by name
pub fn create_transformer(name: &str, config: &StudioConfig) -> Result<Arc<dyn RemoteTransformer>> {
    if name.eq_ignore_ascii_case("gemini") {
        Ok(Arc::new(GeminiTransformer::from_config(config)?))
    } else if name.eq_ignore_ascii_case("mock") {
        Ok(Arc::new(MockTransformer::new()))
    } else {
        Err(StudioError::UnknownTransformer {
            name: name.to_string(),
        })
    }
}
