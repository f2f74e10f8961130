//! Encoder - uploaded file → transport payload
//!
//! An [`UploadedFile`] is an opaque blob with a declared media type. It is
//! either already in memory or backed by a path that is only read when the
//! file is encoded, so [`encode`] is the single suspension point for I/O.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

/// Media types the remote transformer accepts as input
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Where the bytes of an upload live
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Bytes handed over directly (drag-and-drop, tests)
    Memory(Bytes),
    /// File on disk, read lazily
    Path(PathBuf),
}

/// A user-supplied image with its declared media type
#[derive(Debug, Clone)]
pub struct UploadedFile {
    name: String,
    mime_type: String,
    source: FileSource,
}

impl UploadedFile {
    /// Wrap in-memory bytes
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: FileSource::Memory(bytes.into()),
        }
    }

    /// Reference a file on disk, deriving the media type from its extension
    ///
    /// The file is not opened here; read failures surface from [`encode`].
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mime_type = mime_from_path(&path).ok_or_else(|| StudioError::UnsupportedMediaType {
            mime_type: path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            source: FileSource::Path(path),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Whether the declared media type is one the transformer accepts
    pub fn is_supported(&self) -> bool {
        SUPPORTED_MIME_TYPES
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&self.mime_type))
    }

    /// Read the full content
    ///
    /// Fails with [`StudioError::Read`] on I/O failure or when the file is empty.
    pub async fn read_bytes(&self) -> Result<Bytes> {
        let bytes = match &self.source {
            FileSource::Memory(bytes) => bytes.clone(),
            FileSource::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| self.read_error(e.to_string()))?,
        };

        if bytes.is_empty() {
            return Err(self.read_error("file is empty"));
        }
        Ok(bytes)
    }

    fn read_error(&self, reason: impl Into<String>) -> StudioError {
        StudioError::Read {
            source_name: self.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Transport-ready representation of an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPayload {
    /// Base64 (standard alphabet, padded) of the full file content
    pub data: String,
    /// Declared media type of the source file
    pub mime_type: String,
}

impl EncodedPayload {
    /// Approximate decoded size in bytes
    pub fn decoded_len(&self) -> usize {
        self.data.len() / 4 * 3
    }
}

/// Encode an upload for transport
///
/// Recomputed on every processing attempt; nothing is cached.
pub async fn encode(file: &UploadedFile) -> Result<EncodedPayload> {
    let bytes = file.read_bytes().await?;
    tracing::debug!(file = file.name(), bytes = bytes.len(), "encoded upload");

    Ok(EncodedPayload {
        data: STANDARD.encode(&bytes),
        mime_type: file.mime_type().to_string(),
    })
}

/// Media type for a path, from its extension
pub fn mime_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}
