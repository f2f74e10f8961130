//! Renderable image references
//!
//! An [`ImageRef`] is the opaque handle a display layer uses to show or save
//! an image. Preview handles wrap the raw upload and render as a `blob:` URI;
//! result handles wrap the base64 PNG payload and render as a `data:` URL.
//!
//! Handles are allocated through a [`RefStore`] and must be released when
//! superseded, so repeated uploads and attempts never accumulate live handles.
//! Releasing revokes the handle for every clone: its bytes can no longer be
//! read and its URI no longer resolves.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::encode::UploadedFile;
use crate::error::{Result, StudioError};
use crate::util::constants::RESULT_MIME_TYPE;

/// URI scheme prefix for preview handles
const BLOB_PREFIX: &str = "blob:studio-shot/";

/// File name offered when saving a result
const RESULT_FILE_NAME: &str = "enhanced-image.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// The raw upload, shown immediately
    Preview,
    /// The transformed image of a successful attempt
    Result,
}

#[derive(Clone)]
enum RefContent {
    File(UploadedFile),
    Payload(Arc<str>),
}

/// Opaque, cheaply cloneable handle to a displayable image
#[derive(Clone)]
pub struct ImageRef {
    id: Uuid,
    kind: RefKind,
    mime_type: Arc<str>,
    content: RefContent,
    released: Arc<AtomicBool>,
}

impl ImageRef {
    fn new(kind: RefKind, mime_type: &str, content: RefContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            mime_type: Arc::from(mime_type),
            content,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> RefKind {
        self.kind
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Whether the owning store has released this handle
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// URI a display layer can render directly
    ///
    /// Still formatted after release, but [`RefStore::resolve`] no longer maps
    /// it back to a handle.
    pub fn uri(&self) -> String {
        match &self.content {
            RefContent::File(_) => format!("{}{}", BLOB_PREFIX, self.id),
            RefContent::Payload(data) => format!("data:{};base64,{}", self.mime_type, data),
        }
    }

    /// Raw image bytes behind the handle
    ///
    /// Fails with [`StudioError::InvalidReference`] once released.
    pub async fn bytes(&self) -> Result<Bytes> {
        if self.is_released() {
            return Err(StudioError::InvalidReference {
                reason: format!("reference {} has been released", self.id),
            });
        }
        match &self.content {
            RefContent::File(file) => file.read_bytes().await,
            RefContent::Payload(data) => STANDARD
                .decode(data.as_bytes())
                .map(Bytes::from)
                .map_err(|e| StudioError::InvalidReference {
                    reason: format!("result payload is not valid base64: {}", e),
                }),
        }
    }

    /// Save the image (download)
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.bytes().await?;
        tokio::fs::write(path.as_ref(), &bytes).await?;
        tracing::debug!(path = %path.as_ref().display(), bytes = bytes.len(), "image saved");
        Ok(())
    }

    /// Name to offer when the user downloads this image
    pub fn suggested_file_name(&self) -> &str {
        match &self.content {
            RefContent::File(file) => file.name(),
            RefContent::Payload(_) => RESULT_FILE_NAME,
        }
    }
}

impl PartialEq for ImageRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImageRef {}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRef")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Registry of live handles
#[derive(Clone, Default)]
pub struct RefStore {
    live: Arc<Mutex<HashMap<Uuid, ImageRef>>>,
}

impl RefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a preview handle wrapping the raw upload
    pub fn allocate_preview(&self, file: &UploadedFile) -> ImageRef {
        self.insert(ImageRef::new(
            RefKind::Preview,
            file.mime_type(),
            RefContent::File(file.clone()),
        ))
    }

    /// Allocate a result handle wrapping a base64 PNG payload
    pub fn allocate_result(&self, payload: impl Into<Arc<str>>) -> ImageRef {
        self.insert(ImageRef::new(
            RefKind::Result,
            RESULT_MIME_TYPE,
            RefContent::Payload(payload.into()),
        ))
    }

    fn insert(&self, image: ImageRef) -> ImageRef {
        tracing::debug!(id = %image.id, kind = ?image.kind, "reference allocated");
        self.live.lock().insert(image.id, image.clone());
        image
    }

    /// Release a handle; returns false if it was not live
    pub fn release(&self, image: &ImageRef) -> bool {
        let Some(live) = self.live.lock().remove(&image.id) else {
            return false;
        };
        live.released.store(true, Ordering::Release);
        tracing::debug!(id = %image.id, kind = ?image.kind, "reference released");
        true
    }

    /// Release every live handle, returning how many were released
    pub fn release_all(&self) -> usize {
        let mut live = self.live.lock();
        let count = live.len();
        for (_, image) in live.drain() {
            image.released.store(true, Ordering::Release);
        }
        count
    }

    pub fn is_live(&self, image: &ImageRef) -> bool {
        self.live.lock().contains_key(&image.id)
    }

    /// Look up a live handle by the URI it renders as
    pub fn resolve(&self, uri: &str) -> Option<ImageRef> {
        let live = self.live.lock();
        if let Some(id) = uri.strip_prefix(BLOB_PREFIX) {
            let id = Uuid::parse_str(id).ok()?;
            return live.get(&id).cloned();
        }
        live.values()
            .find(|image| image.kind == RefKind::Result && image.uri() == uri)
            .cloned()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

impl fmt::Debug for RefStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefStore")
            .field("live", &self.live_count())
            .finish()
    }
}
