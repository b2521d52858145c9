//! Attachment enrichment: turns a captured image or a location fix into a
//! message draft ready for the outbound pipeline.

use crate::chat::types::{GeoPoint, MessageDraft};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of a permission-gated device call.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome<T> {
    Captured(T),
    /// The user backed out of the picker or camera.
    Cancelled,
    /// The user declined the permission prompt.
    Denied,
}

/// Image handed back by the library picker or the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    /// Device URI of the image; its last path segment names the upload.
    pub uri: String,
    pub bytes: Vec<u8>,
}

/// Photo library and camera.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn pick_from_library(&self) -> Result<CaptureOutcome<CapturedImage>>;
    async fn take_photo(&self) -> Result<CaptureOutcome<CapturedImage>>;
}

/// One-shot geolocation.
#[async_trait]
pub trait LocationFixer: Send + Sync {
    async fn current_position(&self) -> Result<CaptureOutcome<GeoPoint>>;
}

/// Binary upload target returning a stable URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<String>;
}

/// Entries of the attachment menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentAction {
    PickImage,
    TakePhoto,
    ShareLocation,
}

impl AttachmentAction {
    /// Menu entries in display order. A trailing "Cancel" entry follows them.
    pub const ALL: [AttachmentAction; 3] = [
        AttachmentAction::PickImage,
        AttachmentAction::TakePhoto,
        AttachmentAction::ShareLocation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AttachmentAction::PickImage => "Choose From Library",
            AttachmentAction::TakePhoto => "Take Picture",
            AttachmentAction::ShareLocation => "Send Location",
        }
    }

    /// Map a tapped menu row to an action; the cancel row and anything past
    /// it map to `None`.
    pub fn from_menu_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Runs device captures and uploads.
#[derive(Clone)]
pub struct Attachments {
    picker: Arc<dyn ImagePicker>,
    locator: Arc<dyn LocationFixer>,
    blobs: Arc<dyn BlobStore>,
}

impl Attachments {
    pub fn new(
        picker: Arc<dyn ImagePicker>,
        locator: Arc<dyn LocationFixer>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            picker,
            locator,
            blobs,
        }
    }

    /// Run `action` and return the resulting draft.
    ///
    /// `None` means nothing should be sent: the user cancelled, a permission
    /// was denied, or the device call or upload failed (failures are logged).
    pub async fn capture(&self, action: AttachmentAction) -> Option<MessageDraft> {
        tracing::debug!("Attachment action: {}", action.label());
        match action {
            AttachmentAction::PickImage | AttachmentAction::TakePhoto => {
                self.capture_image(action).await
            }
            AttachmentAction::ShareLocation => self.capture_location().await,
        }
    }

    /// Capture an image, upload it and return a draft holding its URL.
    pub async fn capture_image(&self, action: AttachmentAction) -> Option<MessageDraft> {
        let outcome = match action {
            AttachmentAction::TakePhoto => self.picker.take_photo().await,
            _ => self.picker.pick_from_library().await,
        };

        let image = accept(outcome, "image capture")?;
        let name = image_name(&image.uri);

        match self.blobs.upload(image.bytes, &name).await {
            Ok(url) => {
                tracing::info!("Uploaded {} to {}", name, url);
                Some(MessageDraft::image(url))
            }
            Err(e) => {
                tracing::warn!("Image upload failed: {}", e);
                None
            }
        }
    }

    /// Take a single location fix and return a draft holding it.
    ///
    /// A fix with a non-finite coordinate counts as a failed capture: JSON
    /// cannot carry it, so it would poison the cached snapshot.
    pub async fn capture_location(&self) -> Option<MessageDraft> {
        let outcome = self.locator.current_position().await;
        let point = accept(outcome, "location fix")?;

        if !point.is_finite() {
            let err = Error::Capture(format!(
                "location fix out of range: {}, {}",
                point.latitude, point.longitude
            ));
            tracing::warn!("{}", err);
            return None;
        }

        Some(MessageDraft::location(point))
    }
}

fn accept<T>(outcome: Result<CaptureOutcome<T>>, what: &str) -> Option<T> {
    match outcome {
        Ok(CaptureOutcome::Captured(value)) => Some(value),
        Ok(CaptureOutcome::Cancelled) => {
            tracing::debug!("{} cancelled", what);
            None
        }
        Ok(CaptureOutcome::Denied) => {
            let err = Error::PermissionDenied(what.to_string());
            tracing::warn!("{}", err);
            None
        }
        Err(e) => {
            tracing::warn!("{} failed: {}", what, e);
            None
        }
    }
}

/// Upload name for an image: the last `/` segment of its URI.
pub fn image_name(uri: &str) -> String {
    match uri.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}.jpg", uuid::Uuid::new_v4()),
    }
}

/// Blob store writing files into a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<String> {
        if name.contains(['/', '\\']) || name == ".." {
            return Err(Error::Capture(format!("invalid blob name: {}", name)));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes).await?;

        let path = tokio::fs::canonicalize(&path).await?;
        Ok(format!("file://{}", path.display()))
    }
}
