/// Thumbnail job processing
///
/// For an uploaded image (or file), regenerates the blob at several
/// fixed widths as sibling blobs named `<local_path>_<width>`.
use crate::files::FileStore;
use crate::jobs::JobError;
use crate::storage::{thumbnail_path, DiskStorage};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use uuid::Uuid;

pub const QUEUE_NAME: &str = "image-thumbnail-worker";

/// Derived widths, generated in this order
pub const THUMBNAIL_WIDTHS: [u32; 3] = [500, 250, 100];

/// Wire payload: opaque key-value pairs, no schema versioning. Fields
/// are optional because absence is a structural failure the worker
/// detects, not a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailJob {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "fileId")]
    pub file_id: Option<String>,
}

/// Process one job to completion.
///
/// The file is re-resolved through the owner-scoped lookup, so only the
/// declared owner's job can regenerate that file's thumbnails. Every
/// per-width write is awaited and the first failure fails the job.
/// Re-running a job overwrites the same derived paths, so repetition is
/// harmless.
pub async fn process(
    store: &FileStore,
    storage: &DiskStorage,
    job: &ThumbnailJob,
) -> Result<(), JobError> {
    let file_id = job
        .file_id
        .as_deref()
        .ok_or_else(|| JobError::new("Missing fileId"))?;
    let user_id = job
        .user_id
        .as_deref()
        .ok_or_else(|| JobError::new("Missing userId"))?;

    // A malformed owner id fails closed, same as an unknown one
    let file = match Uuid::parse_str(user_id) {
        Ok(owner) => store.find_user_file_by_id(owner, file_id).await?,
        Err(_) => None,
    };
    let file = file.ok_or_else(|| JobError::new("File not found"))?;

    // Folders have no blob to derive from
    let src_path = file
        .local_path()
        .ok_or_else(|| JobError::new("File not found"))?;
    let data = storage
        .read(src_path)
        .await?
        .ok_or_else(|| JobError::new("File not found"))?;

    let img = image::load_from_memory(&data)
        .map_err(|e| JobError::new(format!("Failed to decode image: {}", e)))?;

    for width in THUMBNAIL_WIDTHS {
        let thumb = resize_to_width(&img, width);
        let mut buf = Vec::new();
        thumb
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .map_err(|e| JobError::new(format!("Failed to encode thumbnail: {}", e)))?;

        storage.write_at(&thumbnail_path(src_path, width), &buf).await?;
    }

    Ok(())
}

/// Resize preserving aspect ratio so the rendition is `width` pixels
/// wide. JPEG output, so the pixels are flattened to RGB first.
fn resize_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    let height = ((u64::from(img.height()) * u64::from(width)) / u64::from(img.width()).max(1))
        .max(1) as u32;
    DynamicImage::ImageRgb8(img.thumbnail_exact(width, height).to_rgb8())
}
