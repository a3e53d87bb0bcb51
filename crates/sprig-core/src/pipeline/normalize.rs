//! Image normalization: decode, bound to a maximum edge, re-encode as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{LimitsConfig, NormalizeConfig};
use crate::error::PipelineError;
use crate::types::{NormalizedImage, UploadedImage};

use super::validate::Validator;

/// Produces classifier-ready copies of uploads.
pub struct Normalizer {
    config: NormalizeConfig,
    validator: Validator,
}

impl Normalizer {
    /// Create a new normalizer with the given settings.
    pub fn new(config: NormalizeConfig, limits: LimitsConfig) -> Self {
        Self {
            config,
            validator: Validator::new(limits),
        }
    }

    /// Normalize every upload concurrently.
    ///
    /// Results are returned in input order. A failure affects only its own
    /// slot.
    pub async fn normalize_batch(
        &self,
        uploads: &[UploadedImage],
    ) -> Vec<Result<NormalizedImage, PipelineError>> {
        futures_util::future::join_all(uploads.iter().map(|u| self.normalize(u))).await
    }

    /// Normalize a single upload with validation and a decode timeout.
    pub async fn normalize(&self, upload: &UploadedImage) -> Result<NormalizedImage, PipelineError> {
        self.validator.validate(upload)?;

        let bytes = Arc::clone(&upload.bytes);
        let filename = upload.filename.clone();
        let config = self.config.clone();
        let timeout_duration = Duration::from_millis(self.config.decode_timeout_ms);

        let result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || Self::normalize_sync(&bytes, &filename, &config))
                .await
        })
        .await;

        match result {
            Ok(Ok(Ok(mut normalized))) => {
                normalized.organ = upload.organ.clone();
                tracing::debug!(
                    "Normalized {} to {}x{} ({} -> {} bytes)",
                    upload.filename,
                    normalized.width,
                    normalized.height,
                    upload.len(),
                    normalized.bytes.len()
                );
                Ok(normalized)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(PipelineError::UnsupportedImage {
                filename: upload.filename.clone(),
                message: format!("Task join error: {e}"),
            }),
            Err(_) => Err(PipelineError::Timeout {
                filename: upload.filename.clone(),
                stage: "normalize".to_string(),
                timeout_ms: self.config.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode + resize + encode (runs in spawn_blocking).
    fn normalize_sync(
        bytes: &[u8],
        filename: &str,
        config: &NormalizeConfig,
    ) -> Result<NormalizedImage, PipelineError> {
        let unsupported = |message: String| PipelineError::UnsupportedImage {
            filename: filename.to_string(),
            message,
        };

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| unsupported(format!("Cannot detect image format: {e}")))?;
        if reader.format().is_none() {
            return Err(unsupported("Unrecognized image format".to_string()));
        }
        let image = reader.decode().map_err(|e| unsupported(e.to_string()))?;

        let rgb = bound_and_flatten(image, config.max_dimension);
        let (width, height) = rgb.dimensions();

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, config.quality)
            .encode_image(&rgb)
            .map_err(|e| unsupported(format!("JPEG encode failed: {e}")))?;

        Ok(NormalizedImage {
            filename: NormalizedImage::target_filename(filename),
            bytes: buffer,
            content_type: "image/jpeg".to_string(),
            width,
            height,
            organ: None,
        })
    }
}

/// Downscale so the longest edge is at most `max_dimension`, then drop alpha
/// and convert to 8-bit RGB. Images already within bounds keep their size.
fn bound_and_flatten(image: DynamicImage, max_dimension: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let bounded = if width > max_dimension || height > max_dimension {
        image.thumbnail(max_dimension, max_dimension)
    } else {
        image
    };
    bounded.into_rgb8()
}
