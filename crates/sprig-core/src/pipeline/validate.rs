//! Upload validation before decoding.

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::types::UploadedImage;

/// Validates uploads before they reach the decoder.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Perform quick checks before full decode.
    ///
    /// Checks:
    /// - Upload is non-empty and within the size limit
    /// - Upload starts with the magic bytes of a known image format
    pub fn validate(&self, upload: &UploadedImage) -> Result<(), PipelineError> {
        let max_bytes = self.limits.max_upload_mb.saturating_mul(1024 * 1024);
        if upload.len() as u64 > max_bytes {
            return Err(PipelineError::UploadTooLarge {
                filename: upload.filename.clone(),
                size_mb: upload.len() as u64 / (1024 * 1024),
                max_mb: self.limits.max_upload_mb,
            });
        }

        if upload.len() < 4 {
            return Err(PipelineError::UnsupportedImage {
                filename: upload.filename.clone(),
                message: "Upload too small to be a valid image".to_string(),
            });
        }

        if !is_known_image_header(&upload.bytes) {
            return Err(PipelineError::UnsupportedImage {
                filename: upload.filename.clone(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        Ok(())
    }
}

/// Check whether the leading bytes match a known image format.
fn is_known_image_header(bytes: &[u8]) -> bool {
    match bytes {
        // JPEG
        [0xFF, 0xD8, 0xFF, ..] => true,
        // PNG
        [0x89, b'P', b'N', b'G', ..] => true,
        // GIF87a / GIF89a
        [b'G', b'I', b'F', b'8', ..] => true,
        // WebP: RIFF....WEBP
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => true,
        // BMP
        [b'B', b'M', ..] => true,
        // TIFF, little- and big-endian, version 42
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => true,
        // HEIC/HEIF/AVIF: ftyp box at offset 4
        [_, _, _, _, b'f', b't', b'y', b'p', _, _, _, _, ..] => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(bytes: &[u8]) -> UploadedImage {
        UploadedImage::new("test.bin", bytes.to_vec())
    }

    #[test]
    fn test_magic_bytes_jpeg() {
        assert!(is_known_image_header(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]));
    }

    #[test]
    fn test_magic_bytes_png() {
        assert!(is_known_image_header(&[
            0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A
        ]));
    }

    #[test]
    fn test_magic_bytes_webp() {
        assert!(is_known_image_header(&[
            b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P'
        ]));
    }

    #[test]
    fn test_riff_without_webp_rejected() {
        assert!(!is_known_image_header(&[
            b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'A', b'V', b'E'
        ]));
    }

    #[test]
    fn test_magic_bytes_heic() {
        assert!(is_known_image_header(&[
            0, 0, 0, 0x18, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'c'
        ]));
    }

    #[test]
    fn test_bare_tiff_marker_rejected() {
        assert!(!is_known_image_header(&[b'I', b'I', 0x00, 0x00]));
        assert!(!is_known_image_header(&[b'M', b'M', 0x00, 0x00]));
    }

    #[test]
    fn test_validate_rejects_text() {
        let validator = Validator::new(LimitsConfig::default());
        let err = validator.validate(&upload(b"hello world")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedImage { .. }));
    }

    #[test]
    fn test_validate_rejects_tiny_upload() {
        let validator = Validator::new(LimitsConfig::default());
        let err = validator.validate(&upload(&[0xFF, 0xD8])).unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn test_validate_rejects_oversized_upload() {
        let validator = Validator::new(LimitsConfig { max_upload_mb: 1 });
        let mut bytes = vec![0xFF, 0xD8, 0xFF];
        bytes.resize(2 * 1024 * 1024, 0);
        let err = validator.validate(&upload(&bytes)).unwrap_err();
        assert!(matches!(err, PipelineError::UploadTooLarge { max_mb: 1, .. }));
    }

    #[test]
    fn test_huge_limit_does_not_overflow() {
        let validator = Validator::new(LimitsConfig {
            max_upload_mb: u64::MAX,
        });
        assert!(validator.validate(&upload(&[0xFF, 0xD8, 0xFF, 0xE0])).is_ok());
    }
}
