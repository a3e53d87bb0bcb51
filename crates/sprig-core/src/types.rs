//! Core data types for the Sprig identification pipeline.
//!
//! Inputs ([`UploadedImage`], [`IdentifyRequest`]) flow through the
//! normalizer and classifier; [`IdentificationResult`] is the single output
//! built once per request.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Placeholder caption when the model produced no usable text.
pub const NO_CAPTION: &str = "No caption returned";

/// A raw upload as received from the caller.
///
/// The bytes are shared, never mutated, and kept for the whole request so
/// the captioning stage sees the original pixels rather than the normalized
/// copy.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Original filename
    pub filename: String,

    /// Raw bytes exactly as uploaded
    pub bytes: Arc<[u8]>,

    /// Plant organ depicted ("leaf", "flower", "fruit", "bark", ...)
    pub organ: Option<String>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
            organ: None,
        }
    }

    /// Attach an organ tag.
    pub fn with_organ(mut self, organ: impl Into<String>) -> Self {
        self.organ = Some(organ.into());
        self
    }

    /// Size of the raw upload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A re-encoded copy of an upload, sized for the classifier.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Filename sent to the classifier (original stem, `.jpg` extension)
    pub filename: String,

    /// Re-encoded JPEG bytes
    pub bytes: Vec<u8>,

    /// MIME type of `bytes`
    pub content_type: String,

    /// Width after scaling
    pub width: u32,

    /// Height after scaling
    pub height: u32,

    /// Organ tag carried over from the upload
    pub organ: Option<String>,
}

impl NormalizedImage {
    /// Derive the classifier-facing filename from the original one.
    pub fn target_filename(original: &str) -> String {
        let path = Path::new(original);
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stem.is_empty() => format!("{stem}.jpg"),
            _ => "image.jpg".to_string(),
        }
    }
}

/// One inbound identification request.
#[derive(Debug, Clone, Default)]
pub struct IdentifyRequest {
    /// Uploaded images in caller order
    pub images: Vec<UploadedImage>,

    /// Disable the classifier's own low-confidence rejection
    pub no_reject: bool,
}

impl IdentifyRequest {
    pub fn new(images: Vec<UploadedImage>) -> Self {
        Self {
            images,
            no_reject: false,
        }
    }

    /// Apply positional organ tags: tag `i` goes to image `i`.
    ///
    /// Extra tags are ignored; images past the end of `organs` keep
    /// whatever tag they already had.
    pub fn with_organs<S: Into<String>>(mut self, organs: impl IntoIterator<Item = S>) -> Self {
        for (image, organ) in self.images.iter_mut().zip(organs) {
            image.organ = Some(organ.into());
        }
        self
    }

    pub fn with_no_reject(mut self, no_reject: bool) -> Self {
        self.no_reject = no_reject;
        self
    }
}

/// A ranked species candidate from the primary classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationCandidate {
    /// Scientific name without author
    pub species: String,

    /// Confidence score, always finite and within [0.0, 1.0]
    pub score: f64,

    /// Common names in the requested language
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_names: Vec<String>,

    /// Genus (scientific name without author)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genus: Option<String>,

    /// Family (scientific name without author)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

impl ClassificationCandidate {
    pub fn new(species: impl Into<String>, score: f64) -> Self {
        Self {
            species: species.into(),
            score: clamp_score(score),
            common_names: Vec::new(),
            genus: None,
            family: None,
        }
    }
}

/// Force a score into [0.0, 1.0]; non-finite values become 0.0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// A fallback caption for one uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// Source filename
    pub filename: String,

    /// Model-generated description
    pub caption: String,

    /// Why captioning failed for this image, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Caption {
    pub fn new(filename: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            caption: caption.into(),
            error: None,
        }
    }

    /// Caption recorded when the model call for this image failed.
    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            caption: NO_CAPTION.to_string(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Which terminal state the gating decision reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Primary result was confident, or no fallback is configured
    PlantnetOnly,
    /// Fallback captioning was attempted
    Boosted,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::PlantnetOnly => write!(f, "plantnet_only"),
            Status::Boosted => write!(f, "boosted"),
        }
    }
}

/// The combined answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationResult {
    /// Best species, or `null` when the classifier had no candidates
    pub species: Option<String>,

    /// Best score, 0.0 without candidates
    pub confidence: f64,

    /// Gating outcome
    pub status: Status,

    /// Per-image captions, present only when `status` is `boosted`
    pub boost_captions: Option<Vec<Caption>>,
}

impl IdentificationResult {
    /// Result without a fallback stage.
    pub fn plantnet_only(best: Option<&ClassificationCandidate>) -> Self {
        Self {
            species: best.map(|c| c.species.clone()),
            confidence: best.map(|c| clamp_score(c.score)).unwrap_or(0.0),
            status: Status::PlantnetOnly,
            boost_captions: None,
        }
    }

    /// Result after the fallback stage ran.
    pub fn boosted(best: Option<&ClassificationCandidate>, captions: Vec<Caption>) -> Self {
        Self {
            status: Status::Boosted,
            boost_captions: Some(captions),
            ..Self::plantnet_only(best)
        }
    }
}

/// Error body returned to the caller when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error message
    pub error: String,

    /// Upstream status for classifier failures, mapped status otherwise
    pub status_code: u16,
}

impl From<&crate::error::PipelineError> for ErrorPayload {
    fn from(err: &crate::error::PipelineError) -> Self {
        Self {
            error: err.to_string(),
            status_code: err.http_status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_organs_apply_positionally() {
        let request = IdentifyRequest::new(vec![
            UploadedImage::new("a.jpg", vec![1u8]),
            UploadedImage::new("b.jpg", vec![2u8]),
            UploadedImage::new("c.jpg", vec![3u8]),
        ])
        .with_organs(["leaf", "flower"]);

        assert_eq!(request.images[0].organ.as_deref(), Some("leaf"));
        assert_eq!(request.images[1].organ.as_deref(), Some("flower"));
        assert_eq!(request.images[2].organ, None);
    }

    #[test]
    fn test_extra_organs_are_ignored() {
        let request = IdentifyRequest::new(vec![UploadedImage::new("a.jpg", vec![1u8])])
            .with_organs(["leaf", "flower", "bark"]);
        assert_eq!(request.images.len(), 1);
        assert_eq!(request.images[0].organ.as_deref(), Some("leaf"));
    }

    #[test]
    fn test_target_filename() {
        assert_eq!(NormalizedImage::target_filename("rose.png"), "rose.jpg");
        assert_eq!(NormalizedImage::target_filename("IMG_0001.HEIC"), "IMG_0001.jpg");
        assert_eq!(NormalizedImage::target_filename("noext"), "noext.jpg");
        assert_eq!(NormalizedImage::target_filename(""), "image.jpg");
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(0.42), 0.42);
        assert_eq!(clamp_score(1.7), 1.0);
        assert_eq!(clamp_score(-0.2), 0.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_plantnet_only_serializes_null_captions() {
        let best = ClassificationCandidate::new("Rosa damascena", 0.92);
        let result = IdentificationResult::plantnet_only(Some(&best));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["species"], "Rosa damascena");
        assert_eq!(json["confidence"], 0.92);
        assert_eq!(json["status"], "plantnet_only");
        assert!(json["boost_captions"].is_null());
    }

    #[test]
    fn test_no_candidates_gives_null_species_and_zero_confidence() {
        let result = IdentificationResult::plantnet_only(None);
        assert_eq!(result.species, None);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_boosted_serializes_captions_without_error_field() {
        let result = IdentificationResult::boosted(
            None,
            vec![
                Caption::new("a.jpg", "A fern frond."),
                Caption::failed("b.jpg", "HTTP 500"),
            ],
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "boosted");
        assert!(json["species"].is_null());
        let captions = json["boost_captions"].as_array().unwrap();
        assert_eq!(captions.len(), 2);
        assert!(captions[0].get("error").is_none());
        assert_eq!(captions[1]["caption"], NO_CAPTION);
        assert_eq!(captions[1]["error"], "HTTP 500");
    }

    #[test]
    fn test_error_payload_from_classifier_error() {
        let err = PipelineError::ClassifierHttp {
            status: 403,
            message: "Invalid API key".to_string(),
        };
        let payload = ErrorPayload::from(&err);
        assert_eq!(payload.status_code, 403);
        assert!(payload.error.contains("Invalid API key"));
    }
}
