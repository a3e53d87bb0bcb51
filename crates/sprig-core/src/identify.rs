//! Identification orchestration: normalize, classify, gate, and caption.
//!
//! ```text
//! uploads ─▶ Normalizer ─▶ Classifier ─▶ gate ─┬─▶ result (plantnet_only)
//!    │                                          └─▶ Booster ─▶ result (boosted)
//!    └──────── original bytes ─────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::caption::{BoostOptions, Booster, CaptionProviderFactory};
use crate::classify::{Classifier, PlantNetClient};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::pipeline::Normalizer;
use crate::types::{IdentificationResult, IdentifyRequest, NormalizedImage, Status};

/// Outcome of the single gating decision made per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Confident primary result, or no fallback available
    PrimaryOnly,
    /// Confidence below threshold with a fallback configured
    Boosted,
}

impl GateDecision {
    /// Decide whether to run the fallback stage.
    ///
    /// Boosts iff `confidence < threshold` (strict) and a fallback exists.
    /// Applies even when the classifier returned no candidates (confidence 0.0).
    pub fn decide(confidence: f64, threshold: f64, fallback_available: bool) -> Self {
        if fallback_available && confidence < threshold {
            GateDecision::Boosted
        } else {
            GateDecision::PrimaryOnly
        }
    }
}

impl From<GateDecision> for Status {
    fn from(decision: GateDecision) -> Self {
        match decision {
            GateDecision::PrimaryOnly => Status::PlantnetOnly,
            GateDecision::Boosted => Status::Boosted,
        }
    }
}

/// The two-stage identification pipeline.
pub struct Identifier {
    normalizer: Normalizer,
    classifier: Arc<dyn Classifier>,
    booster: Option<Booster>,
    threshold: f64,
}

impl Identifier {
    /// Assemble a pipeline from explicit collaborators.
    ///
    /// Pass `None` for `booster` to disable the fallback stage.
    pub fn new(
        normalizer: Normalizer,
        classifier: Arc<dyn Classifier>,
        booster: Option<Booster>,
        threshold: f64,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            booster,
            threshold,
        }
    }

    /// Build the production pipeline from configuration.
    ///
    /// The Pl@ntNet key is required. The fallback is wired only when
    /// `boost.enabled` is set and the OpenAI key resolves.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let classifier = PlantNetClient::from_config(&config.plantnet)?;
        let booster = if config.boost.enabled {
            let timeout = Duration::from_millis(config.boost.timeout_ms);
            CaptionProviderFactory::from_config(&config.openai, timeout)
                .map(|provider| Booster::new(provider, BoostOptions::from(&config.boost)))
        } else {
            None
        };

        if booster.is_none() {
            tracing::debug!("Fallback captioning unavailable for this configuration");
        }

        Ok(Self::new(
            Normalizer::new(config.normalize.clone(), config.limits.clone()),
            Arc::new(classifier),
            booster,
            config.boost.threshold,
        ))
    }

    /// Whether the fallback stage can ever run.
    pub fn fallback_available(&self) -> bool {
        self.booster.is_some()
    }

    /// Run one identification request.
    ///
    /// Errors from the primary classifier end the request before any
    /// fallback work. Per-image normalization and caption failures do not.
    pub async fn identify(
        &self,
        request: &IdentifyRequest,
    ) -> std::result::Result<IdentificationResult, PipelineError> {
        let start = Instant::now();
        if request.images.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }

        let mut normalized = Vec::with_capacity(request.images.len());
        for result in self.normalizer.normalize_batch(&request.images).await {
            match result {
                Ok(image) => normalized.push(image),
                Err(e) => tracing::warn!("Dropping image from classification: {e}"),
            }
        }
        if normalized.is_empty() {
            return Err(PipelineError::NoUsableImages {
                count: request.images.len(),
            });
        }

        let organs = aligned_organs(&normalized);
        let candidates = self
            .classifier
            .classify(&normalized, &organs, request.no_reject)
            .await?;
        let best = candidates.first();
        let confidence = best.map(|c| c.score).unwrap_or(0.0);

        let decision = GateDecision::decide(confidence, self.threshold, self.fallback_available());
        tracing::info!(
            "{} best match {:?} at {:.3} (threshold {}) -> {}",
            self.classifier.name(),
            best.map(|c| c.species.as_str()),
            confidence,
            self.threshold,
            Status::from(decision)
        );

        let result = match (decision, &self.booster) {
            (GateDecision::Boosted, Some(booster)) => {
                let captions = booster.caption_batch(&request.images).await;
                IdentificationResult::boosted(best, captions)
            }
            _ => IdentificationResult::plantnet_only(best),
        };

        tracing::debug!(
            "Identified {} images in {:?}",
            request.images.len(),
            start.elapsed()
        );
        Ok(result)
    }
}

/// Tag the classifier sends for an untagged image that precedes a tagged one.
const UNTAGGED_ORGAN: &str = "auto";

/// Organ tags for the classifier, positionally aligned with `images`.
///
/// Ends at the last tagged image. Earlier gaps are filled with
/// [`UNTAGGED_ORGAN`] so every tag stays on its own image.
fn aligned_organs(images: &[NormalizedImage]) -> Vec<String> {
    let Some(last_tagged) = images.iter().rposition(|i| i.organ.is_some()) else {
        return Vec::new();
    };
    images[..=last_tagged]
        .iter()
        .map(|i| i.organ.clone().unwrap_or_else(|| UNTAGGED_ORGAN.to_string()))
        .collect()
}
