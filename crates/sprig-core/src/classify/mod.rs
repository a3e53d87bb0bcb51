//! Primary species classification.
//!
//! The [`Classifier`] trait is the seam between the aggregator and the remote
//! identification service; [`PlantNetClient`] is the production backend.

pub(crate) mod plantnet;

pub use plantnet::PlantNetClient;

use crate::error::PipelineError;
use crate::types::{ClassificationCandidate, NormalizedImage};
use async_trait::async_trait;

/// A species-identification backend.
///
/// Uses `async_trait` so the aggregator can hold an `Arc<dyn Classifier>`
/// and tests can substitute a double.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Identify the species shown in a batch of images.
    ///
    /// `organs[i]` tags `images[i]`; images beyond `organs.len()` are sent
    /// untagged. Candidates come back ranked by the service, best first.
    async fn classify(
        &self,
        images: &[NormalizedImage],
        organs: &[String],
        no_reject: bool,
    ) -> Result<Vec<ClassificationCandidate>, PipelineError>;
}
