//! Fallback captioning engine.
//!
//! Captions every original upload of a request concurrently, bounded by a
//! semaphore, and collects the results by input index so the output order
//! never depends on which call finished first.

use super::provider::{CaptionProvider, CaptionRequest, ImageInput};
use super::retry;
use crate::config::BoostConfig;
use crate::types::{Caption, UploadedImage, NO_CAPTION};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Configuration for the captioning engine.
#[derive(Debug, Clone)]
pub struct BoostOptions {
    /// Maximum concurrent caption calls
    pub parallel: usize,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Output token limit per caption
    pub max_tokens: u32,
    /// Maximum retries per image
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for BoostOptions {
    fn default() -> Self {
        Self::from(&BoostConfig::default())
    }
}

impl From<&BoostConfig> for BoostOptions {
    fn from(config: &BoostConfig) -> Self {
        Self {
            parallel: config.parallel.max(1),
            timeout_ms: config.timeout_ms,
            max_tokens: config.max_tokens,
            retry_attempts: config.retry_attempts,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

/// Concurrent fallback captioner.
pub struct Booster {
    provider: Arc<dyn CaptionProvider>,
    options: BoostOptions,
}

impl Booster {
    pub fn new(provider: Box<dyn CaptionProvider>, options: BoostOptions) -> Self {
        Self {
            provider: Arc::from(provider),
            options,
        }
    }

    /// Caption every upload, one independent call per image.
    ///
    /// Always returns exactly one [`Caption`] per input, in input order.
    /// Failed calls produce a placeholder caption carrying the error.
    pub async fn caption_batch(&self, images: &[UploadedImage]) -> Vec<Caption> {
        let semaphore = Arc::new(Semaphore::new(self.options.parallel));
        let mut handles = Vec::with_capacity(images.len());

        for image in images {
            let semaphore = semaphore.clone();
            let provider = self.provider.clone();
            let options = self.options.clone();
            let filename = image.filename.clone();
            let image = image.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Caption::failed(&image.filename, "Caption semaphore closed");
                };
                caption_single(&provider, &image, &options).await
            });

            handles.push((filename, handle));
        }

        let mut captions = Vec::with_capacity(handles.len());
        for (filename, handle) in handles {
            let caption = match handle.await {
                Ok(caption) => caption,
                Err(e) => {
                    tracing::error!("Caption task for {filename} panicked: {e}");
                    Caption::failed(filename, format!("Caption task failed: {e}"))
                }
            };
            captions.push(caption);
        }

        let failed = captions.iter().filter(|c| c.is_error()).count();
        tracing::debug!(
            "Captioned {} images via {} ({} failed)",
            captions.len(),
            self.provider.name(),
            failed
        );
        captions
    }
}

/// Caption a single upload with timeout and retry logic.
async fn caption_single(
    provider: &Arc<dyn CaptionProvider>,
    image: &UploadedImage,
    options: &BoostOptions,
) -> Caption {
    let input = ImageInput::from_bytes(&image.bytes);
    let request = CaptionRequest::describe_plant(&image.filename, input, options.max_tokens);

    let mut last_error = String::new();
    for attempt in 0..=options.retry_attempts {
        if attempt > 0 {
            let delay = retry::backoff_duration(attempt - 1, options.retry_delay_ms);
            tracing::debug!(
                "Retry {attempt}/{} for {} after {delay:?}",
                options.retry_attempts,
                image.filename
            );
            tokio::time::sleep(delay).await;
        }

        match tokio::time::timeout(
            Duration::from_millis(options.timeout_ms),
            provider.caption(&request),
        )
        .await
        {
            Ok(Ok(response)) => {
                tracing::trace!(
                    "Caption for {} from {} in {}ms ({:?} tokens)",
                    image.filename,
                    response.model,
                    response.latency_ms,
                    response.tokens_used
                );
                let text = response.text.unwrap_or_else(|| NO_CAPTION.to_string());
                return Caption::new(&image.filename, text);
            }
            Ok(Err(e)) => {
                last_error = e.to_string();
                if !retry::is_retryable(&e) {
                    break;
                }
            }
            Err(_) => {
                last_error = format!("Timeout after {}ms", options.timeout_ms);
            }
        }
    }

    tracing::warn!("Captioning failed for {}: {last_error}", image.filename);
    Caption::failed(&image.filename, last_error)
}
