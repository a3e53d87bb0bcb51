//! Caption provider trait and request/response types.

use crate::config::{resolve_env_var, OpenAiConfig};
use crate::error::PipelineError;
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

/// Instruction sent with every fallback image.
pub const CAPTION_PROMPT: &str =
    "Describe this image and suggest likely plant species or context.";

/// Base64-encoded image ready to send to a vision model.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Encode raw upload bytes, sniffing the MIME type from the content.
    ///
    /// Unrecognized content is labelled `image/jpeg`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let media_type = match image::guess_format(bytes) {
            Ok(image::ImageFormat::Png) => "image/png",
            Ok(image::ImageFormat::WebP) => "image/webp",
            Ok(image::ImageFormat::Gif) => "image/gif",
            Ok(image::ImageFormat::Jpeg) => "image/jpeg",
            Ok(other) => {
                tracing::debug!("No vision MIME mapping for {other:?}, sending as image/jpeg");
                "image/jpeg"
            }
            Err(_) => "image/jpeg",
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A request to caption one image.
#[derive(Debug, Clone)]
pub struct CaptionRequest {
    /// Source filename, for error attribution
    pub filename: String,
    /// The image to describe
    pub image: ImageInput,
    /// Text prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl CaptionRequest {
    /// Build the fixed plant-description request for an image.
    pub fn describe_plant(filename: &str, image: ImageInput, max_tokens: u32) -> Self {
        Self {
            filename: filename.to_string(),
            image,
            prompt: CAPTION_PROMPT.to_string(),
            max_tokens,
        }
    }
}

/// The response from a caption call.
#[derive(Debug, Clone)]
pub struct CaptionResponse {
    /// Generated text, `None` when the model returned no content
    pub text: Option<String>,
    /// Model identifier used
    pub model: String,
    /// Total tokens used, if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// A vision-language model that can caption images.
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Generate a caption for the given request.
    async fn caption(&self, request: &CaptionRequest) -> Result<CaptionResponse, PipelineError>;
}

/// Creates the configured caption provider, if credentials exist.
pub struct CaptionProviderFactory;

impl CaptionProviderFactory {
    /// Build the OpenAI provider when its API key resolves.
    ///
    /// Returns `None` without a key: the fallback stage is then unavailable.
    /// `timeout` bounds every HTTP call the provider makes.
    pub fn from_config(
        config: &OpenAiConfig,
        timeout: Duration,
    ) -> Option<Box<dyn CaptionProvider>> {
        let api_key = resolve_env_var(&config.api_key)?;
        let provider =
            super::openai::OpenAiProvider::with_endpoint(&api_key, &config.model, &config.endpoint)
                .with_timeout(timeout);
        Some(Box::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_input_from_jpeg_bytes() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(input.media_type, "image/jpeg");
        assert!(!input.data.is_empty());
    }

    #[test]
    fn test_image_input_from_png_bytes() {
        let input = ImageInput::from_bytes(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        assert_eq!(input.media_type, "image/png");
    }

    #[test]
    fn test_unknown_bytes_default_to_jpeg() {
        let input = ImageInput::from_bytes(b"???");
        assert_eq!(input.media_type, "image/jpeg");
    }

    #[test]
    fn test_image_input_data_url() {
        let input = ImageInput::from_bytes(&[1, 2, 3]);
        assert_eq!(input.data_url(), "data:image/jpeg;base64,AQID");
    }

    #[test]
    fn test_describe_plant_prompt() {
        let image = ImageInput::from_bytes(&[1, 2, 3]);
        let request = CaptionRequest::describe_plant("fern.jpg", image, 300);
        assert!(request.prompt.contains("plant species"));
        assert_eq!(request.max_tokens, 300);
        assert_eq!(request.filename, "fern.jpg");
    }

    #[test]
    fn test_factory_without_key_is_none() {
        let config = OpenAiConfig {
            api_key: "${DEFINITELY_NOT_SET_OPENAI_XYZ}".to_string(),
            ..OpenAiConfig::default()
        };
        let timeout = Duration::from_secs(5);
        assert!(CaptionProviderFactory::from_config(&config, timeout).is_none());
    }

    #[test]
    fn test_factory_with_key() {
        let config = OpenAiConfig {
            api_key: "sk-literal".to_string(),
            ..OpenAiConfig::default()
        };
        let timeout = Duration::from_secs(5);
        let provider = CaptionProviderFactory::from_config(&config, timeout).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
