//! Sprig Core - Embeddable plant identification library.
//!
//! Sprig takes one or more plant photographs, asks the Pl@ntNet service
//! which species they show, and if Pl@ntNet is unsure, asks a vision model
//! to caption each photo as a second opinion.
//!
//! # Architecture
//!
//! ```text
//! Uploads → Normalize (JPEG ≤1280px) → Pl@ntNet → confidence < 0.8? → Captions → JSON
//! ```
//!
//! The remote services sit behind the [`Classifier`] and [`CaptionProvider`]
//! traits so an [`Identifier`] can be assembled with test doubles.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sprig_core::{Config, IdentifyRequest, Identifier, UploadedImage};
//!
//! #[tokio::main]
//! async fn main() -> sprig_core::Result<()> {
//!     let config = Config::load()?;
//!     let identifier = Identifier::from_config(&config)?;
//!
//!     let bytes = std::fs::read("leaf.jpg")?;
//!     let request = IdentifyRequest::new(vec![UploadedImage::new("leaf.jpg", bytes)])
//!         .with_organs(["leaf"]);
//!     let result = identifier.identify(&request).await?;
//!     println!("{:?} ({})", result.species, result.confidence);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod caption;
pub mod classify;
pub mod config;
pub mod error;
pub mod identify;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use caption::{BoostOptions, Booster, CaptionProvider, CaptionProviderFactory};
pub use classify::{Classifier, PlantNetClient};
pub use config::Config;
pub use error::{ConfigError, PipelineError, Result, SprigError};
pub use identify::{GateDecision, Identifier};
pub use pipeline::Normalizer;
pub use types::{
    Caption, ClassificationCandidate, ErrorPayload, IdentificationResult, IdentifyRequest,
    NormalizedImage, Status, UploadedImage,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
