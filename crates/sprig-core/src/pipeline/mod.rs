//! Image preparation stages ahead of the primary classifier.
//!
//! - **validate**: Size and magic-byte checks on raw uploads
//! - **normalize**: Decode, bound, and re-encode uploads as JPEG

pub mod normalize;
pub mod validate;

// Re-exports for convenient access
pub use normalize::Normalizer;
pub use validate::Validator;
