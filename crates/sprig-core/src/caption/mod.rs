//! Vision-model captioning for low-confidence identifications.
//!
//! Provides a provider abstraction over the captioning backend and a
//! concurrent engine that captions every original upload of a request.

pub(crate) mod booster;
pub(crate) mod openai;
pub(crate) mod provider;
pub(crate) mod retry;

pub use booster::{BoostOptions, Booster};
pub use provider::{
    CaptionProvider, CaptionProviderFactory, CaptionRequest, CaptionResponse, ImageInput,
    CAPTION_PROMPT,
};
