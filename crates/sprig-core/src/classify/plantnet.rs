//! Pl@ntNet v2 identify client.
//!
//! Sends all normalized images of one request as a single multipart POST and
//! reads back the service's ranked species list.

use super::Classifier;
use crate::config::{resolve_env_var, PlantNetConfig};
use crate::error::{ConfigError, PipelineError};
use crate::types::{ClassificationCandidate, NormalizedImage};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Client for the Pl@ntNet identification API.
pub struct PlantNetClient {
    api_key: String,
    url: String,
    lang: Option<String>,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl PlantNetClient {
    pub fn new(config: &PlantNetConfig, api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            url: format!(
                "{}/{}",
                config.endpoint.trim_end_matches('/'),
                config.project
            ),
            lang: config.lang.clone(),
            timeout_ms: config.timeout_ms,
            client: reqwest::Client::new(),
        }
    }

    /// Build a client, resolving the API key from config or environment.
    pub fn from_config(config: &PlantNetConfig) -> Result<Self, ConfigError> {
        let api_key = resolve_env_var(&config.api_key).ok_or_else(|| {
            ConfigError::ValidationError(
                "Pl@ntNet API key not set. Set PLANTNET_KEY env var.".to_string(),
            )
        })?;
        Ok(Self::new(config, &api_key))
    }

    fn build_form(
        images: &[NormalizedImage],
        organs: &[String],
    ) -> Result<Form, PipelineError> {
        let mut form = Form::new();
        for (idx, image) in images.iter().enumerate() {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.filename.clone())
                .mime_str(&image.content_type)
                .map_err(|e| PipelineError::Classifier {
                    message: format!("Invalid content type for {}: {e}", image.filename),
                })?;
            form = form.part("images", part);
            if let Some(organ) = organs.get(idx) {
                form = form.text("organs", organ.clone());
            }
        }
        Ok(form)
    }

    fn query(&self, no_reject: bool) -> Vec<(&'static str, String)> {
        let mut query = vec![("api-key", self.api_key.clone())];
        if no_reject {
            query.push(("no-reject", "true".to_string()));
        }
        if let Some(lang) = &self.lang {
            query.push(("lang", lang.clone()));
        }
        query
    }
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentifyResponse {
    #[serde(default)]
    results: Vec<IdentifyMatch>,
    best_match: Option<String>,
    remaining_identification_requests: Option<i64>,
}

#[derive(Deserialize)]
struct IdentifyMatch {
    score: Option<f64>,
    species: Option<SpeciesInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeciesInfo {
    scientific_name_without_author: Option<String>,
    #[serde(default)]
    common_names: Vec<String>,
    genus: Option<TaxonInfo>,
    family: Option<TaxonInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxonInfo {
    scientific_name_without_author: Option<String>,
}

/// Error body shape used by the service (`{"statusCode", "error", "message"}`).
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl From<IdentifyMatch> for ClassificationCandidate {
    fn from(m: IdentifyMatch) -> Self {
        let species = m.species;
        let name = species
            .as_ref()
            .and_then(|s| s.scientific_name_without_author.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let mut candidate = ClassificationCandidate::new(name, m.score.unwrap_or(0.0));
        if let Some(info) = species {
            candidate.common_names = info.common_names;
            candidate.genus = info.genus.and_then(|t| t.scientific_name_without_author);
            candidate.family = info.family.and_then(|t| t.scientific_name_without_author);
        }
        candidate
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(ErrorBody {
            error: Some(error), ..
        }) => error,
        _ => body.trim().to_string(),
    }
}

#[async_trait]
impl Classifier for PlantNetClient {
    fn name(&self) -> &str {
        "plantnet"
    }

    async fn classify(
        &self,
        images: &[NormalizedImage],
        organs: &[String],
        no_reject: bool,
    ) -> Result<Vec<ClassificationCandidate>, PipelineError> {
        let start = Instant::now();
        let form = Self::build_form(images, organs)?;

        let resp = self
            .client
            .post(&self.url)
            .query(&self.query(no_reject))
            .multipart(form)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PipelineError::Timeout {
                        filename: batch_label(images),
                        stage: "classify".to_string(),
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    // The URL carries the API key, keep it out of messages
                    PipelineError::Classifier {
                        message: format!("Pl@ntNet request failed: {}", e.without_url()),
                    }
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::ClassifierHttp {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: IdentifyResponse = resp.json().await.map_err(|e| PipelineError::Classifier {
            message: format!("Failed to parse Pl@ntNet response: {}", e.without_url()),
        })?;

        tracing::debug!(
            "Pl@ntNet answered in {:?}: {} candidates, best match {:?}, {:?} requests remaining",
            start.elapsed(),
            body.results.len(),
            body.best_match,
            body.remaining_identification_requests
        );

        Ok(body.results.into_iter().map(Into::into).collect())
    }
}

fn batch_label(images: &[NormalizedImage]) -> String {
    images
        .iter()
        .map(|i| i.filename.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
