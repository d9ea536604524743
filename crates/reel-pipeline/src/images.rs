//! Batched image generation.
//!
//! Prompts are processed in fixed-size batches in original order.
//! Requests within a batch run concurrently into an index-keyed slot
//! table that is read only after the batch settles; the whole batch is
//! bounded by a wall-clock timeout that aborts in-flight requests and
//! discards the batch wholesale. A failed item or batch is never retried;
//! the pipeline moves on and produces a video from whatever survives.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Fixed visual style appended to every image prompt.
const VISUAL_STYLE: &str = "high-quality historical documentary style, cinematic composition, \
dramatic lighting with warm golden hour tones, detailed textures, \
photorealistic but with slight painterly quality, rich colors, \
atmospheric depth, professional documentary photography aesthetic, \
accurate historical details, compelling visual storytelling, \
museum-quality artwork style, engaging and educational composition";

/// A generated image reference, keyed by its original prompt index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// 1-based prompt index
    pub index: usize,
    /// Remote image URL to download
    pub url: String,
}

/// Batch execution parameters.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of concurrent requests per batch
    pub batch_size: usize,
    /// Wall-clock deadline for one batch
    pub timeout: Duration,
    /// Pause between batches
    pub delay: Duration,
}

impl From<&PipelineConfig> for BatchOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            timeout: config.batch_timeout,
            delay: config.batch_delay,
        }
    }
}

/// Client for the image synthesis call.
#[derive(Debug, Clone)]
pub struct ImageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    model: &'static str,
    prompt: String,
    size: &'static str,
    quality: &'static str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: String,
}

impl ImageClient {
    /// Create a client from pipeline config.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
        }
    }

    /// Generate a single image, returning its remote URL.
    pub async fn generate_image(&self, prompt: &str) -> PipelineResult<String> {
        let request = ImageRequest {
            model: "dall-e-3",
            prompt: format!("{}, {}", prompt, VISUAL_STYLE),
            size: "1024x1024",
            quality: "standard",
            n: 1,
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::generation_failed(format!("image request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::generation_failed(format!(
                "image upstream returned {}: {}",
                status, body
            )));
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::generation_failed(format!("invalid image response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.url)
            .ok_or_else(|| PipelineError::generation_failed("no image in response"))
    }

    /// Generate images for all prompts, batch by batch.
    ///
    /// Returns the surviving candidates with their original 1-based
    /// indices, in strictly increasing index order. Never fails: every
    /// per-item and per-batch error only shrinks the result set.
    pub async fn generate_batched(
        &self,
        prompts: &[String],
        options: &BatchOptions,
    ) -> Vec<ImageCandidate> {
        let mut candidates = Vec::new();
        let batch_count = prompts.len().div_ceil(options.batch_size.max(1));

        for (batch_no, batch) in prompts.chunks(options.batch_size.max(1)).enumerate() {
            info!("Processing image batch {}/{}", batch_no + 1, batch_count);

            let base_index = batch_no * options.batch_size.max(1);
            let mut slots: Vec<Option<String>> = vec![None; batch.len()];
            let mut set = JoinSet::new();

            for (offset, prompt) in batch.iter().enumerate() {
                let client = self.clone();
                let prompt = prompt.clone();
                set.spawn(async move { (offset, client.generate_image(&prompt).await) });
            }

            // The whole batch settles, or times out, before any slot is
            // read. The deadline applies to the batch as a unit: on
            // expiry every request in it counts as failed, including
            // the ones that finished before the clock ran out.
            let drained = tokio::time::timeout(options.timeout, async {
                while let Some(joined) = set.join_next().await {
                    if let Ok((offset, result)) = joined {
                        match result {
                            Ok(url) => slots[offset] = Some(url),
                            Err(e) => error!(
                                "Failed to generate image {}: {}",
                                base_index + offset + 1,
                                e
                            ),
                        }
                    }
                }
            })
            .await;

            if drained.is_err() {
                warn!(
                    "Batch {} timed out after {:?}, continuing with next batch",
                    batch_no + 1,
                    options.timeout
                );
                set.abort_all();
            } else {
                for (offset, slot) in slots.into_iter().enumerate() {
                    if let Some(url) = slot {
                        candidates.push(ImageCandidate {
                            index: base_index + offset + 1,
                            url,
                        });
                    }
                }
            }

            let more_remaining = (batch_no + 1) * options.batch_size.max(1) < prompts.len();
            if more_remaining {
                tokio::time::sleep(options.delay).await;
            }
        }

        info!(
            "Generated {} out of {} images",
            candidates.len(),
            prompts.len()
        );
        candidates
    }
}
