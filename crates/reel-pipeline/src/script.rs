//! Script generation via an OpenAI-compatible chat completions API.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use reel_models::ScriptBundle;

const SYSTEM_PROMPT: &str = "You are an expert historical documentary script writer. \
Generate engaging, factual educational content for video production. \
Create a continuous voiceover script for 60-80 seconds and corresponding \
image prompts that will bring the story to life visually. \
Respond with JSON format containing 'script', 'image_prompts', and 'duration'.";

/// Client for the script generation call.
#[derive(Debug, Clone)]
pub struct ScriptClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Raw bundle shape returned by the model. `script`, `image_prompts`
/// and `duration` are required; missing captions are synthesized
/// during normalization.
#[derive(Debug, Deserialize)]
struct RawBundle {
    script: String,
    image_prompts: Vec<String>,
    #[serde(default)]
    text_overlays: Vec<String>,
    duration: f64,
}

impl ScriptClient {
    /// Create a client from pipeline config.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
        }
    }

    /// Generate the script bundle for a topic.
    ///
    /// The returned bundle always satisfies
    /// `captions.len() == image_prompts.len()`; the invariant is
    /// enforced here, not by consumers.
    pub async fn generate_script(&self, topic: &str) -> PipelineResult<ScriptBundle> {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(topic),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            max_tokens: 2000,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::generation_failed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::generation_failed(format!(
                "upstream returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::generation_failed(format!("invalid response: {}", e)))?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| PipelineError::generation_failed("no choices in response"))?;

        let raw: RawBundle = serde_json::from_str(strip_code_fences(content))
            .map_err(|e| PipelineError::generation_failed(format!("malformed bundle: {}", e)))?;

        if raw.script.trim().is_empty() || raw.image_prompts.is_empty() {
            return Err(PipelineError::generation_failed(
                "bundle missing script text or image prompts",
            ));
        }

        let mut bundle = ScriptBundle {
            script: raw.script,
            image_prompts: raw.image_prompts,
            captions: raw.text_overlays,
            duration_secs: raw.duration.round().max(0.0) as u32,
        };
        bundle.normalize_captions();

        info!(
            prompt_count = bundle.image_prompts.len(),
            duration_secs = bundle.duration_secs,
            "Generated script"
        );

        Ok(bundle)
    }
}

fn user_prompt(topic: &str) -> String {
    format!(
        "Create a 60-80 second educational video script about: {}\n\n\
         Requirements:\n\
         1. Write an engaging, informative voiceover script\n\
         2. Create 12-16 highly detailed image prompts (one per 5 seconds)\n\
         3. Each image prompt should be specific, vivid, and historically accurate\n\
         4. Include descriptive text overlays for each image with key information\n\
         5. Make it educational but entertaining\n\
         6. Include estimated duration in seconds\n\n\
         Format response as JSON with keys:\n\
         - 'script': the voiceover text\n\
         - 'image_prompts': array of detailed image descriptions\n\
         - 'text_overlays': array of educational text for each image (dates, names, locations, facts)\n\
         - 'duration': estimated duration in seconds\n\n\
         Example text overlay: 'Ancient Rome, 753 BC' or 'Julius Caesar (100-44 BC)' or 'Battle of Hastings, 1066 AD'",
        topic
    )
}

/// Strip markdown code fences some models wrap around JSON output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_raw_bundle_requires_core_fields() {
        let missing_duration = r#"{"script": "s", "image_prompts": ["p"]}"#;
        assert!(serde_json::from_str::<RawBundle>(missing_duration).is_err());

        let ok = r#"{"script": "s", "image_prompts": ["p"], "duration": 62.5}"#;
        let raw: RawBundle = serde_json::from_str(ok).unwrap();
        assert!(raw.text_overlays.is_empty());
    }
}
