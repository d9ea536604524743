//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Pipeline configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory for per-session artifact directories
    pub output_dir: PathBuf,
    /// Image generation batch size
    pub batch_size: usize,
    /// Wall-clock timeout for one image batch
    pub batch_timeout: Duration,
    /// Delay between batches (rate-limit headroom)
    pub batch_delay: Duration,
    /// OpenAI API key (script + image generation)
    pub openai_api_key: String,
    /// OpenAI-compatible API base URL
    pub openai_base_url: String,
    /// ElevenLabs API key; `None` skips the primary voice backend
    pub elevenlabs_api_key: Option<String>,
    /// ElevenLabs voice id
    pub elevenlabs_voice_id: String,
    /// ElevenLabs API base URL
    pub elevenlabs_base_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated"),
            batch_size: 3,
            batch_timeout: Duration::from_secs(120),
            batch_delay: Duration::from_millis(1000),
            openai_api_key: String::new(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            elevenlabs_api_key: None,
            elevenlabs_voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            elevenlabs_base_url: "https://api.elevenlabs.io/v1".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            batch_size: std::env::var("BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.batch_size),
            batch_timeout: Duration::from_secs(
                std::env::var("BATCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            batch_delay: Duration::from_millis(
                std::env::var("BATCH_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            elevenlabs_api_key: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            elevenlabs_voice_id: std::env::var("ELEVENLABS_VOICE_ID")
                .unwrap_or(defaults.elevenlabs_voice_id),
            elevenlabs_base_url: std::env::var("ELEVENLABS_BASE_URL")
                .unwrap_or(defaults.elevenlabs_base_url),
        }
    }
}
