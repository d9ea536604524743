//! Voice synthesis with an ordered fallback chain.
//!
//! Backends are tried in sequence until one produces a narration
//! track: the cloud provider (only when credentials are configured),
//! an offline TTS command-line engine, and finally a silent
//! placeholder sized from the script's word count. Each step's failure
//! is logged and absorbed; only exhausting the whole chain is a hard
//! error.

use reqwest::Client;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use reel_media::{audio_duration, estimate_narration_secs, silent_track};
use reel_models::NarrationAsset;

/// Offline TTS engine invoked as a subprocess.
const OFFLINE_TTS_BIN: &str = "edge-tts";
const OFFLINE_TTS_VOICE: &str = "en-US-JennyNeural";
const OFFLINE_TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// One synthesis strategy in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    ElevenLabs,
    OfflineCli,
    Silence,
}

/// Voice synthesizer driving the fallback chain.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    client: Client,
    api_key: Option<String>,
    voice_id: String,
    base_url: String,
}

impl Synthesizer {
    /// Create a synthesizer from pipeline config.
    pub fn new(config: &PipelineConfig) -> Self {
        if config.elevenlabs_api_key.is_none() {
            warn!("ELEVENLABS_API_KEY not configured, primary voice backend disabled");
        }
        Self {
            client: Client::new(),
            api_key: config.elevenlabs_api_key.clone(),
            voice_id: config.elevenlabs_voice_id.clone(),
            base_url: config.elevenlabs_base_url.clone(),
        }
    }

    /// The ordered strategy list for this configuration.
    pub fn chain(&self) -> Vec<Backend> {
        let mut chain = Vec::new();
        if self.api_key.is_some() {
            chain.push(Backend::ElevenLabs);
        }
        chain.push(Backend::OfflineCli);
        chain.push(Backend::Silence);
        chain
    }

    /// Synthesize narration for `text` into `output`.
    ///
    /// Iterates the fallback chain until a backend succeeds. Fails
    /// with [`PipelineError::SynthesisFailed`] only when every step,
    /// including the silent placeholder, has failed.
    pub async fn synthesize(
        &self,
        text: &str,
        output: impl AsRef<Path>,
    ) -> PipelineResult<NarrationAsset> {
        let output = output.as_ref();
        let mut last_error = String::new();

        for backend in self.chain() {
            let attempt = match backend {
                Backend::ElevenLabs => self.try_elevenlabs(text, output).await,
                Backend::OfflineCli => self.try_offline_cli(text, output).await,
                Backend::Silence => silent_track(text, output)
                    .await
                    .map_err(anyhow::Error::from),
            };

            match attempt {
                Ok(asset) => {
                    info!(
                        backend = ?backend,
                        duration_secs = asset.duration_secs,
                        "Generated voiceover"
                    );
                    return Ok(asset);
                }
                Err(e) => {
                    warn!(backend = ?backend, "Voice backend failed: {}", e);
                    last_error = e.to_string();
                }
            }
        }

        Err(PipelineError::synthesis_failed(last_error))
    }

    /// Primary backend: ElevenLabs HTTP TTS.
    async fn try_elevenlabs(&self, text: &str, output: &Path) -> anyhow::Result<NarrationAsset> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("API key not configured"))?;

        let url = format!("{}/text-to-speech/{}", self.base_url, self.voice_id);
        let body = json!({
            "text": text,
            "model_id": "eleven_monolingual_v1",
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.8,
                "style": 0.0,
                "use_speaker_boost": true
            }
        });

        let response = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("ElevenLabs API error {}: {}", status, detail);
        }

        let bytes = response.bytes().await?;
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, &bytes).await?;

        Ok(self.measured_asset(text, output).await)
    }

    /// Secondary backend: offline TTS CLI.
    async fn try_offline_cli(&self, text: &str, output: &Path) -> anyhow::Result<NarrationAsset> {
        which::which(OFFLINE_TTS_BIN)
            .map_err(|_| anyhow::anyhow!("{} not available", OFFLINE_TTS_BIN))?;

        let run = Command::new(OFFLINE_TTS_BIN)
            .arg("--text")
            .arg(text)
            .arg("--write-media")
            .arg(output)
            .arg("--voice")
            .arg(OFFLINE_TTS_VOICE)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let result = tokio::time::timeout(OFFLINE_TTS_TIMEOUT, run)
            .await
            .map_err(|_| anyhow::anyhow!("{} timed out", OFFLINE_TTS_BIN))??;

        if !result.status.success() {
            anyhow::bail!(
                "{} failed: {}",
                OFFLINE_TTS_BIN,
                String::from_utf8_lossy(&result.stderr)
            );
        }

        Ok(self.measured_asset(text, output).await)
    }

    /// Probe the produced file for its real duration, falling back to
    /// the word-count estimate when probing fails.
    async fn measured_asset(&self, text: &str, output: &Path) -> NarrationAsset {
        let duration_secs = match audio_duration(output).await {
            Ok(d) => d,
            Err(e) => {
                warn!("Failed to probe narration duration ({}), using estimate", e);
                estimate_narration_secs(text)
            }
        };
        NarrationAsset {
            path: PathBuf::from(output),
            duration_secs,
        }
    }
}
