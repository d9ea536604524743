//! Silent narration placeholder.
//!
//! Last step of the voice synthesis fallback chain: a silent track
//! whose length is estimated from the script's word count, so the
//! pipeline always ends up with a playable narration file even with
//! zero working speech backends.

use std::path::Path;
use tracing::info;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use reel_models::NarrationAsset;

/// Minimum placeholder duration in seconds.
const MIN_DURATION_SECS: f64 = 10.0;

/// Seconds per word at an assumed ~150 words/minute reading rate.
const SECS_PER_WORD: f64 = 0.4;

/// Estimate narration length for a script, in seconds.
pub fn estimate_narration_secs(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    (words as f64 * SECS_PER_WORD).max(MIN_DURATION_SECS)
}

/// Generate a silent audio file sized to the estimated narration
/// length of `text`.
pub async fn silent_track(text: &str, output: impl AsRef<Path>) -> MediaResult<NarrationAsset> {
    let output = output.as_ref();
    let duration = estimate_narration_secs(text);

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    FfmpegCommand::new(output)
        .input_with_args(
            ["-f", "lavfi"],
            "anullsrc=channel_layout=stereo:sample_rate=44100",
        )
        .duration(duration)
        .audio_codec("libmp3lame")
        .run()
        .await?;

    info!(
        duration_secs = duration,
        output = %output.display(),
        "Generated silent narration placeholder"
    );

    Ok(NarrationAsset {
        path: output.to_path_buf(),
        duration_secs: duration,
    })
}
