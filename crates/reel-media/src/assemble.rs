//! Final video assembly.
//!
//! Stitches the ordered image set into a slideshow timed against the
//! narration track. Display time per image is derived from narration
//! length, and the last image is repeated once so the video does not
//! cut to black before the audio ends.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use reel_models::{NarrationAsset, VideoArtifact};

/// Upper bound on one encode run.
const ENCODE_TIMEOUT: Duration = Duration::from_secs(300);

/// Fixed presentation defaults applied to every output: 1080p frame,
/// slow continuous zoom, and a light cinematic color grade.
fn presentation_filters() -> String {
    [
        "scale=1920:1080:force_original_aspect_ratio=increase",
        "crop=1920:1080",
        "zoompan=z='min(zoom+0.0005,1.1)':d=125:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)'",
        "format=yuv420p",
        "eq=contrast=1.1:brightness=0.02:saturation=1.1",
    ]
    .join(",")
}

/// Build the concat demuxer list: every image with its display
/// duration, then the last image once more without one.
fn concat_list(images: &[PathBuf], per_image_secs: f64) -> String {
    let mut list = String::new();
    for image in images {
        list.push_str(&format!("file '{}'\n", image.display()));
        list.push_str(&format!("duration {}\n", per_image_secs));
    }
    if let Some(last) = images.last() {
        list.push_str(&format!("file '{}'\n", last.display()));
    }
    list
}

/// Assemble the final video from ordered images and the narration.
///
/// Fails with [`MediaError::NoImages`] when the image list is empty
/// and propagates [`MediaError::EncodingFailed`] verbatim from FFmpeg.
pub async fn assemble(
    images: &[PathBuf],
    narration: &NarrationAsset,
    output: impl AsRef<Path>,
) -> MediaResult<VideoArtifact> {
    let output = output.as_ref();

    if images.is_empty() {
        return Err(MediaError::NoImages);
    }

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let per_image_secs = narration.duration_secs / images.len() as f64;
    info!(
        image_count = images.len(),
        narration_secs = narration.duration_secs,
        per_image_secs,
        "Assembling video"
    );

    let list_path = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("temp_images.txt");
    tokio::fs::write(&list_path, concat_list(images, per_image_secs)).await?;

    let result = FfmpegCommand::new(output)
        .input_with_args(["-f", "concat", "-safe", "0"], list_path.to_string_lossy())
        .input(&narration.path)
        .video_codec("libx264")
        .output_args(["-pix_fmt", "yuv420p"])
        .audio_codec("aac")
        .audio_bitrate("128k")
        .video_filter(presentation_filters())
        .output_arg("-shortest")
        .timeout(ENCODE_TIMEOUT)
        .run()
        .await;

    let _ = tokio::fs::remove_file(&list_path).await;
    result?;

    info!(output = %output.display(), "Video created");

    Ok(VideoArtifact {
        path: output.to_path_buf(),
        per_image_secs,
        image_count: images.len(),
    })
}
