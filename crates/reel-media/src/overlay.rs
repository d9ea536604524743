//! Caption overlay compositing.
//!
//! Renders each caption onto a copy of its image with a semi-opaque
//! box for legibility, using FFmpeg's `drawtext` filter. Composition
//! is strictly best-effort: a missing font falls back down the
//! candidate list to fontconfig's default, and any rendering failure
//! degrades to copying the original image to the output path.

use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Ordered font candidates checked before falling back to the
/// fontconfig default.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
];

/// Vertical anchor for the caption box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    Top,
    #[default]
    Bottom,
    Center,
}

/// Overlay rendering style.
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    /// Font size in pixels
    pub font_size: u32,
    /// Caption anchor position
    pub anchor: Anchor,
    /// Padding around the text, also the box border width
    pub padding: u32,
    /// Background box opacity (0.0 to 1.0)
    pub box_opacity: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_size: 48,
            anchor: Anchor::Bottom,
            padding: 20,
            box_opacity: 0.7,
        }
    }
}

impl OverlayStyle {
    /// Set the anchor position.
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Set the padding in pixels.
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Set the box opacity (clamped to 0.0..=1.0).
    pub fn with_box_opacity(mut self, opacity: f32) -> Self {
        self.box_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Build the `drawtext` filter for a caption.
    fn build_filter(&self, caption: &str) -> String {
        let y = match self.anchor {
            Anchor::Top => format!("{}", self.padding),
            Anchor::Bottom => format!("h-text_h-{}", self.padding * 2),
            Anchor::Center => "(h-text_h)/2".to_string(),
        };

        let mut filter = format!(
            "drawtext=text={}:fontsize={}:fontcolor=white:box=1:boxcolor=black@{:.2}:boxborderw={}:x=(w-text_w)/2:y={}",
            escape_drawtext(caption),
            self.font_size,
            self.box_opacity,
            self.padding,
            y
        );

        if let Some(font) = resolve_font() {
            filter.push_str(":fontfile=");
            filter.push_str(&escape_drawtext(&font));
        }

        filter
    }
}

/// First existing font candidate, or `None` to let fontconfig pick.
fn resolve_font() -> Option<String> {
    for candidate in FONT_CANDIDATES {
        if Path::new(candidate).exists() {
            debug!(font = candidate, "Resolved overlay font");
            return Some(candidate.to_string());
        }
    }
    None
}

/// Escape a string for use inside an FFmpeg filter value.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
        .replace(',', "\\,")
}

/// Render a caption onto a copy of `image`, writing to `output`.
///
/// Never fails: if rendering errors for any reason the original image
/// is copied to the output path unmodified.
pub async fn apply_overlay(
    image: impl AsRef<Path>,
    caption: &str,
    output: impl AsRef<Path>,
    style: &OverlayStyle,
) -> MediaResult<PathBuf> {
    let image = image.as_ref();
    let output = output.as_ref();

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let result = FfmpegCommand::new(output)
        .input(image)
        .video_filter(style.build_filter(caption))
        .single_frame()
        .run()
        .await;

    match result {
        Ok(()) => {
            debug!(caption = caption, output = %output.display(), "Applied text overlay");
            Ok(output.to_path_buf())
        }
        Err(e) => {
            warn!(
                "Overlay rendering failed ({}), copying original image: {}",
                e,
                image.display()
            );
            tokio::fs::copy(image, output).await?;
            Ok(output.to_path_buf())
        }
    }
}

/// Apply overlays to a set of images concurrently.
///
/// The two input slices are truncated to the shorter length and zipped
/// index-for-index. Outputs are returned in input order regardless of
/// completion order; a slot whose task fails outright keeps the
/// original image path.
pub async fn apply_many(
    images: &[PathBuf],
    captions: &[String],
    output_dir: impl AsRef<Path>,
    style: &OverlayStyle,
) -> MediaResult<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    tokio::fs::create_dir_all(output_dir).await?;

    let count = images.len().min(captions.len());
    let mut set = JoinSet::new();

    for i in 0..count {
        let image = images[i].clone();
        let caption = captions[i].clone();
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("image_{:02}.png", i + 1));
        let output = output_dir.join(format!("overlay_{}", file_name));
        let style = style.clone();

        set.spawn(async move {
            let result = apply_overlay(&image, &caption, &output, &style).await;
            (i, result.unwrap_or(image))
        });
    }

    let mut slots: Vec<Option<PathBuf>> = vec![None; count];
    while let Some(joined) = set.join_next().await {
        if let Ok((i, path)) = joined {
            slots[i] = Some(path);
        }
    }

    Ok(slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.unwrap_or_else(|| images[i].clone()))
        .collect())
}
