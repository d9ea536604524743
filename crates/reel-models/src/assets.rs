//! On-disk asset descriptors passed between pipeline stages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A generated image, keyed by its original prompt index.
///
/// The index (1-based) defines stitch order end-to-end. Batches
/// complete out of order and partial failures shrink the set, so the
/// assembler sorts by index, never by arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    /// 1-based prompt index, defines stitch order
    pub index: usize,
    /// Downloaded image path
    pub path: PathBuf,
    /// Caption-composited variant, if overlay application succeeded
    pub overlay_path: Option<PathBuf>,
}

impl ImageAsset {
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
            overlay_path: None,
        }
    }

    /// Path to feed the assembler: the overlay variant when present,
    /// otherwise the original.
    pub fn display_path(&self) -> &PathBuf {
        self.overlay_path.as_ref().unwrap_or(&self.path)
    }
}

/// The narration audio track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationAsset {
    /// Local audio file path
    pub path: PathBuf,
    /// Measured duration in seconds
    pub duration_secs: f64,
}

/// The final encoded video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoArtifact {
    /// Encoded file path
    pub path: PathBuf,
    /// Display time per image, `narration_duration / image_count`
    pub per_image_secs: f64,
    /// Number of distinct images stitched
    pub image_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path_prefers_overlay() {
        let mut asset = ImageAsset::new(1, "/tmp/image_01.png");
        assert_eq!(asset.display_path(), &PathBuf::from("/tmp/image_01.png"));

        asset.overlay_path = Some(PathBuf::from("/tmp/overlays/overlay_image_01.png"));
        assert_eq!(
            asset.display_path(),
            &PathBuf::from("/tmp/overlays/overlay_image_01.png")
        );
    }
}
