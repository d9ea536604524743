//! Per-session artifact directory layout.
//!
//! Every artifact for a session lives under one exclusively-owned
//! directory: `script.txt`, numbered `image_NN.png` files, an
//! `overlays/` subdirectory of captioned variants, `voiceover.mp3`,
//! and `final_video.mp4`. Absence of a file means the producing stage
//! has not completed or was skipped.

use std::path::{Path, PathBuf};

use reel_models::AssetListing;

/// Path construction and asset discovery for one session directory.
#[derive(Debug, Clone)]
pub struct SessionWorkspace {
    session_id: String,
    root: PathBuf,
}

impl SessionWorkspace {
    /// Describe a session workspace without touching the filesystem.
    pub fn new(output_dir: impl AsRef<Path>, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self {
            root: output_dir.as_ref().join(&session_id),
            session_id,
        }
    }

    /// Create the session directory tree.
    pub async fn create(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn script_path(&self) -> PathBuf {
        self.root.join("script.txt")
    }

    pub fn voiceover_path(&self) -> PathBuf {
        self.root.join("voiceover.mp3")
    }

    pub fn video_path(&self) -> PathBuf {
        self.root.join("final_video.mp4")
    }

    /// Numbered image path for a 1-based prompt index.
    pub fn image_filename(index: usize) -> String {
        format!("image_{:02}.png", index)
    }

    pub fn image_path(&self, index: usize) -> PathBuf {
        self.root.join(Self::image_filename(index))
    }

    pub fn overlays_dir(&self) -> PathBuf {
        self.root.join("overlays")
    }

    /// List on-disk artifacts as relative download URLs.
    pub async fn list_assets(&self) -> AssetListing {
        let mut listing = AssetListing::default();

        if let Ok(script) = tokio::fs::read_to_string(self.script_path()).await {
            listing.script = Some(script);
        }

        if self.voiceover_path().exists() {
            listing.voiceover = Some(format!(
                "/download-asset/{}/voiceover.mp3",
                self.session_id
            ));
        }

        let mut images = Vec::new();
        if let Ok(mut entries) = tokio::fs::read_dir(&self.root).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with("image_") && name.ends_with(".png") {
                    images.push(name);
                }
            }
        }
        images.sort();
        listing.images = images
            .into_iter()
            .map(|name| format!("/download-asset/{}/{}", self.session_id, name))
            .collect();

        if self.video_path().exists() {
            listing.video = Some(format!("/download/{}", self.session_id));
        }

        listing
    }
}
