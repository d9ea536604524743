//! Session orchestration.
//!
//! [`Pipeline`] owns the session store and the stage clients, and
//! drives each session through the stage machine on a detached task.
//! Stage transitions and progress land in the store as they happen so
//! pollers always see a current, monotonic snapshot.

use dashmap::DashMap;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::downloads::download_many;
use crate::error::PipelineResult;
use crate::images::{BatchOptions, ImageClient};
use crate::script::ScriptClient;
use crate::store::SessionStore;
use crate::tts::Synthesizer;
use crate::workspace::SessionWorkspace;
use reel_models::{AssetListing, ImageAsset, ScriptBundle, Session, Stage};

struct Inner {
    config: PipelineConfig,
    store: SessionStore,
    script_client: ScriptClient,
    image_client: ImageClient,
    synthesizer: Synthesizer,
    http: Client,
    // Retained for observability only; sessions are never cancelled.
    tasks: DashMap<String, JoinHandle<()>>,
}

/// Handle for starting and observing video generation sessions.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

impl Pipeline {
    /// Build a pipeline from config.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                script_client: ScriptClient::new(&config),
                image_client: ImageClient::new(&config),
                synthesizer: Synthesizer::new(&config),
                http: Client::new(),
                store: SessionStore::new(),
                tasks: DashMap::new(),
                config,
            }),
        }
    }

    /// Start a new session for `topic` and return its initial snapshot.
    ///
    /// The session runs on a detached task; callers poll the store for
    /// progress. The returned session is already registered, so a poll
    /// issued immediately after this call can never miss it.
    pub fn start(&self, topic: impl Into<String>) -> PipelineResult<Session> {
        let topic = topic.into();
        let session_id = Uuid::new_v4().to_string();
        let session = self.inner.store.create(&session_id)?;

        info!(session_id = %session_id, topic = %topic, "Starting video generation");

        let pipeline = self.clone();
        let id = session_id.clone();
        let handle = tokio::spawn(async move {
            pipeline.run_session(&id, &topic).await;
            pipeline.inner.tasks.remove(&id);
        });
        self.inner.tasks.insert(session_id, handle);

        Ok(session)
    }

    /// Snapshot of a session's progress state.
    pub fn status(&self, session_id: &str) -> Option<Session> {
        self.inner.store.get(session_id)
    }

    /// On-disk artifacts of a session, as download URLs.
    pub async fn assets(&self, session_id: &str) -> Option<AssetListing> {
        self.inner.store.get(session_id)?;
        let workspace = self.workspace(session_id);
        Some(workspace.list_assets().await)
    }

    /// Path to the final video, once the session has completed.
    pub fn artifact_path(&self, session_id: &str) -> Option<PathBuf> {
        self.inner.store.get(session_id)?.video_path
    }

    /// Root directory of a session's artifacts.
    pub fn session_dir(&self, session_id: &str) -> Option<PathBuf> {
        self.inner.store.get(session_id)?;
        Some(self.workspace(session_id).root().to_path_buf())
    }

    /// Number of sessions tracked by the store.
    pub fn session_count(&self) -> usize {
        self.inner.store.len()
    }

    fn workspace(&self, session_id: &str) -> SessionWorkspace {
        SessionWorkspace::new(&self.inner.config.output_dir, session_id)
    }

    async fn run_session(&self, session_id: &str, topic: &str) {
        if let Err(e) = self.drive(session_id, topic).await {
            error!(session_id = %session_id, "Session failed: {}", e);
            self.inner.store.update(session_id, |s| s.fail(e.to_string()));
        }
    }

    /// Run every stage in order. Any error returned here is fatal and
    /// moves the session to `Error`; recoverable failures are absorbed
    /// inside the stage they occur in.
    async fn drive(&self, session_id: &str, topic: &str) -> PipelineResult<()> {
        let store = &self.inner.store;
        let workspace = self.workspace(session_id);
        workspace.create().await?;

        // Stage: script.
        store.update(session_id, |s| {
            s.enter_stage(Stage::GeneratingScript, "Generating script with AI...")
        });
        let bundle = self.inner.script_client.generate_script(topic).await?;
        tokio::fs::write(workspace.script_path(), &bundle.script).await?;

        // Stage: images.
        store.update(session_id, |s| {
            s.enter_stage(Stage::GeneratingImages, "Generating images...")
        });
        let assets = self.generate_images(session_id, &workspace, &bundle).await;

        // Stage: overlays. Entered even with nothing to caption so the
        // stage sequence observed by pollers is always complete.
        store.update(session_id, |s| {
            s.enter_stage(Stage::AddingOverlays, "Adding text overlays to images...")
        });
        let assets = self.apply_overlays(session_id, &workspace, assets, &bundle).await;

        // Stage: voiceover.
        store.update(session_id, |s| {
            s.enter_stage(Stage::GeneratingVoiceover, "Generating voiceover...")
        });
        let narration = self
            .inner
            .synthesizer
            .synthesize(&bundle.script, workspace.voiceover_path())
            .await?;

        // Stage: assembly.
        store.update(session_id, |s| {
            s.enter_stage(Stage::CreatingVideo, "Assembling final video...")
        });
        let frames: Vec<PathBuf> = assets.iter().map(|a| a.display_path().clone()).collect();
        let artifact =
            reel_media::assemble(&frames, &narration, workspace.video_path()).await?;

        store.update(session_id, |s| s.complete(&artifact.path));
        info!(
            session_id = %session_id,
            video = %artifact.path.display(),
            images = artifact.image_count,
            "Session completed"
        );
        Ok(())
    }

    /// Generate and download images, reporting incremental progress.
    /// Best-effort end to end: the result only shrinks on failure.
    async fn generate_images(
        &self,
        session_id: &str,
        workspace: &SessionWorkspace,
        bundle: &ScriptBundle,
    ) -> Vec<ImageAsset> {
        let options = BatchOptions::from(&self.inner.config);
        let candidates = self
            .inner
            .image_client
            .generate_batched(&bundle.image_prompts, &options)
            .await;

        // Progress is fractions of the prompt count, not of the
        // surviving candidates, so lost images leave a visible gap.
        let total = bundle.image_prompts.len();
        let store = &self.inner.store;
        download_many(&self.inner.http, &candidates, workspace.root(), |done| {
            let progress = (30 + done * 25 / total.max(1)).min(55) as u8;
            store.update(session_id, |s| {
                s.set_progress(progress);
                s.set_message(format!("Generated image {}/{}", done, total));
            });
        })
        .await
    }

    /// Composite captions onto the downloaded images. Any failure here
    /// leaves the affected assets pointing at their originals.
    async fn apply_overlays(
        &self,
        session_id: &str,
        workspace: &SessionWorkspace,
        mut assets: Vec<ImageAsset>,
        bundle: &ScriptBundle,
    ) -> Vec<ImageAsset> {
        if assets.is_empty() {
            self.inner.store.update(session_id, |s| {
                s.set_message("No images to caption, continuing...")
            });
            return assets;
        }

        // Captions align to prompt index, not to arrival order, so a
        // surviving image always gets its own caption.
        let images: Vec<PathBuf> = assets.iter().map(|a| a.path.clone()).collect();
        let captions: Vec<String> = assets
            .iter()
            .map(|a| {
                bundle
                    .captions
                    .get(a.index - 1)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        let style = reel_media::OverlayStyle::default();
        match reel_media::overlay::apply_many(&images, &captions, workspace.overlays_dir(), &style)
            .await
        {
            Ok(outputs) => {
                for (asset, output) in assets.iter_mut().zip(outputs) {
                    if output != asset.path {
                        asset.overlay_path = Some(output);
                    }
                }
                self.inner.store.update(session_id, |s| {
                    s.set_message("Text overlays added successfully")
                });
            }
            Err(e) => {
                warn!(session_id = %session_id, "Overlay stage failed: {}", e);
                self.inner.store.update(session_id, |s| {
                    s.set_message("Continuing without text overlays")
                });
            }
        }
        assets
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("sessions", &self.inner.store.len())
            .finish()
    }
}
