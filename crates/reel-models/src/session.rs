//! Session state for progress tracking and polling.
//!
//! A session is one end-to-end video generation job. The orchestrator
//! is the only writer; any number of pollers read snapshots through
//! the session store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pipeline stage. Strictly sequential; `Error` is reachable from any
/// non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Initializing,
    GeneratingScript,
    GeneratingImages,
    AddingOverlays,
    GeneratingVoiceover,
    CreatingVideo,
    Completed,
    Error,
}

impl Stage {
    /// Get string representation of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initializing => "initializing",
            Stage::GeneratingScript => "generating_script",
            Stage::GeneratingImages => "generating_images",
            Stage::AddingOverlays => "adding_overlays",
            Stage::GeneratingVoiceover => "generating_voiceover",
            Stage::CreatingVideo => "creating_video",
            Stage::Completed => "completed",
            Stage::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Error)
    }

    /// Fixed progress checkpoint reported when the stage is entered.
    pub fn checkpoint_progress(&self) -> u8 {
        match self {
            Stage::Initializing => 0,
            Stage::GeneratingScript => 10,
            Stage::GeneratingImages => 30,
            Stage::AddingOverlays => 55,
            Stage::GeneratingVoiceover => 70,
            Stage::CreatingVideo => 85,
            Stage::Completed => 100,
            // Progress freezes where the failure happened.
            Stage::Error => 0,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress snapshot of one video generation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub session_id: String,
    /// Current pipeline stage
    pub stage: Stage,
    /// Progress percentage (0-100, never decreases)
    pub progress: u8,
    /// Human-readable status message
    pub message: String,
    /// Final video path, set once the session completes
    pub video_path: Option<PathBuf>,
    /// Error message if the session failed
    pub error: Option<String>,
    /// When the session was started
    pub started_at: DateTime<Utc>,
    /// When the state was last updated
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session in the `Initializing` stage.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            stage: Stage::Initializing,
            progress: 0,
            message: "Starting video generation...".to_string(),
            video_path: None,
            error: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Check if the session is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Enter a stage, setting its fixed progress checkpoint and message.
    pub fn enter_stage(&mut self, stage: Stage, message: impl Into<String>) {
        self.stage = stage;
        self.progress = stage.checkpoint_progress().max(self.progress).min(100);
        self.message = message.into();
        self.updated_at = Utc::now();
    }

    /// Update progress within the current stage. Progress is monotonic:
    /// an update below the current value is clamped up to it.
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.max(self.progress).min(100);
        self.updated_at = Utc::now();
    }

    /// Update only the status message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.updated_at = Utc::now();
    }

    /// Mark the session completed with the final video path.
    pub fn complete(&mut self, video_path: impl Into<PathBuf>) {
        self.stage = Stage::Completed;
        self.progress = 100;
        self.message = "Video generation completed!".to_string();
        self.video_path = Some(video_path.into());
        self.updated_at = Utc::now();
    }

    /// Mark the session failed, recording the error message verbatim.
    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.stage = Stage::Error;
        self.message = format!("Error: {}", error);
        self.error = Some(error);
        self.updated_at = Utc::now();
    }
}
