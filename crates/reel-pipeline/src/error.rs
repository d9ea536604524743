//! Pipeline error types.
//!
//! Only a subset of these ever reaches the orchestrator: per-item
//! image and download failures are absorbed at the component boundary
//! and reduce the surviving result set instead of propagating.

use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur while driving a session.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Script generation failed (fatal).
    #[error("Failed to generate script: {0}")]
    GenerationFailed(String),

    /// Voice synthesis failed after exhausting the fallback chain (fatal).
    #[error("Failed to generate voiceover: {0}")]
    SynthesisFailed(String),

    /// A single asset download failed (absorbed, per-item).
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Session id collision on create. Ids are generated, so this
    /// indicates a bug rather than caller error.
    #[error("Session already exists: {0}")]
    SessionExists(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Media operation failed (fatal at the assembly stage).
    #[error(transparent)]
    Media(#[from] reel_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Create a script generation failure.
    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed(message.into())
    }

    /// Create a synthesis failure.
    pub fn synthesis_failed(message: impl Into<String>) -> Self {
        Self::SynthesisFailed(message.into())
    }

    /// Create a download failure.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed(message.into())
    }
}
