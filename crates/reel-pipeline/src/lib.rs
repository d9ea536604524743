//! Generation pipeline for topic-to-video sessions.
//!
//! The [`Pipeline`] drives a five-stage state machine per session:
//! script generation, batched image generation, caption overlays,
//! voice synthesis with a fallback chain, and final assembly. Image,
//! download, and overlay failures shrink the result set instead of
//! failing the session; script, exhausted-synthesis, and assembly
//! failures are fatal and move the session to its terminal `Error`
//! state.

pub mod config;
pub mod downloads;
pub mod error;
pub mod images;
pub mod orchestrator;
pub mod script;
pub mod store;
pub mod tts;
pub mod workspace;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use images::{BatchOptions, ImageCandidate, ImageClient};
pub use orchestrator::Pipeline;
pub use script::ScriptClient;
pub use store::SessionStore;
pub use tts::Synthesizer;
pub use workspace::SessionWorkspace;
