//! Shared data models for the ReelForge pipeline.
//!
//! This crate contains the types that cross crate boundaries: session
//! progress state, the script bundle produced by the language model,
//! and the on-disk asset descriptors handed between pipeline stages.

pub mod assets;
pub mod request;
pub mod script;
pub mod session;

pub use assets::{ImageAsset, NarrationAsset, VideoArtifact};
pub use request::{AssetListing, GenerateRequest, GenerateResponse};
pub use script::ScriptBundle;
pub use session::{Session, Stage};
