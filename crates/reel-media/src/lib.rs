//! FFmpeg/ffprobe wrapper for the ReelForge pipeline.
//!
//! Everything that touches media files lives here: the command
//! builder/runner, audio probing, caption overlay compositing, the
//! silent narration placeholder, and final video assembly.

pub mod assemble;
pub mod command;
pub mod error;
pub mod overlay;
pub mod probe;
pub mod silence;

pub use assemble::assemble;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand};
pub use error::{MediaError, MediaResult};
pub use overlay::{Anchor, OverlayStyle};
pub use probe::audio_duration;
pub use silence::{estimate_narration_secs, silent_track};
