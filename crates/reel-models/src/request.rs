//! Inbound request/response shapes for the HTTP control surface.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body for starting a generation session.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateRequest {
    /// Topic for the video, e.g. "Fall of the Roman Empire"
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
}

/// Response returned when a session is accepted.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub session_id: String,
    pub status: &'static str,
}

impl GenerateResponse {
    pub fn started(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            status: "started",
        }
    }
}

/// Per-session asset listing. Absence of an entry means the producing
/// stage has not completed (or was skipped), not that anything failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetListing {
    /// Narration script text
    pub script: Option<String>,
    /// Relative download URL for the voiceover track
    pub voiceover: Option<String>,
    /// Relative download URLs for the numbered images, in index order
    pub images: Vec<String>,
    /// Relative download URL for the final video
    pub video: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_length_bounds() {
        let empty = GenerateRequest {
            topic: String::new(),
        };
        assert!(empty.validate().is_err());

        let too_long = GenerateRequest {
            topic: "x".repeat(201),
        };
        assert!(too_long.validate().is_err());

        let ok = GenerateRequest {
            topic: "Fall of the Roman Empire".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
