//! Script bundle produced by the language model.

use serde::{Deserialize, Serialize};

/// Placeholder caption used when the model returns fewer captions than
/// image prompts.
pub const PLACEHOLDER_CAPTION: &str = "Historical Scene";

/// Narration script plus the ordered visual prompts and overlay
/// captions that drive the rest of the pipeline.
///
/// After [`normalize_captions`](Self::normalize_captions) the caption
/// list is guaranteed to match the prompt list length; consumers rely
/// on this and never re-check it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptBundle {
    /// Voiceover narration text
    pub script: String,
    /// Ordered image prompts, one per ~5 seconds of narration
    pub image_prompts: Vec<String>,
    /// Overlay captions, parallel to `image_prompts`
    #[serde(default)]
    pub captions: Vec<String>,
    /// Estimated narration duration in seconds
    pub duration_secs: u32,
}

impl ScriptBundle {
    /// Force `captions.len() == image_prompts.len()`.
    ///
    /// Missing captions are synthesized as numbered placeholders, a
    /// short list is padded with the generic placeholder, and a long
    /// list is truncated. Enforced here by the producer so downstream
    /// consumers can zip the two lists index-for-index.
    pub fn normalize_captions(&mut self) {
        if self.captions.is_empty() {
            self.captions = (1..=self.image_prompts.len())
                .map(|i| format!("{} {}", PLACEHOLDER_CAPTION, i))
                .collect();
            return;
        }

        while self.captions.len() < self.image_prompts.len() {
            self.captions.push(PLACEHOLDER_CAPTION.to_string());
        }
        self.captions.truncate(self.image_prompts.len());
    }

    /// Number of words in the narration script.
    pub fn word_count(&self) -> usize {
        self.script.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(prompts: usize, captions: usize) -> ScriptBundle {
        ScriptBundle {
            script: "test narration".to_string(),
            image_prompts: (0..prompts).map(|i| format!("prompt {}", i)).collect(),
            captions: (0..captions).map(|i| format!("caption {}", i)).collect(),
            duration_secs: 60,
        }
    }

    #[test]
    fn test_normalize_pads_short_caption_list() {
        let mut b = bundle(5, 2);
        b.normalize_captions();
        assert_eq!(b.captions.len(), 5);
        assert_eq!(b.captions[1], "caption 1");
        assert_eq!(b.captions[4], PLACEHOLDER_CAPTION);
    }

    #[test]
    fn test_normalize_truncates_long_caption_list() {
        let mut b = bundle(3, 7);
        b.normalize_captions();
        assert_eq!(b.captions.len(), 3);
        assert_eq!(b.captions[2], "caption 2");
    }

    #[test]
    fn test_normalize_synthesizes_missing_captions() {
        let mut b = bundle(3, 0);
        b.normalize_captions();
        assert_eq!(
            b.captions,
            vec![
                "Historical Scene 1",
                "Historical Scene 2",
                "Historical Scene 3"
            ]
        );
    }

    #[test]
    fn test_word_count() {
        let b = ScriptBundle {
            script: "one two  three\nfour".to_string(),
            image_prompts: vec![],
            captions: vec![],
            duration_secs: 10,
        };
        assert_eq!(b.word_count(), 4);
    }
}
