use anyhow::{anyhow, Result};

use crate::classify::backend::ClassifierBackend;
use crate::classify::{expected_rgb_len, Classification, ScoredClass};

const STUB_LABEL: &str = "banana";
const STUB_SCORE: f32 = 0.95;

/// Placeholder backend: always predicts "banana" with 0.95 confidence so the
/// rest of the pipeline (catalog lookup, UI) works without a model file.
pub struct StubBackend;

impl StubBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn classify(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Classification> {
        let expected = expected_rgb_len(width, height)?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Classification {
            top: vec![ScoredClass {
                label: STUB_LABEL.to_string(),
                score: STUB_SCORE,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CoarseLabel;

    #[test]
    fn stub_always_predicts_banana() {
        let mut backend = StubBackend::new();
        let pixels = vec![0u8; 4 * 4 * 3];
        let classification = backend.classify(&pixels, 4, 4).expect("classify");
        assert_eq!(classification.coarse_label(), CoarseLabel::Banana);
        assert!((classification.confidence() - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn stub_rejects_wrong_buffer_length() {
        let mut backend = StubBackend::new();
        let pixels = vec![0u8; 10];
        assert!(backend.classify(&pixels, 4, 4).is_err());
    }
}
