mod backend;
mod backends;
mod registry;

pub use backend::ClassifierBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use registry::BackendRegistry;

use anyhow::{anyhow, Result};
use std::fmt;

use crate::config::ClassifierSettings;

/// Fine-grained labels containing any of these map to [`CoarseLabel::Banana`].
const BANANA_KEYWORDS: &[&str] = &["banana", "plantain"];
/// Fine-grained labels containing any of these map to [`CoarseLabel::Apple`].
const APPLE_KEYWORDS: &[&str] = &["granny smith", "red delicious", "golden delicious", "apple"];

/// One fine-grained class with its softmax probability.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredClass {
    pub label: String,
    pub score: f32,
}

/// Top-k prediction from a classifier backend, ordered by descending score.
#[derive(Clone, Debug, Default)]
pub struct Classification {
    pub top: Vec<ScoredClass>,
}

impl Classification {
    /// Probability of the top class, 0.0 for an empty prediction.
    pub fn confidence(&self) -> f32 {
        self.top.first().map(|entry| entry.score).unwrap_or(0.0)
    }

    pub fn coarse_label(&self) -> CoarseLabel {
        CoarseLabel::from_top_k(&self.top)
    }
}

/// The three answers this service gives: banana, apple, or neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoarseLabel {
    Banana,
    Apple,
    Neither,
}

impl CoarseLabel {
    /// Collapse fine-grained top-k labels to a coarse label by substring
    /// keyword match. Banana keywords are scanned across the whole top-k
    /// before apple keywords, so a "plantain" in fifth place beats a
    /// "granny smith" in first.
    pub fn from_top_k(top: &[ScoredClass]) -> Self {
        let lowered: Vec<String> = top.iter().map(|entry| entry.label.to_lowercase()).collect();
        if lowered
            .iter()
            .any(|label| BANANA_KEYWORDS.iter().any(|kw| label.contains(kw)))
        {
            return CoarseLabel::Banana;
        }
        if lowered
            .iter()
            .any(|label| APPLE_KEYWORDS.iter().any(|kw| label.contains(kw)))
        {
            return CoarseLabel::Apple;
        }
        CoarseLabel::Neither
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoarseLabel::Banana => "banana",
            CoarseLabel::Apple => "apple",
            CoarseLabel::Neither => "neither",
        }
    }
}

impl fmt::Display for CoarseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte length of a tightly packed RGB8 buffer for the given dimensions.
pub(crate) fn expected_rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("image dimensions overflow"))
}

/// Build a registry from configuration. The stub backend is always
/// registered; the tract backend is added when a model is configured and
/// the `backend-tract` feature is enabled.
pub fn registry_from_settings(settings: &ClassifierSettings) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::new());

    #[cfg(feature = "backend-tract")]
    if let (Some(model_path), Some(labels_path)) =
        (&settings.model_path, &settings.labels_path)
    {
        registry.register(TractBackend::load(model_path, labels_path, settings.top_k)?);
    }

    if settings.backend == "tract" && registry.get("tract").is_none() {
        #[cfg(feature = "backend-tract")]
        return Err(anyhow!(
            "backend 'tract' requires model_path and labels_path to be configured"
        ));
        #[cfg(not(feature = "backend-tract"))]
        return Err(anyhow!(
            "backend 'tract' requires building with the backend-tract feature"
        ));
    }

    registry.set_default(&settings.backend)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(labels: &[&str]) -> Vec<ScoredClass> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| ScoredClass {
                label: label.to_string(),
                score: 0.9 - i as f32 * 0.1,
            })
            .collect()
    }

    #[test]
    fn banana_keyword_matches_anywhere_in_top_k() {
        let classes = top(&["espresso", "pizza", "banana"]);
        assert_eq!(CoarseLabel::from_top_k(&classes), CoarseLabel::Banana);
    }

    #[test]
    fn banana_wins_over_higher_ranked_apple() {
        let classes = top(&["Granny Smith", "plantain"]);
        assert_eq!(CoarseLabel::from_top_k(&classes), CoarseLabel::Banana);
    }

    #[test]
    fn apple_varieties_map_to_apple() {
        for label in ["Granny Smith", "red delicious", "custard apple"] {
            let classes = top(&[label]);
            assert_eq!(CoarseLabel::from_top_k(&classes), CoarseLabel::Apple);
        }
    }

    #[test]
    fn pineapple_maps_to_apple_via_substring() {
        // Substring matching is deliberate, so "pineapple" counts as apple.
        let classes = top(&["pineapple"]);
        assert_eq!(CoarseLabel::from_top_k(&classes), CoarseLabel::Apple);
    }

    #[test]
    fn unrelated_labels_map_to_neither() {
        let classes = top(&["espresso", "soup bowl", "carton"]);
        assert_eq!(CoarseLabel::from_top_k(&classes), CoarseLabel::Neither);
    }

    #[test]
    fn empty_top_k_is_neither_with_zero_confidence() {
        let classification = Classification::default();
        assert_eq!(classification.coarse_label(), CoarseLabel::Neither);
        assert_eq!(classification.confidence(), 0.0);
    }

    #[test]
    fn registry_from_settings_defaults_to_stub() {
        let settings = crate::config::ClassifierSettings::default();
        let registry = registry_from_settings(&settings).expect("registry");
        assert_eq!(registry.list(), vec!["stub".to_string()]);
    }

    #[test]
    fn registry_from_settings_rejects_unconfigured_tract() {
        let settings = crate::config::ClassifierSettings {
            backend: "tract".to_string(),
            ..Default::default()
        };
        assert!(registry_from_settings(&settings).is_err());
    }
}
