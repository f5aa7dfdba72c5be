#![cfg(feature = "backend-tract")]

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::classify::backend::ClassifierBackend;
use crate::classify::{expected_rgb_len, Classification, ScoredClass};

/// Side length the model expects. Input frames are resized to this before
/// inference regardless of their original dimensions.
const MODEL_INPUT: u32 = 224;

/// Per-channel normalization constants for ImageNet-trained models.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Tract-based backend for ONNX image classification.
///
/// Loads a local model file plus a sidecar labels file (one class name per
/// line, ordered by class index) and performs inference on RGB frames. It does
/// not perform any network I/O or write to disk beyond model loading.
pub struct TractBackend {
    model: TypedSimplePlan<TypedModel>,
    labels: Vec<String>,
    top_k: usize,
}

impl TractBackend {
    /// Load an ONNX classifier and its labels file from disk.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        model_path: P,
        labels_path: Q,
        top_k: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, MODEL_INPUT as usize, MODEL_INPUT as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        let labels = load_labels(labels_path.as_ref())?;
        if top_k == 0 {
            return Err(anyhow!("top_k must be at least 1"));
        }

        Ok(Self {
            model,
            labels,
            top_k,
        })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
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

        let frame = RgbImage::from_raw(width, height, pixels.to_vec())
            .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", width, height))?;
        let resized = image::imageops::resize(&frame, MODEL_INPUT, MODEL_INPUT, FilterType::Triangle);

        let side = MODEL_INPUT as usize;
        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, channel, y, x)| {
                let value = resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0;
                (value - MEAN[channel]) / STD[channel]
            });

        Ok(input.into_tensor())
    }

    fn extract_top_k(&self, outputs: TVec<TValue>) -> Result<Vec<ScoredClass>> {
        let output = outputs
            .get(0)
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let probabilities = softmax(scores.iter().cloned().collect());
        let mut ranked: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(self.top_k);

        ranked
            .into_iter()
            .map(|(index, score)| {
                let label = self
                    .labels
                    .get(index)
                    .ok_or_else(|| {
                        anyhow!(
                            "model produced class index {} but labels file has {} entries",
                            index,
                            self.labels.len()
                        )
                    })?
                    .clone();
                Ok(ScoredClass { label, score })
            })
            .collect()
    }
}

impl ClassifierBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn classify(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Classification> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let top = self.extract_top_k(outputs)?;
        Ok(Classification { top })
    }

    fn warm_up(&mut self) -> Result<()> {
        let side = MODEL_INPUT as usize;
        let black = vec![0u8; side * side * 3];
        self.classify(&black, MODEL_INPUT, MODEL_INPUT).map(|_| ())
    }
}

fn load_labels(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read labels file {}", path.display()))?;
    let labels: Vec<String> = raw
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    if labels.is_empty() {
        return Err(anyhow!("labels file {} contained no entries", path.display()));
    }
    Ok(labels)
}

fn softmax(logits: Vec<f32>) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum <= 0.0 {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|v| v / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::softmax;

    #[test]
    fn softmax_sums_to_one() {
        let probabilities = softmax(vec![1.0, 2.0, 3.0]);
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probabilities[2] > probabilities[1]);
        assert!(probabilities[1] > probabilities[0]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probabilities = softmax(vec![1000.0, 1000.0]);
        assert!((probabilities[0] - 0.5).abs() < 1e-5);
    }
}
