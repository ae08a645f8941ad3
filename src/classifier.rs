// Emotion classifier interface and result helpers

use crate::error::{ActingError, Result};
use crate::models::ClassificationResult;
use image::RgbImage;

/// Opaque emotion model: square RGB input, label -> confidence output
pub trait EmotionClassifier: Send + Sync {
    fn predict(&self, input: &RgbImage) -> Result<ClassificationResult>;
}

impl<F> EmotionClassifier for F
where
    F: Fn(&RgbImage) -> Result<ClassificationResult> + Send + Sync,
{
    fn predict(&self, input: &RgbImage) -> Result<ClassificationResult> {
        self(input)
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Pairs model outputs with their labels
pub fn label_scores(labels: &[String], scores: &[f32]) -> Result<ClassificationResult> {
    if scores.len() != labels.len() {
        return Err(ActingError::Inference(format!(
            "model produced {} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }
    Ok(labels
        .iter()
        .map(String::as_str)
        .zip(scores.iter().copied())
        .collect())
}
