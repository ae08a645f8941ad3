// ONNX Runtime backed emotion classifier

use crate::classifier::{label_scores, softmax, EmotionClassifier};
use crate::config::ModelConfig;
use crate::error::{ActingError, Result};
use crate::models::ClassificationResult;
use crate::transform::to_chw_tensor;
use image::RgbImage;
use ort::session::Session;
use ort::value::Value;
use std::sync::Mutex;
use tracing::{error, info};

/// Emotion classifier using ONNX Runtime
pub struct OnnxEmotionClassifier {
    session: Mutex<Session>,
    labels: Vec<String>,
    apply_softmax: bool,
}

impl OnnxEmotionClassifier {
    /// Creates a new classifier by loading the configured ONNX model
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| {
                ActingError::ModelLoad(format!("Failed to create session builder: {e}"))
            })?
            .commit_from_file(&config.path)
            .map_err(|e| {
                error!("Failed to load ONNX model {:?}: {}", config.path, e);
                ActingError::ModelLoad(format!("ONNX model load failed: {e}"))
            })?;

        if config.labels.is_empty() {
            return Err(ActingError::ModelLoad(
                "model label list is empty".to_string(),
            ));
        }

        info!(
            "Loaded emotion model {:?} with {} labels",
            config.path,
            config.labels.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            labels: config.labels.clone(),
            apply_softmax: config.apply_softmax,
        })
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn predict(&self, input: &RgbImage) -> Result<ClassificationResult> {
        let (width, height) = input.dimensions();
        let chw_data = to_chw_tensor(input);

        // [1, 3, H, W]
        let input_array = ndarray::Array4::from_shape_vec(
            (1, 3, height as usize, width as usize),
            chw_data,
        )
        .map_err(|e| ActingError::Inference(format!("Failed to create input array: {e}")))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ActingError::Inference(format!("Failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ActingError::Inference("model session lock poisoned".to_string()))?;

        let outputs = session.run(ort::inputs![input_tensor])?;

        let (_, output_value) = outputs
            .iter()
            .next()
            .ok_or_else(|| ActingError::Inference("No output from model".to_string()))?;

        let (_, scores) = output_value.try_extract_tensor::<f32>()?;

        if self.apply_softmax {
            label_scores(&self.labels, &softmax(scores))
        } else {
            label_scores(&self.labels, scores)
        }
    }
}
