// Core data models for the acting game

use crate::emotion::Emotion;
use crate::error::{ActingError, Result};
use crate::sampler::InFlight;
use image::RgbImage;
use std::collections::HashMap;

/// Represents a single video frame with RGB data
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Raw RGB pixel data (width * height * 3 bytes)
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Frame {
    /// Creates a new Frame with the given parameters
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Creates a frame filled with a single colour
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::new(data, width, height)
    }

    /// Wraps an RGB image buffer without copying
    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    /// Copies the pixels into an RGB image buffer.
    ///
    /// Fails when the frame is empty or the buffer does not match the
    /// declared dimensions.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        if self.width == 0 || self.height == 0 {
            return Err(ActingError::Preprocessing(format!(
                "empty frame {}x{}",
                self.width, self.height
            )));
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            ActingError::Preprocessing(format!(
                "buffer of {} bytes does not fit {}x{} RGB",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Converts the RGB data into RGBA for texture upload
    pub fn to_rgba(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect()
    }
}

/// Output of one classifier invocation: label -> confidence in [0, 1]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassificationResult {
    probabilities: HashMap<String, f32>,
}

impl ClassificationResult {
    /// Creates a result from a label/confidence mapping
    pub fn new(probabilities: HashMap<String, f32>) -> Self {
        Self { probabilities }
    }

    /// Confidence for an arbitrary label
    pub fn confidence(&self, label: &str) -> Option<f32> {
        self.probabilities.get(label).copied()
    }

    /// Confidence for the classifier label belonging to `emotion`
    pub fn confidence_for(&self, emotion: Emotion) -> Option<f32> {
        self.confidence(emotion.label())
    }

    /// Highest scoring label, if any
    pub fn top(&self) -> Option<(&str, f32)> {
        self.probabilities
            .iter()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(label, p)| (label.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for ClassificationResult {
    fn from_iter<I: IntoIterator<Item = (S, f32)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl std::fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.top() {
            Some((label, p)) => write!(f, "{} ({}% confidence)", label, (p * 100.0).round()),
            None => write!(f, "no prediction"),
        }
    }
}

/// A classification tagged with the emotion that was requested when its
/// frame was submitted.
///
/// Holds the sampler's in-flight permit; the next frame can only be
/// submitted once the game has handled and dropped this sample.
#[derive(Debug)]
pub struct ClassifiedSample {
    pub emotion: Emotion,
    pub result: ClassificationResult,
    pub(crate) permit: Option<InFlight>,
}

impl ClassifiedSample {
    pub fn new(emotion: Emotion, result: ClassificationResult) -> Self {
        Self {
            emotion,
            result,
            permit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_image_round_trip_keeps_pixels() {
        let frame = Frame::solid(4, 2, [10, 20, 30]);
        let image = frame.to_rgb_image().unwrap();
        assert_eq!(image.get_pixel(3, 1).0, [10, 20, 30]);
        assert_eq!(Frame::from_rgb_image(image), frame);
    }

    #[test]
    fn mismatched_buffer_is_a_preprocessing_error() {
        let frame = Frame::new(vec![0; 5], 2, 2);
        assert!(matches!(
            frame.to_rgb_image(),
            Err(ActingError::Preprocessing(_))
        ));
        assert!(Frame::new(Vec::new(), 0, 0).to_rgb_image().is_err());
    }

    #[test]
    fn rgba_conversion_adds_opaque_alpha() {
        let frame = Frame::solid(1, 1, [1, 2, 3]);
        assert_eq!(frame.to_rgba(), vec![1, 2, 3, 255]);
    }

    #[test]
    fn result_looks_up_emotion_labels() {
        let result: ClassificationResult = [("Happy", 0.7), ("Sad", 0.2)].into_iter().collect();
        assert_eq!(result.confidence_for(Emotion::Happiness), Some(0.7));
        assert_eq!(result.confidence_for(Emotion::Anger), None);
        assert_eq!(result.top(), Some(("Happy", 0.7)));
        assert_eq!(result.to_string(), "Happy (70% confidence)");
    }
}
