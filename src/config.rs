// Configuration for the acting game, read from acting.json when present

use crate::error::{ActingError, Result};
use crate::transform::CropPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "acting.json";

/// Which way the camera faces. Front-facing frames are mirrored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraPosition {
    #[default]
    Front,
    Back,
}

/// Capture resolution preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl CaptureQuality {
    pub fn resolution(self) -> (u32, u32) {
        match self {
            CaptureQuality::Low => (320, 240),
            CaptureQuality::Medium => (640, 480),
            CaptureQuality::High => (1280, 720),
        }
    }
}

/// Frame sampling settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Frames between classification attempts
    pub interval: u32,
    /// Side of the square model input
    pub input_size: u32,
    pub crop_policy: CropPolicy,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: 60,
            input_size: 224,
            crop_policy: CropPolicy::Clamp,
        }
    }
}

/// Scoring rules for each emotion step
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub success_threshold: f32,
    pub almost_threshold: f32,
    pub trying_threshold: f32,
    /// Results per step before the game gives up and moves on
    pub max_fails: u32,
    pub cooldown_ms: u64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            success_threshold: 0.8,
            almost_threshold: 0.5,
            trying_threshold: 0.3,
            max_fails: 10,
            cooldown_ms: 3000,
        }
    }
}

impl GameRules {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Emotion model settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Class labels in model output order
    pub labels: Vec<String>,
    /// Set when the model emits logits rather than probabilities
    pub apply_softmax: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/models/emotions.onnx"),
            labels: ["Angry", "Disgust", "Fear", "Happy", "Neutral", "Sad", "Surprise"]
                .into_iter()
                .map(String::from)
                .collect(),
            apply_softmax: true,
        }
    }
}

/// Camera settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub position: CameraPosition,
    pub quality: CaptureQuality,
    pub frame_rate: u32,
    /// Consecutive capture failures tolerated before the stream is reopened
    pub max_frame_errors: u32,
    pub reconnect_attempts: u32,
    pub reconnect_interval_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            position: CameraPosition::Front,
            quality: CaptureQuality::Medium,
            frame_rate: 30,
            max_frame_errors: 30,
            reconnect_attempts: 10,
            reconnect_interval_ms: 3000,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActingConfig {
    pub sampling: SamplingConfig,
    pub rules: GameRules,
    pub model: ModelConfig,
    pub camera: CameraConfig,
    pub assets_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Default for ActingConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            rules: GameRules::default(),
            model: ModelConfig::default(),
            camera: CameraConfig::default(),
            assets_dir: PathBuf::from("assets"),
            log_file: PathBuf::from("emotion_acting.log"),
        }
    }
}

impl ActingConfig {
    /// Loads `acting.json` from `dir`, falling back to defaults when absent
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: ActingConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling.interval == 0 {
            return Err(ActingError::Config(
                "sampling.interval must be at least 1".to_string(),
            ));
        }
        if self.sampling.input_size == 0 {
            return Err(ActingError::Config(
                "sampling.input_size must be non-zero".to_string(),
            ));
        }
        if self.rules.max_fails == 0 {
            return Err(ActingError::Config(
                "rules.max_fails must be at least 1".to_string(),
            ));
        }
        let rules = &self.rules;
        let thresholds = [
            rules.success_threshold,
            rules.almost_threshold,
            rules.trying_threshold,
        ];
        if thresholds.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(ActingError::Config(
                "thresholds must lie in [0, 1]".to_string(),
            ));
        }
        if !(rules.success_threshold >= rules.almost_threshold
            && rules.almost_threshold >= rules.trying_threshold)
        {
            return Err(ActingError::Config(
                "thresholds must be ordered success >= almost >= trying".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_game_constants() {
        let config = ActingConfig::default();
        assert_eq!(config.sampling.interval, 60);
        assert_eq!(config.sampling.input_size, 224);
        assert_eq!(config.rules.success_threshold, 0.8);
        assert_eq!(config.rules.max_fails, 10);
        assert_eq!(config.rules.cooldown(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = ActingConfig::from_json(
            r#"{ "sampling": { "interval": 15, "crop_policy": "width_based" },
                 "camera": { "quality": "high", "position": "back" } }"#,
        )
        .unwrap();
        assert_eq!(config.sampling.interval, 15);
        assert_eq!(config.sampling.crop_policy, CropPolicy::WidthBased);
        assert_eq!(config.sampling.input_size, 224);
        assert_eq!(config.camera.quality.resolution(), (1280, 720));
        assert_eq!(config.camera.position, CameraPosition::Back);
        assert_eq!(config.rules.max_fails, 10);
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let err = ActingConfig::from_json(r#"{ "rules": { "almost_threshold": 0.9 } }"#)
            .unwrap_err();
        assert!(matches!(err, ActingError::Config(_)));
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(ActingConfig::from_json(r#"{ "sampling": { "interval": 0 } }"#).is_err());
    }

    #[test]
    fn load_reads_file_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ActingConfig::load(dir.path()).unwrap().rules.max_fails, 10);

        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "rules": { "max_fails": 4, "cooldown_ms": 10 } }"#,
        )
        .unwrap();
        let config = ActingConfig::load(dir.path()).unwrap();
        assert_eq!(config.rules.max_fails, 4);
        assert_eq!(config.rules.cooldown(), Duration::from_millis(10));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert!(matches!(
            ActingConfig::load(dir.path()),
            Err(ActingError::Json(_))
        ));
    }
}
