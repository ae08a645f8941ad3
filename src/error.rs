// Error types for the emotion acting game

use thiserror::Error;

/// Main error type for the acting game
#[derive(Debug, Error)]
pub enum ActingError {
    #[error("Camera initialization failed: {0}")]
    CameraInit(String),

    #[error("Camera access denied")]
    CameraAccessDenied,

    #[error("Frame processing failed: {0}")]
    FrameProcessing(String),

    #[error("Preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Image loading failed: {0}")]
    ImageLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for acting game operations
pub type Result<T> = std::result::Result<T, ActingError>;

// Conversion from nokhwa errors
#[cfg(feature = "camera")]
impl From<nokhwa::NokhwaError> for ActingError {
    fn from(err: nokhwa::NokhwaError) -> Self {
        match err {
            nokhwa::NokhwaError::StructureError { structure, error } => {
                ActingError::CameraInit(format!("{structure}: {error}"))
            }
            nokhwa::NokhwaError::OpenDeviceError(device, error) => {
                if error.to_lowercase().contains("permission") {
                    ActingError::CameraAccessDenied
                } else {
                    ActingError::CameraInit(format!("Device {device}: {error}"))
                }
            }
            nokhwa::NokhwaError::ReadFrameError(error) => ActingError::FrameProcessing(error),
            _ => ActingError::CameraInit(err.to_string()),
        }
    }
}

// Conversion from ONNX Runtime errors
#[cfg(feature = "onnx")]
impl From<ort::Error> for ActingError {
    fn from(err: ort::Error) -> Self {
        ActingError::Inference(err.to_string())
    }
}
