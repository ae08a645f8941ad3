// Library exports for the emotion acting game

#[cfg(feature = "camera")]
pub mod camera;
pub mod classifier;
pub mod config;
pub mod emotion;
pub mod error;
pub mod game;
pub mod image_manager;
pub mod models;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod presentation;
pub mod sampler;
pub mod session;
pub mod transform;
#[cfg(feature = "gui")]
pub mod ui;

pub use classifier::EmotionClassifier;
pub use config::ActingConfig;
pub use emotion::Emotion;
pub use error::{ActingError, Result};
pub use game::{GamePhase, StepOutcome};
pub use models::{ClassificationResult, Frame};
pub use presentation::{Feedback, PresentationSink};
pub use session::{start_session, SessionHandle};
