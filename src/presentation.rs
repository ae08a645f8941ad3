// Outputs from the game to whatever renders it

use crate::emotion::Emotion;
use crate::models::Frame;
use std::sync::Arc;

/// Feedback line shown after each classification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    Perfect,
    AlmostThere,
    KeepTrying,
    GiveItAShot,
    MoveOn,
}

impl Feedback {
    pub fn text(self) -> &'static str {
        match self {
            Feedback::Perfect => "Yes, that's perfect!",
            Feedback::AlmostThere => "You're almost there!",
            Feedback::KeepTrying => "Keep trying...",
            Feedback::GiveItAShot => "Give it a shot",
            Feedback::MoveOn => "OK, cut! Let's just move on...",
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Receives everything the player should see.
///
/// Calls arrive from the capture thread (`set_display`) and from the game
/// task (everything else); implementations hand the values over to their
/// own UI thread.
pub trait PresentationSink: Send + Sync {
    /// Prompt for the emotion being requested
    fn set_prompt(&self, text: &str);

    fn set_feedback(&self, feedback: Feedback);

    /// Latest square camera frame
    fn set_display(&self, frame: Arc<Frame>);

    /// Reference picture for the emotion being requested
    fn set_reference(&self, emotion: Emotion);

    /// Captured frames, one per finished step, in game order
    fn show_results(&self, images: Vec<Arc<Frame>>);
}
