// Game state machine: which emotion is requested, scoring, and step advance

use crate::config::GameRules;
use crate::emotion::Emotion;
use crate::models::{ClassificationResult, ClassifiedSample, Frame};
use crate::presentation::{Feedback, PresentationSink};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Sleep};
use tracing::{debug, info};

/// How an emotion step ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    GaveUp,
}

/// Where the game is. Only `Awaiting` accepts samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Awaiting(Emotion),
    CoolingDown(Emotion, StepOutcome),
    Done,
}

impl GamePhase {
    pub fn accepts_samples(self) -> bool {
        matches!(self, GamePhase::Awaiting(_))
    }

    /// Emotion currently being requested
    pub fn awaiting(self) -> Option<Emotion> {
        match self {
            GamePhase::Awaiting(emotion) => Some(emotion),
            _ => None,
        }
    }

    pub fn is_done(self) -> bool {
        self == GamePhase::Done
    }
}

/// What handling one classification produced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reaction {
    pub feedback: Feedback,
    /// Set when this result finished the step
    pub finished: Option<StepOutcome>,
}

/// Session state, owned by a single task
#[derive(Debug)]
pub struct GameMachine {
    rules: GameRules,
    phase: GamePhase,
    /// Consecutive non-successes; reset only by a success
    failures: u32,
    /// Results handled since the current step began
    step_attempts: u32,
    captured: Vec<Arc<Frame>>,
}

impl GameMachine {
    pub fn new(rules: GameRules) -> Self {
        Self {
            rules,
            phase: GamePhase::Awaiting(Emotion::first()),
            failures: 0,
            step_attempts: 0,
            captured: Vec::with_capacity(Emotion::ALL.len()),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn captured(&self) -> &[Arc<Frame>] {
        &self.captured
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    fn grade(&self, confidence: f32) -> Feedback {
        if confidence >= self.rules.success_threshold {
            Feedback::Perfect
        } else if confidence >= self.rules.almost_threshold {
            Feedback::AlmostThere
        } else if confidence >= self.rules.trying_threshold {
            Feedback::KeepTrying
        } else {
            Feedback::GiveItAShot
        }
    }

    /// Scores a classification made while `emotion` was requested.
    ///
    /// Returns `None` when the result is stale (the game has moved past
    /// `emotion`) or lacks the emotion's label; state is untouched then.
    /// `latest` is the most recent display frame, captured if the step ends.
    pub fn handle_result(
        &mut self,
        emotion: Emotion,
        result: &ClassificationResult,
        latest: Option<Arc<Frame>>,
    ) -> Option<Reaction> {
        if self.phase != GamePhase::Awaiting(emotion) {
            debug!("Ignoring stale result for {} in {:?}", emotion, self.phase);
            return None;
        }
        let confidence = result.confidence_for(emotion)?;

        self.failures += 1;
        self.step_attempts += 1;

        let mut feedback = self.grade(confidence);
        let finished = if feedback == Feedback::Perfect {
            self.failures = 0;
            Some(StepOutcome::Succeeded)
        } else if self.step_attempts >= self.rules.max_fails {
            feedback = Feedback::MoveOn;
            Some(StepOutcome::GaveUp)
        } else {
            None
        };

        debug!(
            "{} scored {:.2}: {:?} (failures {}, attempts {})",
            emotion, confidence, feedback, self.failures, self.step_attempts
        );

        if let Some(outcome) = finished {
            self.finish_step(emotion, outcome, latest);
        }

        Some(Reaction { feedback, finished })
    }

    fn finish_step(
        &mut self,
        emotion: Emotion,
        outcome: StepOutcome,
        latest: Option<Arc<Frame>>,
    ) {
        if let Some(frame) = latest {
            if self.captured.len() < Emotion::ALL.len() {
                self.captured.push(frame);
            }
        }
        self.phase = GamePhase::CoolingDown(emotion, outcome);
        info!("{} step finished: {:?}", emotion, outcome);
    }

    /// Ends the cooldown and moves to the next emotion, or to `Done`.
    /// Returns the new phase; does nothing outside a cooldown.
    pub fn finish_cooldown(&mut self) -> Option<GamePhase> {
        let GamePhase::CoolingDown(emotion, _) = self.phase else {
            return None;
        };
        self.step_attempts = 0;
        self.phase = match emotion.next() {
            Some(next) => GamePhase::Awaiting(next),
            None => GamePhase::Done,
        };
        info!("Advanced to {:?}", self.phase);
        Some(self.phase)
    }

    /// Hands over the captured images at the end of the game
    pub fn take_captured(&mut self) -> Vec<Arc<Frame>> {
        std::mem::take(&mut self.captured)
    }
}

/// Runs a [`GameMachine`] as an async task.
///
/// Samples arrive on an mpsc channel; the phase is published on a watch
/// channel so the sampler can evaluate its gate without locking.
pub struct GameDriver {
    machine: GameMachine,
    samples: mpsc::UnboundedReceiver<ClassifiedSample>,
    latest_frame: watch::Receiver<Option<Arc<Frame>>>,
    phase_tx: watch::Sender<GamePhase>,
    sink: Arc<dyn PresentationSink>,
}

impl GameDriver {
    pub fn new(
        machine: GameMachine,
        samples: mpsc::UnboundedReceiver<ClassifiedSample>,
        latest_frame: watch::Receiver<Option<Arc<Frame>>>,
        phase_tx: watch::Sender<GamePhase>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            machine,
            samples,
            latest_frame,
            phase_tx,
            sink,
        }
    }

    fn enter_phase(&self, phase: GamePhase) {
        if let GamePhase::Awaiting(emotion) = phase {
            self.sink.set_prompt(emotion.directions());
            self.sink.set_reference(emotion);
            self.sink.set_feedback(Feedback::GiveItAShot);
        }
        self.phase_tx.send_replace(phase);
    }

    /// Plays the game to the end and returns the captured images.
    ///
    /// Ends early, with whatever was captured so far, if every sample sender
    /// is dropped while no cooldown is pending.
    pub async fn run(mut self) -> Vec<Arc<Frame>> {
        self.enter_phase(self.machine.phase());
        let mut cooldown: Option<Pin<Box<Sleep>>> = None;
        let mut samples_open = true;

        loop {
            tokio::select! {
                biased;

                () = async {
                    if let Some(sleep) = cooldown.as_mut() {
                        sleep.as_mut().await
                    }
                }, if cooldown.is_some() => {
                    cooldown = None;
                    match self.machine.finish_cooldown() {
                        Some(GamePhase::Done) => break,
                        Some(phase) => self.enter_phase(phase),
                        None => {}
                    }
                }

                sample = self.samples.recv(), if samples_open => {
                    let Some(sample) = sample else {
                        samples_open = false;
                        if cooldown.is_some() {
                            continue;
                        }
                        break;
                    };
                    let latest = self.latest_frame.borrow().clone();
                    let Some(reaction) =
                        self.machine.handle_result(sample.emotion, &sample.result, latest)
                    else {
                        continue;
                    };
                    self.sink.set_feedback(reaction.feedback);
                    if reaction.finished.is_some() {
                        self.phase_tx.send_replace(self.machine.phase());
                        let deadline = Instant::now() + self.machine.rules().cooldown();
                        cooldown = Some(Box::pin(tokio::time::sleep_until(deadline)));
                    }
                    // dropping the sample reopens the sampler's gate
                    drop(sample);
                }

                else => break,
            }
        }

        let captured = self.machine.take_captured();
        self.phase_tx.send_replace(GamePhase::Done);
        info!("Session finished with {} captured images", captured.len());
        self.sink.show_results(captured.clone());
        captured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct NullSink;

    impl PresentationSink for NullSink {
        fn set_prompt(&self, _text: &str) {}
        fn set_feedback(&self, _feedback: Feedback) {}
        fn set_display(&self, _frame: Arc<Frame>) {}
        fn set_reference(&self, _emotion: Emotion) {}
        fn show_results(&self, _images: Vec<Arc<Frame>>) {}
    }

    fn result(label: &str, confidence: f32) -> ClassificationResult {
        [(label, confidence)].into_iter().collect()
    }

    fn frame() -> Option<Arc<Frame>> {
        Some(Arc::new(Frame::solid(2, 2, [9, 9, 9])))
    }

    #[test]
    fn strong_result_succeeds_immediately() {
        let mut game = GameMachine::new(GameRules::default());
        let reaction = game
            .handle_result(Emotion::Happiness, &result("Happy", 0.9), frame())
            .unwrap();
        assert_eq!(reaction.feedback, Feedback::Perfect);
        assert_eq!(reaction.finished, Some(StepOutcome::Succeeded));
        assert_eq!(game.captured().len(), 1);
        assert_eq!(game.failures(), 0);
        assert_eq!(
            game.phase(),
            GamePhase::CoolingDown(Emotion::Happiness, StepOutcome::Succeeded)
        );
        assert!(!game.phase().accepts_samples());
    }

    #[test]
    fn feedback_follows_thresholds() {
        let mut game = GameMachine::new(GameRules::default());
        let mut feedback = |c| {
            game.handle_result(Emotion::Happiness, &result("Happy", c), frame())
                .unwrap()
                .feedback
        };
        assert_eq!(feedback(0.5), Feedback::AlmostThere);
        assert_eq!(feedback(0.79), Feedback::AlmostThere);
        assert_eq!(feedback(0.3), Feedback::KeepTrying);
        assert_eq!(feedback(0.29), Feedback::GiveItAShot);
        assert_eq!(feedback(0.0), Feedback::GiveItAShot);
    }

    #[test]
    fn tenth_weak_result_gives_up() {
        let mut game = GameMachine::new(GameRules::default());
        for i in 1..10 {
            let reaction = game
                .handle_result(Emotion::Happiness, &result("Happy", 0.1), frame())
                .unwrap();
            assert_eq!(reaction.finished, None);
            assert_eq!(game.failures(), i);
        }
        let reaction = game
            .handle_result(Emotion::Happiness, &result("Happy", 0.1), frame())
            .unwrap();
        assert_eq!(reaction.feedback, Feedback::MoveOn);
        assert_eq!(reaction.finished, Some(StepOutcome::GaveUp));
        assert_eq!(game.captured().len(), 1);
        // giving up does not reset the counter
        assert_eq!(game.failures(), 10);
    }

    #[test]
    fn give_up_budget_restarts_each_step() {
        let mut game = GameMachine::new(GameRules::default());
        for _ in 0..10 {
            game.handle_result(Emotion::Happiness, &result("Happy", 0.1), frame());
        }
        assert_eq!(game.finish_cooldown(), Some(GamePhase::Awaiting(Emotion::Anger)));
        for _ in 0..9 {
            let reaction = game
                .handle_result(Emotion::Anger, &result("Angry", 0.6), frame())
                .unwrap();
            assert_eq!(reaction.finished, None);
        }
        let reaction = game
            .handle_result(Emotion::Anger, &result("Angry", 0.6), frame())
            .unwrap();
        assert_eq!(reaction.finished, Some(StepOutcome::GaveUp));
        assert_eq!(game.failures(), 20);
    }

    #[test]
    fn success_after_failures_resets_counter() {
        let mut game = GameMachine::new(GameRules::default());
        for _ in 0..5 {
            game.handle_result(Emotion::Happiness, &result("Happy", 0.4), frame());
        }
        assert_eq!(game.failures(), 5);
        let reaction = game
            .handle_result(Emotion::Happiness, &result("Happy", 0.8), frame())
            .unwrap();
        assert_eq!(reaction.finished, Some(StepOutcome::Succeeded));
        assert_eq!(game.failures(), 0);
    }

    #[test]
    fn missing_label_changes_nothing() {
        let mut game = GameMachine::new(GameRules::default());
        assert!(game
            .handle_result(Emotion::Happiness, &result("Sad", 0.99), frame())
            .is_none());
        assert_eq!(game.failures(), 0);
        assert_eq!(game.phase(), GamePhase::Awaiting(Emotion::Happiness));
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut game = GameMachine::new(GameRules::default());
        game.handle_result(Emotion::Happiness, &result("Happy", 0.95), frame());
        // still cooling down
        assert!(game
            .handle_result(Emotion::Happiness, &result("Happy", 0.95), frame())
            .is_none());
        game.finish_cooldown();
        // result computed for the previous step
        assert!(game
            .handle_result(Emotion::Happiness, &result("Happy", 0.95), frame())
            .is_none());
        assert_eq!(game.captured().len(), 1);
    }

    #[test]
    fn full_game_captures_one_image_per_step() {
        let mut game = GameMachine::new(GameRules::default());
        for emotion in Emotion::ALL {
            assert_eq!(game.phase(), GamePhase::Awaiting(emotion));
            game.handle_result(emotion, &result(emotion.label(), 0.85), frame());
            game.finish_cooldown();
        }
        assert!(game.phase().is_done());
        assert_eq!(game.captured().len(), 3);
        assert_eq!(game.finish_cooldown(), None);
        assert!(game
            .handle_result(Emotion::Sadness, &result("Sad", 1.0), frame())
            .is_none());
        assert_eq!(game.take_captured().len(), 3);
    }

    #[test]
    fn finish_cooldown_requires_a_cooldown() {
        let mut game = GameMachine::new(GameRules::default());
        assert_eq!(game.finish_cooldown(), None);
        assert_eq!(game.phase(), GamePhase::Awaiting(Emotion::Happiness));
    }

    #[tokio::test(start_paused = true)]
    async fn driver_waits_out_cooldown_before_next_step() {
        let (sample_tx, sample_rx) = mpsc::unbounded_channel();
        let (_frame_tx, frame_rx) = watch::channel(frame());
        let (phase_tx, mut phase_rx) = watch::channel(GamePhase::Awaiting(Emotion::Happiness));
        let driver = GameDriver::new(
            GameMachine::new(GameRules::default()),
            sample_rx,
            frame_rx,
            phase_tx,
            Arc::new(NullSink),
        );
        let task = tokio::spawn(driver.run());

        sample_tx
            .send(ClassifiedSample::new(Emotion::Happiness, result("Happy", 0.9)))
            .unwrap();
        phase_rx
            .wait_for(|phase| matches!(phase, GamePhase::CoolingDown(..)))
            .await
            .unwrap();
        let started = Instant::now();
        phase_rx
            .wait_for(|phase| *phase == GamePhase::Awaiting(Emotion::Anger))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));

        drop(sample_tx);
        let captured = task.await.unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(*phase_rx.borrow(), GamePhase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_finishes_after_last_cooldown() {
        let (sample_tx, sample_rx) = mpsc::unbounded_channel();
        let (_frame_tx, frame_rx) = watch::channel(frame());
        let (phase_tx, mut phase_rx) = watch::channel(GamePhase::Awaiting(Emotion::Happiness));
        let driver = GameDriver::new(
            GameMachine::new(GameRules::default()),
            sample_rx,
            frame_rx,
            phase_tx,
            Arc::new(NullSink),
        );
        let task = tokio::spawn(driver.run());

        for emotion in Emotion::ALL {
            phase_rx
                .wait_for(|phase| *phase == GamePhase::Awaiting(emotion))
                .await
                .unwrap();
            sample_tx
                .send(ClassifiedSample::new(emotion, result(emotion.label(), 0.99)))
                .unwrap();
        }

        let captured = task.await.unwrap();
        assert_eq!(captured.len(), 3);
    }
}
