// Frame sampling and the single-flight classification gate

use crate::classifier::EmotionClassifier;
use crate::config::SamplingConfig;
use crate::emotion::Emotion;
use crate::error::Result;
use crate::game::GamePhase;
use crate::models::{ClassificationResult, ClassifiedSample, Frame};
use crate::presentation::PresentationSink;
use crate::transform::{center_crop, resize_square};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Counts accepted frames and fires every `interval`-th one
#[derive(Debug, Clone)]
pub struct SampleCounter {
    interval: u32,
    count: u32,
}

impl SampleCounter {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            count: 0,
        }
    }

    /// Counts one frame; true when it should be classified
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.interval {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Single-flight permit: set while held, cleared on drop
#[derive(Debug)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    /// Takes the permit unless a classification is already outstanding
    pub fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// What happened to a delivered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    /// Could not be cropped; nothing shown
    Dropped,
    /// Shown only; the gate was closed
    Gated,
    /// Shown and counted
    Displayed,
    /// Shown and sent to the classifier
    Submitted,
}

/// Sampling & gate controller.
///
/// Owned by the capture thread; `on_frame` never blocks on the classifier.
pub struct FrameSampler {
    config: SamplingConfig,
    counter: SampleCounter,
    latest: watch::Sender<Option<Arc<Frame>>>,
    phase: watch::Receiver<GamePhase>,
    in_flight: Arc<AtomicBool>,
    classifier: Arc<dyn EmotionClassifier>,
    samples: mpsc::UnboundedSender<ClassifiedSample>,
    sink: Arc<dyn PresentationSink>,
    runtime: Handle,
}

impl FrameSampler {
    pub fn new(
        config: SamplingConfig,
        phase: watch::Receiver<GamePhase>,
        classifier: Arc<dyn EmotionClassifier>,
        samples: mpsc::UnboundedSender<ClassifiedSample>,
        sink: Arc<dyn PresentationSink>,
        runtime: Handle,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            counter: SampleCounter::new(config.interval),
            config,
            latest,
            phase,
            in_flight: Arc::new(AtomicBool::new(false)),
            classifier,
            samples,
            sink,
            runtime,
        }
    }

    /// Subscribes to the most recent display frame
    pub fn latest_frame(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.latest.subscribe()
    }

    /// True while a classification is running or its result has not yet
    /// been handled by the game
    pub fn is_classifying(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// True once the game has ended or was dropped; no frame will be
    /// classified again
    pub fn is_finished(&self) -> bool {
        self.phase.borrow().is_done() || self.phase.has_changed().is_err()
    }

    /// Handles one camera frame
    pub fn on_frame(&mut self, frame: Frame) -> FrameDecision {
        let square = match center_crop(&frame, self.config.crop_policy) {
            Ok(square) => Arc::new(square),
            Err(e) => {
                debug!("Dropping frame: {}", e);
                return FrameDecision::Dropped;
            }
        };
        self.sink.set_display(square.clone());
        self.latest.send_replace(Some(square.clone()));

        let Some(emotion) = self.phase.borrow().awaiting() else {
            return FrameDecision::Gated;
        };
        if self.is_classifying() {
            return FrameDecision::Gated;
        }
        if !self.counter.tick() {
            return FrameDecision::Displayed;
        }
        let Some(permit) = InFlight::acquire(&self.in_flight) else {
            return FrameDecision::Gated;
        };

        self.submit(emotion, square, permit);
        FrameDecision::Submitted
    }

    fn submit(&self, emotion: Emotion, square: Arc<Frame>, permit: InFlight) {
        let classifier = self.classifier.clone();
        let samples = self.samples.clone();
        let input_size = self.config.input_size;

        debug!("Submitting {}x{} frame for {}", square.width, square.height, emotion);
        self.runtime.spawn_blocking(move || {
            match classify(classifier.as_ref(), &square, input_size) {
                Ok(result) if result.confidence_for(emotion).is_some() => {
                    debug!("Classified frame for {}: {}", emotion, result);
                    // the game releases the permit once it has handled the sample
                    let _ = samples.send(ClassifiedSample {
                        emotion,
                        result,
                        permit: Some(permit),
                    });
                }
                Ok(result) => {
                    debug!("Result has no {} label: {}", emotion.label(), result);
                }
                Err(e) => {
                    warn!("Classification failed, dropping frame: {}", e);
                }
            }
        });
    }
}

fn classify(
    classifier: &dyn EmotionClassifier,
    square: &Frame,
    input_size: u32,
) -> Result<ClassificationResult> {
    let input = resize_square(square, input_size)?;
    classifier.predict(&input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_fires_every_interval() {
        let mut counter = SampleCounter::new(60);
        let fired: Vec<u32> = (1..=179).filter(|_| counter.tick()).collect();
        assert_eq!(fired, vec![60, 120]);
        assert_eq!(counter.count(), 59);
        assert!(counter.tick());
    }

    #[test]
    fn counter_interval_of_one_fires_every_frame() {
        let mut counter = SampleCounter::new(1);
        assert!((0..5).all(|_| counter.tick()));
    }

    #[test]
    fn permit_is_exclusive_and_released_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        let permit = InFlight::acquire(&flag).unwrap();
        assert!(flag.load(Ordering::Acquire));
        assert!(InFlight::acquire(&flag).is_none());
        drop(permit);
        assert!(!flag.load(Ordering::Acquire));
        assert!(InFlight::acquire(&flag).is_some());
    }
}
