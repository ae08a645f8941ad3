// Wires the sampler and the game together for one acting session

use crate::classifier::EmotionClassifier;
use crate::config::ActingConfig;
use crate::game::{GameDriver, GameMachine, GamePhase};
use crate::models::Frame;
use crate::presentation::PresentationSink;
use crate::sampler::FrameSampler;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

/// Handle to a running session's game task
pub struct SessionHandle {
    phase: watch::Receiver<GamePhase>,
    task: JoinHandle<Vec<Arc<Frame>>>,
}

impl SessionHandle {
    pub fn phase(&self) -> GamePhase {
        *self.phase.borrow()
    }

    /// Watch channel following the game phase
    pub fn subscribe(&self) -> watch::Receiver<GamePhase> {
        self.phase.clone()
    }

    pub fn is_done(&self) -> bool {
        self.phase().is_done()
    }

    /// Stops the game, dropping any pending cooldown
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Waits for the game to end and returns the captured images.
    /// A cancelled session yields no images.
    pub async fn finished(self) -> Vec<Arc<Frame>> {
        self.task.await.unwrap_or_default()
    }
}

/// Starts a session on `runtime`.
///
/// Returns the sampler, to be driven by the frame source, and a handle to
/// the game task.
pub fn start_session(
    config: &ActingConfig,
    classifier: Arc<dyn EmotionClassifier>,
    sink: Arc<dyn PresentationSink>,
    runtime: &Handle,
) -> (FrameSampler, SessionHandle) {
    let machine = GameMachine::new(config.rules.clone());
    let (phase_tx, phase_rx) = watch::channel(machine.phase());
    let (sample_tx, sample_rx) = mpsc::unbounded_channel();

    let sampler = FrameSampler::new(
        config.sampling.clone(),
        phase_rx.clone(),
        classifier,
        sample_tx,
        sink.clone(),
        runtime.clone(),
    );
    let driver = GameDriver::new(machine, sample_rx, sampler.latest_frame(), phase_tx, sink);
    let task = runtime.spawn(driver.run());
    info!(
        "Acting session started (every {} frames, {}ms cooldown)",
        config.sampling.interval, config.rules.cooldown_ms
    );

    (
        sampler,
        SessionHandle {
            phase: phase_rx,
            task,
        },
    )
}
