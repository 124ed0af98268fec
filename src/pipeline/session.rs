// One run of an effect graph, from engine start to teardown.

use std::time::Duration;

use crossbeam_channel::Sender;

use super::graph::EffectGraph;
use super::timer::CompletionTimer;
use crate::audio::AudioAsset;
use crate::error::PlaybackError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Delivered to the controller's context; never acted on where it is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Completed(SessionId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Stopped,
}

/// Something that can bring a graph up on an output device.
///
/// `open` must either return a streaming engine or leave nothing running.
pub trait EngineBackend {
    fn open(&self, graph: &EffectGraph) -> Result<Box<dyn RunningEngine>, PlaybackError>;
}

/// A live engine. `halt` is a full reset: a halted engine is never restarted.
pub trait RunningEngine {
    fn played_frames(&self) -> u64;
    fn halt(&mut self);
}

/// Wall-clock seconds until the asset finishes, assuming playback proceeds
/// from `played_frames` right now at a constant `rate`.
pub fn estimate_completion_secs(asset: &AudioAsset, played_frames: u64, rate: f32) -> f64 {
    let remaining = asset.frame_count().saturating_sub(played_frames);
    let mut secs = remaining as f64 / asset.sample_rate();
    let rate = rate as f64;
    if rate.is_finite() && rate > 0.0 && rate != 1.0 {
        secs /= rate;
    }
    secs
}

pub fn estimate_completion(asset: &AudioAsset, played_frames: u64, rate: f32) -> Duration {
    let secs = estimate_completion_secs(asset, played_frames, rate);
    if secs.is_finite() && secs > 0.0 {
        // tiny rates push this past what a Duration can hold
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

pub struct PlaybackSession {
    id: SessionId,
    graph: EffectGraph,
    engine: Option<Box<dyn RunningEngine>>,
    timer: Option<CompletionTimer>,
    state: SessionState,
}

impl PlaybackSession {
    pub fn start(
        id: SessionId,
        graph: EffectGraph,
        backend: &dyn EngineBackend,
        events: Sender<SessionEvent>,
    ) -> Result<Self, PlaybackError> {
        let mut engine = backend.open(&graph).inspect_err(|e| {
            log::error!("session {}: {e}", id.0);
        })?;

        let delay = estimate_completion(graph.asset(), engine.played_frames(), graph.effective_rate());
        let timer = match CompletionTimer::arm(id, delay, events) {
            Ok(timer) => timer,
            Err(e) => {
                engine.halt();
                log::error!("session {}: could not arm completion timer: {e}", id.0);
                return Err(PlaybackError::PlaybackStartFailed(format!(
                    "could not arm completion timer: {e}"
                )));
            }
        };

        log::info!(
            "session {} started: stages {:?}, completion in {:.3}s",
            id.0,
            graph.kinds(),
            delay.as_secs_f64()
        );

        Ok(Self {
            id,
            graph,
            engine: Some(engine),
            timer: Some(timer),
            state: SessionState::Running,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn graph(&self) -> &EffectGraph {
        &self.graph
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn expected_duration(&self) -> Option<Duration> {
        self.timer.as_ref().map(CompletionTimer::delay)
    }

    /// Idempotent teardown. Returns whether anything was actually released.
    pub fn stop(&mut self) -> bool {
        let mut released = false;
        if let Some(mut timer) = self.timer.take() {
            released |= timer.cancel();
        }
        if let Some(mut engine) = self.engine.take() {
            engine.halt();
            released = true;
        }
        self.state = SessionState::Stopped;
        if released {
            log::info!("session {} stopped", self.id.0);
        }
        released
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}
