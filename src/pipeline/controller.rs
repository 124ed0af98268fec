// Orchestration between the UI adapter and playback sessions.
//
// Every session mutation happens through `&mut self` on the thread that owns
// the controller. Timer threads only post `SessionEvent`s; `poll` drains them
// on the owner's thread, so start, completion and stop never overlap.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use super::graph::EffectGraphBuilder;
use super::params::EffectParameters;
use super::session::{EngineBackend, PlaybackSession, SessionEvent, SessionId};
use crate::audio::AudioAsset;
use crate::error::PlaybackError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayingState {
    Playing,
    NotPlaying,
}

pub struct PlaybackController<B: EngineBackend> {
    backend: B,
    asset: Option<Arc<AudioAsset>>,
    session: Option<PlaybackSession>,
    next_id: u64,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    state: PlayingState,
    observers: Vec<Sender<PlayingState>>,
}

impl<B: EngineBackend> PlaybackController<B> {
    pub fn new(backend: B) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            backend,
            asset: None,
            session: None,
            next_id: 0,
            events_tx,
            events_rx,
            state: PlayingState::NotPlaying,
            observers: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Replace the active recording. Anything still playing the old one stops.
    pub fn set_asset(&mut self, asset: AudioAsset) {
        self.stop_active();
        log::info!(
            "asset set: {} frames @ {}Hz",
            asset.frame_count(),
            asset.sample_rate()
        );
        self.asset = Some(Arc::new(asset));
    }

    pub fn clear_asset(&mut self) {
        self.stop_active();
        self.asset = None;
    }

    pub fn asset(&self) -> Option<&Arc<AudioAsset>> {
        self.asset.as_ref()
    }

    pub fn request_play(&mut self, params: &EffectParameters) -> Result<SessionId, PlaybackError> {
        let asset = self.asset.clone().ok_or(PlaybackError::AssetUnavailable)?;

        // hand the device over: the old session is fully released first
        self.stop_active();

        let id = SessionId(self.next_id);
        self.next_id += 1;

        let graph = EffectGraphBuilder::build(asset, params);
        let session = PlaybackSession::start(id, graph, &self.backend, self.events_tx.clone())?;
        self.session = Some(session);
        self.set_state(PlayingState::Playing);
        Ok(id)
    }

    /// Explicit cancel; same effect as the completion timer firing early.
    pub fn request_stop(&mut self) -> bool {
        self.stop_active()
    }

    /// Handle timer firings on the caller's thread. Returns events handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            handled += 1;
            match event {
                SessionEvent::Completed(id) => {
                    let current = self.session.as_ref().map(PlaybackSession::id);
                    if current == Some(id) {
                        log::debug!("session {} reached its estimated end", id.0);
                        self.stop_active();
                    } else {
                        log::debug!("ignoring completion for stale session {}", id.0);
                    }
                }
            }
        }
        handled
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayingState::Playing
    }

    pub fn playing_state(&self) -> PlayingState {
        self.state
    }

    /// Receive every playing/not-playing transition from now on.
    pub fn subscribe(&mut self) -> Receiver<PlayingState> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.observers.push(tx);
        rx
    }

    pub fn active_session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref().filter(|s| s.is_running())
    }

    fn stop_active(&mut self) -> bool {
        let stopped = match self.session.take() {
            Some(mut session) => session.stop(),
            None => false,
        };
        self.set_state(PlayingState::NotPlaying);
        stopped
    }

    fn set_state(&mut self, state: PlayingState) {
        if self.state == state {
            return;
        }
        self.state = state;
        // observers that hung up are dropped
        self.observers.retain(|tx| tx.send(state).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ChannelFormat, StereoFrame};
    use crate::pipeline::graph::EffectGraph;
    use crate::pipeline::session::RunningEngine;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Fake {
        opened: Cell<usize>,
        halted: Rc<Cell<usize>>,
        fail_next: Cell<bool>,
    }

    struct FakeEngine(Rc<Cell<usize>>);

    impl RunningEngine for FakeEngine {
        fn played_frames(&self) -> u64 {
            0
        }
        fn halt(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    impl EngineBackend for Fake {
        fn open(&self, _graph: &EffectGraph) -> Result<Box<dyn RunningEngine>, PlaybackError> {
            if self.fail_next.replace(false) {
                return Err(PlaybackError::PlaybackStartFailed("device busy".into()));
            }
            self.opened.set(self.opened.get() + 1);
            Ok(Box::new(FakeEngine(self.halted.clone())))
        }
    }

    fn asset(frames: usize) -> AudioAsset {
        AudioAsset::new(vec![StereoFrame::zero(); frames], 1000.0, ChannelFormat::Mono).unwrap()
    }

    #[test]
    fn play_without_asset_is_refused() {
        let mut c = PlaybackController::new(Fake::default());
        let err = c.request_play(&EffectParameters::default()).unwrap_err();
        assert_eq!(err, PlaybackError::AssetUnavailable);
        assert!(!c.is_playing());
        assert_eq!(c.backend().opened.get(), 0);
    }

    #[test]
    fn second_play_replaces_first() {
        let mut c = PlaybackController::new(Fake::default());
        c.set_asset(asset(10_000));
        let first = c.request_play(&EffectParameters::default()).unwrap();
        let second = c.request_play(&EffectParameters::default()).unwrap();
        assert_ne!(first, second);
        assert_eq!(c.active_session().map(PlaybackSession::id), Some(second));
        assert_eq!(c.backend().opened.get(), 2);
        assert_eq!(c.backend().halted.get(), 1);
        assert!(c.is_playing());
    }

    #[test]
    fn stop_twice_releases_once() {
        let mut c = PlaybackController::new(Fake::default());
        c.set_asset(asset(10_000));
        c.request_play(&EffectParameters::default()).unwrap();
        assert!(c.request_stop());
        assert!(!c.request_stop());
        assert_eq!(c.backend().halted.get(), 1);
        assert!(!c.is_playing());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut c = PlaybackController::new(Fake::default());
        c.set_asset(asset(10_000));
        let id = c.request_play(&EffectParameters::default()).unwrap();
        c.request_stop();
        // what a late timer firing looks like
        c.events_tx.send(SessionEvent::Completed(id)).unwrap();
        assert_eq!(c.poll(), 1);
        assert_eq!(c.backend().halted.get(), 1);
        assert!(!c.is_playing());
    }

    #[test]
    fn completion_of_current_session_stops_it() {
        let mut c = PlaybackController::new(Fake::default());
        c.set_asset(asset(10_000));
        let states = c.subscribe();
        let id = c.request_play(&EffectParameters::default()).unwrap();
        c.events_tx.send(SessionEvent::Completed(id)).unwrap();
        c.poll();
        assert!(!c.is_playing());
        assert!(c.active_session().is_none());
        let seen: Vec<_> = states.try_iter().collect();
        assert_eq!(seen, vec![PlayingState::Playing, PlayingState::NotPlaying]);
    }

    #[test]
    fn failed_start_stays_not_playing() {
        let mut c = PlaybackController::new(Fake::default());
        c.set_asset(asset(10_000));
        c.request_play(&EffectParameters::default()).unwrap();
        c.backend().fail_next.set(true);
        let err = c.request_play(&EffectParameters::default()).unwrap_err();
        assert!(matches!(err, PlaybackError::PlaybackStartFailed(_)));
        assert!(!c.is_playing());
        assert!(c.active_session().is_none());
        assert_eq!(c.backend().halted.get(), 1);
    }

    #[test]
    fn new_asset_stops_playback() {
        let mut c = PlaybackController::new(Fake::default());
        c.set_asset(asset(10_000));
        c.request_play(&EffectParameters::default()).unwrap();
        c.set_asset(asset(500));
        assert!(!c.is_playing());
        assert_eq!(c.asset().map(|a| a.frame_count()), Some(500));
    }

    #[test]
    fn no_duplicate_state_notifications() {
        let mut c = PlaybackController::new(Fake::default());
        let states = c.subscribe();
        c.request_stop();
        c.request_stop();
        assert!(states.try_iter().next().is_none());
    }
}
