// The thin adapter between UI events and the playback controller. The TUI
// never touches the pipeline directly; it sends InputEvents here and renders
// whatever display_state() returns.

use std::path::{Path, PathBuf};

use crate::audio::recorder::Recorder;
use crate::audio::AudioAsset;
use crate::error::AssetError;
use crate::pipeline::persistence;
use crate::pipeline::{EffectParameters, EngineBackend, ParamFields, PlaybackController};
use crate::shared::{DisplayState, InputEvent, ParamField};

const MAX_FIELD_LEN: usize = 8;

pub struct Middle<B: EngineBackend> {
    pub controller: PlaybackController<B>,
    pub fields: ParamFields,
    focus: ParamField,
    recorder: Option<Recorder>,
    status: String,
    project_dir: PathBuf,
}

impl<B: EngineBackend> Middle<B> {
    pub fn new(controller: PlaybackController<B>, fields: ParamFields, project_dir: &Path) -> Self {
        Self {
            controller,
            fields,
            focus: ParamField::Pitch,
            recorder: None,
            status: String::from("press r to record"),
            project_dir: project_dir.to_path_buf(),
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::RecordPress => self.toggle_recording(),
            InputEvent::PlayPress => self.toggle_playback(),
            InputEvent::NextField => self.focus = self.focus.next(),
            InputEvent::TypeChar(c) => {
                let text = self.focus.text_mut(&mut self.fields);
                if (c.is_ascii_digit() || c == '.' || c == '-') && text.len() < MAX_FIELD_LEN {
                    text.push(c);
                }
            }
            InputEvent::Backspace => {
                self.focus.text_mut(&mut self.fields).pop();
            }
            InputEvent::ToggleEcho => self.fields.echo_enabled = !self.fields.echo_enabled,
            InputEvent::ToggleReverb => self.fields.reverb_enabled = !self.fields.reverb_enabled,
            InputEvent::Quit => {
                self.controller.request_stop();
            }
        }
    }

    // Called every UI frame: deliver timer firings and drain the mic
    pub fn tick(&mut self) {
        let was_playing = self.controller.is_playing();
        self.controller.poll();
        if was_playing && !self.controller.is_playing() {
            self.status = String::from("done");
        }
        if let Some(rec) = self.recorder.as_mut() {
            rec.drain();
        }
        if self.recorder.as_ref().is_some_and(Recorder::is_full) {
            log::info!("recording hit the length cap, finishing");
            self.finish_recording();
        }
    }

    pub fn display_state(&self) -> DisplayState {
        let recorded_secs = match (&self.recorder, self.controller.asset()) {
            (Some(rec), _) => rec.captured_frames() as f32 / rec.sample_rate() as f32,
            (None, Some(asset)) => asset.duration().as_secs_f32(),
            (None, None) => 0.0,
        };
        DisplayState {
            playing: self.controller.is_playing(),
            recording: self.recorder.is_some(),
            recorded_secs,
            has_asset: self.controller.asset().is_some(),
            fields: self.fields.clone(),
            focus: self.focus,
            status_text: self.status.clone(),
        }
    }

    pub fn on_recording_complete(&mut self, result: Result<AudioAsset, AssetError>) {
        let asset = match result {
            Ok(asset) => asset,
            Err(e) => {
                // failed capture leaves the previous clip in place
                log::warn!("recording discarded: {e}");
                self.status = format!("record failed: {e}");
                return;
            }
        };

        let path = persistence::recording_path(&self.project_dir);
        let saved = persistence::ensure_dir(&self.project_dir)
            .and_then(|_| Ok(asset.write_wav(&path)?));
        if let Err(e) = saved {
            log::warn!("could not save recording to {:?}: {e:#}", path);
        }

        self.status = format!("recorded {:.1}s", asset.duration().as_secs_f32());
        self.controller.set_asset(asset);
    }

    fn finish_recording(&mut self) {
        if let Some(rec) = self.recorder.take() {
            let result = rec.finish();
            self.on_recording_complete(result);
        }
    }

    fn toggle_recording(&mut self) {
        if self.recorder.is_some() {
            self.finish_recording();
            return;
        }

        self.controller.request_stop();
        match Recorder::start() {
            Ok(rec) => {
                self.recorder = Some(rec);
                self.status = String::from("recording... press r to stop");
            }
            Err(e) => {
                log::error!("could not start recording: {e:#}");
                self.status = format!("mic unavailable: {e}");
            }
        }
    }

    fn toggle_playback(&mut self) {
        if self.controller.is_playing() {
            self.controller.request_stop();
            self.status = String::from("stopped");
            return;
        }
        if self.recorder.is_some() {
            self.status = String::from("stop recording first");
            return;
        }

        let parsed = EffectParameters::parse(&self.fields);
        match self.controller.request_play(&parsed.params) {
            Ok(_) => {
                self.status = match parsed.issues.first() {
                    Some(issue) => format!("playing ({issue})"),
                    None => String::from("playing"),
                };
            }
            Err(e) => self.status = e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ChannelFormat, StereoFrame};
    use crate::error::PlaybackError;
    use crate::pipeline::{EffectGraph, RunningEngine};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Fake {
        graphs: RefCell<Vec<EffectGraph>>,
    }

    struct Idle;

    impl RunningEngine for Idle {
        fn played_frames(&self) -> u64 {
            0
        }
        fn halt(&mut self) {}
    }

    impl EngineBackend for Fake {
        fn open(&self, graph: &EffectGraph) -> Result<Box<dyn RunningEngine>, PlaybackError> {
            self.graphs.borrow_mut().push(graph.clone());
            Ok(Box::new(Idle))
        }
    }

    fn middle(dir: &Path) -> Middle<Fake> {
        Middle::new(PlaybackController::new(Fake::default()), ParamFields::default(), dir)
    }

    fn clip() -> AudioAsset {
        AudioAsset::new(vec![StereoFrame::zero(); 44100], 44100.0, ChannelFormat::Mono).unwrap()
    }

    #[test]
    fn typing_goes_to_focused_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = middle(dir.path());
        for c in ['-', '3', 'x', '0', '0'] {
            m.handle_input(InputEvent::TypeChar(c));
        }
        m.handle_input(InputEvent::NextField);
        m.handle_input(InputEvent::TypeChar('2'));
        m.handle_input(InputEvent::Backspace);
        m.handle_input(InputEvent::TypeChar('3'));
        assert_eq!(m.fields.pitch, "-300");
        assert_eq!(m.fields.rate, "3");
        assert_eq!(m.display_state().focus, ParamField::Rate);
    }

    #[test]
    fn play_without_recording_reports_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = middle(dir.path());
        m.handle_input(InputEvent::PlayPress);
        let ds = m.display_state();
        assert!(!ds.playing);
        assert_eq!(ds.status_text, PlaybackError::AssetUnavailable.to_string());
    }

    #[test]
    fn completed_recording_is_saved_and_playable() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = middle(dir.path());
        m.on_recording_complete(Ok(clip()));
        assert!(persistence::recording_path(dir.path()).exists());

        m.handle_input(InputEvent::ToggleEcho);
        m.handle_input(InputEvent::PlayPress);
        assert!(m.display_state().playing);
        let graphs = m.controller.backend().graphs.borrow();
        assert_eq!(graphs.len(), 1);
        assert_eq!(graphs[0].kinds(), vec![crate::pipeline::StageKind::Echo]);
    }

    #[test]
    fn failed_recording_keeps_previous_clip() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = middle(dir.path());
        m.on_recording_complete(Ok(clip()));
        m.on_recording_complete(Err(AssetError::EmptyRecording));
        let ds = m.display_state();
        assert!(ds.has_asset);
        assert!((ds.recorded_secs - 1.0).abs() < 1e-6);
    }

    #[test]
    fn play_press_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = middle(dir.path());
        m.on_recording_complete(Ok(clip()));
        m.handle_input(InputEvent::PlayPress);
        m.handle_input(InputEvent::PlayPress);
        assert!(!m.display_state().playing);
        assert_eq!(m.display_state().status_text, "stopped");
    }
}
