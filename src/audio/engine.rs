use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::asset::AudioAsset;
use super::effect::{Echo, Effect, PitchShifter, Reverb};
use super::frame::StereoFrame;
use crate::pipeline::graph::{EffectGraph, GraphNode};

/// Counters the audio thread publishes for the session side to read.
#[derive(Debug, Default)]
pub struct EngineProgress {
    played: AtomicU64,
    finished: AtomicBool,
}

impl EngineProgress {
    pub fn played_frames(&self) -> u64 {
        self.played.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Renders one effect graph. Lives inside the output callback, so nothing
/// here allocates after construction.
pub struct Engine {
    asset: Arc<AudioAsset>,
    pos: f64,  // read position in asset frames
    step: f64, // asset frames advanced per output frame
    chain: Vec<Box<dyn Effect>>,
    progress: Arc<EngineProgress>,
}

impl Engine {
    pub fn new(graph: &EffectGraph, output_rate: u32) -> Self {
        let asset = graph.asset().clone();
        let out_rate = output_rate as f32;
        let mut rate = 1.0f64;
        let mut chain: Vec<Box<dyn Effect>> = Vec::new();

        // wire the units in the order the builder laid them out
        for node in graph.stages() {
            match *node {
                GraphNode::PitchRate { cents, rate: r } => {
                    rate = r as f64;
                    if cents != 0.0 {
                        chain.push(Box::new(PitchShifter::new(cents, out_rate)));
                    }
                }
                GraphNode::Echo { mix } => chain.push(Box::new(Echo::new(mix, out_rate))),
                GraphNode::Reverb { mix } => chain.push(Box::new(Reverb::new(mix, out_rate))),
                GraphNode::Source | GraphNode::Output => {}
            }
        }

        let step = rate * asset.sample_rate() / output_rate as f64;
        log::debug!(
            "engine: units {:?}, step {:.4} ({}Hz asset -> {}Hz out)",
            chain.iter().map(|e| e.name()).collect::<Vec<_>>(),
            step,
            asset.sample_rate(),
            output_rate
        );

        Self {
            asset,
            pos: 0.0,
            step,
            chain,
            progress: Arc::new(EngineProgress::default()),
        }
    }

    #[cfg(test)]
    fn unit_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|e| e.name()).collect()
    }

    pub fn progress(&self) -> Arc<EngineProgress> {
        self.progress.clone()
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        let data = self.asset.frames();
        let len = data.len();

        for frame in out.iter_mut() {
            let i = self.pos as usize;
            if i >= len {
                *frame = StereoFrame::zero();
                continue;
            }
            // linear interpolation between neighbouring frames
            let frac = (self.pos - i as f64) as f32;
            let s0 = data[i];
            let s1 = data.get(i + 1).copied().unwrap_or(s0);
            *frame = StereoFrame::lerp(s0, s1, frac);
            self.pos += self.step;
        }

        // effects keep running past the end so tails ring out
        for effect in self.chain.iter_mut() {
            effect.process(out);
        }

        let played = (self.pos as u64).min(len as u64);
        self.progress.played.store(played, Ordering::Relaxed);
        if played >= len as u64 {
            self.progress.finished.store(true, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ChannelFormat;
    use crate::pipeline::graph::EffectGraphBuilder;
    use crate::pipeline::params::EffectParameters;

    fn ramp_asset(frames: usize, rate: f64) -> Arc<AudioAsset> {
        let data = (0..frames).map(|i| StereoFrame::mono(i as f32)).collect();
        Arc::new(AudioAsset::new(data, rate, ChannelFormat::Mono).unwrap())
    }

    #[test]
    fn passthrough_plays_asset_verbatim() {
        let asset = ramp_asset(8, 1000.0);
        let graph = EffectGraphBuilder::build(asset, &EffectParameters::default());
        let mut engine = Engine::new(&graph, 1000);
        let progress = engine.progress();

        let mut out = vec![StereoFrame::zero(); 4];
        engine.render_block(&mut out);
        assert_eq!(out[3], StereoFrame::mono(3.0));
        assert_eq!(progress.played_frames(), 4);
        assert!(!progress.is_finished());

        let mut out = vec![StereoFrame::zero(); 6];
        engine.render_block(&mut out);
        assert_eq!(out[3], StereoFrame::mono(7.0));
        assert_eq!(out[4], StereoFrame::zero());
        assert_eq!(progress.played_frames(), 8);
        assert!(progress.is_finished());
    }

    #[test]
    fn rate_changes_read_speed() {
        let asset = ramp_asset(100, 1000.0);
        let params = EffectParameters { playback_rate: Some(2.0), ..Default::default() };
        let graph = EffectGraphBuilder::build(asset, &params);
        let mut engine = Engine::new(&graph, 1000);

        let mut out = vec![StereoFrame::zero(); 10];
        engine.render_block(&mut out);
        assert_eq!(out[5], StereoFrame::mono(10.0));
        assert_eq!(engine.progress().played_frames(), 20);
    }

    #[test]
    fn units_follow_builder_order() {
        let params = EffectParameters {
            pitch_shift_cents: Some(-300.0),
            playback_rate: Some(1.5),
            echo_enabled: true,
            reverb_enabled: true,
            ..Default::default()
        };
        let graph = EffectGraphBuilder::build(ramp_asset(100, 1000.0), &params);
        let engine = Engine::new(&graph, 1000);
        assert_eq!(engine.unit_names(), vec!["pitch", "echo", "reverb"]);
        assert_eq!(engine.step, 1.5);

        let params = EffectParameters { reverb_enabled: true, ..Default::default() };
        let graph = EffectGraphBuilder::build(ramp_asset(100, 1000.0), &params);
        assert_eq!(Engine::new(&graph, 1000).unit_names(), vec!["reverb"]);
    }

    #[test]
    fn zero_cents_applies_rate_without_shifter() {
        let params = EffectParameters {
            pitch_shift_cents: Some(0.0),
            playback_rate: Some(2.0),
            ..Default::default()
        };
        let graph = EffectGraphBuilder::build(ramp_asset(100, 1000.0), &params);
        assert!(matches!(
            graph.stages()[0],
            GraphNode::PitchRate { cents, rate } if cents == 0.0 && rate == 2.0
        ));

        let mut engine = Engine::new(&graph, 1000);
        assert!(engine.unit_names().is_empty());
        assert_eq!(engine.step, 2.0);

        let mut out = vec![StereoFrame::zero(); 4];
        engine.render_block(&mut out);
        assert_eq!(out[3], StereoFrame::mono(6.0));
    }

    #[test]
    fn output_rate_mismatch_is_resampled() {
        let asset = ramp_asset(100, 500.0);
        let graph = EffectGraphBuilder::build(asset, &EffectParameters::default());
        let mut engine = Engine::new(&graph, 1000);

        let mut out = vec![StereoFrame::zero(); 4];
        engine.render_block(&mut out);
        assert_eq!(out[1], StereoFrame::mono(0.5));
        assert_eq!(out[2], StereoFrame::mono(1.0));
    }
}
