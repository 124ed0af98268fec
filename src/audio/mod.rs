use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;

use crate::error::PlaybackError;
use crate::pipeline::graph::EffectGraph;
use crate::pipeline::session::{EngineBackend, RunningEngine};

mod asset;
mod effect;
mod engine;
mod frame;
pub mod recorder;

pub use asset::{AudioAsset, ChannelFormat};
pub use effect::{Echo, Effect, PitchShifter, Reverb};
pub use engine::{Engine, EngineProgress};
pub use frame::StereoFrame;

// largest block rendered in one go; bigger callbacks are split
const MAX_BLOCK_FRAMES: usize = 4096;

/// Plays graphs on the host's default output device.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpalBackend;

impl EngineBackend for CpalBackend {
    fn open(&self, graph: &EffectGraph) -> Result<Box<dyn RunningEngine>, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| start_failed("no default output device"))?;
        let supported = device.default_output_config().map_err(start_failed)?;

        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(start_failed("unsupported sample format (only f32 supported for now)"));
        }

        let output_rate: u32 = supported.sample_rate();
        let channels = frame_width(supported.channels())
            .ok_or_else(|| start_failed("device reports zero channels"))?;
        let config: cpal::StreamConfig = supported.into();

        let engine = Engine::new(graph, output_rate);
        let progress = engine.progress();
        let stream = build_output_stream_f32(&device, &config, engine, channels)?;
        // a stream that fails to play is dropped here, so nothing stays wired
        stream.play().map_err(start_failed)?;

        log::info!("output stream started: {}Hz, {} ch", output_rate, channels);
        Ok(Box::new(CpalPlayback { stream: Some(stream), progress }))
    }
}

fn start_failed(err: impl std::fmt::Display) -> PlaybackError {
    PlaybackError::PlaybackStartFailed(err.to_string())
}

// samples per interleaved frame; a zero-channel device can't be driven
fn frame_width(channels: u16) -> Option<usize> {
    (channels > 0).then_some(channels as usize)
}

struct CpalPlayback {
    stream: Option<cpal::Stream>,
    progress: Arc<EngineProgress>,
}

impl RunningEngine for CpalPlayback {
    fn played_frames(&self) -> u64 {
        self.progress.played_frames()
    }

    fn halt(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("could not pause output stream: {e}");
            }
            // dropping the stream closes the device; it can't be resumed
            drop(stream);
            log::debug!(
                "output stream released after {} frames (finished: {})",
                self.progress.played_frames(),
                self.progress.is_finished()
            );
        }
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: Engine,
    channels: usize,
) -> Result<cpal::Stream, PlaybackError> {
    let mut scratch = vec![StereoFrame::zero(); MAX_BLOCK_FRAMES];
    let err_fn = |err| log::error!("audio output stream error: {err}");

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                for chunk in data.chunks_mut(MAX_BLOCK_FRAMES * channels) {
                    let n_frames = chunk.len() / channels;
                    let frames = &mut scratch[..n_frames];
                    engine.render_block(frames);

                    for (out, f) in chunk.chunks_exact_mut(channels).zip(frames.iter()) {
                        match out {
                            [mono] => *mono = 0.5 * (f.left + f.right),
                            [l, r, rest @ ..] => {
                                *l = f.left;
                                *r = f.right;
                                rest.fill(0.0);
                            }
                            [] => {}
                        }
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(start_failed)
}
