use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use super::asset::{AudioAsset, ChannelFormat};
use super::frame::StereoFrame;
use crate::error::AssetError;

// longest clip we keep; frames past this are dropped
pub const MAX_RECORD_SECONDS: usize = 30;

/// Captures the default input device until `finish` is called or the clip
/// reaches `MAX_RECORD_SECONDS`.
pub struct Recorder {
    stream: cpal::Stream,
    rx: Receiver<Vec<StereoFrame>>,
    captured: Capture,
    sample_rate: u32,
    channels: u16,
}

// Frames gathered so far, never more than `limit`
struct Capture {
    frames: Vec<StereoFrame>,
    limit: usize,
}

impl Capture {
    fn new(sample_rate: u32) -> Self {
        Self { frames: Vec::new(), limit: sample_rate as usize * MAX_RECORD_SECONDS }
    }

    fn push_block(&mut self, block: &[StereoFrame]) {
        let room = self.limit.saturating_sub(self.frames.len());
        self.frames.extend_from_slice(&block[..block.len().min(room)]);
    }

    fn is_full(&self) -> bool {
        self.frames.len() >= self.limit
    }
}

impl Recorder {
    pub fn start() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host.default_input_device().context("no default input device")?;
        let supported = device
            .default_input_config()
            .context("no default input config")?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            anyhow::bail!("unsupported input sample format (only f32 supported for now)");
        }

        let sample_rate: u32 = supported.sample_rate();
        let channels = supported.channels();
        let width = super::frame_width(channels).context("input device reports zero channels")?;
        let stream_config: cpal::StreamConfig = supported.into();
        let (tx, rx) = crossbeam_channel::bounded::<Vec<StereoFrame>>(2048);

        let stream = build_input_stream(&device, &stream_config, width, tx)?;
        stream.play().context("failed to start input stream")?;
        log::info!("recording started: {}Hz, {} ch", sample_rate, channels);

        Ok(Self { stream, rx, captured: Capture::new(sample_rate), sample_rate, channels })
    }

    // Pull whatever the input callback has delivered so far
    pub fn drain(&mut self) {
        for block in self.rx.try_iter() {
            self.captured.push_block(&block);
        }
    }

    /// The clip has hit `MAX_RECORD_SECONDS`; further input is discarded.
    pub fn is_full(&self) -> bool {
        self.captured.is_full()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn captured_frames(&self) -> usize {
        self.captured.frames.len()
    }

    pub fn finish(mut self) -> Result<AudioAsset, AssetError> {
        if let Err(e) = self.stream.pause() {
            log::warn!("could not pause input stream: {e}");
        }
        self.drain();
        log::info!("recording finished: {} frames", self.captured.frames.len());
        if self.captured.frames.is_empty() {
            return Err(AssetError::EmptyRecording);
        }
        AudioAsset::new(
            std::mem::take(&mut self.captured.frames),
            self.sample_rate as f64,
            ChannelFormat::from_channels(self.channels),
        )
    }
}

fn build_input_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    in_channels: usize,
    tx: Sender<Vec<StereoFrame>>,
) -> anyhow::Result<cpal::Stream> {
    let err_fn = |err| log::error!("audio input stream error: {err}");

    let stream = device
        .build_input_stream(
            config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let frames: Vec<StereoFrame> = if in_channels == 1 {
                    data.iter().map(|&s| StereoFrame::mono(s)).collect()
                } else {
                    data.chunks_exact(in_channels)
                        .map(|c| StereoFrame { left: c[0], right: c[1] })
                        .collect()
                };

                let _ = tx.try_send(frames);
            },
            err_fn,
            None,
        )
        .context("failed to build input stream")?;

    Ok(stream)
}
