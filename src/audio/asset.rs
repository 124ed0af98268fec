use std::path::Path;
use std::time::Duration;

use super::frame::StereoFrame;
use crate::error::AssetError;

/// Channel layout of the source the asset was decoded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelFormat {
    Mono,
    Stereo,
    Multi(u16),
}

impl ChannelFormat {
    pub fn from_channels(channels: u16) -> Self {
        match channels {
            1 => ChannelFormat::Mono,
            2 => ChannelFormat::Stereo,
            n => ChannelFormat::Multi(n),
        }
    }

    pub fn channels(self) -> u16 {
        match self {
            ChannelFormat::Mono => 1,
            ChannelFormat::Stereo => 2,
            ChannelFormat::Multi(n) => n,
        }
    }
}

/// A decoded recording. Immutable once built; the engine reads it through an `Arc`.
#[derive(Clone, Debug)]
pub struct AudioAsset {
    frames: Vec<StereoFrame>, // the audio data array, always stereo internally
    sample_rate: f64,
    channel_format: ChannelFormat,
}

impl AudioAsset {
    pub fn new(
        frames: Vec<StereoFrame>,
        sample_rate: f64,
        channel_format: ChannelFormat,
    ) -> Result<Self, AssetError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(AssetError::InvalidSampleRate(sample_rate));
        }
        Ok(Self { frames, sample_rate, channel_format })
    }

    pub fn frames(&self) -> &[StereoFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channel_format(&self) -> ChannelFormat {
        self.channel_format
    }

    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.frames.len() as f64 / self.sample_rate)
            .unwrap_or(Duration::MAX)
    }

    // Load a WAV file from disk, keeping its native sample rate
    pub fn load_wav(path: &Path) -> Result<Self, AssetError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(AssetError::UnsupportedFormat("zero channels".into()));
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader // float, just pass it through
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => { // int, scale into [-1, 1]
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let frames: Vec<StereoFrame> = if channels == 1 {
            samples.into_iter().map(StereoFrame::mono).collect()
        } else {
            // anything past the first two channels is dropped
            samples
                .chunks_exact(channels)
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect()
        };

        log::debug!(
            "loaded {} frames @ {}Hz ({} ch) from {:?}",
            frames.len(),
            spec.sample_rate,
            channels,
            path
        );
        Self::new(
            frames,
            spec.sample_rate as f64,
            ChannelFormat::from_channels(spec.channels),
        )
    }

    // Write as 32-bit float stereo so nothing is lost between sessions
    pub fn write_wav(&self, path: &Path) -> Result<(), AssetError> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: self.sample_rate.round() as u32,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for f in &self.frames {
            writer.write_sample(f.left)?;
            writer.write_sample(f.right)?;
        }
        writer.finalize()?;
        Ok(())
    }
}
