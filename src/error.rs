// Error types for the playback pipeline

use thiserror::Error;

/// Failures surfaced by `PlaybackController::request_play` and session start
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Nothing has been recorded (or the last recording was discarded)
    #[error("no recorded audio is available to play")]
    AssetUnavailable,

    /// The output engine could not be brought up (device busy, bad format, ...)
    #[error("playback engine failed to start: {0}")]
    PlaybackStartFailed(String),
}

/// Failures while building or decoding an `AudioAsset`
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// The recorder stopped before any frames arrived
    #[error("recording captured no audio")]
    EmptyRecording,

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

/// A user-supplied value that could not be used as typed and was defaulted
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {field} value {input:?}: {reason}")]
pub struct InvalidParameter {
    pub field: &'static str,
    pub input: String,
    pub reason: &'static str,
}
