pub mod audio;
pub mod error;
pub mod middle;
pub mod pipeline;
pub mod shared;
pub mod tui;

pub use error::{AssetError, InvalidParameter, PlaybackError};
