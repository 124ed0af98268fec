pub mod controller;
pub mod graph;
pub mod params;
pub mod persistence;
pub mod session;
pub mod timer;

pub use controller::{PlaybackController, PlayingState};
pub use graph::{EffectGraph, EffectGraphBuilder, GraphNode, StageKind, REVERB_DEFAULT_MIX};
pub use params::{EffectParameters, ParamFields, ParsedParameters};
pub use session::{
    estimate_completion, estimate_completion_secs, EngineBackend, PlaybackSession, RunningEngine,
    SessionEvent, SessionId, SessionState,
};
