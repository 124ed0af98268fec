// Effect graph assembly
//
// A graph is a straight chain: source, then whichever of pitch/rate, echo and
// reverb are enabled (always in that order), then the output sink.

use std::sync::Arc;

use super::params::EffectParameters;
use crate::audio::AudioAsset;

/// Reverb always runs at this wet/dry mix; caller-supplied values are ignored.
pub const REVERB_DEFAULT_MIX: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    PitchRate,
    Echo,
    Reverb,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GraphNode {
    Source,
    /// One node carries both adjustments; `rate` is the speed multiplier.
    PitchRate { cents: f32, rate: f32 },
    Echo { mix: f32 },
    Reverb { mix: f32 },
    Output,
}

impl GraphNode {
    pub fn stage_kind(&self) -> Option<StageKind> {
        match self {
            GraphNode::PitchRate { .. } => Some(StageKind::PitchRate),
            GraphNode::Echo { .. } => Some(StageKind::Echo),
            GraphNode::Reverb { .. } => Some(StageKind::Reverb),
            GraphNode::Source | GraphNode::Output => None,
        }
    }
}

/// Built once per play request and never modified afterwards.
#[derive(Clone, Debug)]
pub struct EffectGraph {
    asset: Arc<AudioAsset>,
    nodes: Vec<GraphNode>, // Source first, Output last
}

impl EffectGraph {
    pub fn asset(&self) -> &Arc<AudioAsset> {
        &self.asset
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Processing stages between the endpoints.
    pub fn stages(&self) -> &[GraphNode] {
        &self.nodes[1..self.nodes.len() - 1]
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages().iter().filter_map(GraphNode::stage_kind).collect()
    }

    pub fn is_passthrough(&self) -> bool {
        self.stages().is_empty()
    }

    /// Each adjacent pair is one connection; there are no gaps to fill.
    pub fn connections(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode)> + '_ {
        self.nodes.windows(2).map(|w| (&w[0], &w[1]))
    }

    pub fn effective_rate(&self) -> f32 {
        self.stages()
            .iter()
            .find_map(|n| match n {
                GraphNode::PitchRate { rate, .. } => Some(*rate),
                _ => None,
            })
            .unwrap_or(1.0)
    }
}

pub struct EffectGraphBuilder;

impl EffectGraphBuilder {
    pub fn build(asset: Arc<AudioAsset>, params: &EffectParameters) -> EffectGraph {
        let mut nodes = Vec::with_capacity(5);
        nodes.push(GraphNode::Source);

        if params.has_pitch_rate() {
            nodes.push(GraphNode::PitchRate {
                cents: params.pitch_shift_cents.unwrap_or(0.0),
                rate: params.effective_rate(),
            });
        }
        if params.echo_enabled {
            nodes.push(GraphNode::Echo { mix: params.echo_mix });
        }
        if params.reverb_enabled {
            if params.reverb_mix != REVERB_DEFAULT_MIX {
                log::debug!(
                    "reverb mix {} ignored, using {}",
                    params.reverb_mix,
                    REVERB_DEFAULT_MIX
                );
            }
            nodes.push(GraphNode::Reverb { mix: REVERB_DEFAULT_MIX });
        }

        nodes.push(GraphNode::Output);
        EffectGraph { asset, nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ChannelFormat, StereoFrame};

    fn asset() -> Arc<AudioAsset> {
        Arc::new(
            AudioAsset::new(vec![StereoFrame::zero(); 64], 44100.0, ChannelFormat::Mono).unwrap(),
        )
    }

    #[test]
    fn nothing_enabled_is_passthrough() {
        let graph = EffectGraphBuilder::build(asset(), &EffectParameters::default());
        assert!(graph.is_passthrough());
        assert_eq!(graph.nodes(), &[GraphNode::Source, GraphNode::Output]);
        assert_eq!(graph.connections().count(), 1);
        assert_eq!(graph.effective_rate(), 1.0);
    }

    #[test]
    fn identity_rate_adds_no_stage() {
        let params = EffectParameters { playback_rate: Some(1.0), ..Default::default() };
        assert!(EffectGraphBuilder::build(asset(), &params).is_passthrough());
    }

    #[test]
    fn everything_enabled_is_canonical_order() {
        let params = EffectParameters {
            reverb_enabled: true,
            echo_enabled: true,
            echo_mix: 30.0,
            playback_rate: Some(0.5),
            pitch_shift_cents: Some(1000.0),
            ..Default::default()
        };
        let graph = EffectGraphBuilder::build(asset(), &params);
        assert_eq!(
            graph.kinds(),
            vec![StageKind::PitchRate, StageKind::Echo, StageKind::Reverb]
        );
        assert_eq!(
            graph.stages()[0],
            GraphNode::PitchRate { cents: 1000.0, rate: 0.5 }
        );
        assert_eq!(graph.stages()[1], GraphNode::Echo { mix: 30.0 });
        assert_eq!(graph.effective_rate(), 0.5);
    }

    #[test]
    fn echo_without_reverb() {
        let params = EffectParameters { echo_enabled: true, ..Default::default() };
        let graph = EffectGraphBuilder::build(asset(), &params);
        assert_eq!(
            graph.nodes(),
            &[GraphNode::Source, GraphNode::Echo { mix: 50.0 }, GraphNode::Output]
        );
    }

    #[test]
    fn absent_stages_leave_no_gap() {
        let params = EffectParameters {
            pitch_shift_cents: Some(-500.0),
            reverb_enabled: true,
            ..Default::default()
        };
        let graph = EffectGraphBuilder::build(asset(), &params);
        let pairs: Vec<_> = graph.connections().map(|(a, b)| (*a, *b)).collect();
        assert_eq!(
            pairs,
            vec![
                (GraphNode::Source, GraphNode::PitchRate { cents: -500.0, rate: 1.0 }),
                (
                    GraphNode::PitchRate { cents: -500.0, rate: 1.0 },
                    GraphNode::Reverb { mix: REVERB_DEFAULT_MIX }
                ),
                (GraphNode::Reverb { mix: REVERB_DEFAULT_MIX }, GraphNode::Output),
            ]
        );
    }

    #[test]
    fn reverb_mix_is_fixed() {
        let params = EffectParameters {
            reverb_enabled: true,
            reverb_mix: 90.0,
            ..Default::default()
        };
        let graph = EffectGraphBuilder::build(asset(), &params);
        assert_eq!(graph.stages(), &[GraphNode::Reverb { mix: REVERB_DEFAULT_MIX }]);
    }

    #[test]
    fn build_is_repeatable() {
        let a = asset();
        let params = EffectParameters { echo_enabled: true, ..Default::default() };
        let first = EffectGraphBuilder::build(a.clone(), &params);
        let second = EffectGraphBuilder::build(a, &params);
        assert_eq!(first.nodes(), second.nodes());
    }
}
