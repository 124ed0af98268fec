// Effect parameters, and the permissive parse from the UI's text fields.

use serde::{Deserialize, Serialize};

use super::graph::REVERB_DEFAULT_MIX;
use crate::error::InvalidParameter;

pub const DEFAULT_ECHO_MIX: f32 = 50.0;

/// Snapshot of the effect controls taken at each play request.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectParameters {
    pub pitch_shift_cents: Option<f32>, // None = no shift
    pub playback_rate: Option<f32>,     // None or 0 = 1.0
    pub echo_enabled: bool,
    pub echo_mix: f32, // 0-100
    pub reverb_enabled: bool,
    pub reverb_mix: f32, // accepted but the builder always uses its own default
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            pitch_shift_cents: None,
            playback_rate: None,
            echo_enabled: false,
            echo_mix: DEFAULT_ECHO_MIX,
            reverb_enabled: false,
            reverb_mix: REVERB_DEFAULT_MIX,
        }
    }
}

impl EffectParameters {
    /// The speed multiplier actually applied. Anything unusable means 1.0.
    pub fn effective_rate(&self) -> f32 {
        match self.playback_rate {
            Some(r) if r.is_finite() && r > 0.0 => r,
            _ => 1.0,
        }
    }

    pub fn has_pitch_rate(&self) -> bool {
        self.pitch_shift_cents.is_some() || self.effective_rate() != 1.0
    }

    /// Build parameters from raw UI fields. Never fails: bad values are
    /// defaulted and reported in `issues`.
    pub fn parse(fields: &ParamFields) -> ParsedParameters {
        let mut issues = Vec::new();

        let pitch_shift_cents = parse_optional("pitch", &fields.pitch, &mut issues);

        let playback_rate = match parse_optional("rate", &fields.rate, &mut issues) {
            Some(r) if r <= 0.0 => {
                issues.push(InvalidParameter {
                    field: "rate",
                    input: fields.rate.clone(),
                    reason: "rate must be positive, using 1.0",
                });
                Some(1.0)
            }
            other => other,
        };

        let echo_mix = parse_optional("echo mix", &fields.echo_mix, &mut issues)
            .unwrap_or(DEFAULT_ECHO_MIX);

        for issue in &issues {
            log::warn!("{issue}");
        }

        ParsedParameters {
            params: EffectParameters {
                pitch_shift_cents,
                playback_rate,
                echo_enabled: fields.echo_enabled,
                echo_mix,
                reverb_enabled: fields.reverb_enabled,
                ..Default::default()
            },
            issues,
        }
    }
}

fn parse_optional(
    field: &'static str,
    input: &str,
    issues: &mut Vec<InvalidParameter>,
) -> Option<f32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f32>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            issues.push(InvalidParameter {
                field,
                input: input.to_string(),
                reason: "not a number, ignoring",
            });
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedParameters {
    pub params: EffectParameters,
    pub issues: Vec<InvalidParameter>,
}

/// What the UI layer hands over: text fields and toggles, unvalidated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamFields {
    pub pitch: String,
    pub rate: String,
    pub echo_mix: String,
    pub echo_enabled: bool,
    pub reverb_enabled: bool,
}
