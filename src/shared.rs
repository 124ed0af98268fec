// Types shared between the TUI and the middle layer.
//
// Keys:
//   r             //  RecordPress (start / stop capture)
//   Space         //  PlayPress (play with current fields / stop)
//   Tab           //  NextField
//   0-9 . -       //  TypeChar into the focused field
//   Backspace     //  Backspace
//   e             //  ToggleEcho
//   v             //  ToggleReverb
//   Esc           //  Quit
//
// The TUI just renders the DisplayState it gets from the middle layer every frame.

use crate::pipeline::ParamFields;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    RecordPress,
    PlayPress,
    NextField,
    TypeChar(char),
    Backspace,
    ToggleEcho,
    ToggleReverb,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamField {
    Pitch,
    Rate,
    EchoMix,
}

impl ParamField {
    pub const ALL: [ParamField; 3] = [ParamField::Pitch, ParamField::Rate, ParamField::EchoMix];

    pub fn next(self) -> Self {
        match self {
            ParamField::Pitch => ParamField::Rate,
            ParamField::Rate => ParamField::EchoMix,
            ParamField::EchoMix => ParamField::Pitch,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParamField::Pitch => "PITCH (cents)",
            ParamField::Rate => "RATE (x)",
            ParamField::EchoMix => "ECHO MIX (%)",
        }
    }

    pub fn text(self, fields: &ParamFields) -> &str {
        match self {
            ParamField::Pitch => &fields.pitch,
            ParamField::Rate => &fields.rate,
            ParamField::EchoMix => &fields.echo_mix,
        }
    }

    pub fn text_mut(self, fields: &mut ParamFields) -> &mut String {
        match self {
            ParamField::Pitch => &mut fields.pitch,
            ParamField::Rate => &mut fields.rate,
            ParamField::EchoMix => &mut fields.echo_mix,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub playing: bool,
    pub recording: bool,
    pub recorded_secs: f32, // live while recording, else length of the current clip
    pub has_asset: bool,
    pub fields: ParamFields,
    pub focus: ParamField,
    pub status_text: String,
}
