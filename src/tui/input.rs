use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crate::shared::InputEvent;

// poll for input from the terminal and translate key presses into input events
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code).into_iter().collect());
    }
    Ok(vec![])
}

pub fn handle_key(code: KeyCode) -> Option<InputEvent> {
    let event = match code {
        KeyCode::Esc => InputEvent::Quit,
        KeyCode::Char(' ') => InputEvent::PlayPress,
        KeyCode::Char('r') => InputEvent::RecordPress,
        KeyCode::Char('e') => InputEvent::ToggleEcho,
        KeyCode::Char('v') => InputEvent::ToggleReverb,
        KeyCode::Tab => InputEvent::NextField,
        KeyCode::Backspace => InputEvent::Backspace,

        // anything that can appear in a number goes to the focused field
        KeyCode::Char(c @ ('0'..='9' | '.' | '-')) => InputEvent::TypeChar(c),

        _ => return None,
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_events() {
        assert_eq!(handle_key(KeyCode::Char(' ')), Some(InputEvent::PlayPress));
        assert_eq!(handle_key(KeyCode::Char('7')), Some(InputEvent::TypeChar('7')));
        assert_eq!(handle_key(KeyCode::Char('-')), Some(InputEvent::TypeChar('-')));
        assert_eq!(handle_key(KeyCode::Tab), Some(InputEvent::NextField));
        assert_eq!(handle_key(KeyCode::Char('z')), None);
    }
}
