use crate::shared::{DisplayState, ParamField};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // transport: record / play indicator
            Constraint::Length(7), // effect fields + toggles
            Constraint::Length(3), // status line
            Constraint::Min(0),
        ])
        .split(area);

    draw_transport(frame, sections[0], state, blink_on);
    draw_fields(frame, sections[1], state);
    draw_status(frame, sections[2], state);
}

fn draw_transport(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let (label, color) = if state.recording {
        (if blink_on { "● REC" } else { "  REC" }, Color::Red)
    } else if state.playing {
        ("■ STOP", Color::Green) // same button, shows what pressing it does
    } else if state.has_asset {
        ("▶ PLAY", Color::White)
    } else {
        ("no clip", Color::DarkGray)
    };

    let line = Line::from(vec![
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(format!("   {:.1}s", state.recorded_secs)),
    ]);
    let block = Block::default().borders(Borders::ALL).title(" voxfx ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_fields(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mut lines: Vec<Line> = ParamField::ALL
        .iter()
        .map(|&field| {
            let focused = field == state.focus;
            let style = if focused {
                Style::default().fg(Color::Black).bg(Color::LightMagenta)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(format!("{:<15}", field.label())),
                Span::styled(format!("[{:<8}]", field.text(&state.fields)), style),
            ])
        })
        .collect();

    lines.push(toggle_line("ECHO   (e)", state.fields.echo_enabled));
    lines.push(toggle_line("REVERB (v)", state.fields.reverb_enabled));

    let block = Block::default().borders(Borders::ALL).title(" effects (tab to switch) ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn toggle_line(label: &'static str, on: bool) -> Line<'static> {
    let (text, color) = if on { ("ON ", Color::LightGreen) } else { ("OFF", Color::DarkGray) };
    Line::from(vec![
        Span::raw(format!("{:<15}", label)),
        Span::styled(text, Style::default().fg(color)),
    ])
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let block = Block::default().borders(Borders::ALL);
    let text = format!("{}   (r record, space play/stop, esc quit)", state.status_text);
    frame.render_widget(Paragraph::new(text).block(block), area);
}
