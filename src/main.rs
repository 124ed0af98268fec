use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;
use anyhow::Context;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use voxfx::audio::{AudioAsset, CpalBackend};
use voxfx::middle::Middle;
use voxfx::pipeline::{persistence, PlaybackController};
use voxfx::shared::InputEvent;
use voxfx::tui;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(project_dir: &std::path::Path) -> anyhow::Result<()> {
    // log to a file; stderr would scribble over the TUI
    persistence::ensure_dir(project_dir)?;
    let path = persistence::log_path(project_dir);
    let file = File::create(&path).with_context(|| format!("could not create {:?}", path))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    init_logging(&project_dir)?;
    log::info!("voxfx starting in {:?}", project_dir);

    let settings = persistence::load_settings(&project_dir).unwrap_or_default();
    let mut middle = Middle::new(
        PlaybackController::new(CpalBackend),
        settings.fields,
        &project_dir,
    );

    // pick up the last clip if there is one
    let recording = persistence::recording_path(&project_dir);
    if recording.exists() {
        match AudioAsset::load_wav(&recording) {
            Ok(asset) => middle.controller.set_asset(asset),
            Err(e) => log::warn!("could not reload {:?}: {e}", recording),
        }
    }

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = std::time::Duration::from_millis(16); // ~60fps
    let blink_start = Instant::now();

    loop {
        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;
        // timer firings are handled here, on the UI thread
        middle.tick();
        let ds = middle.display_state();

        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, blink_on);
        })?;

        let events = tui::input::poll_input(tick_rate)?;
        for event in events {
            if event == InputEvent::Quit {
                middle.handle_input(event);
                let settings = persistence::Settings { fields: middle.fields.clone() };
                if let Err(e) = persistence::save_settings(&project_dir, &settings) {
                    log::warn!("could not save settings: {e:#}");
                }
                log::info!("voxfx exiting");
                return Ok(());
            }
            middle.handle_input(event);
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
