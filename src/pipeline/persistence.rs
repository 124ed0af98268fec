// to be called on main startup and quit; saves the effect fields so we can restore them later
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pipeline::params::ParamFields;

pub const VOXFX_DIR: &str = ".voxfx";
const SETTINGS_FILE: &str = "settings.json";
const RECORDING_FILE: &str = "recording.wav";
const LOG_FILE: &str = "voxfx.log";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub fields: ParamFields,
}

// <project_dir>/.voxfx/settings.json
fn settings_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(VOXFX_DIR).join(SETTINGS_FILE)
}

pub fn recording_path(project_dir: &Path) -> PathBuf {
    project_dir.join(VOXFX_DIR).join(RECORDING_FILE)
}

pub fn log_path(project_dir: &Path) -> PathBuf {
    project_dir.join(VOXFX_DIR).join(LOG_FILE)
}

pub fn ensure_dir(project_dir: &Path) -> anyhow::Result<PathBuf> {
    let dir = project_dir.join(VOXFX_DIR);
    std::fs::create_dir_all(&dir)?; // create .voxfx/ if needed
    Ok(dir)
}

// Missing or unreadable settings just mean defaults
pub fn load_settings(project_dir: &Path) -> Option<Settings> {
    let path = settings_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(settings) => Some(settings),
        Err(e) => {
            log::warn!("ignoring unreadable settings at {:?}: {e}", path);
            None
        }
    }
}

pub fn save_settings(project_dir: &Path, settings: &Settings) -> anyhow::Result<()> {
    ensure_dir(project_dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(settings_file_path(project_dir), json)?;
    Ok(())
}
