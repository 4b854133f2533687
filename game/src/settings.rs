use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_LEVEL_COUNT: u32 = 12;
/// Slowest accepted transit pace.
pub const MIN_CELLS_PER_SECOND: f32 = 0.1;

/// Pacing of the `Resolving` phase shown by an animation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TransitSettings {
    pub cells_per_second: f32,
    pub break_delay_ms: u64,
    pub win_delay_ms: u64,
}

impl Default for TransitSettings {
    fn default() -> Self {
        Self {
            cells_per_second: 15.0,
            break_delay_ms: 200,
            win_delay_ms: 700,
        }
    }
}

impl TransitSettings {
    pub fn clamp(mut self) -> Self {
        if !self.cells_per_second.is_finite() || self.cells_per_second <= 0.0 {
            self.cells_per_second = TransitSettings::default().cells_per_second;
        }
        self.cells_per_second = self.cells_per_second.max(MIN_CELLS_PER_SECOND);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PuzzleSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_level_count")]
    pub level_count: u32,
    /// Directory holding `level{N}.txt` or `level{N}.json`.
    #[serde(default)]
    pub levels_dir: Option<PathBuf>,
    #[serde(default)]
    pub transit: TransitSettings,
}

impl Default for PuzzleSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            level_count: default_level_count(),
            levels_dir: None,
            transit: TransitSettings::default(),
        }
    }
}

impl PuzzleSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.level_count = self.level_count.max(1);
        self.transit = self.transit.clamp();
        self
    }

    /// Path of level `level_id` under `levels_dir`, preferring the text format.
    pub fn level_path(&self, level_id: u32) -> Option<PathBuf> {
        let dir = self.levels_dir.as_deref()?;
        let text = dir.join(format!("level{level_id}.txt"));
        if text.exists() {
            return Some(text);
        }
        Some(dir.join(format!("level{level_id}.json")))
    }
}

fn default_version() -> u32 {
    1
}

fn default_level_count() -> u32 {
    DEFAULT_LEVEL_COUNT
}

/// `$override_var` verbatim, else `$xdg_var/pairslide/<file>`, else `$HOME/<home_dirs>/pairslide/<file>`.
pub(crate) fn user_file(override_var: &str, xdg_var: &str, home_dirs: &[&str], file: &str) -> PathBuf {
    if let Some(explicit) = std::env::var_os(override_var) {
        return PathBuf::from(explicit);
    }

    let base = std::env::var_os(xdg_var)
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .map(|home| home_dirs.iter().fold(PathBuf::from(home), |p, dir| p.join(dir)))
        })
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("pairslide").join(file)
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn from_env() -> Self {
        Self {
            path: user_file("PAIRSLIDE_SETTINGS_PATH", "XDG_CONFIG_HOME", &[".config"], "settings.json"),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> PuzzleSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return PuzzleSettings::default();
        };
        serde_json::from_slice::<PuzzleSettings>(&bytes)
            .map(PuzzleSettings::sanitized)
            .unwrap_or_else(|err| {
                log::warn!("settings file {} unreadable ({err}); using defaults", self.path.display());
                PuzzleSettings::default()
            })
    }

    pub fn save(&self, settings: &PuzzleSettings) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }
}
