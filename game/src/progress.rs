use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{controller::WinReport, scoring::MAX_SCORE, settings::user_file};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelRecord {
    pub level: u32,
    pub unlocked: bool,
    pub score: u8,
}

/// What a single `record_score` call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressChange {
    pub improved: bool,
    pub newly_unlocked: Option<u32>,
}

/// Per-level best scores and unlock flags. Scores only ever ratchet upward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelProgress {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    levels: Vec<LevelRecord>,
}

fn default_version() -> u32 {
    1
}

impl LevelProgress {
    pub fn new(level_count: u32) -> Self {
        let levels = (1..=level_count.max(1))
            .map(|level| LevelRecord {
                level,
                unlocked: level == 1,
                score: 0,
            })
            .collect();
        Self {
            version: default_version(),
            levels,
        }
    }

    /// Reshapes loaded data to `level_count` levels, keeping what matches.
    fn normalized(self, level_count: u32) -> Self {
        let mut out = Self::new(level_count);
        for stored in self.levels {
            if let Some(record) = out.record_mut(stored.level) {
                record.unlocked |= stored.unlocked;
                record.score = stored.score.min(MAX_SCORE);
            }
        }
        out
    }

    pub fn levels(&self) -> &[LevelRecord] {
        &self.levels
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    fn record(&self, level: u32) -> Option<&LevelRecord> {
        self.levels.iter().find(|r| r.level == level)
    }

    fn record_mut(&mut self, level: u32) -> Option<&mut LevelRecord> {
        self.levels.iter_mut().find(|r| r.level == level)
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        level == 1 || self.record(level).is_some_and(|r| r.unlocked)
    }

    pub fn score(&self, level: u32) -> u8 {
        self.record(level).map_or(0, |r| r.score)
    }

    pub fn total_stars(&self) -> u32 {
        self.levels.iter().map(|r| u32::from(r.score)).sum()
    }

    /// Returns `true` if the level was locked before this call.
    pub fn unlock(&mut self, level: u32) -> bool {
        match self.record_mut(level) {
            Some(record) if !record.unlocked => {
                record.unlocked = true;
                true
            }
            _ => false,
        }
    }

    /// Stores `max(existing, score)` and unlocks the next level on any non-zero score.
    /// Unknown level ids are ignored.
    pub fn record_score(&mut self, level: u32, score: u8) -> ProgressChange {
        let score = score.min(MAX_SCORE);
        let Some(record) = self.record_mut(level) else {
            log::warn!("ignoring score for unknown level {level}");
            return ProgressChange::default();
        };

        let improved = score > record.score;
        if improved {
            record.score = score;
        }

        let newly_unlocked = if score > 0 && self.unlock(level + 1) {
            Some(level + 1)
        } else {
            None
        };

        if improved || newly_unlocked.is_some() {
            log::info!("progress: level {level} best {}, unlocked {newly_unlocked:?}", self.score(level));
        }
        ProgressChange {
            improved,
            newly_unlocked,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.level_count());
    }
}

/// File-backed progress handle, constructed explicitly and handed to whoever persists wins.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn from_env() -> Self {
        Self::at(user_file(
            "PAIRSLIDE_PROGRESS_PATH",
            "XDG_DATA_HOME",
            &[".local", "share"],
            "progress.json",
        ))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing files give fresh progress; corrupt ones are logged and replaced by fresh progress.
    pub fn load(&self, level_count: u32) -> LevelProgress {
        let Ok(bytes) = fs::read(&self.path) else {
            return LevelProgress::new(level_count);
        };
        match serde_json::from_slice::<LevelProgress>(&bytes) {
            Ok(progress) => progress.normalized(level_count),
            Err(err) => {
                log::warn!("progress file {} unreadable ({err}); starting fresh", self.path.display());
                LevelProgress::new(level_count)
            }
        }
    }

    pub fn save(&self, progress: &LevelProgress) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(progress)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        atomic_write(&self.path, json.as_bytes())
    }

    pub fn record_win(&self, progress: &mut LevelProgress, report: &WinReport) -> io::Result<ProgressChange> {
        let change = progress.record_score(report.level_id, report.score.total);
        self.save(progress)?;
        Ok(change)
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    if fs::rename(&tmp, path).is_err() {
        // Renaming over an existing file is not atomic everywhere; fall back to a copy.
        fs::copy(&tmp, path)?;
        let _ = fs::remove_file(&tmp);
    }
    Ok(())
}
