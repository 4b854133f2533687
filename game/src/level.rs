use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    character::{Character, PerCharacter},
    grid::{CellKind, DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH, Grid, Vec2i},
};

pub const HEAVY_START_GLYPH: char = 'H';
pub const LIGHT_START_GLYPH: char = 'L';
/// Start glyphs used by older level files.
pub const HEAVY_START_ALIAS: char = 'B';
pub const LIGHT_START_ALIAS: char = 'S';

/// Largest cell count a level may declare.
pub const MAX_GRID_CELLS: usize = 1 << 20;

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("level grid must be non-empty, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    #[error("level grid {width}x{height} exceeds the cell limit")]
    GridTooLarge { width: usize, height: usize },
    #[error("level has no {} start position", .0.label())]
    MissingStart(Character),
    #[error("{what} at {pos} lies outside the {width}x{height} grid")]
    OutOfBounds {
        what: &'static str,
        pos: Vec2i,
        width: usize,
        height: usize,
    },
    #[error("both characters start on {0}")]
    StartsOverlap(Vec2i),
    #[error("{} start {pos} is on a {kind:?} cell it cannot occupy", .who.label())]
    StartBlocked {
        who: Character,
        pos: Vec2i,
        kind: CellKind,
    },
    #[error("line {line}: unknown layout glyph {glyph:?}")]
    UnknownGlyph { line: usize, glyph: char },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("failed reading level: {0}")]
    Io(#[from] io::Error),
    #[error("failed parsing level json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Designer-authored level: dimensions, start cells, typed tile lists and par values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    pub heavy_start: Vec2i,
    pub light_start: Vec2i,
    #[serde(default)]
    pub walls: Vec<Vec2i>,
    #[serde(default)]
    pub invisible: Vec<Vec2i>,
    #[serde(default)]
    pub heavy_lanes: Vec<Vec2i>,
    #[serde(default)]
    pub light_lanes: Vec<Vec2i>,
    #[serde(default)]
    pub breakables: Vec<Vec2i>,
    #[serde(default)]
    pub heavy_finishes: Vec<Vec2i>,
    #[serde(default)]
    pub light_finishes: Vec<Vec2i>,
    #[serde(default)]
    pub heavy_par: u32,
    #[serde(default)]
    pub light_par: u32,
}

fn default_width() -> usize {
    DEFAULT_GRID_WIDTH
}

fn default_height() -> usize {
    DEFAULT_GRID_HEIGHT
}

impl LevelDescriptor {
    /// An empty `width`x`height` room with the given starts and no tiles.
    pub fn open(width: usize, height: usize, heavy_start: Vec2i, light_start: Vec2i) -> Self {
        Self {
            name: String::new(),
            width,
            height,
            heavy_start,
            light_start,
            walls: Vec::new(),
            invisible: Vec::new(),
            heavy_lanes: Vec::new(),
            light_lanes: Vec::new(),
            breakables: Vec::new(),
            heavy_finishes: Vec::new(),
            light_finishes: Vec::new(),
            heavy_par: 0,
            light_par: 0,
        }
    }

    /// Bordered room used by loaders that choose to substitute a layout for a missing file.
    pub fn fallback(level_id: u32) -> Self {
        let width = DEFAULT_GRID_WIDTH as i32;
        let height = DEFAULT_GRID_HEIGHT as i32;
        let mut level = Self::open(
            DEFAULT_GRID_WIDTH,
            DEFAULT_GRID_HEIGHT,
            Vec2i::new(1, 1),
            Vec2i::new(5, 1),
        );
        level.name = format!("Default Level {level_id}");
        for x in 0..width {
            level.walls.push(Vec2i::new(x, 0));
            level.walls.push(Vec2i::new(x, height - 1));
        }
        for y in 1..height - 1 {
            level.walls.push(Vec2i::new(0, y));
            level.walls.push(Vec2i::new(width - 1, y));
        }
        level.heavy_finishes.push(Vec2i::new(5, 8));
        level.light_finishes.push(Vec2i::new(1, 8));
        level
    }

    /// Builds a descriptor from layout rows (top row first). Width is the longest row.
    pub fn from_rows(rows: &[&str]) -> Result<Self, LevelError> {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        check_size(width, rows.len())?;
        let rows: Vec<(usize, &str)> = rows
            .iter()
            .copied()
            .enumerate()
            .map(|(i, r)| (i + 1, r))
            .collect();
        parse_layout(String::new(), width, rows.len(), &rows)
    }

    /// Parses the text level format: name, `WIDTH HEIGHT`, layout rows, then optional par lines.
    pub fn parse_text(text: &str) -> Result<Self, LevelError> {
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim_end()));

        let name = match lines.next() {
            Some((_, name)) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                return Err(LevelError::Parse {
                    line: 1,
                    message: "missing level name".to_string(),
                });
            }
        };

        let (width, height) = match lines.next() {
            Some((line, dims)) => parse_dimensions(line, dims)?,
            None => (DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT),
        };

        let rows: Vec<(usize, &str)> = lines.by_ref().take(height).collect();
        let mut level = parse_layout(name, width, height, &rows)?;

        let mut pars = lines.filter(|(_, l)| !l.trim().is_empty());
        if let Some((line, text)) = pars.next() {
            level.heavy_par = parse_par(line, text)?;
        }
        if let Some((line, text)) = pars.next() {
            level.light_par = parse_par(line, text)?;
        }

        Ok(level)
    }

    /// Loads a level file: `.json` as serde JSON, anything else as the text format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&text)?)
        } else {
            Self::parse_text(&text)
        }
    }

    pub fn start(&self, who: Character) -> Vec2i {
        match who {
            Character::Heavy => self.heavy_start,
            Character::Light => self.light_start,
        }
    }

    pub fn starts(&self) -> PerCharacter<Vec2i> {
        PerCharacter::new(self.heavy_start, self.light_start)
    }

    pub fn par(&self, who: Character) -> u32 {
        match who {
            Character::Heavy => self.heavy_par,
            Character::Light => self.light_par,
        }
    }

    fn layers(&self) -> [(&'static str, &[Vec2i], CellKind); 7] {
        [
            ("wall", self.walls.as_slice(), CellKind::Wall),
            ("invisible block", self.invisible.as_slice(), CellKind::Invisible),
            ("heavy lane", self.heavy_lanes.as_slice(), CellKind::HeavyOnly),
            ("light lane", self.light_lanes.as_slice(), CellKind::LightOnly),
            ("heavy finish", self.heavy_finishes.as_slice(), CellKind::HeavyFinish),
            ("light finish", self.light_finishes.as_slice(), CellKind::LightFinish),
            ("breakable", self.breakables.as_slice(), CellKind::Breakable),
        ]
    }

    /// Validates the descriptor and translates it into a grid. Later layers win on shared cells.
    pub fn build_grid(&self) -> Result<Grid, LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        check_size(self.width, self.height)?;

        let mut grid = Grid::new(self.width, self.height);
        for (what, positions, kind) in self.layers() {
            for &pos in positions {
                if !grid.in_bounds(pos) {
                    return Err(self.out_of_bounds(what, pos));
                }
                grid.set_at(pos, kind);
            }
        }

        for who in Character::ALL {
            let pos = self.start(who);
            let Some(kind) = grid.at(pos) else {
                return Err(self.out_of_bounds(
                    match who {
                        Character::Heavy => "heavy start",
                        Character::Light => "light start",
                    },
                    pos,
                ));
            };
            // A start on a breakable would leave it unconsumed under the character.
            if kind.blocks(who) || kind == CellKind::Breakable {
                return Err(LevelError::StartBlocked { who, pos, kind });
            }
        }

        if self.heavy_start == self.light_start {
            return Err(LevelError::StartsOverlap(self.heavy_start));
        }

        Ok(grid)
    }

    fn out_of_bounds(&self, what: &'static str, pos: Vec2i) -> LevelError {
        LevelError::OutOfBounds {
            what,
            pos,
            width: self.width,
            height: self.height,
        }
    }
}

fn parse_dimensions(line: usize, text: &str) -> Result<(usize, usize), LevelError> {
    let mut parts = text.split_whitespace().map(str::parse::<usize>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(w)), Some(Ok(h)), None) => {
            check_size(w, h)?;
            Ok((w, h))
        }
        _ => Err(LevelError::Parse {
            line,
            message: format!("expected `WIDTH HEIGHT`, got {text:?}"),
        }),
    }
}

/// Keeps every coordinate representable as `i32` and the cell buffer bounded.
fn check_size(width: usize, height: usize) -> Result<(), LevelError> {
    match width.checked_mul(height) {
        Some(cells) if cells <= MAX_GRID_CELLS => Ok(()),
        _ => Err(LevelError::GridTooLarge { width, height }),
    }
}

fn parse_par(line: usize, text: &str) -> Result<u32, LevelError> {
    text.trim().parse::<u32>().map_err(|e| LevelError::Parse {
        line,
        message: format!("invalid par value {:?}: {e}", text.trim()),
    })
}

fn parse_layout(
    name: String,
    width: usize,
    height: usize,
    rows: &[(usize, &str)],
) -> Result<LevelDescriptor, LevelError> {
    let mut heavy_start = None;
    let mut light_start = None;
    let mut level = LevelDescriptor::open(width, height, Vec2i::ZERO, Vec2i::ZERO);
    level.name = name;

    for (row, &(line, text)) in rows.iter().enumerate().take(height) {
        let y = (height - row - 1) as i32;
        for (x, glyph) in text.chars().enumerate().take(width) {
            let pos = Vec2i::new(x as i32, y);
            match glyph {
                HEAVY_START_GLYPH | HEAVY_START_ALIAS => heavy_start = Some(pos),
                LIGHT_START_GLYPH | LIGHT_START_ALIAS => light_start = Some(pos),
                _ => match CellKind::from_glyph(glyph) {
                    Some(CellKind::Empty) => {}
                    Some(CellKind::Wall) => level.walls.push(pos),
                    Some(CellKind::Invisible) => level.invisible.push(pos),
                    Some(CellKind::HeavyOnly) => level.heavy_lanes.push(pos),
                    Some(CellKind::LightOnly) => level.light_lanes.push(pos),
                    Some(CellKind::HeavyFinish) => level.heavy_finishes.push(pos),
                    Some(CellKind::LightFinish) => level.light_finishes.push(pos),
                    Some(CellKind::Breakable) => level.breakables.push(pos),
                    Some(CellKind::Passable) | None => {
                        return Err(LevelError::UnknownGlyph { line, glyph });
                    }
                },
            }
        }
    }

    level.heavy_start = heavy_start.ok_or(LevelError::MissingStart(Character::Heavy))?;
    level.light_start = light_start.ok_or(LevelError::MissingStart(Character::Light))?;
    Ok(level)
}
