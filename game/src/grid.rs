use std::{
    fmt,
    ops::{Add, Neg, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::character::Character;

pub const DEFAULT_GRID_WIDTH: usize = 7;
pub const DEFAULT_GRID_HEIGHT: usize = 11;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    pub const ZERO: Vec2i = Vec2i { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan_len(self) -> u32 {
        self.x.unsigned_abs() + self.y.unsigned_abs()
    }

    pub fn length(self) -> f32 {
        ((self.x as f32).powi(2) + (self.y as f32).powi(2)).sqrt()
    }

    pub fn dot(self, rhs: Vec2i) -> i32 {
        self.x * rhs.x + self.y * rhs.y
    }
}

impl Add for Vec2i {
    type Output = Vec2i;

    fn add(self, rhs: Vec2i) -> Self::Output {
        Vec2i::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2i {
    type Output = Vec2i;

    fn sub(self, rhs: Vec2i) -> Self::Output {
        Vec2i::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2i {
    type Output = Vec2i;

    fn neg(self) -> Self::Output {
        Vec2i::new(-self.x, -self.y)
    }
}

impl fmt::Display for Vec2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned move input. `y = 0` is the bottom row, so `Up` is `+y`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> Vec2i {
        match self {
            Direction::Up => Vec2i::new(0, 1),
            Direction::Down => Vec2i::new(0, -1),
            Direction::Left => Vec2i::new(-1, 0),
            Direction::Right => Vec2i::new(1, 0),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Whether `offset` lies entirely on this direction's axis.
    pub fn is_parallel(self, offset: Vec2i) -> bool {
        if self.is_horizontal() {
            offset.y == 0
        } else {
            offset.x == 0
        }
    }

    /// Coordinate of `pos` on the movement axis, signed so that larger means further ahead.
    pub fn progress_of(self, pos: Vec2i) -> i32 {
        pos.dot(self.delta())
    }

    pub fn letter(self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDirectionError(pub String);

impl fmt::Display for ParseDirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown direction {:?}", self.0)
    }
}

impl std::error::Error for ParseDirectionError {}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" | "up" => Ok(Direction::Up),
            "d" | "down" => Ok(Direction::Down),
            "l" | "left" => Ok(Direction::Left),
            "r" | "right" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CellKind {
    #[default]
    Empty,
    Wall,
    HeavyOnly,
    LightOnly,
    HeavyFinish,
    LightFinish,
    Breakable,
    Invisible,
    /// A consumed `Breakable`. Traverses like `Empty`.
    Passable,
}

impl CellKind {
    pub fn lane_for(who: Character) -> CellKind {
        match who {
            Character::Heavy => CellKind::HeavyOnly,
            Character::Light => CellKind::LightOnly,
        }
    }

    pub fn finish_for(who: Character) -> CellKind {
        match who {
            Character::Heavy => CellKind::HeavyFinish,
            Character::Light => CellKind::LightFinish,
        }
    }

    /// Whether `who` can never enter a cell of this kind.
    pub fn blocks(self, who: Character) -> bool {
        match self {
            CellKind::Wall | CellKind::Invisible => true,
            CellKind::HeavyOnly | CellKind::HeavyFinish => who == Character::Light,
            CellKind::LightOnly | CellKind::LightFinish => who == Character::Heavy,
            CellKind::Empty | CellKind::Breakable | CellKind::Passable => false,
        }
    }

    pub fn is_finish_for(self, who: Character) -> bool {
        self == CellKind::finish_for(who)
    }

    /// Lane and finish tiles reserved for `who`; a character resting on one is anchored.
    pub fn is_reserved_for(self, who: Character) -> bool {
        self == CellKind::lane_for(who) || self == CellKind::finish_for(who)
    }

    pub fn glyph(self) -> char {
        match self {
            CellKind::Empty => '.',
            CellKind::Wall => 'X',
            CellKind::HeavyOnly => '&',
            CellKind::LightOnly => '$',
            CellKind::HeavyFinish => '*',
            CellKind::LightFinish => '^',
            CellKind::Breakable => '!',
            CellKind::Invisible => 'I',
            CellKind::Passable => ',',
        }
    }

    pub fn from_glyph(c: char) -> Option<CellKind> {
        let kind = match c {
            '.' => CellKind::Empty,
            'X' => CellKind::Wall,
            '&' => CellKind::HeavyOnly,
            '$' => CellKind::LightOnly,
            '*' => CellKind::HeavyFinish,
            '^' => CellKind::LightFinish,
            '!' => CellKind::Breakable,
            'I' => CellKind::Invisible,
            ',' => CellKind::Passable,
            _ => return None,
        };
        Some(kind)
    }
}

/// Fixed-size cell map, row-major with `y = 0` at the bottom.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<CellKind>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellKind::Empty; width.saturating_mul(height)],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Vec2i) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn index(&self, pos: Vec2i) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width + pos.x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<CellKind> {
        self.at(Vec2i::new(x, y))
    }

    pub fn at(&self, pos: Vec2i) -> Option<CellKind> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Out-of-bounds writes are ignored.
    pub(crate) fn set(&mut self, x: i32, y: i32, kind: CellKind) {
        if let Some(i) = self.index(Vec2i::new(x, y)) {
            self.cells[i] = kind;
        }
    }

    pub(crate) fn set_at(&mut self, pos: Vec2i, kind: CellKind) {
        self.set(pos.x, pos.y, kind);
    }

    /// Whether `who` may stand on `pos`. Off-grid cells are never enterable.
    pub fn enterable_by(&self, pos: Vec2i, who: Character) -> bool {
        self.at(pos).is_some_and(|kind| !kind.blocks(who))
    }

    pub fn positions_of(&self, kind: CellKind) -> Vec<Vec2i> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Vec2i::new(x as i32, y as i32);
                if self.at(pos) == Some(kind) {
                    out.push(pos);
                }
            }
        }
        out
    }

    /// Glyph rows, top row first.
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.height)
            .rev()
            .map(|y| {
                (0..self.width)
                    .map(|x| self.cells[y * self.width + x].glyph())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_reports_none_outside_bounds() {
        let grid = Grid::new(7, 11);
        assert_eq!(grid.get(0, 0), Some(CellKind::Empty));
        assert_eq!(grid.get(6, 10), Some(CellKind::Empty));
        assert_eq!(grid.get(-1, 0), None);
        assert_eq!(grid.get(7, 0), None);
        assert_eq!(grid.get(0, 11), None);
    }

    #[test]
    fn set_ignores_out_of_bounds_and_rows_render_top_first() {
        let mut grid = Grid::new(3, 2);
        grid.set(0, 0, CellKind::Wall);
        grid.set(2, 1, CellKind::LightFinish);
        grid.set(5, 5, CellKind::Wall);
        assert_eq!(grid.to_rows(), vec!["..^".to_string(), "X..".to_string()]);
    }

    #[test]
    fn lane_and_finish_tiles_block_only_the_other_character() {
        for kind in [CellKind::HeavyOnly, CellKind::HeavyFinish] {
            assert!(!kind.blocks(Character::Heavy));
            assert!(kind.blocks(Character::Light));
        }
        for kind in [CellKind::LightOnly, CellKind::LightFinish] {
            assert!(kind.blocks(Character::Heavy));
            assert!(!kind.blocks(Character::Light));
        }
        for who in Character::ALL {
            assert!(CellKind::Wall.blocks(who));
            assert!(CellKind::Invisible.blocks(who));
            assert!(!CellKind::Passable.blocks(who));
            assert!(!CellKind::Breakable.blocks(who));
        }
    }

    #[test]
    fn direction_parsing_accepts_letters_and_words() {
        assert_eq!("u".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("Right".parse::<Direction>(), Ok(Direction::Right));
        assert!("diagonal".parse::<Direction>().is_err());
        for dir in Direction::ALL {
            assert_eq!(dir.delta() + dir.reverse().delta(), Vec2i::ZERO);
            assert_eq!(dir.delta().manhattan_len(), 1);
        }
    }
}
