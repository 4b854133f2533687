use serde::{Deserialize, Serialize};

use crate::grid::{CellKind, Grid, Vec2i};

/// Tracks which breakable tiles are still intact and performs the `Breakable -> Passable` flip.
///
/// This is the only writer of the grid after a level is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakableTracker {
    intact: Vec<Vec2i>,
}

impl BreakableTracker {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            intact: grid.positions_of(CellKind::Breakable),
        }
    }

    pub fn intact(&self) -> &[Vec2i] {
        &self.intact
    }

    pub fn is_intact(&self, pos: Vec2i) -> bool {
        self.intact.contains(&pos)
    }

    /// Breaks the tile at `pos` if it is still intact, recording it in `broken`.
    ///
    /// Returns `false` for anything that is not an intact breakable, so re-entering a
    /// `Passable` cell is a no-op.
    pub fn consume(&mut self, grid: &mut Grid, pos: Vec2i, broken: &mut Vec<Vec2i>) -> bool {
        if grid.at(pos) != Some(CellKind::Breakable) {
            return false;
        }

        grid.set_at(pos, CellKind::Passable);
        self.intact.retain(|&p| p != pos);
        broken.push(pos);
        log::debug!("breakable tile at {pos} consumed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_flips_once_and_records_once() {
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, CellKind::Breakable);
        let mut tracker = BreakableTracker::from_grid(&grid);
        assert_eq!(tracker.intact(), &[Vec2i::new(1, 1)]);

        let mut broken = Vec::new();
        assert!(tracker.consume(&mut grid, Vec2i::new(1, 1), &mut broken));
        assert!(!tracker.consume(&mut grid, Vec2i::new(1, 1), &mut broken));
        assert!(!tracker.consume(&mut grid, Vec2i::new(0, 0), &mut broken));

        assert_eq!(broken, vec![Vec2i::new(1, 1)]);
        assert_eq!(grid.get(1, 1), Some(CellKind::Passable));
        assert!(!tracker.is_intact(Vec2i::new(1, 1)));
    }
}
