use serde::{Deserialize, Serialize};

pub const MAX_SCORE: u8 = 3;

/// The three independent point conditions of a completed level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub heavy_under_par: bool,
    pub light_under_par: bool,
    pub simultaneous: bool,
    pub total: u8,
}

impl ScoreBreakdown {
    pub fn compute(
        heavy_moves: u32,
        heavy_par: u32,
        light_moves: u32,
        light_par: u32,
        simultaneous: bool,
    ) -> Self {
        let heavy_under_par = heavy_moves <= heavy_par;
        let light_under_par = light_moves <= light_par;
        let total = [heavy_under_par, light_under_par, simultaneous]
            .into_iter()
            .filter(|&point| point)
            .count() as u8;

        Self {
            heavy_under_par,
            light_under_par,
            simultaneous,
            total: total.min(MAX_SCORE),
        }
    }
}

pub fn level_score(
    heavy_moves: u32,
    heavy_par: u32,
    light_moves: u32,
    light_par: u32,
    simultaneous: bool,
) -> u8 {
    ScoreBreakdown::compute(heavy_moves, heavy_par, light_moves, light_par, simultaneous).total
}
