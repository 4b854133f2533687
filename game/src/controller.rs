use serde::{Deserialize, Serialize};

use crate::{
    breakables::BreakableTracker,
    character::{Character, PerCharacter},
    grid::{Direction, Grid, Vec2i},
    level::{HEAVY_START_GLYPH, LIGHT_START_GLYPH, LevelDescriptor, LevelError},
    resolver::{Mover, Resolution, resolve},
    scoring::ScoreBreakdown,
};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Phase {
    /// Accepting input.
    #[default]
    Idle,
    /// A move has been applied and is being shown in transit; input is rejected.
    Resolving,
    /// Both characters finished. Terminal until restart or level switch.
    Won,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterState {
    pub pos: Vec2i,
    pub finished: bool,
    /// Resolutions in which this character's position actually changed.
    pub moves: u32,
}

impl CharacterState {
    fn at_start(pos: Vec2i) -> Self {
        Self {
            pos,
            finished: false,
            moves: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinReport {
    pub level_id: u32,
    pub score: ScoreBreakdown,
}

/// Effects of one resolved move, in the order an animation layer should replay them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PuzzleEvent {
    Blocked,
    Squeezed { pushed: Character },
    TileBroken(Vec2i),
    FinishReached(Character),
    Won(WinReport),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveOutcome {
    pub resolution: Resolution,
    pub just_finished: PerCharacter<bool>,
    pub events: Vec<PuzzleEvent>,
    pub win: Option<WinReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveAttempt {
    Applied(MoveOutcome),
    /// A previous move is still in transit; the input is dropped, not queued.
    InTransit,
    /// The level is already won.
    Finished,
}

impl MoveAttempt {
    pub fn outcome(&self) -> Option<&MoveOutcome> {
        match self {
            MoveAttempt::Applied(outcome) => Some(outcome),
            MoveAttempt::InTransit | MoveAttempt::Finished => None,
        }
    }

    pub fn into_outcome(self) -> Option<MoveOutcome> {
        match self {
            MoveAttempt::Applied(outcome) => Some(outcome),
            MoveAttempt::InTransit | MoveAttempt::Finished => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PuzzleSnapshot {
    pub level_id: u32,
    pub phase: Phase,
    pub heavy: CharacterState,
    pub light: CharacterState,
    pub simultaneous: bool,
    pub score: Option<u8>,
    pub rows: Vec<String>,
}

/// Turn-based driver for one level attempt.
///
/// Owns the mutable grid exclusively. Restarts rebuild everything from the pristine grid
/// derived from the descriptor at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleController {
    level_id: u32,
    descriptor: LevelDescriptor,
    pristine: Grid,
    grid: Grid,
    breakables: BreakableTracker,
    characters: PerCharacter<CharacterState>,
    phase: Phase,
    simultaneous: bool,
    score: Option<ScoreBreakdown>,
    last_resolution: Option<Resolution>,
}

impl PuzzleController {
    pub fn new(level_id: u32, descriptor: LevelDescriptor) -> Result<Self, LevelError> {
        let pristine = descriptor.build_grid()?;
        log::info!(
            "loaded level {level_id} {:?} ({}x{})",
            descriptor.name,
            pristine.width(),
            pristine.height()
        );

        Ok(Self {
            level_id,
            grid: pristine.clone(),
            breakables: BreakableTracker::from_grid(&pristine),
            characters: descriptor.starts().map(CharacterState::at_start),
            pristine,
            descriptor,
            phase: Phase::Idle,
            simultaneous: false,
            score: None,
            last_resolution: None,
        })
    }

    /// Replaces the current attempt with a fresh one. On error the current level is kept.
    pub fn load_level(&mut self, level_id: u32, descriptor: LevelDescriptor) -> Result<(), LevelError> {
        *self = Self::new(level_id, descriptor)?;
        Ok(())
    }

    pub fn restart(&mut self) {
        self.grid = self.pristine.clone();
        self.breakables = BreakableTracker::from_grid(&self.pristine);
        self.characters = self.descriptor.starts().map(CharacterState::at_start);
        self.phase = Phase::Idle;
        self.simultaneous = false;
        self.score = None;
        self.last_resolution = None;
        log::info!("level {} restarted", self.level_id);
    }

    pub fn apply_move(&mut self, direction: Direction) -> MoveAttempt {
        match self.phase {
            Phase::Resolving => return MoveAttempt::InTransit,
            Phase::Won => return MoveAttempt::Finished,
            Phase::Idle => {}
        }

        let movers = self.characters.map(|c| Mover::new(c.pos, c.finished));
        let resolution = resolve(&mut self.grid, &mut self.breakables, movers, direction);

        let mut events = Vec::new();
        if let Some(pushed) = resolution.pushed() {
            events.push(PuzzleEvent::Squeezed { pushed });
        }
        events.extend(resolution.broken.iter().copied().map(PuzzleEvent::TileBroken));
        if resolution.blocked {
            log::debug!("move {direction:?} blocked");
            events.push(PuzzleEvent::Blocked);
        }

        let mut just_finished = PerCharacter::both(false);
        for who in Character::ALL {
            let target = *resolution.targets.get(who);
            let state = self.characters.get_mut(who);
            if target != state.pos {
                state.pos = target;
                state.moves += 1;
            }

            let on_finish = self
                .grid
                .at(state.pos)
                .is_some_and(|kind| kind.is_finish_for(who));
            if !state.finished && on_finish {
                state.finished = true;
                just_finished.set(who, true);
                log::debug!("{} reached its finish at {}", who.label(), state.pos);
                events.push(PuzzleEvent::FinishReached(who));
            }
        }

        // Latched by the first joint slide of the attempt, finished or not.
        if resolution.both_moved && !self.simultaneous {
            log::debug!("both characters moved together on {direction:?}");
            self.simultaneous = true;
        }

        let win = self.check_win();
        match win {
            Some(report) => events.push(PuzzleEvent::Won(report)),
            None => self.phase = Phase::Resolving,
        }
        self.last_resolution = Some(resolution.clone());

        MoveAttempt::Applied(MoveOutcome {
            resolution,
            just_finished,
            events,
            win,
        })
    }

    /// Scores the attempt the first time both characters are finished.
    fn check_win(&mut self) -> Option<WinReport> {
        let both_finished = self.characters.heavy.finished && self.characters.light.finished;
        if !both_finished || self.score.is_some() {
            return None;
        }

        let score = ScoreBreakdown::compute(
            self.characters.heavy.moves,
            self.descriptor.heavy_par,
            self.characters.light.moves,
            self.descriptor.light_par,
            self.simultaneous,
        );
        self.score = Some(score);
        self.phase = Phase::Won;
        log::info!("level {} won with score {}", self.level_id, score.total);
        Some(WinReport {
            level_id: self.level_id,
            score,
        })
    }

    /// Ends the transit of the last move. No-op outside `Resolving`.
    pub fn finish_transit(&mut self) {
        if self.phase == Phase::Resolving {
            self.phase = Phase::Idle;
        }
    }

    pub fn level_id(&self) -> u32 {
        self.level_id
    }

    pub fn descriptor(&self) -> &LevelDescriptor {
        &self.descriptor
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn breakables(&self) -> &BreakableTracker {
        &self.breakables
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn character(&self, who: Character) -> &CharacterState {
        self.characters.get(who)
    }

    pub fn positions(&self) -> PerCharacter<Vec2i> {
        self.characters.map(|c| c.pos)
    }

    pub fn simultaneous(&self) -> bool {
        self.simultaneous
    }

    pub fn score(&self) -> Option<ScoreBreakdown> {
        self.score
    }

    pub fn last_resolution(&self) -> Option<&Resolution> {
        self.last_resolution.as_ref()
    }

    /// Current grid as layout glyph rows, top row first, with both characters drawn on top.
    pub fn render_rows(&self) -> Vec<String> {
        let height = self.grid.height() as i32;
        let mut rows: Vec<Vec<char>> = self
            .grid
            .to_rows()
            .into_iter()
            .map(|row| row.chars().collect())
            .collect();

        for (who, glyph) in [
            (Character::Heavy, HEAVY_START_GLYPH),
            (Character::Light, LIGHT_START_GLYPH),
        ] {
            let pos = self.characters.get(who).pos;
            let row = (height - 1 - pos.y) as usize;
            if let Some(cell) = rows.get_mut(row).and_then(|r| r.get_mut(pos.x as usize)) {
                *cell = glyph;
            }
        }

        rows.into_iter().map(|r| r.into_iter().collect()).collect()
    }

    pub fn snapshot(&self) -> PuzzleSnapshot {
        PuzzleSnapshot {
            level_id: self.level_id,
            phase: self.phase,
            heavy: self.characters.heavy,
            light: self.characters.light,
            simultaneous: self.simultaneous,
            score: self.score.map(|s| s.total),
            rows: self.render_rows(),
        }
    }
}
