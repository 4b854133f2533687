//! Two-body slide resolution.
//!
//! One directional input produces one [`Resolution`]. The resolver first classifies the move as
//! a squeeze or a standard slide ([`MovePlan`]), then computes targets in a fixed order: in a
//! standard move the front character slides first and the rear character collides with the
//! front's *new* target, never its stale position.

use serde::{Deserialize, Serialize};

use crate::{
    breakables::BreakableTracker,
    character::{Character, PerCharacter},
    grid::{CellKind, Direction, Grid, Vec2i},
};

/// Resting state of one character as seen by the resolver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mover {
    pub pos: Vec2i,
    pub finished: bool,
}

impl Mover {
    pub fn new(pos: Vec2i, finished: bool) -> Self {
        Self { pos, finished }
    }
}

/// How a move is resolved, decided once per input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MovePlan {
    /// Adjacent pair with a blocked front: the front is pushed back, the rear slides past it.
    Squeeze { front: Character },
    Standard { front: Character },
}

impl MovePlan {
    pub fn front(self) -> Character {
        match self {
            MovePlan::Squeeze { front } | MovePlan::Standard { front } => front,
        }
    }

    pub fn rear(self) -> Character {
        self.front().other()
    }

    pub fn is_squeeze(self) -> bool {
        matches!(self, MovePlan::Squeeze { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resolution {
    pub direction: Direction,
    /// `None` when both characters were already finished and nothing was computed.
    pub plan: Option<MovePlan>,
    pub from: PerCharacter<Vec2i>,
    pub targets: PerCharacter<Vec2i>,
    /// Euclidean travel distance per character, for proportional-speed interpolation.
    pub distances: PerCharacter<f32>,
    /// Tiles flipped `Breakable -> Passable` by this resolution, in break order.
    pub broken: Vec<Vec2i>,
    pub blocked: bool,
    pub both_moved: bool,
}

impl Resolution {
    fn frozen(direction: Direction, from: PerCharacter<Vec2i>) -> Self {
        Self {
            direction,
            plan: None,
            from,
            targets: from,
            distances: PerCharacter::both(0.0),
            broken: Vec::new(),
            blocked: true,
            both_moved: false,
        }
    }

    pub fn squeeze_occurred(&self) -> bool {
        self.plan.is_some_and(MovePlan::is_squeeze)
    }

    /// The character pushed backwards by a squeeze.
    pub fn pushed(&self) -> Option<Character> {
        match self.plan {
            Some(MovePlan::Squeeze { front }) => Some(front),
            _ => None,
        }
    }

    pub fn moved(&self, who: Character) -> bool {
        self.targets.get(who) != self.from.get(who)
    }

    /// Nominal move length in cells: the longer of the two travel distances.
    pub fn travel_distance(&self) -> f32 {
        self.distances.heavy.max(self.distances.light)
    }
}

/// Resolves one move against `grid`, consuming breakable tiles through `breakables`.
pub fn resolve(
    grid: &mut Grid,
    breakables: &mut BreakableTracker,
    movers: PerCharacter<Mover>,
    direction: Direction,
) -> Resolution {
    Resolver {
        grid,
        breakables,
        broken: Vec::new(),
    }
    .run(movers, direction)
}

/// The other character as seen by a sliding character.
#[derive(Debug, Clone, Copy)]
enum Obstacle {
    /// Squeeze slides ignore the other character.
    None,
    /// A cell the slider may neither enter nor jump across on the movement axis.
    At(Vec2i),
}

struct Resolver<'a> {
    grid: &'a mut Grid,
    breakables: &'a mut BreakableTracker,
    broken: Vec<Vec2i>,
}

impl Resolver<'_> {
    fn run(mut self, movers: PerCharacter<Mover>, direction: Direction) -> Resolution {
        let from = movers.map(|m| m.pos);
        if movers.heavy.finished && movers.light.finished {
            return Resolution::frozen(direction, from);
        }

        let plan = self.plan(movers, direction);
        let mut targets = match plan {
            MovePlan::Squeeze { front } => self.squeeze(movers, front, direction),
            MovePlan::Standard { front } => self.standard(movers, front, direction),
        };
        self.separate(&mut targets, movers, plan.front(), direction);

        debug_assert_ne!(targets.heavy, targets.light, "characters resolved onto one cell");
        debug_assert!(
            self.grid.in_bounds(targets.heavy) && self.grid.in_bounds(targets.light),
            "resolved target left the grid"
        );

        let distances = PerCharacter::new(
            (targets.heavy - from.heavy).length(),
            (targets.light - from.light).length(),
        );
        let heavy_moved = targets.heavy != from.heavy;
        let light_moved = targets.light != from.light;

        if plan.is_squeeze() {
            log::debug!(
                "squeeze {direction:?}: {} pushed back to {}",
                plan.front().label(),
                targets.get(plan.front())
            );
        }

        Resolution {
            direction,
            plan: Some(plan),
            from,
            targets,
            distances,
            broken: self.broken,
            blocked: !heavy_moved && !light_moved,
            both_moved: heavy_moved && light_moved,
        }
    }

    fn plan(&mut self, movers: PerCharacter<Mover>, direction: Direction) -> MovePlan {
        let standard = MovePlan::Standard {
            front: geometric_front(movers.heavy.pos, movers.light.pos, direction),
        };

        let offset = movers.heavy.pos - movers.light.pos;
        if offset.manhattan_len() != 1 || !direction.is_parallel(offset) {
            return standard;
        }

        let front = if direction.delta().dot(offset) > 0 {
            Character::Heavy
        } else {
            Character::Light
        };
        let ahead = movers.get(front).pos + direction.delta();
        let ahead_kind = self.grid.at(ahead);
        let front_blocked = match ahead_kind {
            None => true,
            // Scheduled to break, but still stops the front this turn.
            Some(CellKind::Breakable) => true,
            Some(kind) => kind.blocks(front),
        };
        if !front_blocked {
            return standard;
        }

        // Breaks even when an anchor then cancels the squeeze.
        if ahead_kind == Some(CellKind::Breakable) {
            self.breakables.consume(self.grid, ahead, &mut self.broken);
        }
        if self.anchored(movers) {
            return standard;
        }
        MovePlan::Squeeze { front }
    }

    /// A character resting on its own lane or finish tile cannot be displaced by a squeeze.
    fn anchored(&self, movers: PerCharacter<Mover>) -> bool {
        Character::ALL.into_iter().any(|who| {
            self.grid
                .at(movers.get(who).pos)
                .is_some_and(|kind| kind.is_reserved_for(who))
        })
    }

    fn squeeze(
        &mut self,
        movers: PerCharacter<Mover>,
        front: Character,
        direction: Direction,
    ) -> PerCharacter<Vec2i> {
        let rear = front.other();
        let mut targets = movers.map(|m| m.pos);
        if !movers.get(front).finished {
            let pushed = self.slide(front, movers.get(front).pos, direction.reverse(), Obstacle::None);
            targets.set(front, pushed);
        }
        if !movers.get(rear).finished {
            let advanced = self.slide(rear, movers.get(rear).pos, direction, Obstacle::None);
            targets.set(rear, advanced);
        }
        targets
    }

    fn standard(
        &mut self,
        movers: PerCharacter<Mover>,
        front: Character,
        direction: Direction,
    ) -> PerCharacter<Vec2i> {
        let rear = front.other();
        let mut targets = movers.map(|m| m.pos);

        if !movers.get(front).finished {
            let rear_pos = movers.get(rear).pos;
            let target = self.slide(front, movers.get(front).pos, direction, Obstacle::At(rear_pos));
            targets.set(front, target);
        }

        // The rear collides with where the front ends up, not where it started.
        let front_target = *targets.get(front);
        if !movers.get(rear).finished {
            let target = self.slide(rear, movers.get(rear).pos, direction, Obstacle::At(front_target));
            targets.set(rear, target);
        }

        targets
    }

    /// Overlap guard: the rear ends one cell behind the front's target.
    fn separate(
        &self,
        targets: &mut PerCharacter<Vec2i>,
        movers: PerCharacter<Mover>,
        front: Character,
        direction: Direction,
    ) {
        if targets.heavy != targets.light {
            return;
        }

        let rear = front.other();
        let (pulled, anchor) = if movers.get(rear).finished {
            (front, rear)
        } else {
            (rear, front)
        };
        let behind = *targets.get(anchor) - direction.delta();
        log::debug!("overlap at {}; {} pulled back to {behind}", targets.get(anchor), pulled.label());
        targets.set(pulled, behind);
    }

    /// Slides `who` from `start` until a boundary, blocking tile, the obstacle, or its own
    /// finish tile stops it. Breakable tiles on the way are consumed and do not stop the slide.
    fn slide(
        &mut self,
        who: Character,
        start: Vec2i,
        direction: Direction,
        obstacle: Obstacle,
    ) -> Vec2i {
        let step = direction.delta();
        let mut curr = start;

        loop {
            let next = curr + step;
            let Some(kind) = self.grid.at(next) else {
                break;
            };

            if let Obstacle::At(other) = obstacle {
                if next == other || passes_through(curr, next, other, direction) {
                    break;
                }
            }

            if kind.blocks(who) {
                break;
            }

            if kind.is_finish_for(who) {
                curr = next;
                break;
            }

            if kind == CellKind::Breakable {
                self.breakables.consume(self.grid, next, &mut self.broken);
            }
            curr = next;
        }

        curr
    }
}

/// Front by coordinate along `direction`; ties go to the light character.
pub fn geometric_front(heavy: Vec2i, light: Vec2i, direction: Direction) -> Character {
    if direction.progress_of(heavy) > direction.progress_of(light) {
        Character::Heavy
    } else {
        Character::Light
    }
}

/// Whether stepping `curr -> next` would jump across `other` on the movement line.
fn passes_through(curr: Vec2i, next: Vec2i, other: Vec2i, direction: Direction) -> bool {
    let same_line = if direction.is_horizontal() {
        next.y == other.y
    } else {
        next.x == other.x
    };
    if !same_line {
        return false;
    }
    let before = direction.progress_of(curr) < direction.progress_of(other);
    let beyond = direction.progress_of(next) > direction.progress_of(other);
    before && beyond
}
