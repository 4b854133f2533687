use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    character::{Character, PerCharacter},
    controller::MoveOutcome,
    grid::Vec2i,
    resolver::Resolution,
    settings::TransitSettings,
};

/// Wall-clock pacing of one move's `Resolving` phase.
///
/// Both characters travel at the same speed, so the longer path sets the duration and the
/// shorter mover arrives early.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitClock {
    from: PerCharacter<Vec2i>,
    targets: PerCharacter<Vec2i>,
    distances: PerCharacter<f32>,
    #[serde(with = "crate::serde_duration")]
    travel: Duration,
    /// Extra hold after travel (tile breaks, win cue).
    #[serde(with = "crate::serde_duration")]
    hold: Duration,
    #[serde(with = "crate::serde_duration")]
    elapsed: Duration,
}

impl TransitClock {
    pub fn for_resolution(resolution: &Resolution, cells_per_second: f32) -> Self {
        let travel = if cells_per_second > 0.0 {
            Duration::try_from_secs_f32(resolution.travel_distance() / cells_per_second)
                .unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };

        Self {
            from: resolution.from,
            targets: resolution.targets,
            distances: resolution.distances,
            travel,
            hold: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Clock for a controller outcome, including the break and win delays from `settings`.
    pub fn for_outcome(outcome: &MoveOutcome, settings: &TransitSettings) -> Self {
        let mut clock = Self::for_resolution(&outcome.resolution, settings.cells_per_second);
        if !outcome.resolution.broken.is_empty() {
            clock.hold += Duration::from_millis(settings.break_delay_ms);
        }
        if outcome.win.is_some() {
            clock.hold += Duration::from_millis(settings.win_delay_ms);
        }
        clock
    }

    pub fn duration(&self) -> Duration {
        self.travel.saturating_add(self.hold)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration()
    }

    /// Advances the clock. Returns `true` once the transit is complete.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if !self.is_done() {
            self.elapsed = self.elapsed.saturating_add(dt).min(self.duration());
        }
        self.is_done()
    }

    /// Travel progress in `0..=1`, ignoring the hold.
    pub fn progress(&self) -> f32 {
        if self.travel.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.travel.as_secs_f32()).min(1.0)
    }

    pub fn character_progress(&self, who: Character) -> f32 {
        let distance = *self.distances.get(who);
        let longest = self.distances.heavy.max(self.distances.light);
        if distance <= 0.0 || longest <= 0.0 {
            return 1.0;
        }
        (self.progress() * longest / distance).min(1.0)
    }

    /// Fractional cell position of `who` for drawing.
    pub fn interpolated_position(&self, who: Character) -> (f32, f32) {
        let from = *self.from.get(who);
        let to = *self.targets.get(who);
        let t = self.character_progress(who);
        (
            from.x as f32 + (to.x - from.x) as f32 * t,
            from.y as f32 + (to.y - from.y) as f32 * t,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Direction;

    fn resolution(from: PerCharacter<Vec2i>, targets: PerCharacter<Vec2i>) -> Resolution {
        Resolution {
            direction: Direction::Right,
            plan: None,
            from,
            targets,
            distances: PerCharacter::new(
                (targets.heavy - from.heavy).length(),
                (targets.light - from.light).length(),
            ),
            broken: Vec::new(),
            blocked: false,
            both_moved: true,
        }
    }

    #[test]
    fn longer_path_sets_duration_and_shorter_mover_arrives_early() {
        let res = resolution(
            PerCharacter::new(Vec2i::new(0, 0), Vec2i::new(0, 1)),
            PerCharacter::new(Vec2i::new(4, 0), Vec2i::new(2, 1)),
        );
        let mut clock = TransitClock::for_resolution(&res, 4.0);
        assert_eq!(clock.duration(), Duration::from_secs(1));

        assert!(!clock.tick(Duration::from_millis(500)));
        assert!((clock.progress() - 0.5).abs() < 1e-4);
        assert!((clock.character_progress(Character::Heavy) - 0.5).abs() < 1e-4);
        assert!((clock.character_progress(Character::Light) - 1.0).abs() < 1e-4);

        let (hx, hy) = clock.interpolated_position(Character::Heavy);
        assert!((hx - 2.0).abs() < 1e-4);
        assert_eq!(hy, 0.0);

        assert!(clock.tick(Duration::from_millis(600)));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
        assert_eq!(clock.interpolated_position(Character::Light), (2.0, 1.0));
    }

    #[test]
    fn degenerate_pace_saturates_instead_of_panicking() {
        let res = resolution(
            PerCharacter::new(Vec2i::new(0, 0), Vec2i::new(0, 1)),
            PerCharacter::new(Vec2i::new(6, 0), Vec2i::new(3, 1)),
        );
        let mut clock = TransitClock::for_resolution(&res, 1e-40);
        assert_eq!(clock.duration(), Duration::MAX);
        assert!(!clock.tick(Duration::from_secs(1)));
        assert!(clock.progress() < 1e-3);
    }

    #[test]
    fn stationary_move_is_immediately_done() {
        let still = PerCharacter::new(Vec2i::new(1, 1), Vec2i::new(3, 3));
        let mut clock = TransitClock::for_resolution(&resolution(still, still), 15.0);
        assert!(clock.is_done());
        assert!(clock.tick(Duration::ZERO));
        assert_eq!(clock.progress(), 1.0);
    }
}
