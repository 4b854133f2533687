use pairslide::{
    breakables::BreakableTracker,
    character::{Character, PerCharacter},
    grid::{CellKind, Direction, Grid, Vec2i},
    level::LevelDescriptor,
    resolver::{MovePlan, Mover, Resolution, resolve},
};

fn v(x: i32, y: i32) -> Vec2i {
    Vec2i::new(x, y)
}

fn open_level(heavy: Vec2i, light: Vec2i) -> LevelDescriptor {
    LevelDescriptor::open(7, 11, heavy, light)
}

fn resolve_fresh(level: &LevelDescriptor, direction: Direction) -> (Grid, Resolution) {
    let mut grid = level.build_grid().expect("level should build");
    let mut tracker = BreakableTracker::from_grid(&grid);
    let movers = level.starts().map(|pos| Mover::new(pos, false));
    let resolution = resolve(&mut grid, &mut tracker, movers, direction);
    (grid, resolution)
}

#[test]
fn rear_slides_up_to_a_blocked_front() {
    let mut level = open_level(v(1, 1), v(5, 1));
    level.walls = (0..11).map(|y| v(6, y)).collect();

    let (_, res) = resolve_fresh(&level, Direction::Right);

    assert_eq!(res.plan, Some(MovePlan::Standard { front: Character::Light }));
    assert_eq!(res.targets, PerCharacter::new(v(4, 1), v(5, 1)));
    assert!(!res.squeeze_occurred());
    assert!(!res.blocked);
    assert!(!res.both_moved);
    assert!(!res.moved(Character::Light));
    assert!((res.distances.heavy - 3.0).abs() < 1e-6);
    assert_eq!(res.distances.light, 0.0);
    assert!((res.travel_distance() - 3.0).abs() < 1e-6);
}

#[test]
fn squeeze_pushes_blocked_front_back_past_the_rear() {
    let mut level = open_level(v(3, 5), v(4, 5));
    level.walls.push(v(5, 5));

    let (_, res) = resolve_fresh(&level, Direction::Right);

    assert!(res.squeeze_occurred());
    assert_eq!(res.pushed(), Some(Character::Light));
    assert_eq!(res.targets.light, v(0, 5));
    assert_eq!(res.targets.heavy, v(4, 5));
    assert!(res.both_moved);
    assert_ne!(res.targets.heavy, res.targets.light);
}

#[test]
fn squeeze_in_a_tight_corridor_swaps_the_pair() {
    let mut level = open_level(v(3, 5), v(4, 5));
    level.walls.extend([v(2, 5), v(5, 5)]);

    let (_, res) = resolve_fresh(&level, Direction::Right);

    assert!(res.squeeze_occurred());
    assert_eq!(res.targets, PerCharacter::new(v(4, 5), v(3, 5)));
}

#[test]
fn slide_consumes_breakable_once_and_leaves_it_passable() {
    let mut level = open_level(v(2, 0), v(5, 0));
    level.breakables.push(v(2, 2));

    let mut grid = level.build_grid().expect("level should build");
    let mut tracker = BreakableTracker::from_grid(&grid);
    let movers = level.starts().map(|pos| Mover::new(pos, false));

    let up = resolve(&mut grid, &mut tracker, movers, Direction::Up);
    assert_eq!(up.targets.heavy, v(2, 10));
    assert_eq!(up.broken, vec![v(2, 2)]);
    assert_eq!(grid.get(2, 2), Some(CellKind::Passable));
    assert!(tracker.intact().is_empty());

    let movers = up.targets.map(|pos| Mover::new(pos, false));
    let down = resolve(&mut grid, &mut tracker, movers, Direction::Down);
    assert_eq!(down.targets.heavy, v(2, 0));
    assert!(down.broken.is_empty());
    assert_eq!(grid.get(2, 2), Some(CellKind::Passable));
}

#[test]
fn breakable_ahead_of_an_adjacent_pair_confirms_a_squeeze_and_breaks() {
    let mut level = open_level(v(3, 5), v(4, 5));
    level.breakables.push(v(5, 5));

    let (grid, res) = resolve_fresh(&level, Direction::Right);

    assert_eq!(res.pushed(), Some(Character::Light));
    assert_eq!(res.broken, vec![v(5, 5)]);
    assert_eq!(grid.get(5, 5), Some(CellKind::Passable));
    assert_eq!(res.targets.heavy, v(6, 5));
    assert_eq!(res.targets.light, v(0, 5));
}

#[test]
fn adjacent_pair_with_an_open_front_slides_normally() {
    let level = open_level(v(1, 5), v(2, 5));

    let (_, res) = resolve_fresh(&level, Direction::Right);

    assert_eq!(res.plan, Some(MovePlan::Standard { front: Character::Light }));
    assert_eq!(res.targets, PerCharacter::new(v(5, 5), v(6, 5)));
}

#[test]
fn side_by_side_pair_never_squeezes_across_the_move_axis() {
    let mut level = open_level(v(1, 5), v(2, 5));
    level.walls.extend([v(1, 6), v(2, 6)]);

    let (_, res) = resolve_fresh(&level, Direction::Up);

    assert!(!res.squeeze_occurred());
    assert!(res.blocked);
    assert_eq!(res.targets, PerCharacter::new(v(1, 5), v(2, 5)));
}

#[test]
fn separated_pair_never_squeezes() {
    let mut level = open_level(v(2, 5), v(4, 5));
    level.walls.push(v(5, 5));

    let (_, res) = resolve_fresh(&level, Direction::Right);

    assert!(!res.squeeze_occurred());
    assert_eq!(res.targets, PerCharacter::new(v(3, 5), v(4, 5)));
}

#[test]
fn the_other_characters_lane_blocks_the_front_and_confirms_a_squeeze() {
    let mut level = open_level(v(3, 5), v(4, 5));
    level.heavy_lanes.push(v(5, 5));

    let (_, res) = resolve_fresh(&level, Direction::Right);

    assert_eq!(res.pushed(), Some(Character::Light));
    // Lanes do not stop their own character.
    assert_eq!(res.targets.heavy, v(6, 5));
    assert_eq!(res.targets.light, v(0, 5));
}

#[test]
fn anchored_character_cancels_the_squeeze() {
    let mut heavy_anchored = open_level(v(3, 5), v(4, 5));
    heavy_anchored.walls.push(v(5, 5));
    heavy_anchored.heavy_lanes.push(v(3, 5));

    let mut light_anchored = open_level(v(3, 5), v(4, 5));
    light_anchored.walls.push(v(5, 5));
    light_anchored.light_lanes.push(v(4, 5));

    for level in [heavy_anchored, light_anchored] {
        let (_, res) = resolve_fresh(&level, Direction::Right);
        assert_eq!(res.plan, Some(MovePlan::Standard { front: Character::Light }));
        assert!(res.blocked);
        assert_eq!(res.targets, PerCharacter::new(v(3, 5), v(4, 5)));
    }
}

#[test]
fn anchored_pair_breaks_the_tile_ahead_and_slides_normally() {
    let mut level = open_level(v(3, 5), v(4, 5));
    level.breakables.push(v(5, 5));
    level.heavy_lanes.push(v(3, 5));

    let (grid, res) = resolve_fresh(&level, Direction::Right);

    assert!(!res.squeeze_occurred());
    assert_eq!(res.broken, vec![v(5, 5)]);
    assert_eq!(grid.get(5, 5), Some(CellKind::Passable));
    assert_eq!(res.targets, PerCharacter::new(v(5, 5), v(6, 5)));
}

#[test]
fn breakable_ahead_of_a_frozen_anchored_front_still_breaks() {
    let mut level = open_level(v(3, 5), v(4, 5));
    level.light_finishes.push(v(4, 5));
    level.breakables.push(v(5, 5));
    let mut grid = level.build_grid().expect("level should build");
    let mut tracker = BreakableTracker::from_grid(&grid);

    let movers = PerCharacter::new(Mover::new(v(3, 5), false), Mover::new(v(4, 5), true));
    let res = resolve(&mut grid, &mut tracker, movers, Direction::Right);

    assert_eq!(res.plan, Some(MovePlan::Standard { front: Character::Light }));
    assert_eq!(res.broken, vec![v(5, 5)]);
    assert_eq!(grid.get(5, 5), Some(CellKind::Passable));
    assert!(tracker.intact().is_empty());
    assert_eq!(res.targets, level.starts());
    assert!(res.blocked);
}

#[test]
fn finished_character_is_frozen_and_acts_as_an_obstacle() {
    let mut level = open_level(v(3, 8), v(3, 1));
    level.heavy_finishes.push(v(3, 8));
    let pristine = level.build_grid().expect("level should build");

    for direction in Direction::ALL {
        let mut grid = pristine.clone();
        let mut tracker = BreakableTracker::from_grid(&grid);
        let movers = PerCharacter::new(Mover::new(v(3, 8), true), Mover::new(v(3, 1), false));
        let res = resolve(&mut grid, &mut tracker, movers, direction);
        assert_eq!(res.targets.heavy, v(3, 8), "{direction:?}");
        assert_ne!(res.targets.light, v(3, 8), "{direction:?}");
    }

    let mut grid = pristine.clone();
    let mut tracker = BreakableTracker::from_grid(&grid);
    let movers = PerCharacter::new(Mover::new(v(3, 8), true), Mover::new(v(3, 1), false));
    let up = resolve(&mut grid, &mut tracker, movers, Direction::Up);
    assert_eq!(up.targets.light, v(3, 7));
}

#[test]
fn both_finished_is_a_frozen_no_op() {
    let mut level = open_level(v(1, 1), v(5, 1));
    level.heavy_finishes.push(v(1, 1));
    level.light_finishes.push(v(5, 1));
    let mut grid = level.build_grid().expect("level should build");
    let mut tracker = BreakableTracker::from_grid(&grid);

    let movers = level.starts().map(|pos| Mover::new(pos, true));
    let res = resolve(&mut grid, &mut tracker, movers, Direction::Up);

    assert_eq!(res.plan, None);
    assert!(res.blocked);
    assert_eq!(res.targets, level.starts());
    assert_eq!(res.travel_distance(), 0.0);
}

#[test]
fn blocked_resolution_leaves_the_grid_untouched() {
    let mut level = open_level(v(0, 0), v(1, 0));
    level.breakables.push(v(3, 3));
    let mut grid = level.build_grid().expect("level should build");
    let before = grid.clone();
    let mut tracker = BreakableTracker::from_grid(&grid);

    let movers = level.starts().map(|pos| Mover::new(pos, false));
    let res = resolve(&mut grid, &mut tracker, movers, Direction::Down);

    assert!(res.blocked);
    assert!(res.broken.is_empty());
    assert_eq!(res.targets, res.from);
    assert_eq!(grid, before);
    assert_eq!(tracker.intact(), &[v(3, 3)]);
}

#[test]
fn rear_cannot_pass_through_the_front_in_a_column() {
    let mut level = open_level(v(2, 0), v(2, 4));
    level.walls.push(v(2, 6));

    let (_, res) = resolve_fresh(&level, Direction::Up);

    assert_eq!(res.plan, Some(MovePlan::Standard { front: Character::Light }));
    assert_eq!(res.targets, PerCharacter::new(v(2, 4), v(2, 5)));
}

#[test]
fn slide_stops_on_its_own_finish_tile() {
    let mut level = open_level(v(0, 3), v(6, 0));
    level.heavy_finishes.push(v(4, 3));

    let (_, res) = resolve_fresh(&level, Direction::Right);

    assert_eq!(res.targets.heavy, v(4, 3));
}

#[test]
fn targets_stay_distinct_and_enterable_for_every_start_pair() {
    let mut template = LevelDescriptor::open(5, 5, v(0, 0), v(1, 0));
    template.walls.push(v(2, 2));
    template.heavy_lanes.push(v(1, 3));
    template.light_lanes.push(v(3, 1));
    template.heavy_finishes.push(v(4, 4));
    template.light_finishes.push(v(0, 4));
    template.breakables.push(v(2, 0));

    let cells: Vec<Vec2i> = (0..5).flat_map(|y| (0..5).map(move |x| v(x, y))).collect();
    let mut checked = 0;
    for &heavy in &cells {
        for &light in &cells {
            let mut level = template.clone();
            level.heavy_start = heavy;
            level.light_start = light;
            let Ok(pristine) = level.build_grid() else {
                continue;
            };

            for direction in Direction::ALL {
                let mut grid = pristine.clone();
                let mut tracker = BreakableTracker::from_grid(&grid);
                let movers = level.starts().map(|pos| Mover::new(pos, false));
                let res = resolve(&mut grid, &mut tracker, movers, direction);

                assert_ne!(res.targets.heavy, res.targets.light, "{heavy} {light} {direction:?}");
                for who in Character::ALL {
                    let target = *res.targets.get(who);
                    assert!(grid.enterable_by(target, who), "{} at {target}", who.label());
                }
                for &pos in &res.broken {
                    assert_eq!(grid.at(pos), Some(CellKind::Passable));
                }
                checked += 1;
            }
        }
    }
    assert!(checked > 0);
}
