use std::path::PathBuf;

use pairslide::{
    character::Character,
    controller::{PuzzleController, PuzzleEvent},
    grid::Direction,
    level::LevelDescriptor,
};

fn bundled(level_id: u32) -> LevelDescriptor {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("levels")
        .join(format!("level{level_id}.txt"));
    LevelDescriptor::load(&path).expect("bundled level loads")
}

fn play(level_id: u32, moves: &[Direction]) -> PuzzleController {
    let mut controller = PuzzleController::new(level_id, bundled(level_id)).expect("bundled level builds");
    for &direction in moves {
        assert!(controller.apply_move(direction).outcome().is_some());
        controller.finish_transit();
    }
    controller
}

#[test]
fn first_level_is_a_single_joint_slide() {
    let controller = play(1, &[Direction::Up]);
    let score = controller.score().expect("level 1 solved");
    assert_eq!(score.total, 3);
}

#[test]
fn second_level_needs_a_break_then_a_squeeze() {
    let mut controller = PuzzleController::new(2, bundled(2)).expect("bundled level builds");

    let up = controller
        .apply_move(Direction::Up)
        .into_outcome()
        .expect("up accepted");
    assert_eq!(up.resolution.broken.len(), 1);
    controller.finish_transit();

    let left = controller
        .apply_move(Direction::Left)
        .into_outcome()
        .expect("left accepted");
    assert!(left.events.contains(&PuzzleEvent::Squeezed {
        pushed: Character::Heavy
    }));

    let report = left.win.expect("squeeze finishes both");
    assert_eq!(report.level_id, 2);
    assert_eq!(report.score.total, 3);
}
