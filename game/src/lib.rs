pub mod breakables;
pub mod character;
pub mod controller;
pub mod grid;
pub mod level;
pub mod progress;
pub mod resolver;
pub mod scoring;
pub mod serde_duration;
pub mod settings;
pub mod transit;

pub use character::{Character, PerCharacter};
pub use controller::{MoveAttempt, MoveOutcome, Phase, PuzzleController, PuzzleEvent, WinReport};
pub use grid::{CellKind, Direction, Grid, Vec2i};
pub use level::{LevelDescriptor, LevelError};
pub use resolver::{MovePlan, Resolution};
pub use scoring::{ScoreBreakdown, level_score};
