//! The three motion-game simulations behind [`MotionGame`].

pub mod balloon;
pub mod obstacle;
pub mod star;

pub use balloon::BalloonGame;
pub use obstacle::ObstacleGame;
pub use star::StarGame;

use rand::{rngs::StdRng, SeedableRng};

use crate::game::{GameKind, MotionGame};
use crate::settings::GameOptions;

/// Build a freshly configured simulation seeded from the OS.
pub fn build(kind: GameKind, options: &GameOptions) -> Box<dyn MotionGame> {
    build_seeded(kind, options, StdRng::from_entropy())
}

/// Same as [`build`] with a caller-chosen random source, for reproducible runs.
pub fn build_seeded(kind: GameKind, options: &GameOptions, rng: StdRng) -> Box<dyn MotionGame> {
    match kind {
        GameKind::Star => Box::new(StarGame::new(options.level, options.duration_secs, rng)),
        GameKind::Balloon => Box::new(BalloonGame::new(options.cloud_count, options.canvas, rng)),
        GameKind::Obstacle => Box::new(ObstacleGame::new(options.obstacle_count, rng)),
    }
}
