pub mod phase;
pub mod session;
pub mod state;

pub use phase::{current_phase, PerPhase, Phase, PhaseScores, PhaseTracker};
pub use session::{FrameReport, GameSession};
pub use state::{GameState, GameStatus};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::pose::{Canvas, PoseFrame};
use crate::report::GameOutcome;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum GameKind {
    Star,
    Balloon,
    Obstacle,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Star => "star",
            GameKind::Balloon => "balloon",
            GameKind::Obstacle => "obstacle",
        }
    }

    /// Title shown to players and stored with saved sessions.
    pub fn display_name(&self) -> &'static str {
        match self {
            GameKind::Star => "Star Game",
            GameKind::Balloon => "Balloon Game",
            GameKind::Obstacle => "Avoid the Obstacles!",
        }
    }
}

impl FromStr for GameKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "star" | "star game" => Ok(GameKind::Star),
            "balloon" | "balloon game" => Ok(GameKind::Balloon),
            "obstacle" | "obstacles" | "avoid the obstacles!" => Ok(GameKind::Obstacle),
            other => Err(anyhow!("unknown game '{other}'")),
        }
    }
}

/// Per-frame inputs a simulation needs besides the pose itself.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub canvas: Canvas,
    pub now: Instant,
    /// Active play time, excluding every pause.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Complete,
}

/// A simulation driven one frame at a time while the session is playing.
pub trait MotionGame: Send {
    fn kind(&self) -> GameKind;

    /// Called for every frame while playing or paused, before the frame
    /// is gated on `Playing`. Never called while preparing or counting down.
    fn observe(&mut self, _frame: Option<&PoseFrame>, _canvas: Canvas) {}

    fn update(&mut self, frame: Option<&PoseFrame>, ctx: &FrameContext) -> Progress;

    /// Active play time after which the session ends on its own.
    fn time_limit(&self) -> Option<Duration> {
        None
    }

    /// Value for the on-screen score counter.
    fn score(&self) -> i64;

    /// Reduce everything recorded so far into the final outcome.
    fn finish(&mut self) -> GameOutcome;

    fn view(&self, canvas: Canvas) -> GameView;

    /// Return to the freshly configured state.
    fn restart(&mut self);
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SpriteKind {
    Star,
    Balloon,
    Cloud,
    Rock,
    Bird,
}

/// One image to draw, centered on (`x`, `y`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sprite {
    pub kind: SpriteKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
    #[serde(default)]
    pub mirrored: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HudItem {
    pub label: String,
    pub value: String,
}

impl HudItem {
    pub fn new(label: &str, value: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// What the renderer needs to draw one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub sprites: Vec<Sprite>,
    pub hud: Vec<HudItem>,
    /// Y pixel of the star capture line, when one is drawn.
    pub capture_line_y: Option<f64>,
    pub status: GameStatus,
    pub countdown: Option<u32>,
}
