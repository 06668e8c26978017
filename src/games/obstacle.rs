//! Obstacles crossing the screen that the player must duck under.

use rand::{rngs::StdRng, Rng};

use crate::advice::obstacle_advice;
use crate::game::{
    FrameContext, GameKind, GameView, HudItem, MotionGame, Progress, Sprite, SpriteKind,
};
use crate::metrics::Metric;
use crate::pose::{all_pixels, joint_angle, Canvas, Joint, PixelPoint, PoseFrame};
use crate::report::{GameDetails, GameOutcome, ObstacleRow, ResultRow};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const OBSTACLE_RADIUS: f64 = 100.0;
/// Pixels per frame.
const OBSTACLE_SPEED: f64 = 15.0;
const BAND_TOP: f64 = 0.2;
const BAND_SPAN: f64 = 0.1;
const SPRITES: [SpriteKind; 3] = [SpriteKind::Rock, SpriteKind::Bird, SpriteKind::Cloud];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub x: f64,
    pub y: f64,
    /// Signed horizontal velocity.
    pub speed: f64,
    pub sprite: SpriteKind,
}

impl Obstacle {
    pub fn new(direction: Direction, y: f64, sprite: SpriteKind, canvas_width: f64) -> Self {
        let (x, speed) = match direction {
            Direction::LeftToRight => (-OBSTACLE_RADIUS, OBSTACLE_SPEED),
            Direction::RightToLeft => (canvas_width + OBSTACLE_RADIUS, -OBSTACLE_SPEED),
        };
        Self { x, y, speed, sprite }
    }

    pub fn spawn(rng: &mut impl Rng, canvas: Canvas) -> Self {
        let direction = if rng.gen_bool(0.5) {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        };
        let y = canvas.height * (BAND_TOP + rng.gen::<f64>() * BAND_SPAN);
        let sprite = SPRITES[rng.gen_range(0..SPRITES.len())];
        Self::new(direction, y, sprite, canvas.width)
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    /// True when any landmark lies strictly inside the obstacle.
    pub fn hits(&self, frame: &PoseFrame, canvas: Canvas) -> bool {
        let center = self.center();
        all_pixels(frame, canvas).any(|point| point.distance_to(center) < OBSTACLE_RADIUS)
    }

    pub fn is_off_screen(&self, canvas_width: f64) -> bool {
        self.x - OBSTACLE_RADIUS > canvas_width || self.x + OBSTACLE_RADIUS < 0.0
    }
}

pub struct ObstacleGame {
    obstacle_count: u32,
    rng: StdRng,
    obstacle: Option<Obstacle>,
    generated: u32,
    failed: u32,
    min_knee_angle: Option<f64>,
    rows: Vec<ObstacleRow>,
}

impl ObstacleGame {
    pub fn new(obstacle_count: u32, rng: StdRng) -> Self {
        Self {
            obstacle_count,
            rng,
            obstacle: None,
            generated: 0,
            failed: 0,
            min_knee_angle: None,
            rows: Vec::new(),
        }
    }

    pub fn obstacle(&self) -> Option<&Obstacle> {
        self.obstacle.as_ref()
    }

    pub fn generated(&self) -> u32 {
        self.generated
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn rows(&self) -> &[ObstacleRow] {
        &self.rows
    }

    fn track_knee(&mut self, frame: &PoseFrame) {
        if let (Some(hip), Some(knee), Some(ankle)) = (
            frame.get(Joint::LeftHip),
            frame.get(Joint::LeftKnee),
            frame.get(Joint::LeftAnkle),
        ) {
            if let Some(angle) = joint_angle(knee, hip, ankle) {
                self.min_knee_angle = Some(self.min_knee_angle.map_or(angle, |min| min.min(angle)));
            }
        }
    }
}

impl MotionGame for ObstacleGame {
    fn kind(&self) -> GameKind {
        GameKind::Obstacle
    }

    fn update(&mut self, frame: Option<&PoseFrame>, ctx: &FrameContext) -> Progress {
        if self.obstacle.is_none() && self.generated < self.obstacle_count {
            self.obstacle = Some(Obstacle::spawn(&mut self.rng, ctx.canvas));
            self.generated += 1;
        }

        let Some(obstacle) = self.obstacle.as_mut() else {
            return Progress::Continue;
        };
        obstacle.x += obstacle.speed;
        let collision = frame.map_or(false, |frame| obstacle.hits(frame, ctx.canvas));
        let off_screen = obstacle.is_off_screen(ctx.canvas.width);

        if let Some(frame) = frame {
            self.track_knee(frame);
        }

        if collision {
            self.failed += 1;
        }
        if !(collision || off_screen) {
            return Progress::Continue;
        }

        self.rows.push(ObstacleRow {
            obstacle: self.generated,
            passed: !collision,
            min_knee_angle: Metric::rounded(self.min_knee_angle.take(), 1),
        });
        self.obstacle = None;
        log_info!(
            "obstacle {} {}",
            self.generated,
            if collision { "hit" } else { "passed" }
        );

        if self.generated >= self.obstacle_count {
            Progress::Complete
        } else {
            Progress::Continue
        }
    }

    /// Obstacles not yet sent.
    fn score(&self) -> i64 {
        self.obstacle_count as i64 - self.generated as i64
    }

    fn finish(&mut self) -> GameOutcome {
        let passed: Vec<bool> = self.rows.iter().map(|row| row.passed).collect();

        GameOutcome {
            kind: GameKind::Obstacle,
            score: self.score(),
            rows: self.rows.iter().cloned().map(ResultRow::Obstacle).collect(),
            details: GameDetails::Obstacle {
                obstacle_count: self.obstacle_count,
                failed: self.failed,
            },
            advice: obstacle_advice(&passed),
        }
    }

    fn view(&self, _canvas: Canvas) -> GameView {
        let sprites = self
            .obstacle
            .iter()
            .map(|obstacle| Sprite {
                kind: obstacle.sprite,
                x: obstacle.x,
                y: obstacle.y,
                width: OBSTACLE_RADIUS * 2.0,
                height: OBSTACLE_RADIUS * 2.0,
                opacity: 1.0,
                mirrored: obstacle.speed < 0.0,
            })
            .collect();

        GameView {
            sprites,
            hud: vec![
                HudItem::new("Obstacles left", self.score()),
                HudItem::new("Hits", self.failed),
            ],
            ..GameView::default()
        }
    }

    fn restart(&mut self) {
        self.obstacle = None;
        self.generated = 0;
        self.failed = 0;
        self.min_knee_angle = None;
        self.rows.clear();
    }
}
