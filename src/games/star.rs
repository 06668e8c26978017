//! Falling stars caught with either hand above a rising capture line.

use rand::{rngs::StdRng, Rng};
use std::time::{Duration, Instant};

use crate::advice::star_advice;
use crate::game::{
    FrameContext, GameKind, GameView, HudItem, MotionGame, Phase, PhaseScores, PhaseTracker,
    Progress, Sprite, SpriteKind,
};
use crate::metrics::{MetricsAccumulator, Side};
use crate::pose::{hands, joint_angle, Canvas, Joint, PixelPoint, PoseFrame};
use crate::report::{GameDetails, GameOutcome, PhaseRow, ResultRow};
use crate::settings::Level;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarType {
    pub size: f64,
    /// Pixels per frame.
    pub speed: f64,
}

pub const STAR_TYPES: [StarType; 3] = [
    StarType { size: 70.0, speed: 5.0 },
    StarType { size: 80.0, speed: 5.0 },
    StarType { size: 90.0, speed: 5.0 },
];

const SPAWN_INTERVAL: Duration = Duration::from_millis(2000);
const CAPTURE_LINE_START: f64 = 0.6;
const CAPTURE_LINE_STEP: f64 = 0.002;
/// Stars appear this fraction of the height above the capture line.
const SPAWN_ABOVE_LINE: f64 = 0.3;
const FORBIDDEN_ZONE: f64 = 0.2;
const SIDE_BAND: f64 = 0.15;
const TOUCH_FACTOR: f64 = 0.75;

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub speed: f64,
    pub side: Side,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarStep {
    Falling,
    /// Touched; carries the hand that touched it.
    Collected(Side),
    Missed,
}

impl Star {
    pub fn new(x: f64, y: f64, kind: StarType, side: Side) -> Self {
        Self {
            x,
            y,
            size: kind.size,
            speed: kind.speed,
            side,
            opacity: 1.0,
        }
    }

    /// Random x inside the band for `side`, keeping clear of the center.
    pub fn spawn_x(rng: &mut impl Rng, canvas_width: f64, side: Side) -> f64 {
        let (min, max) = match side {
            Side::Left => (
                0.5 - FORBIDDEN_ZONE / 2.0 - SIDE_BAND,
                0.5 - FORBIDDEN_ZONE / 2.0,
            ),
            Side::Right => (
                0.5 + FORBIDDEN_ZONE / 2.0,
                0.5 + FORBIDDEN_ZONE / 2.0 + SIDE_BAND,
            ),
        };
        canvas_width * (min + rng.gen::<f64>() * (max - min))
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    pub fn touch_radius(&self) -> f64 {
        self.size * TOUCH_FACTOR
    }

    pub fn touches(&self, hand: PixelPoint) -> bool {
        self.center().distance_to(hand) < self.touch_radius()
    }

    /// Fall one frame and resolve against the hands and the capture line.
    pub fn step(
        &mut self,
        left: PixelPoint,
        right: PixelPoint,
        canvas_height: f64,
        capture_line_y: f64,
    ) -> StarStep {
        self.y += self.speed;

        if self.y + self.size / 2.0 >= capture_line_y {
            self.opacity = 0.0;
        }

        if self.opacity > 0.0 {
            if self.touches(right) {
                return StarStep::Collected(Side::Right);
            }
            if self.touches(left) {
                return StarStep::Collected(Side::Left);
            }
        }

        if self.y > canvas_height || self.opacity <= 0.0 {
            return StarStep::Missed;
        }

        StarStep::Falling
    }
}

pub struct StarGame {
    level: Level,
    duration: Duration,
    rng: StdRng,
    star: Option<Star>,
    last_cleared: Option<Instant>,
    last_side: Side,
    /// Capture line height as a fraction from the top.
    capture_line: f64,
    score: u32,
    spawned: u32,
    missed: u32,
    phase_scores: PhaseScores,
    phases: PhaseTracker,
    metrics: MetricsAccumulator,
}

impl StarGame {
    pub fn new(level: Level, duration_secs: u32, rng: StdRng) -> Self {
        Self {
            level,
            duration: Duration::from_secs(duration_secs as u64),
            rng,
            star: None,
            last_cleared: None,
            last_side: Side::Left,
            capture_line: CAPTURE_LINE_START,
            score: 0,
            spawned: 0,
            missed: 0,
            phase_scores: PhaseScores::default(),
            phases: PhaseTracker::new(),
            metrics: MetricsAccumulator::new(),
        }
    }

    pub fn star(&self) -> Option<&Star> {
        self.star.as_ref()
    }

    pub fn capture_line(&self) -> f64 {
        self.capture_line
    }

    pub fn phase_scores(&self) -> &PhaseScores {
        &self.phase_scores
    }

    pub fn metrics(&self) -> &MetricsAccumulator {
        &self.metrics
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn missed(&self) -> u32 {
        self.missed
    }

    fn advance_capture_line(&mut self) {
        let floor = self.level.capture_line_floor();
        if self.capture_line > floor {
            self.capture_line = (self.capture_line - CAPTURE_LINE_STEP).max(floor);
        }
    }

    fn record_arm(&mut self, frame: &PoseFrame, side: Side, phase: Phase, hand: PixelPoint, height: f64) {
        self.metrics.push_height(side, phase, hand.y / height);

        let (shoulder, wrist, hip) = match side {
            Side::Left => (Joint::LeftShoulder, Joint::LeftWrist, Joint::LeftHip),
            Side::Right => (Joint::RightShoulder, Joint::RightWrist, Joint::RightHip),
        };
        if let (Some(shoulder), Some(wrist), Some(hip)) =
            (frame.get(shoulder), frame.get(wrist), frame.get(hip))
        {
            if let Some(angle) = joint_angle(shoulder, wrist, hip) {
                self.metrics.push_angle(side, phase, angle);
            }
        }
    }

    /// The spawn height rides the capture line, so it climbs with it
    /// toward the level's floor.
    fn spawn(&mut self, canvas: Canvas, capture_line_y: f64) {
        let kind = STAR_TYPES[self.rng.gen_range(0..STAR_TYPES.len())];
        let side = match self.last_side {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        };
        self.last_side = side;

        let x = Star::spawn_x(&mut self.rng, canvas.width, side);
        let y = capture_line_y - SPAWN_ABOVE_LINE * canvas.height;
        self.star = Some(Star::new(x, y, kind, side));
        self.spawned += 1;
    }
}

impl MotionGame for StarGame {
    fn kind(&self) -> GameKind {
        GameKind::Star
    }

    fn update(&mut self, frame: Option<&PoseFrame>, ctx: &FrameContext) -> Progress {
        if ctx.elapsed >= self.duration {
            return Progress::Complete;
        }

        self.advance_capture_line();
        let capture_line_y = self.capture_line * ctx.canvas.height;

        let Some(frame) = frame else {
            return Progress::Continue;
        };
        let Some((left, right)) = hands(frame, ctx.canvas).both() else {
            return Progress::Continue;
        };

        let phase = self
            .phases
            .observe(ctx.elapsed.as_secs_f64(), self.duration.as_secs_f64());
        self.record_arm(frame, Side::Left, phase, left, ctx.canvas.height);
        self.record_arm(frame, Side::Right, phase, right, ctx.canvas.height);

        if let Some(star) = self.star.as_mut() {
            match star.step(left, right, ctx.canvas.height, capture_line_y) {
                StarStep::Falling => {}
                StarStep::Collected(hand) => {
                    self.score += 1;
                    *self.phase_scores.get_mut(phase) += 1;
                    self.star = None;
                    self.last_cleared = Some(ctx.now);
                    log_info!("star caught with {} hand in {} phase", hand.as_str(), phase.as_str());
                }
                StarStep::Missed => {
                    self.missed += 1;
                    self.star = None;
                    self.last_cleared = Some(ctx.now);
                }
            }
        } else {
            let ready = self
                .last_cleared
                .map_or(true, |at| ctx.now.saturating_duration_since(at) >= SPAWN_INTERVAL);
            if ready {
                self.spawn(ctx.canvas, capture_line_y);
            }
        }

        Progress::Continue
    }

    fn time_limit(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn score(&self) -> i64 {
        self.score as i64
    }

    fn finish(&mut self) -> GameOutcome {
        let summary = self.metrics.summarize();
        let rows = Phase::ALL
            .into_iter()
            .map(|phase| {
                let left = summary.left.get(phase);
                let right = summary.right.get(phase);
                ResultRow::Phase(PhaseRow {
                    phase,
                    stars: *self.phase_scores.get(phase),
                    right_angle: right.max_angle,
                    left_angle: left.max_angle,
                    right_range: right.excursion,
                    left_range: left.excursion,
                })
            })
            .collect();
        let advice = star_advice(self.level, &self.phase_scores, &summary);

        log_info!(
            "star game finished: {} caught, {} missed, {} spawned",
            self.score,
            self.missed,
            self.spawned
        );

        GameOutcome {
            kind: GameKind::Star,
            score: self.score as i64,
            rows,
            details: GameDetails::Star {
                level: self.level,
                duration_secs: self.duration.as_secs() as u32,
                phase_scores: self.phase_scores.clone(),
                metrics: summary,
            },
            advice,
        }
    }

    fn view(&self, canvas: Canvas) -> GameView {
        let sprites = self
            .star
            .iter()
            .map(|star| Sprite {
                kind: SpriteKind::Star,
                x: star.x,
                y: star.y,
                width: star.size,
                height: star.size,
                opacity: star.opacity,
                mirrored: false,
            })
            .collect();

        GameView {
            sprites,
            hud: vec![HudItem::new("Score", self.score)],
            capture_line_y: Some(self.capture_line * canvas.height),
            ..GameView::default()
        }
    }

    fn restart(&mut self) {
        self.star = None;
        self.last_cleared = None;
        self.last_side = Side::Left;
        self.capture_line = CAPTURE_LINE_START;
        self.score = 0;
        self.spawned = 0;
        self.missed = 0;
        self.phase_scores = PhaseScores::default();
        self.phases.reset();
        self.metrics.clear();
    }
}
