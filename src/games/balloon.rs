//! A balloon steered by arm elevation, collecting one cloud at a time.

use rand::{rngs::StdRng, Rng};
use std::time::{Duration, Instant};

use crate::advice::{balloon_advice, stability_from_attempts};
use crate::game::{
    FrameContext, GameKind, GameView, HudItem, MotionGame, Progress, Sprite, SpriteKind,
};
use crate::metrics::SymmetrySeries;
use crate::pose::{Canvas, Joint, PoseFrame};
use crate::report::{CloudRow, GameDetails, GameOutcome, ResultRow};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

const BALLOON_START_Y: f64 = 300.0;
const BALLOON_SMOOTHING: f64 = 0.2;
const BALLOON_X: f64 = 0.7;
const BALLOON_WIDTH: f64 = 180.0;
const BALLOON_HEIGHT: f64 = 270.0;
/// Cap on the shoulder-width distance compensation.
const MAX_ARM_SCALE: f64 = 3.0;
const ARM_SCALE_DIVISOR: f64 = 2.5;
const RESTING_OFFSET: f64 = 0.3;
const TRAVEL: f64 = 0.8;

const CLOUD_WIDTH: f64 = 220.0;
const CLOUD_HEIGHT: f64 = 250.0;
const CLOUD_X: f64 = 0.7;
const TOUCH_HALF_HEIGHT: f64 = 150.0 / 2.0;
const TOUCH_RADIUS: f64 = 30.0;
const FADE_STEP: f64 = 0.02;
const CLOUD_MARGIN: f64 = 100.0;
const MIN_CLOUD_DISTANCE: f64 = 200.0;
const MAX_SPAWN_TRIES: usize = 64;
const COLLECT_COOLDOWN: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    pub y: f64,
    pub opacity: f64,
    pub visible: bool,
}

impl Cloud {
    pub fn new(y: f64) -> Self {
        Self {
            y,
            opacity: 1.0,
            visible: true,
        }
    }

    pub fn is_touching(&self, balloon_y: f64) -> bool {
        (balloon_y - self.y).abs() < TOUCH_HALF_HEIGHT + TOUCH_RADIUS
    }

    /// Fade one frame. Returns true once the cloud has faded out completely.
    pub fn fade(&mut self) -> bool {
        self.opacity -= FADE_STEP;
        if self.opacity <= 0.0 {
            self.visible = false;
            self.opacity = 1.0;
            return true;
        }
        false
    }
}

/// Random cloud height in `[margin, h - margin)` keeping clear of the balloon.
/// Falls back to the farthest candidate seen when the canvas leaves no room.
pub fn spawn_height(rng: &mut impl Rng, canvas_height: f64, balloon_y: f64) -> f64 {
    let low = CLOUD_MARGIN;
    let high = canvas_height - CLOUD_MARGIN;
    if high <= low {
        return canvas_height / 2.0;
    }

    let mut best = low;
    for _ in 0..MAX_SPAWN_TRIES {
        let y = rng.gen_range(low..high);
        if (y - balloon_y).abs() >= MIN_CLOUD_DISTANCE {
            return y;
        }
        if (y - balloon_y).abs() > (best - balloon_y).abs() {
            best = y;
        }
    }
    best
}

/// Where the arms ask the balloon to be, in pixels.
fn target_height(frame: &PoseFrame, canvas: Canvas) -> Option<f64> {
    let left_shoulder = frame.get(Joint::LeftShoulder)?;
    let right_shoulder = frame.get(Joint::RightShoulder)?;
    let left_wrist = frame.get(Joint::LeftWrist)?;
    let right_wrist = frame.get(Joint::RightWrist)?;

    let shoulder_y = (left_shoulder.y + right_shoulder.y) / 2.0;
    let wrist_y = (left_wrist.y + right_wrist.y) / 2.0;
    let delta = shoulder_y - wrist_y;

    let shoulder_width = (left_shoulder.x - right_shoulder.x).abs();
    let scale = (1.0 / (shoulder_width * ARM_SCALE_DIVISOR)).min(MAX_ARM_SCALE);

    Some(canvas.height / 2.0 + (RESTING_OFFSET - delta * scale) * canvas.height * TRAVEL)
}

pub struct BalloonGame {
    cloud_count: u32,
    canvas_height: f64,
    rng: StdRng,
    balloon_y: f64,
    cloud: Cloud,
    touching: bool,
    attempts: u32,
    collected: u32,
    cooldown_until: Option<Instant>,
    rows: Vec<CloudRow>,
    symmetry: SymmetrySeries,
}

impl BalloonGame {
    pub fn new(cloud_count: u32, canvas: Canvas, mut rng: StdRng) -> Self {
        let cloud = Cloud::new(spawn_height(&mut rng, canvas.height, BALLOON_START_Y));
        Self {
            cloud_count,
            canvas_height: canvas.height,
            rng,
            balloon_y: BALLOON_START_Y,
            cloud,
            touching: false,
            attempts: 0,
            collected: 0,
            cooldown_until: None,
            rows: Vec::new(),
            symmetry: SymmetrySeries::new(),
        }
    }

    pub fn balloon_y(&self) -> f64 {
        self.balloon_y
    }

    pub fn cloud(&self) -> &Cloud {
        &self.cloud
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn rows(&self) -> &[CloudRow] {
        &self.rows
    }

    pub fn symmetry(&self) -> &SymmetrySeries {
        &self.symmetry
    }

    fn collect(&mut self, now: Instant) -> Progress {
        self.collected += 1;
        let stability = stability_from_attempts(self.attempts);
        self.rows.push(CloudRow {
            cloud: self.collected,
            attempts: self.attempts,
            stability,
        });
        log_info!(
            "cloud {} collected after {} attempts ({}% stability)",
            self.collected,
            self.attempts,
            stability
        );
        self.attempts = 0;
        self.touching = false;

        if self.collected >= self.cloud_count {
            return Progress::Complete;
        }

        self.cloud = Cloud::new(spawn_height(&mut self.rng, self.canvas_height, self.balloon_y));
        self.cooldown_until = Some(now + COLLECT_COOLDOWN);
        Progress::Continue
    }
}

impl MotionGame for BalloonGame {
    fn kind(&self) -> GameKind {
        GameKind::Balloon
    }

    fn observe(&mut self, frame: Option<&PoseFrame>, _canvas: Canvas) {
        let Some(frame) = frame else {
            return;
        };
        if let (Some(ls), Some(lw), Some(rs), Some(rw)) = (
            frame.get(Joint::LeftShoulder),
            frame.get(Joint::LeftWrist),
            frame.get(Joint::RightShoulder),
            frame.get(Joint::RightWrist),
        ) {
            self.symmetry.record(ls.y - lw.y, rs.y - rw.y);
        }
    }

    fn update(&mut self, frame: Option<&PoseFrame>, ctx: &FrameContext) -> Progress {
        if let Some(target) = frame.and_then(|frame| target_height(frame, ctx.canvas)) {
            if target.is_finite() {
                self.balloon_y += (target - self.balloon_y) * BALLOON_SMOOTHING;
            }
        }

        let cooling_down = self.cooldown_until.map_or(false, |until| ctx.now < until);
        if cooling_down {
            return Progress::Continue;
        }
        self.cooldown_until = None;

        if self.cloud.is_touching(self.balloon_y) {
            if !self.touching {
                self.touching = true;
                self.attempts += 1;
            }
            if self.cloud.fade() {
                return self.collect(ctx.now);
            }
        } else {
            self.touching = false;
            self.cloud.opacity = 1.0;
        }

        Progress::Continue
    }

    /// Clouds still to collect.
    fn score(&self) -> i64 {
        self.cloud_count as i64 - self.collected as i64
    }

    fn finish(&mut self) -> GameOutcome {
        let stabilities: Vec<u32> = self.rows.iter().map(|row| row.stability).collect();
        let advice = balloon_advice(&stabilities, self.symmetry.mean());

        GameOutcome {
            kind: GameKind::Balloon,
            score: self.score(),
            rows: self.rows.iter().cloned().map(ResultRow::Cloud).collect(),
            details: GameDetails::Balloon {
                cloud_count: self.cloud_count,
                symmetry: self.symmetry.summarize(),
            },
            advice,
        }
    }

    fn view(&self, canvas: Canvas) -> GameView {
        let mut sprites = Vec::with_capacity(2);
        if self.cloud.visible {
            sprites.push(Sprite {
                kind: SpriteKind::Cloud,
                x: canvas.width * CLOUD_X,
                y: self.cloud.y,
                width: CLOUD_WIDTH,
                height: CLOUD_HEIGHT,
                opacity: self.cloud.opacity,
                mirrored: false,
            });
        }
        sprites.push(Sprite {
            kind: SpriteKind::Balloon,
            x: canvas.width * BALLOON_X,
            y: self.balloon_y,
            width: BALLOON_WIDTH,
            height: BALLOON_HEIGHT,
            opacity: 1.0,
            mirrored: false,
        });

        GameView {
            sprites,
            hud: vec![
                HudItem::new("Clouds left", self.score()),
                HudItem::new("Attempts", self.attempts),
            ],
            ..GameView::default()
        }
    }

    fn restart(&mut self) {
        self.balloon_y = BALLOON_START_Y;
        self.cloud = Cloud::new(spawn_height(&mut self.rng, self.canvas_height, BALLOON_START_Y));
        self.touching = false;
        self.attempts = 0;
        self.collected = 0;
        self.cooldown_until = None;
        self.rows.clear();
        self.symmetry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::balloon::STABILITY_GOOD;
    use crate::pose::{Landmark, LANDMARK_COUNT};
    use rand::SeedableRng;

    const CANVAS: Canvas = Canvas {
        width: 1280.0,
        height: 720.0,
    };

    fn game(clouds: u32) -> BalloonGame {
        BalloonGame::new(clouds, CANVAS, StdRng::seed_from_u64(11))
    }

    fn ctx(now: Instant) -> FrameContext {
        FrameContext {
            canvas: CANVAS,
            now,
            elapsed: Duration::ZERO,
        }
    }

    fn arms(shoulder_y: f64, left_wrist_y: f64, right_wrist_y: f64) -> PoseFrame {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.9); LANDMARK_COUNT];
        landmarks[Joint::LeftShoulder.index()] = Landmark::new(0.4, shoulder_y, 0.9);
        landmarks[Joint::RightShoulder.index()] = Landmark::new(0.6, shoulder_y, 0.9);
        landmarks[Joint::LeftWrist.index()] = Landmark::new(0.3, left_wrist_y, 0.9);
        landmarks[Joint::RightWrist.index()] = Landmark::new(0.7, right_wrist_y, 0.9);
        PoseFrame::new(landmarks)
    }

    /// Holds the balloon on the cloud until it is collected. Returns the
    /// instant after the last frame.
    fn hold_until_collected(game: &mut BalloonGame, mut now: Instant) -> (Instant, Progress) {
        let before = game.collected();
        for _ in 0..200 {
            game.balloon_y = game.cloud.y;
            let progress = game.update(None, &ctx(now));
            now += Duration::from_millis(16);
            if game.collected() > before {
                return (now, progress);
            }
        }
        panic!("cloud was never collected");
    }

    /// One brief contact that breaks before the cloud fades out.
    fn touch_and_leave(game: &mut BalloonGame, now: Instant) {
        game.balloon_y = game.cloud.y;
        game.update(None, &ctx(now));
        assert!(game.cloud().opacity < 1.0);
        game.balloon_y = game.cloud.y + 400.0;
        game.update(None, &ctx(now));
        assert_eq!(game.cloud().opacity, 1.0);
    }

    #[test]
    fn test_touch_threshold() {
        let cloud = Cloud::new(300.0);
        assert!(cloud.is_touching(404.0));
        assert!(!cloud.is_touching(405.0));
        assert!(cloud.is_touching(196.0));
    }

    #[test]
    fn test_fade_resets_opacity_when_done() {
        let mut cloud = Cloud::new(300.0);
        let mut frames = 0;
        while !cloud.fade() {
            frames += 1;
            assert!(frames < 100);
        }
        assert!(!cloud.visible);
        assert_eq!(cloud.opacity, 1.0);
        assert!(frames >= 49);
    }

    #[test]
    fn test_spawn_keeps_distance_from_balloon() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            let y = spawn_height(&mut rng, 720.0, 300.0);
            assert!((100.0..620.0).contains(&y));
            assert!((y - 300.0).abs() >= MIN_CLOUD_DISTANCE);
        }
        assert_eq!(spawn_height(&mut rng, 150.0, 10.0), 75.0);
    }

    #[test]
    fn test_balloon_eases_toward_target() {
        let mut game = game(3);
        let frame = arms(0.4, 0.4, 0.4);
        game.update(Some(&frame), &ctx(Instant::now()));
        // scale = 1 / (0.2 * 2.5) = 2, delta = 0 -> target 360 + 0.3 * 576
        let target = 360.0 + 0.3 * 720.0 * 0.8;
        let expected = 300.0 + (target - 300.0) * 0.2;
        assert!((game.balloon_y() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_symmetry_recorded_on_observe() {
        let mut game = game(3);
        game.observe(Some(&arms(0.4, 0.2, 0.3)), CANVAS);
        game.observe(None, CANVAS);
        assert_eq!(game.symmetry().len(), 1);
        assert!((game.symmetry().mean().unwrap() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_attempts_count_contact_episodes() {
        let mut game = game(3);
        let t0 = Instant::now();
        touch_and_leave(&mut game, t0);
        touch_and_leave(&mut game, t0);
        assert_eq!(game.attempts(), 2);

        let (_, progress) = hold_until_collected(&mut game, t0);
        assert_eq!(progress, Progress::Continue);
        assert_eq!(game.rows()[0].attempts, 3);
        assert_eq!(game.rows()[0].stability, 60);
        assert_eq!(game.attempts(), 0);
        assert_eq!(game.score(), 2);
    }

    #[test]
    fn test_cooldown_blocks_immediate_contact() {
        let mut game = game(3);
        let t0 = Instant::now();
        let (now, _) = hold_until_collected(&mut game, t0);
        game.balloon_y = game.cloud.y;
        game.update(None, &ctx(now));
        assert_eq!(game.attempts(), 0);
        game.update(None, &ctx(now + COLLECT_COOLDOWN));
        assert_eq!(game.attempts(), 1);
    }

    #[test]
    fn test_three_clouds_end_to_end() {
        let mut game = game(3);
        let mut now = Instant::now();
        let plan = [1, 2, 5];

        let mut progress = Progress::Continue;
        for attempts in plan {
            for _ in 1..attempts {
                touch_and_leave(&mut game, now);
            }
            let (next, result) = hold_until_collected(&mut game, now);
            now = next + COLLECT_COOLDOWN;
            progress = result;
        }

        assert_eq!(progress, Progress::Complete);
        let outcome = game.finish();
        let stabilities: Vec<u32> = outcome
            .rows
            .iter()
            .map(|row| match row {
                ResultRow::Cloud(row) => row.stability,
                other => panic!("unexpected row {other:?}"),
            })
            .collect();
        assert_eq!(stabilities, vec![100, 80, 20]);
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.advice, vec![STABILITY_GOOD.to_string()]);
    }

    #[test]
    fn test_restart_clears_progress() {
        let mut game = game(2);
        hold_until_collected(&mut game, Instant::now());
        game.observe(Some(&arms(0.4, 0.2, 0.3)), CANVAS);
        game.restart();
        assert_eq!(game.collected(), 0);
        assert!(game.rows().is_empty());
        assert!(game.symmetry().is_empty());
        assert_eq!(game.balloon_y(), BALLOON_START_Y);
    }
}
