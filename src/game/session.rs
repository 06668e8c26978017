use anyhow::{anyhow, Result};
use rand::{rngs::StdRng, SeedableRng};
use std::time::{Duration, Instant};

use log::info;

use crate::games;
use crate::pose::{is_body_visible, Canvas, PoseFrame};
use crate::report::GameOutcome;
use crate::settings::GameOptions;

use super::{
    FrameContext, GameKind, GameState, GameStatus, GameView, HudItem, MotionGame, Progress,
};

/// Result of handing one frame or tick to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub previous: GameStatus,
    pub status: GameStatus,
    pub previous_score: i64,
    pub score: i64,
}

impl FrameReport {
    pub fn status_changed(&self) -> bool {
        self.previous != self.status
    }

    pub fn score_changed(&self) -> bool {
        self.previous_score != self.score
    }

    pub fn finished(&self) -> bool {
        self.status_changed() && self.status == GameStatus::GameOver
    }
}

/// One mini-game screen: lifecycle plus the simulation it gates.
pub struct GameSession {
    state: GameState,
    game: Box<dyn MotionGame>,
    canvas: Canvas,
    outcome: Option<GameOutcome>,
}

impl GameSession {
    pub fn new(kind: GameKind, options: &GameOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::with_game(games::build(kind, options), options.canvas))
    }

    /// Like [`GameSession::new`] but with reproducible spawns.
    pub fn with_seed(kind: GameKind, options: &GameOptions, seed: u64) -> Result<Self> {
        options.validate()?;
        let game = games::build_seeded(kind, options, StdRng::seed_from_u64(seed));
        Ok(Self::with_game(game, options.canvas))
    }

    pub fn with_game(game: Box<dyn MotionGame>, canvas: Canvas) -> Self {
        Self {
            state: GameState::new(),
            game,
            canvas,
            outcome: None,
        }
    }

    pub fn kind(&self) -> GameKind {
        self.game.kind()
    }

    pub fn status(&self) -> GameStatus {
        self.state.status()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn score(&self) -> i64 {
        self.game.score()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.state.elapsed(now)
    }

    /// Final outcome, available once the session reached game over.
    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// Process one pose frame (`None` when no body was detected).
    pub fn handle_frame(&mut self, frame: Option<&PoseFrame>, now: Instant) -> FrameReport {
        let previous = self.state.status();
        let previous_score = self.game.score();
        if previous == GameStatus::GameOver {
            return self.report(previous, previous_score);
        }

        // Passive sampling starts with play and keeps running while paused.
        if matches!(previous, GameStatus::Playing | GameStatus::Paused) {
            self.game.observe(frame, self.canvas);
        }
        if previous == GameStatus::Paused {
            return self.report(previous, previous_score);
        }

        self.state.observe_visibility(is_body_visible(frame), now);
        self.state.tick(now);

        if self.state.status() == GameStatus::Playing {
            let ctx = FrameContext {
                canvas: self.canvas,
                now,
                elapsed: self.state.elapsed(now),
            };
            if self.game.update(frame, &ctx) == Progress::Complete {
                self.complete(now);
            } else {
                self.enforce_time_limit(now);
            }
        }

        self.report(previous, previous_score)
    }

    /// Advance debounce, countdown and time-limit expiry without a frame.
    pub fn tick(&mut self, now: Instant) -> FrameReport {
        let previous = self.state.status();
        let previous_score = self.game.score();
        self.state.tick(now);
        self.enforce_time_limit(now);
        self.report(previous, previous_score)
    }

    pub fn pause(&mut self, now: Instant) -> Result<()> {
        self.state.pause(now)?;
        info!("{} paused", self.kind().as_str());
        Ok(())
    }

    pub fn resume(&mut self, now: Instant) -> Result<()> {
        self.state.resume(now)?;
        info!("{} resumed", self.kind().as_str());
        Ok(())
    }

    /// Throw away all progress and return to `Preparing`.
    pub fn restart(&mut self) {
        self.state.reset();
        self.game.restart();
        self.outcome = None;
        info!("{} restarted", self.kind().as_str());
    }

    pub fn view(&self, now: Instant) -> GameView {
        let mut view = self.game.view(self.canvas);
        view.status = self.state.status();
        view.countdown = self.state.countdown_remaining(now);
        if let Some(limit) = self.game.time_limit() {
            let left = limit.saturating_sub(self.state.elapsed(now));
            view.hud.push(HudItem::new("Time left", left.as_secs()));
        }
        view
    }

    pub fn require_outcome(&self) -> Result<&GameOutcome> {
        self.outcome
            .as_ref()
            .ok_or_else(|| anyhow!("game is not over yet"))
    }

    fn enforce_time_limit(&mut self, now: Instant) {
        if self.state.status() != GameStatus::Playing {
            return;
        }
        if let Some(limit) = self.game.time_limit() {
            if self.state.elapsed(now) >= limit {
                self.complete(now);
            }
        }
    }

    fn complete(&mut self, now: Instant) {
        if self.state.finish(now).is_ok() {
            let outcome = self.game.finish();
            info!(
                "{} over: score {}, {} result rows",
                self.kind().as_str(),
                outcome.score,
                outcome.rows.len()
            );
            self.outcome = Some(outcome);
        }
    }

    fn report(&self, previous: GameStatus, previous_score: i64) -> FrameReport {
        FrameReport {
            previous,
            status: self.state.status(),
            previous_score,
            score: self.game.score(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::star::FATIGUE;
    use crate::game::{current_phase, GameView, PhaseScores, SpriteKind};
    use crate::games::BalloonGame;
    use crate::pose::{Joint, Landmark, LANDMARK_COUNT};
    use crate::report::{GameDetails, ResultRow};
    use std::sync::{Arc, Mutex};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn visible_body() -> PoseFrame {
        PoseFrame::new(vec![Landmark::new(0.5, 0.5, 0.9); LANDMARK_COUNT])
    }

    fn session(kind: GameKind) -> GameSession {
        GameSession::with_seed(kind, &GameOptions::default(), 42).unwrap()
    }

    /// Debounce plus countdown; returns the instant play began.
    fn start_playing(session: &mut GameSession, t0: Instant) -> Instant {
        let body = visible_body();
        session.handle_frame(Some(&body), t0);
        let report = session.handle_frame(Some(&body), t0 + ms(800));
        assert_eq!(report.status, GameStatus::Countdown);
        assert!(report.status_changed());
        let play = t0 + ms(3800);
        session.tick(play);
        assert_eq!(session.status(), GameStatus::Playing);
        play
    }

    #[test]
    fn test_rejects_invalid_options() {
        let mut options = GameOptions::default();
        options.obstacle_count = 0;
        assert!(GameSession::new(GameKind::Obstacle, &options).is_err());
    }

    #[test]
    fn test_star_ends_on_time_limit() {
        let mut session = session(GameKind::Star);
        let t0 = Instant::now();
        let play = start_playing(&mut session, t0);
        let body = visible_body();

        let mut finished = None;
        for step in 1..=400u64 {
            let report = session.handle_frame(Some(&body), play + ms(step * 100));
            if report.finished() {
                finished = Some(step);
                break;
            }
        }

        assert_eq!(finished, Some(300));
        assert_eq!(session.elapsed(play + ms(60_000)), ms(30_000));
        let outcome = session.require_outcome().unwrap();
        assert_eq!(outcome.kind, GameKind::Star);
        assert_eq!(outcome.rows.len(), 3);
        assert!(matches!(outcome.details, GameDetails::Star { .. }));
    }

    #[test]
    fn test_tick_alone_expires_star() {
        let mut session = session(GameKind::Star);
        let play = start_playing(&mut session, Instant::now());
        assert!(!session.tick(play + ms(29_999)).finished());
        assert!(session.tick(play + ms(30_000)).finished());
        assert!(session.outcome().is_some());
    }

    #[test]
    fn test_pause_freezes_frames_and_clock() {
        let mut session = session(GameKind::Star);
        let play = start_playing(&mut session, Instant::now());

        session.pause(play + ms(5000)).unwrap();
        let report = session.handle_frame(None, play + ms(6000));
        assert_eq!(report.status, GameStatus::Paused);
        assert!(!report.status_changed());
        assert!(session.pause(play + ms(6000)).is_err());

        session.resume(play + ms(10_000)).unwrap();
        assert_eq!(session.elapsed(play + ms(10_000)), ms(5000));
        let view = session.view(play + ms(10_000));
        assert_eq!(view.status, GameStatus::Playing);
        assert!(view.hud.contains(&HudItem::new("Time left", 25)));
    }

    #[test]
    fn test_body_loss_returns_to_preparing() {
        let mut session = session(GameKind::Balloon);
        let play = start_playing(&mut session, Instant::now());

        let report = session.handle_frame(None, play + ms(2000));
        assert_eq!(report.previous, GameStatus::Playing);
        assert_eq!(report.status, GameStatus::Preparing);
        assert_eq!(session.elapsed(play + ms(9000)), ms(2000));
        assert_eq!(session.state().body_lost_count(), 1);

        let back = start_playing(&mut session, play + ms(9000));
        assert_eq!(session.elapsed(back + ms(1000)), ms(3000));
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut options = GameOptions::default();
        options.obstacle_count = 1;
        let mut session = GameSession::with_seed(GameKind::Obstacle, &options, 7).unwrap();
        let play = start_playing(&mut session, Instant::now());

        // A body far below the obstacle band never collides.
        let mut low = vec![Landmark::new(0.5, 0.9, 0.9); LANDMARK_COUNT];
        low[0] = Landmark::new(0.5, 0.95, 0.9);
        let low = PoseFrame::new(low);
        let mut now = play;
        while session.status() == GameStatus::Playing {
            now += ms(33);
            session.handle_frame(Some(&low), now);
            assert!(now < play + ms(60_000));
        }

        let outcome = session.require_outcome().unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert!(matches!(&outcome.rows[0], ResultRow::Obstacle(row) if row.passed));
        assert_eq!(session.score(), 0);

        session.restart();
        assert_eq!(session.status(), GameStatus::Preparing);
        assert!(session.outcome().is_none());
        assert!(session.require_outcome().is_err());
        assert_eq!(session.score(), 1);
    }

    /// Balloon game shared with the test so its samples stay readable.
    struct SharedBalloon(Arc<Mutex<BalloonGame>>);

    impl MotionGame for SharedBalloon {
        fn kind(&self) -> GameKind {
            GameKind::Balloon
        }

        fn observe(&mut self, frame: Option<&PoseFrame>, canvas: Canvas) {
            self.0.lock().unwrap().observe(frame, canvas)
        }

        fn update(&mut self, frame: Option<&PoseFrame>, ctx: &FrameContext) -> Progress {
            self.0.lock().unwrap().update(frame, ctx)
        }

        fn score(&self) -> i64 {
            self.0.lock().unwrap().score()
        }

        fn finish(&mut self) -> GameOutcome {
            self.0.lock().unwrap().finish()
        }

        fn view(&self, canvas: Canvas) -> GameView {
            self.0.lock().unwrap().view(canvas)
        }

        fn restart(&mut self) {
            self.0.lock().unwrap().restart()
        }
    }

    fn with_hands(left: (f64, f64), right: (f64, f64)) -> PoseFrame {
        let mut landmarks = visible_body().landmarks().to_vec();
        landmarks[Joint::LeftShoulder.index()] = Landmark::new(0.4, 0.3, 0.9);
        landmarks[Joint::RightShoulder.index()] = Landmark::new(0.6, 0.3, 0.9);
        landmarks[Joint::LeftWrist.index()] = Landmark::new(left.0, left.1, 0.9);
        landmarks[Joint::RightWrist.index()] = Landmark::new(right.0, right.1, 0.9);
        PoseFrame::new(landmarks)
    }

    #[test]
    fn test_no_symmetry_samples_before_play() {
        let canvas = Canvas::default();
        let balloon = Arc::new(Mutex::new(BalloonGame::new(
            3,
            canvas,
            rand::rngs::StdRng::seed_from_u64(5),
        )));
        let mut session = GameSession::with_game(Box::new(SharedBalloon(balloon.clone())), canvas);

        // One arm raised, the other low.
        let lopsided = with_hands((0.3, 0.1), (0.7, 0.5));
        let t0 = Instant::now();
        for step in 0..114u64 {
            session.handle_frame(Some(&lopsided), t0 + ms(step * 33));
        }
        assert_eq!(session.status(), GameStatus::Countdown);
        assert_eq!(balloon.lock().unwrap().symmetry().len(), 0);

        // Debounce ends on the frame at 825 ms, the countdown 3 s later.
        let play = t0 + ms(3825);
        session.tick(play);
        assert_eq!(session.status(), GameStatus::Playing);
        session.handle_frame(Some(&lopsided), play + ms(33));
        assert_eq!(balloon.lock().unwrap().symmetry().len(), 1);

        session.pause(play + ms(40)).unwrap();
        session.handle_frame(Some(&lopsided), play + ms(66));
        let symmetry = balloon.lock().unwrap().symmetry().summarize();
        assert_eq!(symmetry.samples, 2);
        assert_eq!(symmetry.mean_error.value(), Some(0.4));
    }

    #[test]
    fn test_star_phase_scores_drive_fatigue_advice() {
        // Medium level, 30 seconds.
        let mut session = session(GameKind::Star);
        let canvas = session.canvas();
        let play = start_playing(&mut session, Instant::now());
        let idle = visible_body();
        let wanted = PhaseScores {
            start: 5,
            middle: 3,
            end: 1,
        };
        let mut caught = PhaseScores::default();

        let mut step = 0u64;
        while session.status() == GameStatus::Playing {
            step += 1;
            assert!(step <= 400);
            let now = play + ms(step * 100);
            let phase = current_phase(session.elapsed(now).as_secs_f64(), 30.0);
            let star = session
                .view(now)
                .sprites
                .into_iter()
                .find(|sprite| sprite.kind == SpriteKind::Star);

            let frame = match star {
                Some(star) if caught.get(phase) < wanted.get(phase) => {
                    *caught.get_mut(phase) += 1;
                    // Just below where the star falls next, inside its touch radius.
                    let hand = (star.x / canvas.width, (star.y + 45.0) / canvas.height);
                    with_hands((0.5, 0.5), hand)
                }
                _ => idle.clone(),
            };
            session.handle_frame(Some(&frame), now);
        }

        assert_eq!(step, 300);
        assert_eq!(caught, wanted);
        let outcome = session.require_outcome().unwrap();
        assert_eq!(outcome.score, 9);
        match &outcome.details {
            GameDetails::Star {
                level,
                phase_scores,
                ..
            } => {
                assert_eq!(*level, crate::settings::Level::Medium);
                assert_eq!(*phase_scores, wanted);
            }
            other => panic!("unexpected details {other:?}"),
        }
        assert!(outcome.advice.iter().any(|line| line == FATIGUE));
    }
}
