//! Async runtime around a [`GameSession`]: frame delivery, the wall-clock
//! ticker, UI events and saving.

mod events;
mod feed;
mod worker;

pub use events::GameEvent;
pub use feed::{PoseFeed, StampedFrame};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{error, info};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::game::{GameKind, GameSession, GameStatus, GameView};
use crate::report::{GameOutcome, SessionReport};
use crate::settings::GameOptions;

use events::EVENT_CAPACITY;
use feed::now;
use worker::{frame_loop, ticker_loop};

const TICK_INTERVAL: Duration = Duration::from_millis(100);
const DEBUG_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Running frame loop and ticker. Dropping it cancels both; `detach` also
/// waits for them to finish.
pub struct Attachment {
    cancel_token: CancellationToken,
    frame_task: Option<JoinHandle<()>>,
    ticker_task: Option<JoinHandle<()>>,
}

impl Attachment {
    pub async fn detach(mut self) -> Result<()> {
        self.cancel_token.cancel();
        if let Some(handle) = self.frame_task.take() {
            handle.await.context("frame loop task failed to join")?;
        }
        if let Some(handle) = self.ticker_task.take() {
            handle.await.context("game ticker task failed to join")?;
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.frame_task.as_ref().map_or(true, |h| h.is_finished())
            && self.ticker_task.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

pub enum SaveStatus {
    /// The write is running in the background.
    Started(JoinHandle<()>),
    /// This outcome was already saved (or is being saved).
    AlreadySaved,
}

#[derive(Clone)]
pub struct GameController {
    session: Arc<Mutex<GameSession>>,
    events: broadcast::Sender<GameEvent>,
    saved: Arc<AtomicBool>,
    db: Option<Database>,
    tick_interval: Duration,
}

impl GameController {
    pub fn new(kind: GameKind, options: &GameOptions, db: Option<Database>) -> Result<Self> {
        Ok(Self::with_session(GameSession::new(kind, options)?, db))
    }

    pub fn with_session(session: GameSession, db: Option<Database>) -> Self {
        let debug_mode = std::env::var("PHYSIOPLAY_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            session: Arc::new(Mutex::new(session)),
            events,
            saved: Arc::new(AtomicBool::new(false)),
            db,
            tick_interval: if debug_mode {
                DEBUG_TICK_INTERVAL
            } else {
                TICK_INTERVAL
            },
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Start consuming `feed`. Frames pushed before this call are ignored.
    pub fn attach(&self, feed: &PoseFeed) -> Attachment {
        let cancel_token = CancellationToken::new();
        let frames = feed.subscribe();

        let frame_task = tokio::spawn(frame_loop(
            self.session.clone(),
            frames,
            self.events.clone(),
            cancel_token.clone(),
        ));
        let ticker_task = tokio::spawn(ticker_loop(
            self.session.clone(),
            self.events.clone(),
            self.tick_interval,
            cancel_token.clone(),
        ));

        Attachment {
            cancel_token,
            frame_task: Some(frame_task),
            ticker_task: Some(ticker_task),
        }
    }

    pub async fn status(&self) -> GameStatus {
        self.session.lock().await.status()
    }

    pub async fn score(&self) -> i64 {
        self.session.lock().await.score()
    }

    pub async fn view(&self) -> GameView {
        self.session.lock().await.view(now())
    }

    pub async fn outcome(&self) -> Option<GameOutcome> {
        self.session.lock().await.outcome().cloned()
    }

    pub async fn pause(&self) -> Result<()> {
        let mut guard = self.session.lock().await;
        let previous = guard.status();
        guard.pause(now())?;
        self.notify_status(previous, guard.status());
        Ok(())
    }

    pub async fn resume(&self) -> Result<()> {
        let mut guard = self.session.lock().await;
        let previous = guard.status();
        guard.resume(now())?;
        self.notify_status(previous, guard.status());
        Ok(())
    }

    /// Start over with the same options; a later game can be saved again.
    pub async fn restart(&self) {
        let mut guard = self.session.lock().await;
        let previous = guard.status();
        guard.restart();
        self.saved.store(false, Ordering::SeqCst);
        self.notify_status(previous, guard.status());
        let _ = self.events.send(GameEvent::ScoreChanged {
            score: guard.score(),
        });
    }

    /// Persist the finished game for `player_id` in the background. At most
    /// one save runs per outcome; a failed write clears the latch so the
    /// caller can retry.
    pub async fn save(&self, player_id: &str) -> Result<SaveStatus> {
        let Some(db) = self.db.clone() else {
            bail!("no database configured");
        };
        let outcome = {
            let guard = self.session.lock().await;
            guard.require_outcome()?.clone()
        };

        if self.saved.swap(true, Ordering::SeqCst) {
            return Ok(SaveStatus::AlreadySaved);
        }

        let report = SessionReport::assemble(player_id, &outcome, Utc::now());
        let player_id = player_id.to_string();
        let saved = self.saved.clone();

        let handle = tokio::spawn(async move {
            match db.save_report(&player_id, &report).await {
                Ok(()) => info!("Saved {} session {} for {}", report.game, report.id, player_id),
                Err(err) => {
                    error!("Failed to save session for {player_id}: {err:?}");
                    saved.store(false, Ordering::SeqCst);
                }
            }
        });

        Ok(SaveStatus::Started(handle))
    }

    pub fn is_saved(&self) -> bool {
        self.saved.load(Ordering::SeqCst)
    }

    fn notify_status(&self, previous: GameStatus, status: GameStatus) {
        if previous != status {
            let _ = self.events.send(GameEvent::StatusChanged { previous, status });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, PoseFrame, LANDMARK_COUNT};
    use std::time::Instant;
    use tokio::time::sleep;

    fn body_below_band() -> PoseFrame {
        PoseFrame::new(vec![Landmark::new(0.5, 0.9, 0.9); LANDMARK_COUNT])
    }

    fn one_obstacle() -> GameOptions {
        GameOptions {
            obstacle_count: 1,
            ..GameOptions::default()
        }
    }

    /// A session already driven to game over with synthetic timestamps.
    fn finished_session() -> GameSession {
        let mut session = GameSession::with_seed(GameKind::Obstacle, &one_obstacle(), 3).unwrap();
        let body = body_below_band();
        let mut at = Instant::now();
        for _ in 0..1_000 {
            session.handle_frame(Some(&body), at);
            session.tick(at);
            if session.status() == GameStatus::GameOver {
                return session;
            }
            at += Duration::from_millis(50);
        }
        panic!("session never finished");
    }

    async fn next_status(rx: &mut broadcast::Receiver<GameEvent>) -> GameStatus {
        loop {
            match rx.recv().await.unwrap() {
                GameEvent::StatusChanged { status, .. } => return status,
                _ => continue,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_and_ticker_reach_playing() {
        let controller = GameController::new(GameKind::Star, &GameOptions::default(), None).unwrap();
        let mut events = controller.subscribe();
        let mut feed = PoseFeed::new();
        let attachment = controller.attach(&feed);

        feed.push(Some(body_below_band()));
        sleep(Duration::from_millis(850)).await;
        feed.push(Some(body_below_band()));

        assert_eq!(next_status(&mut events).await, GameStatus::Countdown);
        sleep(Duration::from_millis(3100)).await;
        assert_eq!(next_status(&mut events).await, GameStatus::Playing);
        assert_eq!(controller.status().await, GameStatus::Playing);

        controller.pause().await.unwrap();
        assert_eq!(next_status(&mut events).await, GameStatus::Paused);
        controller.resume().await.unwrap();
        assert_eq!(controller.status().await, GameStatus::Playing);

        attachment.detach().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_alone_ends_star_game() {
        let controller = GameController::new(GameKind::Star, &GameOptions::default(), None).unwrap();
        let mut feed = PoseFeed::new();
        let attachment = controller.attach(&feed);

        feed.push(Some(body_below_band()));
        sleep(Duration::from_millis(900)).await;
        feed.push(Some(body_below_band()));
        sleep(Duration::from_millis(3100 + 30_500)).await;

        assert_eq!(controller.status().await, GameStatus::GameOver);
        assert!(controller.outcome().await.is_some());
        attachment.detach().await.unwrap();
    }

    #[tokio::test]
    async fn test_drop_cancels_tasks() {
        let controller = GameController::new(GameKind::Balloon, &GameOptions::default(), None).unwrap();
        let feed = PoseFeed::new();
        let attachment = controller.attach(&feed);
        let token = attachment.cancel_token.clone();
        drop(attachment);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_save_latch() {
        let db = Database::in_memory().unwrap();
        let controller = GameController::with_session(finished_session(), Some(db.clone()));

        match controller.save("yoshi").await.unwrap() {
            SaveStatus::Started(handle) => handle.await.unwrap(),
            SaveStatus::AlreadySaved => panic!("first save must start"),
        }
        assert!(controller.is_saved());
        assert!(matches!(
            controller.save("yoshi").await.unwrap(),
            SaveStatus::AlreadySaved
        ));

        let sessions = db.load_sessions("yoshi").await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].game, "Avoid the Obstacles!");

        controller.restart().await;
        assert!(!controller.is_saved());
        assert_eq!(controller.status().await, GameStatus::Preparing);
        assert!(controller.save("yoshi").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_save_clears_latch() {
        let db = Database::in_memory().unwrap();
        db.execute(|conn| {
            conn.execute_batch("DROP TABLE session_reports")?;
            Ok(())
        })
        .await
        .unwrap();
        let controller = GameController::with_session(finished_session(), Some(db));

        match controller.save("bowser").await.unwrap() {
            SaveStatus::Started(handle) => handle.await.unwrap(),
            SaveStatus::AlreadySaved => panic!("first save must start"),
        }
        assert!(!controller.is_saved());
    }

    #[tokio::test]
    async fn test_save_requires_finished_game() {
        let controller = GameController::new(
            GameKind::Obstacle,
            &one_obstacle(),
            Some(Database::in_memory().unwrap()),
        )
        .unwrap();
        assert!(controller.save("kirby").await.is_err());
        assert!(!controller.is_saved());
    }
}
