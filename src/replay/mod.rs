//! Feeding recorded pose streams through a game, either instantly with
//! synthetic timestamps or in real time through a [`GameController`].

pub mod recording;

pub use recording::{RecordedEvent, Recording};

use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::time::{sleep_until, Instant as TokioInstant};

use crate::controller::{GameController, PoseFeed};
use crate::game::{GameSession, GameStatus};
use crate::report::GameOutcome;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub frames: usize,
    pub status: GameStatus,
    pub outcome: Option<GameOutcome>,
}

fn apply_control(session: &mut GameSession, event: &RecordedEvent, at: Instant) {
    let result = match event {
        RecordedEvent::Pause { .. } => session.pause(at),
        RecordedEvent::Resume { .. } => session.resume(at),
        RecordedEvent::Restart { .. } => {
            session.restart();
            Ok(())
        }
        RecordedEvent::Frame { .. } => Ok(()),
    };
    if let Err(err) = result {
        log_warn!("ignoring recorded control at {} ms: {err}", event.t_ms());
    }
}

/// Run `recording` through `session` as fast as possible, stamping each
/// event at `base + t_ms`.
pub fn replay(session: &mut GameSession, recording: &Recording, base: Instant) -> ReplaySummary {
    let mut frames = 0;
    for event in &recording.events {
        let at = base + Duration::from_millis(event.t_ms());
        match event.frame() {
            Some(frame) => {
                frames += 1;
                session.handle_frame(frame.as_ref(), at);
                session.tick(at);
            }
            None => apply_control(session, event, at),
        }
    }

    log_info!(
        "replayed {} frames; {} ended {}",
        frames,
        session.kind().as_str(),
        session.status().as_str()
    );

    ReplaySummary {
        frames,
        status: session.status(),
        outcome: session.outcome().cloned(),
    }
}

/// Play `recording` in real time through `controller`, then wait `linger`
/// for the ticker to settle before detaching.
pub async fn replay_live(
    controller: &GameController,
    recording: &Recording,
    linger: Duration,
) -> Result<ReplaySummary> {
    let mut feed = PoseFeed::new();
    let attachment = controller.attach(&feed);
    let start = TokioInstant::now();

    for event in &recording.events {
        sleep_until(start + Duration::from_millis(event.t_ms())).await;
        match event {
            RecordedEvent::Frame { .. } => feed.push(event.frame().flatten()),
            RecordedEvent::Pause { .. } => {
                if let Err(err) = controller.pause().await {
                    log_warn!("ignoring recorded pause: {err}");
                }
            }
            RecordedEvent::Resume { .. } => {
                if let Err(err) = controller.resume().await {
                    log_warn!("ignoring recorded resume: {err}");
                }
            }
            RecordedEvent::Restart { .. } => controller.restart().await,
        }
    }

    tokio::time::sleep(linger).await;
    attachment.detach().await?;

    Ok(ReplaySummary {
        frames: feed.pushed() as usize,
        status: controller.status().await,
        outcome: controller.outcome().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameKind;
    use crate::pose::{Landmark, LANDMARK_COUNT};
    use crate::settings::GameOptions;

    fn frame_event(t_ms: u64, visible: bool) -> RecordedEvent {
        RecordedEvent::Frame {
            t_ms,
            landmarks: visible.then(|| vec![Landmark::new(0.5, 0.9, 0.9); LANDMARK_COUNT]),
        }
    }

    /// Standing still below the obstacle band until every obstacle passed.
    fn standing_recording(until_ms: u64) -> Recording {
        Recording {
            events: (0..=until_ms / 33).map(|i| frame_event(i * 33, true)).collect(),
        }
    }

    #[test]
    fn test_replay_obstacle_to_game_over() {
        let options = GameOptions {
            obstacle_count: 2,
            ..GameOptions::default()
        };
        let mut session = GameSession::with_seed(GameKind::Obstacle, &options, 5).unwrap();
        let summary = replay(&mut session, &standing_recording(20_000), Instant::now());

        assert_eq!(summary.status, GameStatus::GameOver);
        let outcome = summary.outcome.unwrap();
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn test_replay_pause_and_bad_controls() {
        let mut session =
            GameSession::with_seed(GameKind::Star, &GameOptions::default(), 5).unwrap();
        let mut events = vec![
            RecordedEvent::Resume { t_ms: 0 },
            frame_event(0, true),
            frame_event(900, true),
            frame_event(3_900, true),
            RecordedEvent::Pause { t_ms: 4_000 },
            frame_event(4_100, false),
        ];
        events.push(RecordedEvent::Resume { t_ms: 5_000 });
        let summary = replay(&mut session, &Recording { events }, Instant::now());

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.status, GameStatus::Playing);
        assert!(summary.outcome.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_replay_matches_session() {
        let options = GameOptions {
            obstacle_count: 1,
            ..GameOptions::default()
        };
        let session = GameSession::with_seed(GameKind::Obstacle, &options, 8).unwrap();
        let controller = GameController::with_session(session, None);

        let summary = replay_live(&controller, &standing_recording(12_000), Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(summary.status, GameStatus::GameOver);
        assert_eq!(summary.outcome.unwrap().rows.len(), 1);
    }
}
