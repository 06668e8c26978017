use serde::Serialize;
use tokio::sync::broadcast;

use crate::game::{FrameReport, GameSession, GameStatus};
use crate::report::GameOutcome;

pub const EVENT_CAPACITY: usize = 64;

/// Notifications for the UI. Nothing on the frame path listens to these.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        previous: GameStatus,
        status: GameStatus,
    },
    ScoreChanged { score: i64 },
    GameOver { outcome: GameOutcome },
}

/// Fan out whatever `report` says changed. Send errors only mean nobody is
/// subscribed.
pub(crate) fn publish(events: &broadcast::Sender<GameEvent>, session: &GameSession, report: FrameReport) {
    if report.score_changed() {
        let _ = events.send(GameEvent::ScoreChanged {
            score: report.score,
        });
    }
    if report.status_changed() {
        let _ = events.send(GameEvent::StatusChanged {
            previous: report.previous,
            status: report.status,
        });
    }
    if report.finished() {
        if let Some(outcome) = session.outcome() {
            let _ = events.send(GameEvent::GameOver {
                outcome: outcome.clone(),
            });
        }
    }
}
