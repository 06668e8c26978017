use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::game::GameSession;

use super::events::{publish, GameEvent};
use super::feed::{now, StampedFrame};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Hands every new frame to the session, one at a time, until cancelled or
/// the feed goes away.
pub(crate) async fn frame_loop(
    session: Arc<Mutex<GameSession>>,
    mut frames: watch::Receiver<Option<Arc<StampedFrame>>>,
    events: broadcast::Sender<GameEvent>,
    cancel_token: CancellationToken,
) {
    let mut last_seq = 0u64;

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    log_info!("pose feed closed; frame loop exiting");
                    break;
                }
                let Some(stamped) = frames.borrow_and_update().clone() else {
                    continue;
                };
                if stamped.seq > last_seq + 1 && last_seq > 0 {
                    log_warn!("dropped {} stale pose frames", stamped.seq - last_seq - 1);
                }
                last_seq = stamped.seq;

                let mut guard = session.lock().await;
                let report = guard.handle_frame(stamped.frame.as_ref(), stamped.at);
                publish(&events, &guard, report);
            }
            _ = cancel_token.cancelled() => {
                log_info!("frame loop shutting down");
                break;
            }
        }
    }
}

/// Drives the time-based transitions (debounce, countdown, time limit) even
/// when no frames arrive.
pub(crate) async fn ticker_loop(
    session: Arc<Mutex<GameSession>>,
    events: broadcast::Sender<GameEvent>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut guard = session.lock().await;
                let report = guard.tick(now());
                publish(&events, &guard, report);
            }
            _ = cancel_token.cancelled() => {
                log_info!("game ticker shutting down");
                break;
            }
        }
    }
}
