use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::pose::PoseFrame;

/// One pose estimate plus the moment it was captured.
#[derive(Debug, Clone)]
pub struct StampedFrame {
    pub seq: u64,
    pub at: Instant,
    /// `None` when the estimator found no body.
    pub frame: Option<PoseFrame>,
}

/// Producer end of the pose stream.
///
/// Only the newest frame is kept: a frame pushed while the previous one is
/// still being processed replaces it instead of queueing behind it.
pub struct PoseFeed {
    tx: watch::Sender<Option<Arc<StampedFrame>>>,
    seq: u64,
}

impl PoseFeed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx, seq: 0 }
    }

    /// Publish a frame stamped with the current time.
    pub fn push(&mut self, frame: Option<PoseFrame>) {
        self.push_at(frame, now());
    }

    pub fn push_at(&mut self, frame: Option<PoseFrame>, at: Instant) {
        self.seq += 1;
        let stamped = StampedFrame {
            seq: self.seq,
            at,
            frame,
        };
        // No subscriber yet is fine; the value is kept for the next one.
        self.tx.send_replace(Some(Arc::new(stamped)));
    }

    pub fn pushed(&self) -> u64 {
        self.seq
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<StampedFrame>>> {
        self.tx.subscribe()
    }
}

impl Default for PoseFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Current time on the tokio clock, so paused-clock tests stay consistent.
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
