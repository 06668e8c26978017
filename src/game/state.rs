use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use log::info;

pub const VISIBILITY_DEBOUNCE: Duration = Duration::from_millis(800);
pub const COUNTDOWN_TICKS: u32 = 3;
pub const COUNTDOWN_TICK: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Preparing,
    Countdown,
    Playing,
    Paused,
    GameOver,
}

impl Default for GameStatus {
    fn default() -> Self {
        GameStatus::Preparing
    }
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Preparing => "preparing",
            GameStatus::Countdown => "countdown",
            GameStatus::Playing => "playing",
            GameStatus::Paused => "paused",
            GameStatus::GameOver => "gameover",
        }
    }
}

/// Lifecycle of one game screen plus the active-time bookkeeping.
///
/// `started_at` is the anchor from which active play time is measured. Every
/// stretch spent outside `Playing` is added onto it when play resumes, so
/// `elapsed` only ever counts time spent playing.
#[derive(Debug, Clone, Default)]
pub struct GameState {
    status: GameStatus,
    started_at: Option<Instant>,
    /// Beginning of the current stretch outside `Playing`, once play has begun.
    suspended_at: Option<Instant>,
    visible_since: Option<Instant>,
    countdown_started: Option<Instant>,
    finished_elapsed: Option<Duration>,
    suspended_total: Duration,
    body_lost_count: u32,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn body_lost_count(&self) -> u32 {
        self.body_lost_count
    }

    /// Wall-clock time removed from the active clock so far.
    pub fn suspended_total(&self) -> Duration {
        self.suspended_total
    }

    /// Active play time as of `now`.
    pub fn elapsed(&self, now: Instant) -> Duration {
        if let Some(frozen) = self.finished_elapsed {
            return frozen;
        }
        match (self.status, self.started_at, self.suspended_at) {
            (GameStatus::Playing, Some(start), _) => now.saturating_duration_since(start),
            (_, Some(start), Some(suspended)) => suspended.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    /// Countdown value to display (3, 2, 1) while counting down.
    pub fn countdown_remaining(&self, now: Instant) -> Option<u32> {
        if self.status != GameStatus::Countdown {
            return None;
        }
        let started = self.countdown_started?;
        let ticks = (now.saturating_duration_since(started).as_millis()
            / COUNTDOWN_TICK.as_millis()) as u32;
        Some(COUNTDOWN_TICKS.saturating_sub(ticks).max(1))
    }

    /// Feed the visibility of the latest frame. Returns the new status when
    /// it changed.
    pub fn observe_visibility(&mut self, visible: bool, now: Instant) -> Option<GameStatus> {
        match self.status {
            GameStatus::Preparing => {
                if visible {
                    self.visible_since.get_or_insert(now);
                } else {
                    self.visible_since = None;
                }
                self.tick(now)
            }
            GameStatus::Playing if !visible => {
                self.body_lost_count += 1;
                info!("body lost while playing; back to preparing");
                self.suspend(now);
                self.status = GameStatus::Preparing;
                Some(self.status)
            }
            _ => None,
        }
    }

    /// Advance time-driven transitions: the visibility debounce and the
    /// countdown. Safe to call at any rate.
    pub fn tick(&mut self, now: Instant) -> Option<GameStatus> {
        match self.status {
            GameStatus::Preparing => {
                let since = self.visible_since?;
                if now.saturating_duration_since(since) >= VISIBILITY_DEBOUNCE {
                    self.visible_since = None;
                    self.countdown_started = Some(now);
                    self.status = GameStatus::Countdown;
                    info!("body visible; countdown started");
                    Some(self.status)
                } else {
                    None
                }
            }
            GameStatus::Countdown => {
                let started = self.countdown_started?;
                if now.saturating_duration_since(started) >= COUNTDOWN_TICK * COUNTDOWN_TICKS {
                    self.countdown_started = None;
                    self.enter_playing(now);
                    Some(self.status)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn pause(&mut self, now: Instant) -> Result<()> {
        if self.status != GameStatus::Playing {
            bail!("cannot pause while {}", self.status.as_str());
        }
        self.suspend(now);
        self.status = GameStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: Instant) -> Result<()> {
        if self.status != GameStatus::Paused {
            bail!("cannot resume while {}", self.status.as_str());
        }
        self.enter_playing(now);
        Ok(())
    }

    pub fn finish(&mut self, now: Instant) -> Result<()> {
        if self.status != GameStatus::Playing {
            bail!("cannot finish while {}", self.status.as_str());
        }
        self.finished_elapsed = Some(self.elapsed(now));
        self.status = GameStatus::GameOver;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn suspend(&mut self, now: Instant) {
        if self.started_at.is_some() && self.suspended_at.is_none() {
            self.suspended_at = Some(now);
        }
    }

    fn enter_playing(&mut self, now: Instant) {
        match (self.started_at.as_mut(), self.suspended_at.take()) {
            (Some(start), Some(suspended)) => {
                let gap = now.saturating_duration_since(suspended);
                *start += gap;
                self.suspended_total += gap;
            }
            (None, _) => self.started_at = Some(now),
            (Some(_), None) => {}
        }
        self.status = GameStatus::Playing;
    }
}
