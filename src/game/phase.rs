use serde::{Deserialize, Serialize};

use log::debug;

/// Coarse thirds of a timed session used to group scores and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Start,
    Middle,
    End,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Start, Phase::Middle, Phase::End];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Middle => "middle",
            Phase::End => "end",
        }
    }
}

/// Bucket `elapsed_secs` of active play into a phase of a session lasting
/// `total_secs`. A boundary value falls into the later phase.
pub fn current_phase(elapsed_secs: f64, total_secs: f64) -> Phase {
    let remaining = total_secs - elapsed_secs;
    if remaining > total_secs * 2.0 / 3.0 {
        Phase::Start
    } else if remaining > total_secs / 3.0 {
        Phase::Middle
    } else {
        Phase::End
    }
}

/// Caches the last phase seen so the reported phase never regresses.
#[derive(Debug, Clone, Default)]
pub struct PhaseTracker {
    last: Option<Phase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, elapsed_secs: f64, total_secs: f64) -> Phase {
        let computed = current_phase(elapsed_secs, total_secs);
        let phase = match self.last {
            Some(last) if last > computed => last,
            _ => computed,
        };
        if self.last != Some(phase) {
            debug!("phase -> {}", phase.as_str());
            self.last = Some(phase);
        }
        phase
    }

    pub fn last(&self) -> Option<Phase> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// One value per phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerPhase<T> {
    pub start: T,
    pub middle: T,
    pub end: T,
}

impl<T> PerPhase<T> {
    pub fn get(&self, phase: Phase) -> &T {
        match phase {
            Phase::Start => &self.start,
            Phase::Middle => &self.middle,
            Phase::End => &self.end,
        }
    }

    pub fn get_mut(&mut self, phase: Phase) -> &mut T {
        match phase {
            Phase::Start => &mut self.start,
            Phase::Middle => &mut self.middle,
            Phase::End => &mut self.end,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerPhase<U> {
        PerPhase {
            start: f(&self.start),
            middle: f(&self.middle),
            end: f(&self.end),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Phase, &T)> {
        Phase::ALL.into_iter().map(move |phase| (phase, self.get(phase)))
    }
}

pub type PhaseScores = PerPhase<u32>;

impl PhaseScores {
    pub fn total(&self) -> u32 {
        self.start + self.middle + self.end
    }
}
