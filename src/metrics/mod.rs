//! Biomechanical sampling: per side and phase hand heights and arm angles,
//! plus the left/right symmetry series of the balloon game.

mod types;

pub use types::{Metric, MetricsSummary, PhaseStats, Side, SymmetrySummary};

use serde::{Deserialize, Serialize};

use crate::game::{PerPhase, Phase};

/// Raw samples for one side in one phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSeries {
    pub hand_heights: Vec<f64>,
    pub arm_angles: Vec<f64>,
}

impl SampleSeries {
    fn stats(&self) -> PhaseStats {
        PhaseStats {
            excursion: Metric::rounded(excursion(&self.hand_heights), 3),
            max_angle: Metric::rounded(maximum(&self.arm_angles), 1),
            samples: self.hand_heights.len(),
        }
    }
}

/// Append-only sample store, written while playing and reduced at game over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsAccumulator {
    left: PerPhase<SampleSeries>,
    right: PerPhase<SampleSeries>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn series_mut(&mut self, side: Side, phase: Phase) -> &mut SampleSeries {
        match side {
            Side::Left => self.left.get_mut(phase),
            Side::Right => self.right.get_mut(phase),
        }
    }

    pub fn series(&self, side: Side, phase: Phase) -> &SampleSeries {
        match side {
            Side::Left => self.left.get(phase),
            Side::Right => self.right.get(phase),
        }
    }

    /// Record a normalized hand height (0 at the top of the image).
    pub fn push_height(&mut self, side: Side, phase: Phase, height: f64) {
        if height.is_finite() {
            self.series_mut(side, phase).hand_heights.push(height);
        }
    }

    pub fn push_angle(&mut self, side: Side, phase: Phase, degrees: f64) {
        if degrees.is_finite() {
            self.series_mut(side, phase).arm_angles.push(degrees);
        }
    }

    pub fn summarize(&self) -> MetricsSummary {
        MetricsSummary {
            left: self.left.map(SampleSeries::stats),
            right: self.right.map(SampleSeries::stats),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Absolute left/right difference samples, lower is better.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymmetrySeries {
    samples: Vec<f64>,
}

impl SymmetrySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `|left_delta - right_delta|`.
    pub fn record(&mut self, left_delta: f64, right_delta: f64) {
        let error = (left_delta - right_delta).abs();
        if error.is_finite() {
            self.samples.push(error);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        mean(&self.samples)
    }

    pub fn summarize(&self) -> SymmetrySummary {
        SymmetrySummary {
            samples: self.samples.len(),
            mean_error: Metric::rounded(self.mean(), 4),
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// `max - min`, or `None` for an empty slice.
pub fn excursion(values: &[f64]) -> Option<f64> {
    let max = maximum(values)?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    Some(max - min)
}

pub fn maximum(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
