use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::game::PerPhase;

const NOT_AVAILABLE: &str = "N/A";

/// A reduced measurement that may be missing. Serializes as a number or
/// as the string `"N/A"`, never as NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metric(Option<f64>);

impl Metric {
    pub const NA: Metric = Metric(None);

    /// Wrap `value` rounded to `decimals`; non-finite input becomes N/A.
    pub fn rounded(value: Option<f64>, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        Metric(
            value
                .filter(|v| v.is_finite())
                .map(|v| (v * factor).round() / factor),
        )
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn is_na(&self) -> bool {
        self.0.is_none()
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        Metric(value.filter(|v| v.is_finite()))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0, f.precision()) {
            (Some(value), Some(precision)) => write!(f, "{value:.precision$}"),
            (Some(value), None) => write!(f, "{value}"),
            (None, _) => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Metric::from(Some(value))),
            Raw::Text(text) => Ok(Metric::from(text.parse::<f64>().ok())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Range of motion and peak arm angle for one side in one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStats {
    pub excursion: Metric,
    pub max_angle: Metric,
    #[serde(default)]
    pub samples: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub left: PerPhase<PhaseStats>,
    pub right: PerPhase<PhaseStats>,
}

impl MetricsSummary {
    pub fn side(&self, side: Side) -> &PerPhase<PhaseStats> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Mean of the three per-phase peak angles; `None` if any phase has none.
    pub fn mean_max_angle(&self, side: Side) -> Option<f64> {
        let phases = self.side(side);
        let mut total = 0.0;
        for (_, stats) in phases.iter() {
            total += stats.max_angle.value()?;
        }
        Some(total / 3.0)
    }

    pub fn total_samples(&self) -> usize {
        Side::BOTH
            .iter()
            .flat_map(|side| self.side(*side).iter().map(|(_, s)| s.samples))
            .sum()
    }
}

/// Balloon game arm symmetry, reduced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymmetrySummary {
    pub samples: usize,
    pub mean_error: Metric,
}
