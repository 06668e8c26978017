use crate::game::PhaseScores;
use crate::metrics::{MetricsSummary, Side};
use crate::settings::Level;

use super::NOT_ENOUGH_DATA;

pub const FATIGUE: &str = "You collected many more stars in the initial phase than in the final one. You might have gotten tired. I suggest trying a lower level to improve your endurance.";
pub const LEVEL_UP: &str = "You maintained great consistency between phases! You could try moving up a level for a greater challenge";

/// Degrees of mean peak-angle difference that flags one arm as weaker.
const ARM_GAP_DEGREES: f64 = 15.0;

pub fn star_advice(level: Level, scores: &PhaseScores, summary: &MetricsSummary) -> Vec<String> {
    if scores.total() == 0 && summary.total_samples() == 0 {
        return vec![NOT_ENOUGH_DATA.to_string()];
    }

    let mut advice = Vec::new();

    let start = scores.start as f64;
    let end = scores.end as f64;
    let average = scores.total() as f64 / 3.0;
    let drop_ratio = if start > 0.0 { end / start } else { 1.0 };

    if level != Level::Low && drop_ratio < 0.5 {
        advice.push(FATIGUE.to_string());
    }

    if level != Level::High && drop_ratio > 0.9 && average > 3.0 {
        advice.push(LEVEL_UP.to_string());
    }

    if let (Some(right), Some(left)) = (
        summary.mean_max_angle(Side::Right),
        summary.mean_max_angle(Side::Left),
    ) {
        if (right - left).abs() > ARM_GAP_DEGREES {
            let weaker = if right < left { Side::Right } else { Side::Left };
            advice.push(format!("Your {} arm seems a bit weaker.", weaker.as_str()));
        }
    }

    advice
}
