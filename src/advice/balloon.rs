use super::NOT_ENOUGH_DATA;

pub const SYMMETRY_EXCELLENT: &str = "Excellent arm symmetry!";
pub const SYMMETRY_GOOD: &str =
    "You maintained good symmetry, but you can improve a bit more for a more precise trajectory.";
pub const SYMMETRY_IMPROVE: &str = "Keep your arms more symmetrical to control the balloon better.";
pub const STABILITY_LOW: &str =
    "Try to be more stable with your arms. Hold your position when you touch the cloud.";
pub const STABILITY_GOOD: &str =
    "Good control, but you could improve your stability a little during contact with the clouds.";
pub const STABILITY_EXCELLENT: &str = "Excellent stability! You held your position well.";

/// Attempts beyond the first each cost this many points of stability.
const ATTEMPT_PENALTY: f64 = 100.0 / 5.0;

/// Stability percentage for a cloud collected after `attempts` contacts.
pub fn stability_from_attempts(attempts: u32) -> u32 {
    let extra = attempts.saturating_sub(1) as f64;
    (100.0 - extra * ATTEMPT_PENALTY).max(0.0).round() as u32
}

pub fn balloon_advice(stabilities: &[u32], mean_symmetry_error: Option<f64>) -> Vec<String> {
    if stabilities.is_empty() {
        return vec![NOT_ENOUGH_DATA.to_string()];
    }

    let mut advice = Vec::new();

    if let Some(error) = mean_symmetry_error {
        let message = if error <= 0.08 {
            SYMMETRY_EXCELLENT
        } else if error < 0.15 {
            SYMMETRY_GOOD
        } else {
            SYMMETRY_IMPROVE
        };
        advice.push(message.to_string());
    }

    let mean_stability =
        stabilities.iter().map(|s| *s as f64).sum::<f64>() / stabilities.len() as f64;
    let message = if mean_stability <= 60.0 {
        STABILITY_LOW
    } else if mean_stability <= 80.0 {
        STABILITY_GOOD
    } else {
        STABILITY_EXCELLENT
    };
    advice.push(message.to_string());

    advice
}
