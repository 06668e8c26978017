use super::NOT_ENOUGH_DATA;

pub const BEND_MORE: &str = "Bend your knee more to avoid obstacles more effectively";
pub const GOOD_JOB: &str = "Good job! You managed to avoid several obstacles, but you can improve a bit more by bending your knee better";
pub const GREAT_JOB: &str = "Great job! You avoided most of the obstacles";

/// Percentage of obstacles passed, `None` when there were none.
pub fn success_rate(passed: &[bool]) -> Option<f64> {
    if passed.is_empty() {
        return None;
    }
    let count = passed.iter().filter(|p| **p).count();
    Some(count as f64 / passed.len() as f64 * 100.0)
}

pub fn obstacle_advice(passed: &[bool]) -> Vec<String> {
    let Some(rate) = success_rate(passed) else {
        return vec![NOT_ENOUGH_DATA.to_string()];
    };

    let message = if rate < 50.0 {
        BEND_MORE
    } else if rate < 80.0 {
        GOOD_JOB
    } else {
        GREAT_JOB
    };
    vec![message.to_string()]
}
