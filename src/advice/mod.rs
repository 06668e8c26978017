//! Threshold rules turning a finished game's numbers into feedback.
//!
//! Every rule set is pure and deterministic. When there is nothing to judge
//! it answers with [`NOT_ENOUGH_DATA`] alone.

pub mod balloon;
pub mod obstacle;
pub mod star;

pub use balloon::{balloon_advice, stability_from_attempts};
pub use obstacle::{obstacle_advice, success_rate};
pub use star::star_advice;

pub const NOT_ENOUGH_DATA: &str = "There is not enough gameplay data to provide feedback.";
