mod adapter;
mod angles;
mod landmark;

pub use adapter::{all_pixels, hands, is_body_visible, joint_pixels, Canvas, Hands, PixelPoint};
pub use angles::joint_angle;
pub use landmark::{Joint, Landmark, PoseFrame, LANDMARK_COUNT};
