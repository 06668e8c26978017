//! Converts normalized pose landmarks into canvas pixel space.

use serde::{Deserialize, Serialize};

use super::{Joint, PoseFrame};

/// Pixel dimensions of the drawing surface the games run on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: PixelPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Pixel position of `joint`, or `None` when the model did not report it.
pub fn joint_pixels(frame: &PoseFrame, joint: Joint, canvas: Canvas) -> Option<PixelPoint> {
    frame
        .get(joint)
        .map(|lm| PixelPoint::new(lm.x * canvas.width, lm.y * canvas.height))
}

/// Pixel positions of every landmark in the frame, in model order.
pub fn all_pixels(frame: &PoseFrame, canvas: Canvas) -> impl Iterator<Item = PixelPoint> + '_ {
    frame
        .landmarks()
        .iter()
        .map(move |lm| PixelPoint::new(lm.x * canvas.width, lm.y * canvas.height))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hands {
    pub left: Option<PixelPoint>,
    pub right: Option<PixelPoint>,
}

impl Hands {
    pub fn both(&self) -> Option<(PixelPoint, PixelPoint)> {
        self.left.zip(self.right)
    }
}

pub fn hands(frame: &PoseFrame, canvas: Canvas) -> Hands {
    Hands {
        left: joint_pixels(frame, Joint::LeftWrist, canvas),
        right: joint_pixels(frame, Joint::RightWrist, canvas),
    }
}

/// True only when a frame exists and every landmark is confident and
/// inside the image. A single occluded joint hides the whole body.
pub fn is_body_visible(frame: Option<&PoseFrame>) -> bool {
    match frame {
        Some(frame) if !frame.is_empty() => frame.landmarks().iter().all(|lm| lm.is_in_frame()),
        _ => false,
    }
}
