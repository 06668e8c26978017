use serde::{Deserialize, Serialize};

/// Number of keypoints the pose model emits per frame.
pub const LANDMARK_COUNT: usize = 33;

/// One tracked body joint in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    /// Confident and strictly inside the image.
    pub fn is_in_frame(&self) -> bool {
        self.visibility > 0.5 && self.x > 0.0 && self.x < 1.0 && self.y > 0.0 && self.y < 1.0
    }
}

/// Fixed anatomical indices of the pose model that the games read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    LeftAnkle,
}

impl Joint {
    pub fn index(self) -> usize {
        match self {
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftWrist => 15,
            Joint::RightWrist => 16,
            Joint::LeftHip => 23,
            Joint::RightHip => 24,
            Joint::LeftKnee => 25,
            Joint::LeftAnkle => 27,
        }
    }
}

/// All landmarks detected in one camera frame, ordered by model index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseFrame {
    landmarks: Vec<Landmark>,
}

impl PoseFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn get(&self, joint: Joint) -> Option<Landmark> {
        self.landmarks.get(joint.index()).copied()
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }
}

impl From<Vec<Landmark>> for PoseFrame {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self::new(landmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_joint_is_none() {
        let frame = PoseFrame::new(vec![Landmark::new(0.5, 0.5, 0.9); 12]);
        assert!(frame.get(Joint::LeftShoulder).is_some());
        assert!(frame.get(Joint::LeftWrist).is_none());
    }

    #[test]
    fn test_deserialize_without_visibility() {
        let frame: PoseFrame = serde_json::from_str(r#"[{"x":0.2,"y":0.3,"z":-0.1}]"#).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.landmarks()[0].visibility, 0.0);
        assert!(!frame.landmarks()[0].is_in_frame());
    }
}
