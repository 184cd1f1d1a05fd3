//! Rigid body state samples

use std::time::SystemTime;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use super::Pose;

/// Pose of `source_frame` expressed in `target_frame`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyState {
    pub source_frame: String,
    pub target_frame: String,
    pub position: DVec3,
    pub orientation: DQuat,
    pub time: SystemTime,
}

impl Default for RigidBodyState {
    fn default() -> Self {
        Self {
            source_frame: String::new(),
            target_frame: String::new(),
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            time: SystemTime::UNIX_EPOCH,
        }
    }
}

impl RigidBodyState {
    pub fn new(
        source_frame: impl Into<String>,
        target_frame: impl Into<String>,
        position: DVec3,
        orientation: DQuat,
    ) -> Self {
        Self {
            source_frame: source_frame.into(),
            target_frame: target_frame.into(),
            position,
            orientation,
            time: SystemTime::now(),
        }
    }

    /// A frame-less state, as used for camera poses
    pub fn from_pose(pose: Pose) -> Self {
        Self {
            position: pose.position,
            orientation: pose.orientation,
            time: SystemTime::now(),
            ..Self::default()
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }

    /// True when both frame names are set
    pub fn has_frames(&self) -> bool {
        !self.source_frame.is_empty() && !self.target_frame.is_empty()
    }
}
