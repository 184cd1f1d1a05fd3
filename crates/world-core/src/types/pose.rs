//! Pose type definition

use glam::{DAffine3, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

/// Pose (position and orientation) of a model relative to the world frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec3,
    /// Unit quaternion
    pub orientation: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        orientation: DQuat::IDENTITY,
    };

    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation: orientation.normalize(),
        }
    }

    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            orientation: DQuat::IDENTITY,
        }
    }

    /// Build a pose from fixed-axis roll/pitch/yaw in radians.
    ///
    /// The rotation is `Rz(yaw) * Ry(pitch) * Rx(roll)`, the convention used by
    /// SDF `<pose>` elements.
    pub fn from_xyz_rpy(xyz: [f64; 3], rpy: [f64; 3]) -> Self {
        Self {
            position: DVec3::from(xyz),
            orientation: DQuat::from_euler(EulerRot::ZYX, rpy[2], rpy[1], rpy[0]),
        }
    }

    /// Roll, pitch and yaw in radians
    pub fn rpy(&self) -> [f64; 3] {
        let (yaw, pitch, roll) = self.orientation.to_euler(EulerRot::ZYX);
        [roll, pitch, yaw]
    }

    pub fn to_affine(&self) -> DAffine3 {
        DAffine3::from_rotation_translation(self.orientation, self.position)
    }
}
