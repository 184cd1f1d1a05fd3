//! Camera, projection parameters and view manipulation.

use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Default image width in pixels.
pub const DEFAULT_WIDTH: u32 = 800;
/// Default image height in pixels.
pub const DEFAULT_HEIGHT: u32 = 600;
/// Largest accepted image width or height in pixels.
pub const MAX_DIMENSION: u32 = 8192;

/// Projection parameters of the rendering camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// Image width in pixels. Zero selects [`DEFAULT_WIDTH`].
    pub width: u32,
    /// Image height in pixels. Zero selects [`DEFAULT_HEIGHT`].
    pub height: u32,
    /// Horizontal field of view in degrees.
    pub horizontal_fov: f64,
    /// Near clipping plane distance.
    pub z_near: f64,
    /// Far clipping plane distance.
    pub z_far: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            horizontal_fov: 60.0,
            z_near: 0.01,
            z_far: 1000.0,
        }
    }
}

impl CameraParams {
    /// Returns a copy with unset dimensions replaced by the defaults.
    pub fn normalized(mut self) -> Self {
        if self.width == 0 {
            self.width = DEFAULT_WIDTH;
        }
        if self.height == 0 {
            self.height = DEFAULT_HEIGHT;
        }
        self
    }

    /// Check clip planes, field of view and image size.
    pub fn validate(&self) -> Result<(), String> {
        let params = self.normalized();
        let planes_ok = params.z_near > 0.0 && params.z_far > params.z_near;
        if !planes_ok {
            return Err(format!(
                "invalid clip planes near={} far={}",
                params.z_near, params.z_far
            ));
        }
        let fov_ok = params.horizontal_fov > 0.0 && params.horizontal_fov < 180.0;
        if !fov_ok {
            return Err(format!(
                "horizontal field of view {} is outside (0, 180) degrees",
                params.horizontal_fov
            ));
        }
        if params.width > MAX_DIMENSION || params.height > MAX_DIMENSION {
            return Err(format!(
                "image size {}x{} exceeds {}x{}",
                params.width, params.height, MAX_DIMENSION, MAX_DIMENSION
            ));
        }
        Ok(())
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        let p = self.normalized();
        p.width as f64 / p.height as f64
    }

    /// Vertical field of view in radians matching the horizontal one.
    pub fn vertical_fov(&self) -> f64 {
        let half_h = self.horizontal_fov.to_radians() * 0.5;
        2.0 * (half_h.tan() / self.aspect_ratio()).atan()
    }
}

/// A perspective camera looking from `eye` towards `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: DVec3,
    pub target: DVec3,
    pub up: DVec3,
    /// Vertical field of view in radians.
    pub fov_y: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    /// Creates a camera overlooking the world origin, Z up.
    pub fn new(params: &CameraParams) -> Self {
        let mut camera = Self {
            eye: DVec3::new(5.0, -5.0, 3.0),
            target: DVec3::ZERO,
            up: DVec3::Z,
            fov_y: 0.0,
            aspect: 1.0,
            near: 0.0,
            far: 0.0,
        };
        camera.apply_params(params);
        camera
    }

    /// Applies projection parameters.
    pub fn apply_params(&mut self, params: &CameraParams) {
        let params = params.normalized();
        self.fov_y = params.vertical_fov();
        self.aspect = params.aspect_ratio();
        self.near = params.z_near;
        self.far = params.z_far;
    }

    /// Sets eye, look-at point and up vector.
    pub fn set_view(&mut self, eye: DVec3, look_at: DVec3, up: DVec3) {
        self.eye = eye;
        self.target = look_at;
        self.up = up;
    }

    /// Eye/look-at/up for a camera at `position` looking along the local X
    /// axis with local Z up.
    pub fn view_from_pose(position: DVec3, orientation: DQuat) -> (DVec3, DVec3, DVec3) {
        let look_at = position + orientation * DVec3::X;
        let up = orientation * DVec3::Z;
        (position, look_at, up)
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance from the eye to the look-at point.
    pub fn distance(&self) -> f64 {
        self.eye.distance(self.target)
    }
}

/// How user input moves the camera.
///
/// Chosen once when the widget is created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum CameraManipulator {
    /// Input is ignored; only explicit view changes move the camera.
    #[default]
    Fixed,
    /// Drag orbits around the look-at point, scroll changes the distance.
    Orbit {
        /// Radians per pixel of drag.
        sensitivity: f64,
    },
}

impl CameraManipulator {
    /// Handles a pointer drag of `(dx, dy)` pixels.
    pub fn drag(&self, camera: &mut Camera, dx: f64, dy: f64) {
        let Self::Orbit { sensitivity } = *self else {
            return;
        };

        let offset = camera.eye - camera.target;
        let yaw = DQuat::from_axis_angle(camera.up.normalize_or(DVec3::Z), -dx * sensitivity);
        let right = offset.cross(camera.up).normalize_or_zero();
        let pitch = if right == DVec3::ZERO {
            DQuat::IDENTITY
        } else {
            DQuat::from_axis_angle(right, dy * sensitivity)
        };
        camera.eye = camera.target + yaw * pitch * offset;
    }

    /// Handles a scroll of `delta` steps; positive moves closer.
    pub fn zoom(&self, camera: &mut Camera, delta: f64) {
        if matches!(self, Self::Fixed) {
            return;
        }
        let offset = camera.eye - camera.target;
        let scale = 0.9_f64.powf(delta);
        camera.eye = camera.target + offset * scale;
    }
}
