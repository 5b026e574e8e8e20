use glam::{Mat4, Vec3};

/// Distance from the orbit target (the origin) to the eye.
pub const ORBIT_DISTANCE: f32 = 8.0;
/// Lowest allowed pitch (radians), slightly below the horizon.
pub const MIN_PITCH: f32 = -0.5;
/// Highest allowed pitch (radians), short of straight down so look-at stays defined.
pub const MAX_PITCH: f32 = std::f32::consts::PI / 2.3;
pub const INITIAL_PITCH: f32 = std::f32::consts::FRAC_PI_3;

pub const FOV_Y: f32 = std::f32::consts::FRAC_PI_3;
pub const ASPECT: f32 = 1.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

/// Orbit orientation accumulated from pointer drags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationState {
    pitch: f32,
    pub yaw: f32,
}

impl OrientationState {
    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch: pitch.clamp(MIN_PITCH, MAX_PITCH), yaw }
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Rotate by the given deltas; pitch is clamped after every call.
    pub fn rotate(&mut self, d_pitch: f32, d_yaw: f32) {
        self.pitch = (self.pitch + d_pitch).clamp(MIN_PITCH, MAX_PITCH);
        self.yaw += d_yaw;
    }

    /// `Ry(yaw) * Rx(-pitch) * T(0, 0, distance)`
    pub fn orbit_transform(&self) -> Mat4 {
        Mat4::from_rotation_y(self.yaw)
            * Mat4::from_rotation_x(-self.pitch)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, ORBIT_DISTANCE))
    }
}

impl Default for OrientationState {
    fn default() -> Self {
        Self::new(INITIAL_PITCH, 0.0)
    }
}

/// Per-frame camera output, recomputed every tick and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub view: Mat4,
    pub eye: Vec3,
}

impl CameraFrame {
    pub fn from_orientation(orientation: &OrientationState) -> Self {
        let eye = orientation.orbit_transform().w_axis.truncate();
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        Self { view, eye }
    }
}

/// Fixed projection, set once at startup.
pub fn projection() -> Mat4 {
    Mat4::perspective_rh(FOV_Y, ASPECT, Z_NEAR, Z_FAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_pitch() {
        assert_eq!(OrientationState::new(10.0, 0.0).pitch(), MAX_PITCH);
        assert_eq!(OrientationState::new(-10.0, 0.0).pitch(), MIN_PITCH);
    }

    #[test]
    fn test_level_orbit_sits_on_positive_z() {
        let frame = CameraFrame::from_orientation(&OrientationState::new(0.0, 0.0));
        assert!((frame.eye - Vec3::new(0.0, 0.0, ORBIT_DISTANCE)).length() < 1e-5);
    }

    #[test]
    fn test_positive_pitch_raises_eye() {
        let frame = CameraFrame::from_orientation(&OrientationState::default());
        let expected_y = ORBIT_DISTANCE * INITIAL_PITCH.sin();
        assert!((frame.eye.y - expected_y).abs() < 1e-4, "eye {:?}", frame.eye);
        assert!((frame.eye.length() - ORBIT_DISTANCE).abs() < 1e-4);
    }

    #[test]
    fn test_yaw_swings_eye_around_y() {
        let orientation = OrientationState::new(0.0, std::f32::consts::FRAC_PI_2);
        let frame = CameraFrame::from_orientation(&orientation);
        // Ry(90deg) maps +Z onto +X
        assert!((frame.eye - Vec3::new(ORBIT_DISTANCE, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_view_maps_origin_in_front_of_camera() {
        let frame = CameraFrame::from_orientation(&OrientationState::new(0.3, 1.2));
        let origin_in_view = frame.view.transform_point3(Vec3::ZERO);
        assert!(origin_in_view.x.abs() < 1e-4);
        assert!(origin_in_view.y.abs() < 1e-4);
        assert!((origin_in_view.z + ORBIT_DISTANCE).abs() < 1e-4);
    }
}
