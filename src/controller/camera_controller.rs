use crate::model::{CameraFrame, OrientationState};

/// Pixels of drag per radian of rotation.
pub const DRAG_PIXELS_PER_RADIAN: f32 = 60.0;

/// Anchor of an in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragSession {
    last_x: f32,
    last_y: f32,
}

/// Turns pointer drags into an orbit orientation
pub struct CameraController {
    orientation: OrientationState,
    drag: Option<DragSession>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::with_orientation(OrientationState::default())
    }

    pub fn with_orientation(orientation: OrientationState) -> Self {
        Self { orientation, drag: None }
    }

    pub fn orientation(&self) -> OrientationState {
        self.orientation
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start (or restart) a drag anchored at `(x, y)`.
    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag = Some(DragSession { last_x: x, last_y: y });
    }

    /// Rotate by the movement since the last pointer position. Ignored outside a drag.
    pub fn update_drag(&mut self, x: f32, y: f32) {
        let Some(session) = self.drag.as_mut() else {
            return;
        };
        let dx = x - session.last_x;
        let dy = y - session.last_y;
        session.last_x = x;
        session.last_y = y;

        self.orientation.rotate(dy / DRAG_PIXELS_PER_RADIAN, -dx / DRAG_PIXELS_PER_RADIAN);
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn compute_frame(&self) -> CameraFrame {
        CameraFrame::from_orientation(&self.orientation)
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::camera::{MAX_PITCH, MIN_PITCH};

    #[test]
    fn test_pitch_stays_clamped_for_any_drag() {
        let mut controller = CameraController::new();
        controller.begin_drag(0.0, 0.0);
        let (mut x, mut y) = (0.0f32, 0.0f32);
        // Deterministic mix of tiny, huge, positive and negative moves
        for step in 0..2000 {
            let s = step as f32;
            x += (s * 0.37).sin() * 150.0;
            y += (s * 0.73).cos() * (1.0 + (step % 17) as f32 * 40.0);
            controller.update_drag(x, y);
            let pitch = controller.orientation().pitch();
            assert!((MIN_PITCH..=MAX_PITCH).contains(&pitch), "pitch {pitch} escaped at step {step}");
        }
    }

    #[test]
    fn test_update_without_drag_is_noop() {
        let mut controller = CameraController::new();
        let before = controller.orientation();
        controller.update_drag(500.0, -300.0);
        assert_eq!(controller.orientation(), before);

        controller.begin_drag(0.0, 0.0);
        controller.end_drag();
        controller.update_drag(120.0, 120.0);
        assert_eq!(controller.orientation(), before);
    }

    #[test]
    fn test_drag_deltas_map_to_pitch_and_yaw() {
        let mut controller = CameraController::with_orientation(OrientationState::new(0.0, 0.0));
        controller.begin_drag(100.0, 100.0);
        controller.update_drag(160.0, 130.0);
        let o = controller.orientation();
        assert!((o.pitch() - 0.5).abs() < 1e-6);
        assert!((o.yaw + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_begin_drag_resets_anchor() {
        let mut controller = CameraController::with_orientation(OrientationState::new(0.0, 0.0));
        controller.begin_drag(0.0, 0.0);
        controller.begin_drag(300.0, 0.0);
        controller.update_drag(300.0, 0.0);
        assert_eq!(controller.orientation(), OrientationState::new(0.0, 0.0));
        assert!(controller.is_dragging());
    }

    #[test]
    fn test_compute_frame_is_pure() {
        let controller = CameraController::new();
        assert_eq!(controller.compute_frame(), controller.compute_frame());
        assert!((controller.compute_frame().eye.length() - crate::model::camera::ORBIT_DISTANCE).abs() < 1e-4);
    }
}
