/// Platform-agnostic pointer handling
use crate::controller::CameraController;

/// Pointer events the viewer reacts to, in logical surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    DragStart { x: f32, y: f32 },
    DragMove { x: f32, y: f32 },
    DragEnd,
}

impl PointerEvent {
    /// Forward this event to the camera controller.
    pub fn apply(self, camera: &mut CameraController) {
        match self {
            PointerEvent::DragStart { x, y } => camera.begin_drag(x, y),
            PointerEvent::DragMove { x, y } => camera.update_drag(x, y),
            PointerEvent::DragEnd => camera.end_drag(),
        }
    }
}

/// Turns raw button and cursor notifications into [`PointerEvent`]s.
///
/// Backends that report button presses without a position (winit) need the last
/// cursor position to anchor a drag. A press that arrives before any cursor movement
/// is held and anchored at the first position reported after it.
#[derive(Debug, Default)]
pub struct PointerTracker {
    cursor: Option<(f32, f32)>,
    pressed: bool,
}

impl PointerTracker {
    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Option<PointerEvent> {
        let first_position = self.cursor.is_none();
        self.cursor = Some((x, y));
        if self.pressed && first_position {
            Some(PointerEvent::DragStart { x, y })
        } else {
            Some(PointerEvent::DragMove { x, y })
        }
    }

    pub fn button_pressed(&mut self) -> Option<PointerEvent> {
        self.pressed = true;
        let (x, y) = self.cursor?;
        Some(PointerEvent::DragStart { x, y })
    }

    pub fn button_released(&mut self) -> Option<PointerEvent> {
        self.pressed = false;
        Some(PointerEvent::DragEnd)
    }

    /// The cursor left the surface; any drag in progress ends here.
    pub fn cursor_left(&mut self) -> Option<PointerEvent> {
        self.cursor = None;
        if std::mem::take(&mut self.pressed) {
            Some(PointerEvent::DragEnd)
        } else {
            None
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::{PointerEvent, PointerTracker};
    use winit::event::{ElementState, MouseButton, WindowEvent};

    impl PointerTracker {
        /// Translate a window event; `scale_factor` converts physical to logical pixels.
        pub fn translate(&mut self, event: &WindowEvent, scale_factor: f64) -> Option<PointerEvent> {
            match event {
                WindowEvent::CursorMoved { position, .. } => {
                    let p = position.to_logical::<f64>(scale_factor);
                    self.cursor_moved(p.x as f32, p.y as f32)
                }
                WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => match state {
                    ElementState::Pressed => self.button_pressed(),
                    ElementState::Released => self.button_released(),
                },
                WindowEvent::CursorLeft { .. } => self.cursor_left(),
                _ => None,
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::PointerEvent;
    use web_sys::MouseEvent;

    pub fn mouse_down_to_pointer(e: &MouseEvent) -> PointerEvent {
        PointerEvent::DragStart { x: e.page_x() as f32, y: e.page_y() as f32 }
    }

    pub fn mouse_move_to_pointer(e: &MouseEvent) -> PointerEvent {
        PointerEvent::DragMove { x: e.page_x() as f32, y: e.page_y() as f32 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrientationState;

    #[test]
    fn test_events_drive_controller() {
        let mut camera = CameraController::with_orientation(OrientationState::new(0.0, 0.0));
        PointerEvent::DragMove { x: 10.0, y: 10.0 }.apply(&mut camera);
        assert_eq!(camera.orientation(), OrientationState::new(0.0, 0.0));

        PointerEvent::DragStart { x: 0.0, y: 0.0 }.apply(&mut camera);
        PointerEvent::DragMove { x: 0.0, y: 6.0 }.apply(&mut camera);
        assert!((camera.orientation().pitch() - 0.1).abs() < 1e-6);

        PointerEvent::DragEnd.apply(&mut camera);
        assert!(!camera.is_dragging());
    }

    #[test]
    fn test_press_before_any_motion_anchors_on_first_move() {
        let mut tracker = PointerTracker::default();
        assert_eq!(tracker.button_pressed(), None);
        assert_eq!(tracker.cursor_moved(40.0, 20.0), Some(PointerEvent::DragStart { x: 40.0, y: 20.0 }));
        assert_eq!(tracker.cursor_moved(46.0, 20.0), Some(PointerEvent::DragMove { x: 46.0, y: 20.0 }));
    }

    #[test]
    fn test_press_after_motion_starts_at_cursor() {
        let mut tracker = PointerTracker::default();
        tracker.cursor_moved(5.0, 7.0);
        assert_eq!(tracker.button_pressed(), Some(PointerEvent::DragStart { x: 5.0, y: 7.0 }));
        assert_eq!(tracker.button_released(), Some(PointerEvent::DragEnd));
    }

    #[test]
    fn test_leaving_surface_ends_drag() {
        let mut camera = CameraController::with_orientation(OrientationState::new(0.0, 0.0));
        let mut tracker = PointerTracker::default();
        for event in [tracker.cursor_moved(0.0, 0.0), tracker.button_pressed(), tracker.cursor_left()]
            .into_iter()
            .flatten()
        {
            event.apply(&mut camera);
        }
        assert!(!camera.is_dragging());

        // Re-entering with the button still up must not rotate
        if let Some(event) = tracker.cursor_moved(90.0, 90.0) {
            event.apply(&mut camera);
        }
        assert_eq!(camera.orientation(), OrientationState::new(0.0, 0.0));
    }

    #[test]
    fn test_leaving_without_drag_emits_nothing() {
        let mut tracker = PointerTracker::default();
        tracker.cursor_moved(1.0, 1.0);
        assert_eq!(tracker.cursor_left(), None);
    }
}
