//! Browser shell: canvas, pointer listeners, feed socket and the animation frame loop.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::{HtmlCanvasElement, MouseEvent, Window};

use crate::config::ViewerConfig;
use crate::controller::input::wasm::{mouse_down_to_pointer, mouse_move_to_pointer};
use crate::controller::{CameraController, GeometryFeedListener, GpuBufferManager, PointerEvent, RenderLoop};
use crate::logging;
use crate::model::PendingGeometry;
use crate::transport;
use crate::view::{GpuContext, SurfaceRecovery, SurfaceRenderer};

#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();

    let config = ViewerConfig::default();
    let (window, canvas) = init_canvas(config.width, config.height)?;
    setup_app(window, &canvas, config).await
}

async fn setup_app(window: Window, canvas: &HtmlCanvasElement, config: ViewerConfig) -> Result<(), JsValue> {
    let gpu = GpuContext::new(canvas, config.width, config.height)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e}")))?;
    let mut renderer = SurfaceRenderer::new(gpu, config.clear_color);

    let camera = Rc::new(RefCell::new(CameraController::new()));
    let pending = PendingGeometry::default();

    // The socket stays open after the handle is dropped; its callbacks are leaked
    transport::connect(&config.feed_url, GeometryFeedListener::new(pending.clone()))?;
    setup_pointer_listeners(canvas, camera.clone())?;

    let buffers = GpuBufferManager::new(renderer.uploader(), pending);
    let mut render_loop = RenderLoop::new(camera, buffers, config.light_position);
    render_loop.start();

    AnimationFrameLoop::new(window, move || {
        let Err(e) = render_loop.tick(&mut renderer) else { return true };
        match SurfaceRecovery::for_error(&e) {
            SurfaceRecovery::Skip => {
                tracing::warn!(error = %e, "skipping frame");
                true
            }
            SurfaceRecovery::Reconfigure => {
                // The canvas never changes size, so re-applying the current config is enough
                let (width, height) = renderer.size();
                tracing::debug!(error = %e, width, height, "surface outdated");
                renderer.reconfigure(width, height)
            }
            SurfaceRecovery::Fatal => {
                tracing::error!(error = %e, ticks = render_loop.ticks(), "surface failed, render loop stopped");
                false
            }
        }
    })
    .start()
}

fn setup_pointer_listeners(canvas: &HtmlCanvasElement, camera: Rc<RefCell<CameraController>>) -> Result<(), JsValue> {
    // Mouse down
    {
        let camera = camera.clone();
        let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
            if e.button() != 0 {
                return;
            }
            mouse_down_to_pointer(&e).apply(&mut camera.borrow_mut());
            e.prevent_default();
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }

    // Mouse move
    {
        let camera = camera.clone();
        let mousemove = Closure::wrap(Box::new(move |e: MouseEvent| {
            mouse_move_to_pointer(&e).apply(&mut camera.borrow_mut());
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;
        mousemove.forget();
    }

    // Mouse up, or leaving the canvas mid-drag
    for event in ["mouseup", "mouseleave"] {
        let camera = camera.clone();
        let end = Closure::wrap(Box::new(move |_e: MouseEvent| {
            PointerEvent::DragEnd.apply(&mut camera.borrow_mut());
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback(event, end.as_ref().unchecked_ref())?;
        end.forget();
    }

    Ok(())
}

fn init_canvas(width: u32, height: u32) -> Result<(Window, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    canvas_el.set_width(width);
    canvas_el.set_height(height);
    body.append_child(&canvas_el)?;
    Ok((window, canvas_el))
}

fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

type FrameClosure = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Self-rescheduling `requestAnimationFrame` callback.
///
/// The frame function returns `false` to stop rescheduling.
struct AnimationFrameLoop {
    frame: Box<dyn FnMut() -> bool>,
    window: Window,
}

impl AnimationFrameLoop {
    fn new(window: Window, frame: impl FnMut() -> bool + 'static) -> Self {
        Self { frame: Box::new(frame), window }
    }

    fn start(self) -> Result<(), JsValue> {
        let Self { mut frame, window } = self;

        let callback: FrameClosure = Rc::new(RefCell::new(None));
        let callback_clone = callback.clone();
        let window_for_loop = window.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if !frame() {
                return;
            }

            let next = callback_clone.borrow();
            let Some(cb) = next.as_ref() else { return };
            if let Err(e) = window_for_loop.request_animation_frame(cb.as_ref().unchecked_ref()) {
                tracing::error!(error = ?e, "requestAnimationFrame failed, render loop stopped");
            }
        }) as Box<dyn FnMut()>));

        let first = callback.borrow();
        match first.as_ref() {
            Some(cb) => {
                window.request_animation_frame(cb.as_ref().unchecked_ref())?;
            }
            None => return Err(js_error("animation frame callback missing")),
        }
        Ok(())
    }
}
