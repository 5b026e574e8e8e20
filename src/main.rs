use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

// Import from the library crate
use hotmesh::{config::ViewerConfig, controller, logging, model, transport, view};

use controller::{CameraController, GeometryFeedListener, GpuBufferManager, PointerTracker, RenderLoop};
use model::PendingGeometry;
use transport::{FeedEvent, FeedPayload};
use view::{GpuContext, SurfaceRecovery, SurfaceRenderer, WgpuMeshUploader};

/// Window-bound state, created once the event loop resumes.
struct Viewer {
    window: Arc<Window>,
    renderer: SurfaceRenderer,
    render_loop: RenderLoop<WgpuMeshUploader>,
}

struct App {
    config: ViewerConfig,
    camera: Rc<RefCell<CameraController>>,
    pending: PendingGeometry,
    listener: GeometryFeedListener,
    pointer: PointerTracker,
    viewer: Option<Viewer>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        let pending = PendingGeometry::default();
        Self {
            config,
            camera: Rc::new(RefCell::new(CameraController::new())),
            listener: GeometryFeedListener::new(pending.clone()),
            pending,
            pointer: PointerTracker::default(),
            viewer: None,
        }
    }

    fn create_viewer(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Viewer> {
        let attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(attrs)?);

        // The surface is sized in physical pixels
        let size = window.inner_size();
        let gpu = pollster::block_on(GpuContext::new_native(window.clone(), size.width, size.height))?;
        let renderer = SurfaceRenderer::new(gpu, self.config.clear_color);

        let buffers = GpuBufferManager::new(renderer.uploader(), self.pending.clone());
        let mut render_loop = RenderLoop::new(self.camera.clone(), buffers, self.config.light_position);
        render_loop.start();

        Ok(Viewer { window, renderer, render_loop })
    }
}

impl ApplicationHandler<FeedEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }

        match self.create_viewer(event_loop) {
            Ok(viewer) => {
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to initialize viewer");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else { return };
        if window_id != viewer.window.id() {
            return;
        }

        if let Some(pointer_event) = self.pointer.translate(&event, viewer.window.scale_factor()) {
            pointer_event.apply(&mut self.camera.borrow_mut());
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let size = viewer.window.inner_size();
                if viewer.renderer.reconfigure(size.width, size.height) {
                    viewer.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = viewer.render_loop.tick(&mut viewer.renderer) {
                    match SurfaceRecovery::for_error(&e) {
                        SurfaceRecovery::Skip => tracing::warn!(error = %e, "skipping frame"),
                        SurfaceRecovery::Reconfigure => {
                            let size = viewer.window.inner_size();
                            tracing::debug!(error = %e, width = size.width, height = size.height, "surface outdated");
                            // Minimized: wait for a Resized event instead of spinning
                            if !viewer.renderer.reconfigure(size.width, size.height) {
                                return;
                            }
                        }
                        SurfaceRecovery::Fatal => {
                            tracing::error!(error = %e, ticks = viewer.render_loop.ticks(), "surface failed, exiting");
                            event_loop.exit();
                            return;
                        }
                    }
                }
                viewer.window.request_redraw();
            }
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FeedEvent) {
        match event {
            FeedEvent::Connected => tracing::info!("geometry feed ready"),
            FeedEvent::Payload(FeedPayload::Text(text)) => {
                self.listener.on_payload(&text);
            }
            FeedEvent::Payload(FeedPayload::Binary(bytes)) => {
                self.listener.on_binary_payload(&bytes);
            }
            FeedEvent::Disconnected => tracing::warn!(
                accepted = self.listener.accepted(),
                dropped = self.listener.dropped(),
                "geometry feed gone, keeping last mesh"
            ),
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let config = ViewerConfig::from_env();
    tracing::info!(feed_url = %config.feed_url, "starting hotmesh");

    let event_loop = EventLoop::<FeedEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    // Detached; the process exit ends the blocking read
    let _feed = transport::spawn_feed(config.feed_url.clone(), event_loop.create_proxy())?;

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
