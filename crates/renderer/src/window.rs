//! Windowed preview runtime.
//!
//! The preview runs its own event loop on a dedicated thread so callers can
//! keep driving extraction and parameter updates from wherever they already
//! are. Commands cross over through the event loop proxy; the thread owns the
//! window and all GPU state for its lifetime.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use logofield::RenderableField;
use tracing::{debug, error, warn};

use crate::gpu::{FrameOutcome, GpuState};
use crate::types::{EffectParams, PreviewConfig};
use crate::viewport::ViewportCoordinator;

/// Messages delivered to the preview thread through the event loop proxy.
#[derive(Debug, Clone)]
enum PreviewCommand {
    UpdateParams(EffectParams),
    ReplaceField(Arc<RenderableField>),
    Shutdown,
}

struct PreviewState {
    window: Arc<Window>,
    gpu: GpuState,
}

impl PreviewState {
    fn new(
        window: Arc<Window>,
        field: &RenderableField,
        params: EffectParams,
        now: Instant,
    ) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, field, params, now)?;
        Ok(Self { window, gpu })
    }
}

/// Handle to a running preview window.
///
/// Dropping the runtime asks the window to close and joins the thread, so a
/// caller that only needs the preview for the duration of a scope can rely
/// on scope exit alone.
pub struct PreviewRuntime {
    proxy: EventLoopProxy<PreviewCommand>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl PreviewRuntime {
    /// Opens the preview window on its own thread and blocks until the
    /// window and GPU state are either ready or failed to come up.
    pub fn spawn(config: PreviewConfig, field: Arc<RenderableField>) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("liquidlogo-preview".into())
            .spawn(move || run_preview_thread(config, field, ready_tx))
            .map_err(|err| anyhow!("failed to spawn preview thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("preview thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            join_handle: Some(handle),
        })
    }

    /// Pushes a new parameter set to the running preview.
    pub fn update_params(&self, params: EffectParams) -> Result<()> {
        self.proxy
            .send_event(PreviewCommand::UpdateParams(params))
            .map_err(|err| anyhow!(err))
    }

    /// Swaps the displayed field for a freshly extracted one.
    pub fn replace_field(&self, field: Arc<RenderableField>) -> Result<()> {
        self.proxy
            .send_event(PreviewCommand::ReplaceField(field))
            .map_err(|err| anyhow!(err))
    }

    /// Blocks until the window is closed by the user.
    pub fn wait(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            handle
                .join()
                .map_err(|err| anyhow!("preview thread panicked: {err:?}"))??;
        }
        Ok(())
    }

    /// Closes the window and joins the thread.
    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(PreviewCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("preview thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for PreviewRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(PreviewCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_preview_thread(
    config: PreviewConfig,
    field: Arc<RenderableField>,
    ready_tx: Sender<Result<EventLoopProxy<PreviewCommand>, anyhow::Error>>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<PreviewCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }
    let event_loop = builder
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let proxy = event_loop.create_proxy();

    let coordinator = ViewportCoordinator::new(config.logical_side);
    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(coordinator.logical_size())
        .with_resizable(false)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let frame = coordinator.resolve(window.scale_factor(), field.width(), field.height());
    debug!(
        backing_width = frame.backing.width,
        backing_height = frame.backing.height,
        canvas_ratio = frame.canvas_ratio,
        image_ratio = frame.image_ratio,
        "preview viewport resolved"
    );

    let mut state = match PreviewState::new(
        window.clone(),
        field.as_ref(),
        config.params,
        Instant::now(),
    ) {
        Ok(state) => state,
        Err(err) => {
            let wrapped = anyhow!("failed to initialise preview renderer: {err}");
            let message = wrapped.to_string();
            let _ = ready_tx.send(Err(anyhow!(message)));
            return Err(wrapped);
        }
    };

    if state.gpu.ready_for_frame(Instant::now()) {
        state.window.request_redraw();
    }

    let _ = ready_tx.send(Ok(proxy.clone()));

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::UserEvent(command) => match command {
            PreviewCommand::UpdateParams(params) => state.gpu.set_params(params),
            PreviewCommand::ReplaceField(field) => {
                if let Err(err) = state.gpu.replace_field(field.as_ref()) {
                    warn!(error = %err, "field upload rejected; keeping previous texture");
                }
            }
            PreviewCommand::Shutdown => elwt.exit(),
        },
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => elwt.exit(),
            WindowEvent::Resized(new_size) => state.gpu.resize(new_size),
            WindowEvent::ScaleFactorChanged {
                scale_factor,
                mut inner_size_writer,
            } => {
                let _ =
                    inner_size_writer.request_inner_size(coordinator.backing_size(scale_factor));
            }
            WindowEvent::RedrawRequested => match state.gpu.render_frame(Instant::now()) {
                Ok(FrameOutcome::Rendered) | Ok(FrameOutcome::Skipped) => {}
                Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                    state.gpu.resize(state.gpu.size());
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    error!("surface out of memory; exiting preview");
                    elwt.exit();
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    warn!("surface timeout; retrying next frame");
                }
                Err(other) => {
                    warn!(error = ?other, "surface error; retrying next frame");
                }
            },
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            if state.gpu.ready_for_frame(now) {
                state.window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else {
                elwt.set_control_flow(ControlFlow::WaitUntil(state.gpu.next_deadline()));
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("preview event loop error: {err}"))
}
