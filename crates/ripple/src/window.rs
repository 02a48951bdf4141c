use std::sync::Arc;

use anyhow::{anyhow, Result};
use rippleconfig::EffectConfig;
use tracing::{error, info, warn};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::clock::SystemTimeSource;
use crate::driver::FrameDriver;
use crate::gpu::GpuBackend;
use crate::viewport::Viewport;

/// Window parameters for the interactive run.
#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub title: String,
    /// Initial inner size in logical pixels.
    pub size: (u32, u32),
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "ripplefx".to_string(),
            size: (1280, 720),
        }
    }
}

/// Opens a window and drives the effect until it is closed or Escape is pressed.
pub(crate) fn run(config: EffectConfig, options: WindowOptions) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(options.title.as_str())
        .with_inner_size(LogicalSize::new(options.size.0, options.size.1))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut driver = FrameDriver::new(viewport_for(&window), Box::new(SystemTimeSource::new()));
    let surface_window = window.clone();
    driver.start(|viewport| GpuBackend::new(surface_window, &config, viewport))?;
    if let Some(backend) = driver.backend() {
        info!(adapter = backend.adapter_name(), "rendering with wgpu");
    }
    window.request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    elwt.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(window.scale_factor());
                driver.pointer_moved(logical.x as f32, logical.y as f32);
            }
            WindowEvent::CursorLeft { .. } => driver.pointer_left(),
            WindowEvent::Resized(_) => {
                if let Err(err) = driver.resize(viewport_for(&window)) {
                    warn!(error = %err, "ignoring resize");
                }
                window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Err(err) = driver.resize(viewport_for(&window)) {
                    warn!(error = %err, "ignoring scale factor change");
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(token) = driver.pending_token() else {
                    return;
                };
                if let Err(err) = driver.run_cycle(token) {
                    match err.downcast_ref::<wgpu::SurfaceError>() {
                        Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            if let Some(backend) = driver.backend() {
                                backend.reconfigure_surface();
                            }
                        }
                        Some(wgpu::SurfaceError::OutOfMemory) => {
                            error!("surface out of memory; exiting");
                            elwt.exit();
                        }
                        Some(other) => warn!("surface error: {other:?}; dropping frame"),
                        None => warn!(error = ?err, "frame cycle failed; dropping frame"),
                    }
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            if driver.pending_token().is_some() {
                window.request_redraw();
            }
            elwt.set_control_flow(ControlFlow::Wait);
        }
        Event::LoopExiting => match driver.dispose() {
            Ok(report) if !report.is_clean() => {
                warn!(failures = report.failures().len(), "teardown finished with errors");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "teardown skipped"),
        },
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

fn viewport_for(window: &Window) -> Viewport {
    viewport_from_inner_size(window.inner_size(), window.scale_factor())
}

/// Viewport for a window's physical inner size. Windows below the minimum
/// extent get a larger viewport; the swapchain is configured from it, so the
/// effect overflows the window anchored at the top-left.
fn viewport_from_inner_size(size: PhysicalSize<u32>, scale_factor: f64) -> Viewport {
    let scale = scale_factor as f32;
    Viewport::new(
        size.width as f32 / scale,
        size.height as f32 / scale,
        scale,
    )
}
