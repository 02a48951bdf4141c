//! Interactive wave-ripple distortion over a static text backdrop.
//!
//! A damped wave equation runs on a pair of float surfaces that swap roles
//! every frame. Each cycle the physics stage steps the field (injecting a
//! pressure impulse under the pointer) and the compositing stage refracts the
//! backdrop along the field's gradient and adds a specular highlight:
//!
//! ```text
//!   pointer events ─▶ PointerTracker ─┐
//!                                     ▼
//!   FrameDriver::run_cycle ─▶ physics(read ▶ write) ─▶ swap ─▶ composite(read + backdrop) ─▶ visible surface
//!          ▲                                                                                  │
//!          └──────────────────────────── next FrameToken ◀────────────────────────────────────┘
//! ```
//!
//! [`Renderer`] is the entry point: [`Renderer::run_windowed`] opens a window
//! backed by wgpu, [`Renderer::render_headless`] runs the CPU backend and
//! returns the final frame as an image.

mod backdrop;
mod backend;
mod clock;
mod composite;
mod driver;
mod error;
mod field;
mod gpu;
mod lifecycle;
mod physics;
mod pointer;
mod schedule;
mod software;
mod store;
mod viewport;
mod window;

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;
use rippleconfig::EffectConfig;

pub use backdrop::Backdrop;
pub use backend::SimulationBackend;
pub use clock::{BoxedTimeSource, FixedStepTimeSource, FrameClock, SystemTimeSource, TimeSource};
pub use composite::{composite, shade, CompositeParams};
pub use driver::{CycleOutcome, DriverState, FrameDriver};
pub use error::{DriverError, InitError};
pub use field::{Texel, WaveField, GRADIENT_X, GRADIENT_Y, PRESSURE, VELOCITY};
pub use gpu::GpuBackend;
pub use lifecycle::{ReleaseFailure, ReleaseReport, ResourceKind};
pub use physics::{impulse_at, step, PhysicsParams, Stencil};
pub use pointer::{PointerSample, PointerTracker};
pub use schedule::{FrameScheduler, FrameToken};
pub use software::SoftwareBackend;
pub use store::PingPong;
pub use viewport::{Viewport, MIN_VIEWPORT_EXTENT};
pub use window::WindowOptions;

/// Pointer held at a fixed client position for the first `frames` cycles of a
/// headless render, then released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedPointer {
    /// Logical client coordinates, origin at the top-left.
    pub position: [f32; 2],
    pub frames: u32,
}

/// Parameters of an offscreen render.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessRequest {
    /// Viewport size in logical pixels.
    pub size: (u32, u32),
    pub pixel_density: f32,
    /// Number of frame cycles to run; at least one is always run.
    pub frames: u32,
    /// Simulated frame rate used for the clock.
    pub fps: f32,
    pub pointer: Option<ScriptedPointer>,
}

impl Default for HeadlessRequest {
    fn default() -> Self {
        Self {
            size: (800, 600),
            pixel_density: 1.0,
            frames: 120,
            fps: 60.0,
            pointer: None,
        }
    }
}

/// High-level entry point owning the effect configuration.
pub struct Renderer {
    config: EffectConfig,
}

impl Renderer {
    pub fn new(config: EffectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    /// Opens a window and runs the GPU backend until the window closes.
    pub fn run_windowed(self, options: WindowOptions) -> Result<()> {
        window::run(self.config, options)
    }

    /// Runs the effect on the CPU backend and returns the last composited frame.
    pub fn render_headless(&self, request: &HeadlessRequest) -> Result<RgbaImage> {
        let viewport = Viewport::new(
            request.size.0 as f32,
            request.size.1 as f32,
            request.pixel_density,
        );
        let mut driver = FrameDriver::new(
            viewport,
            Box::new(FixedStepTimeSource::at_fps(request.fps)),
        );
        let mut token = driver.start(|viewport| Ok(SoftwareBackend::new(&self.config, viewport)))?;

        for index in 0..request.frames.max(1) {
            match request.pointer {
                Some(pointer) if index < pointer.frames => {
                    driver.pointer_moved(pointer.position[0], pointer.position[1]);
                }
                _ => driver.pointer_left(),
            }
            match driver.run_cycle(token)? {
                CycleOutcome::Completed { next, .. } => token = next,
                CycleOutcome::Rejected => anyhow::bail!("headless frame {index} was rejected"),
            }
        }

        let frame = driver
            .backend()
            .map(|backend| backend.frame().clone())
            .context("software backend missing after render")?;
        let report = driver.dispose()?;
        if !report.is_clean() {
            tracing::warn!(failures = report.failures().len(), "teardown finished with errors");
        }
        tracing::info!(
            width = frame.width(),
            height = frame.height(),
            frames = request.frames.max(1),
            "headless render finished"
        );
        Ok(frame)
    }
}

/// Writes `image` as PNG, creating parent directories as needed.
pub fn export_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
