use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rippleconfig::{EffectConfig, LabelConfig};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;

use crate::backdrop::Backdrop;
use crate::backend::SimulationBackend;
use crate::clock::FrameClock;
use crate::composite::CompositeParams;
use crate::lifecycle::{ReleaseReport, ResourceKind};
use crate::physics::PhysicsParams;
use crate::pointer::PointerSample;
use crate::store::PingPong;
use crate::viewport::Viewport;

use super::context::GpuContext;
use super::pipeline::StagePrograms;
use super::surfaces::{BackdropTexture, FieldSurface, QuadGeometry};
use super::uniforms::{CompositeUniforms, PhysicsUniforms};

/// wgpu implementation of both stages, presenting into a window surface.
pub struct GpuBackend {
    context: GpuContext,
    label: LabelConfig,
    programs: StagePrograms,
    quad: QuadGeometry,
    physics_uniforms: PhysicsUniforms,
    physics_buffer: wgpu::Buffer,
    composite_uniforms: CompositeUniforms,
    composite_buffer: wgpu::Buffer,
    surfaces: PingPong<FieldSurface>,
    backdrop: BackdropTexture,
    /// Indexed by the surface each group reads from.
    physics_groups: [wgpu::BindGroup; 2],
    composite_groups: [wgpu::BindGroup; 2],
}

impl GpuBackend {
    /// Brings up the device and allocates every resource for `viewport`.
    ///
    /// Returns [`crate::InitError`] (inside the `anyhow` chain) when the
    /// environment has no usable adapter, device or surface. Resources
    /// created before a failure are dropped on return.
    pub fn new<W>(window: Arc<W>, config: &EffectConfig, viewport: Viewport) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let (width, height) = viewport.physical_size();
        let context = GpuContext::new(window, (width, height))?;
        let device = &context.device;

        let programs = with_error_scope(device, || {
            StagePrograms::new(device, context.surface_format())
        })
        .context("failed to build stage programs")?;
        let quad = QuadGeometry::new(device);

        let physics_uniforms =
            PhysicsUniforms::new(&PhysicsParams::from(&config.simulation), width, height);
        let physics_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("physics uniforms"),
            contents: bytemuck::bytes_of(&physics_uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let composite_uniforms =
            CompositeUniforms::new(&CompositeParams::from(&config.compositing), width, height);
        let composite_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("composite uniforms"),
            contents: bytemuck::bytes_of(&composite_uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let surfaces = PingPong::new(|index| FieldSurface::new(device, width, height, index));
        let backdrop = Backdrop::generate(&config.label, width, height, viewport.pixel_density());
        let backdrop = BackdropTexture::upload(device, &context.queue, &backdrop);

        let physics_groups = surfaces
            .surfaces()
            .each_ref()
            .map(|surface| programs.physics_bind_group(device, &physics_buffer, surface));
        let composite_groups = surfaces.surfaces().each_ref().map(|surface| {
            programs.composite_bind_group(device, &composite_buffer, surface, &backdrop)
        });

        debug!(
            adapter = %context.adapter_info.name,
            width,
            height,
            "allocated GPU wave field"
        );

        Ok(Self {
            context,
            label: config.label.clone(),
            programs,
            quad,
            physics_uniforms,
            physics_buffer,
            composite_uniforms,
            composite_buffer,
            surfaces,
            backdrop,
            physics_groups,
            composite_groups,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.context.adapter_info.name
    }

    /// Recovers from a lost or outdated swapchain.
    pub fn reconfigure_surface(&self) {
        self.context.reconfigure();
    }

    fn rebuild_bind_groups(&mut self) {
        let device = &self.context.device;
        let programs = &self.programs;
        let physics_buffer = &self.physics_buffer;
        let composite_buffer = &self.composite_buffer;
        let backdrop = &self.backdrop;
        self.physics_groups = self
            .surfaces
            .surfaces()
            .each_ref()
            .map(|surface| programs.physics_bind_group(device, physics_buffer, surface));
        self.composite_groups = self.surfaces.surfaces().each_ref().map(|surface| {
            programs.composite_bind_group(device, composite_buffer, surface, backdrop)
        });
    }
}

impl SimulationBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn dispatch_physics(&mut self, clock: FrameClock, pointer: PointerSample) -> Result<()> {
        self.physics_uniforms.update(clock, pointer);
        self.context.queue.write_buffer(
            &self.physics_buffer,
            0,
            bytemuck::bytes_of(&self.physics_uniforms),
        );

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("physics encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("physics pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.surfaces.write().view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.programs.physics);
            pass.set_bind_group(0, &self.physics_groups[self.surfaces.read_index()], &[]);
            self.quad.draw(&mut pass);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn swap(&mut self) {
        self.surfaces.swap();
    }

    fn dispatch_composite(&mut self) -> Result<()> {
        let acquisition_start = Instant::now();
        let frame = self.context.surface.get_current_texture()?;
        let acquisition = acquisition_start.elapsed();
        if acquisition > Duration::from_millis(100) {
            warn!(
                ms = acquisition.as_millis() as u64,
                "acquiring the surface texture was slow"
            );
        }

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("composite encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.programs.composite);
            pass.set_bind_group(0, &self.composite_groups[self.surfaces.read_index()], &[]);
            self.quad.draw(&mut pass);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) -> Result<()> {
        let (width, height) = viewport.physical_size();
        let max = self.context.max_texture_dimension;
        if width > max || height > max {
            anyhow::bail!("viewport {width}x{height} exceeds the GPU texture limit of {max}");
        }

        // Swapchain and field share the clamped size.
        self.context.resize(width, height);
        let device = &self.context.device;
        self.surfaces
            .reallocate(|index| FieldSurface::new(device, width, height, index));
        let backdrop = Backdrop::generate(&self.label, width, height, viewport.pixel_density());
        self.backdrop = BackdropTexture::upload(device, &self.context.queue, &backdrop);

        self.physics_uniforms.set_resolution(width, height);
        self.context.queue.write_buffer(
            &self.physics_buffer,
            0,
            bytemuck::bytes_of(&self.physics_uniforms),
        );
        self.composite_uniforms.set_resolution(width, height);
        self.context.queue.write_buffer(
            &self.composite_buffer,
            0,
            bytemuck::bytes_of(&self.composite_uniforms),
        );

        self.rebuild_bind_groups();
        debug!(
            width,
            height,
            generation = self.surfaces.generation(),
            "reallocated GPU wave field"
        );
        Ok(())
    }

    fn release(self) -> ReleaseReport {
        let Self {
            context,
            programs,
            quad,
            physics_buffer,
            composite_buffer,
            surfaces,
            backdrop,
            physics_groups,
            composite_groups,
            ..
        } = self;
        let device = &context.device;
        let mut report = ReleaseReport::new();

        report.release(ResourceKind::Surfaces, || {
            with_error_scope(device, || {
                drop(physics_groups);
                drop(composite_groups);
                for surface in surfaces.into_surfaces() {
                    surface.texture.destroy();
                }
            })
        });
        report.release(ResourceKind::Programs, || {
            with_error_scope(device, || drop(programs))
        });
        report.release(ResourceKind::Geometry, || {
            with_error_scope(device, || {
                quad.vertices.destroy();
                quad.indices.destroy();
                physics_buffer.destroy();
                composite_buffer.destroy();
            })
        });
        report.release(ResourceKind::Backdrop, || {
            with_error_scope(device, || backdrop.texture.destroy())
        });
        report.release(ResourceKind::Context, || {
            context.device.poll(wgpu::PollType::Wait)?;
            drop(context);
            Ok(())
        });
        report
    }
}

/// Runs `f` inside a validation error scope, turning captured errors into `Err`.
fn with_error_scope<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(anyhow!("{error}")),
        None => Ok(value),
    }
}
