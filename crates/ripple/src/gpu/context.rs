use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::error::InitError;

/// Owns the wgpu instance, presentation surface and device.
///
/// Fields are declared in release order: dropping the context tears down the
/// surface before the device and instance.
pub(crate) struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub adapter_info: wgpu::AdapterInfo,
    pub max_texture_dimension: u32,
    _instance: wgpu::Instance,
}

impl GpuContext {
    pub(crate) fn new<W>(window: Arc<W>, size: (u32, u32)) -> Result<Self, InitError>
    where
        W: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance
            .create_surface(window)
            .map_err(InitError::Surface)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(InitError::Unsupported)?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let max_texture_dimension = limits.max_texture_dimension_2d;
        let (width, height) = (size.0.max(1), size.1.max(1));
        if width > max_texture_dimension || height > max_texture_dimension {
            return Err(InitError::TooLarge {
                width,
                height,
                max: max_texture_dimension,
            });
        }

        let surface_caps = surface.get_capabilities(&adapter);
        // The effect writes display-ready values, so skip the sRGB encode.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| {
                let fallback = surface_caps.formats.first().copied();
                if let Some(format) = fallback {
                    tracing::warn!(
                        ?format,
                        "no linear (non-sRGB) surface format available; falling back to {:?}",
                        format
                    );
                }
                fallback
            })
            .ok_or(InitError::IncompatibleSurface)?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("ripple device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(InitError::Device)?;

        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .or_else(|| surface_caps.present_modes.first().copied())
            .unwrap_or(wgpu::PresentMode::Fifo);
        tracing::debug!(?present_mode, ?surface_format, "using present mode");

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            adapter_info,
            max_texture_dimension,
            _instance: instance,
        })
    }

    pub(crate) fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width.min(self.max_texture_dimension);
        self.config.height = height.min(self.max_texture_dimension);
        self.surface.configure(&self.device, &self.config);
    }

    /// Reapplies the current configuration after a lost or outdated surface.
    pub(crate) fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}
