/// Smallest logical extent a simulation surface is allocated at.
pub const MIN_VIEWPORT_EXTENT: f32 = 100.0;

/// Host viewport in logical pixels plus the device pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    logical_width: f32,
    logical_height: f32,
    pixel_density: f32,
}

impl Viewport {
    /// Builds a viewport, clamping degenerate sizes to [`MIN_VIEWPORT_EXTENT`].
    pub fn new(logical_width: f32, logical_height: f32, pixel_density: f32) -> Self {
        let clamp = |value: f32| {
            if value.is_finite() {
                value.max(MIN_VIEWPORT_EXTENT)
            } else {
                MIN_VIEWPORT_EXTENT
            }
        };
        let width = clamp(logical_width);
        let height = clamp(logical_height);
        if width != logical_width || height != logical_height {
            tracing::warn!(
                requested_width = logical_width,
                requested_height = logical_height,
                width,
                height,
                "viewport below minimum size; clamping"
            );
        }
        let pixel_density = if pixel_density.is_finite() && pixel_density > 0.0 {
            pixel_density
        } else {
            1.0
        };
        Self {
            logical_width: width,
            logical_height: height,
            pixel_density,
        }
    }

    /// Viewport whose physical size is exactly `width`x`height` at density 1.
    pub fn from_physical(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32, 1.0)
    }

    pub fn logical_width(&self) -> f32 {
        self.logical_width
    }

    pub fn logical_height(&self) -> f32 {
        self.logical_height
    }

    pub fn pixel_density(&self) -> f32 {
        self.pixel_density
    }

    /// Size of the simulation surfaces in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let width = (self.logical_width * self.pixel_density).floor().max(1.0);
        let height = (self.logical_height * self.pixel_density).floor().max(1.0);
        (width as u32, height as u32)
    }
}
