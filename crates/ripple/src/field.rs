//! CPU-side wave field surface.
//!
//! Texels are stored row-major with simulation-space orientation: row 0 is
//! the bottom of the surface and `+y` points up, matching the pointer
//! convention in [`crate::pointer`].

/// One texel of the wave field: `(pressure, velocity, gradient_x, gradient_y)`.
pub type Texel = [f32; 4];

pub const PRESSURE: usize = 0;
pub const VELOCITY: usize = 1;
pub const GRADIENT_X: usize = 2;
pub const GRADIENT_Y: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct WaveField {
    width: u32,
    height: u32,
    texels: Vec<Texel>,
}

impl WaveField {
    /// Allocates a zeroed field. Dimensions are clamped to at least one texel.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            texels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Texel at `(x, y)`; out-of-range coordinates are clamped to the edge.
    pub fn texel(&self, x: u32, y: u32) -> Texel {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[self.index(x, y)]
    }

    pub fn set_texel(&mut self, x: u32, y: u32, texel: Texel) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.texels[index] = texel;
        }
    }

    pub fn pressure(&self, x: u32, y: u32) -> f32 {
        self.texel(x, y)[PRESSURE]
    }

    pub fn set_pressure(&mut self, x: u32, y: u32, pressure: f32) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.texels[index][PRESSURE] = pressure;
        }
    }

    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    pub(crate) fn texels_mut(&mut self) -> &mut [Texel] {
        &mut self.texels
    }

    pub fn clear(&mut self) {
        self.texels.fill([0.0; 4]);
    }

    pub fn is_zero(&self) -> bool {
        self.texels.iter().flatten().all(|value| *value == 0.0)
    }

    /// Largest absolute value over every channel.
    pub fn peak(&self) -> f32 {
        self.texels
            .iter()
            .flatten()
            .fold(0.0_f32, |acc, value| acc.max(value.abs()))
    }
}
