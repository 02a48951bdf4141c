//! Damped discrete wave update.
//!
//! This is the reference implementation of `shaders/physics.wgsl`; the
//! software backend runs it directly and the tests use it to pin down the
//! behaviour the GPU program has to match.

use rippleconfig::SimulationConfig;

use crate::field::{Texel, WaveField, PRESSURE, VELOCITY};
use crate::pointer::PointerSample;

/// Per-dispatch constants of the physics stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub propagation: f32,
    pub restoring_force: f32,
    pub velocity_damping: f32,
    pub pressure_damping: f32,
    pub ripple_radius: f32,
    pub intensity: f32,
}

impl From<&SimulationConfig> for PhysicsParams {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            propagation: config.propagation,
            restoring_force: config.restoring_force,
            velocity_damping: config.velocity_damping,
            pressure_damping: config.damping,
            ripple_radius: config.ripple_radius,
            intensity: config.intensity,
        }
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

/// Pressure of the four axis-aligned neighbours after the reflective
/// boundary has been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stencil {
    pub right: f32,
    pub left: f32,
    pub up: f32,
    pub down: f32,
}

impl Stencil {
    /// Gathers the neighbours of `(x, y)`. Reads never leave the grid: a
    /// missing outward neighbour takes the value of the opposite one.
    pub fn gather(field: &WaveField, x: u32, y: u32) -> Self {
        let (width, height) = field.dimensions();
        let right = field.pressure(x.saturating_add(1).min(width - 1), y);
        let left = field.pressure(x.saturating_sub(1), y);
        let up = field.pressure(x, y.saturating_add(1).min(height - 1));
        let down = field.pressure(x, y.saturating_sub(1));

        let mut stencil = Self {
            right,
            left,
            up,
            down,
        };
        if x == 0 {
            stencil.left = stencil.right;
        }
        if x == width - 1 {
            stencil.right = stencil.left;
        }
        if y == 0 {
            stencil.down = stencil.up;
        }
        if y == height - 1 {
            stencil.up = stencil.down;
        }
        stencil
    }
}

/// Advances `src` by one step into `dst`.
///
/// Frame 0 writes the zero field regardless of the input contents.
pub fn step(
    src: &WaveField,
    dst: &mut WaveField,
    params: &PhysicsParams,
    pointer: PointerSample,
    frame: u64,
) {
    debug_assert_eq!(src.dimensions(), dst.dimensions());
    if frame == 0 {
        dst.clear();
        return;
    }

    let (width, height) = src.dimensions();
    let resolution = [width as f32, height as f32];
    let pointer_uv = [
        pointer.position[0] / resolution[0],
        pointer.position[1] / resolution[1],
    ];

    let texels = dst.texels_mut();
    for y in 0..height {
        for x in 0..width {
            let current = src.texel(x, y);
            let stencil = Stencil::gather(src, x, y);
            let uv = [
                (x as f32 + 0.5) / resolution[0],
                (y as f32 + 0.5) / resolution[1],
            ];
            let impulse = if pointer.active {
                impulse_at(uv, pointer_uv, params)
            } else {
                0.0
            };
            texels[y as usize * width as usize + x as usize] =
                advance_texel(current, stencil, params, impulse);
        }
    }
}

/// Pressure impulse a pixel at normalized `uv` receives from the pointer.
pub fn impulse_at(uv: [f32; 2], pointer_uv: [f32; 2], params: &PhysicsParams) -> f32 {
    let dx = uv[0] - pointer_uv[0];
    let dy = uv[1] - pointer_uv[1];
    let distance = (dx * dx + dy * dy).sqrt();
    if distance <= params.ripple_radius {
        params.intensity * (1.0 - distance / params.ripple_radius)
    } else {
        0.0
    }
}

fn advance_texel(current: Texel, n: Stencil, params: &PhysicsParams, impulse: f32) -> Texel {
    let k = params.propagation;
    let mut pressure = current[PRESSURE];
    let mut velocity = current[VELOCITY];

    velocity += k * (-2.0 * pressure + n.right + n.left) / 4.0;
    velocity += k * (-2.0 * pressure + n.up + n.down) / 4.0;

    pressure += k * velocity;

    velocity -= params.restoring_force * k * pressure;

    velocity *= params.velocity_damping;
    pressure *= params.pressure_damping;

    pressure += impulse;

    [
        pressure,
        velocity,
        (n.right - n.left) / 2.0,
        (n.up - n.down) / 2.0,
    ]
}
