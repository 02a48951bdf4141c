use bytemuck::{Pod, Zeroable};

use crate::clock::FrameClock;
use crate::composite::CompositeParams;
use crate::physics::PhysicsParams;
use crate::pointer::PointerSample;

/// Mirrors `PhysicsUniforms` in `shaders/physics.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct PhysicsUniforms {
    pub resolution: [f32; 2],
    pub pointer: [f32; 2],
    pub frame: u32,
    pub pointer_active: u32,
    pub time: f32,
    pub _pad0: f32,
    pub propagation: f32,
    pub restoring_force: f32,
    pub velocity_damping: f32,
    pub pressure_damping: f32,
    pub ripple_radius: f32,
    pub intensity: f32,
    pub _pad1: [f32; 2],
}

impl PhysicsUniforms {
    pub fn new(params: &PhysicsParams, width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            pointer: [0.0; 2],
            frame: 0,
            pointer_active: 0,
            time: 0.0,
            _pad0: 0.0,
            propagation: params.propagation,
            restoring_force: params.restoring_force,
            velocity_damping: params.velocity_damping,
            pressure_damping: params.pressure_damping,
            ripple_radius: params.ripple_radius,
            intensity: params.intensity,
            _pad1: [0.0; 2],
        }
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = [width as f32, height as f32];
    }

    pub fn update(&mut self, clock: FrameClock, pointer: PointerSample) {
        // The shader only distinguishes frame 0; saturate instead of wrapping.
        self.frame = u32::try_from(clock.frame).unwrap_or(u32::MAX);
        self.time = clock.seconds;
        self.pointer = pointer.position;
        self.pointer_active = u32::from(pointer.active);
    }
}

/// Mirrors `CompositeUniforms` in `shaders/composite.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct CompositeUniforms {
    pub resolution: [f32; 2],
    pub distortion: f32,
    pub specular_gain: f32,
    pub light_direction: [f32; 3],
    pub shininess: f32,
}

impl CompositeUniforms {
    pub fn new(params: &CompositeParams, width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            distortion: params.distortion,
            specular_gain: params.specular_gain,
            light_direction: params.light_direction,
            shininess: params.shininess,
        }
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = [width as f32, height as f32];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<PhysicsUniforms>(), 64);
        assert_eq!(std::mem::size_of::<CompositeUniforms>(), 32);
        assert_eq!(std::mem::offset_of!(CompositeUniforms, light_direction), 16);
    }

    #[test]
    fn frame_counter_saturates() {
        let mut uniforms = PhysicsUniforms::new(&PhysicsParams::default(), 10, 10);
        uniforms.update(FrameClock::new(1.0, u64::MAX), PointerSample::active_at(1.0, 2.0));
        assert_eq!(uniforms.frame, u32::MAX);
        assert_eq!(uniforms.pointer_active, 1);
    }
}
