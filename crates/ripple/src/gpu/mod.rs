//! wgpu backend.
//!
//! - `context` owns the wgpu instance, device and presentation surface.
//! - `surfaces` allocates the ping-pong field textures, the backdrop texture
//!   and the full-screen quad.
//! - `pipeline` builds the physics and compositing programs from WGSL.
//! - `uniforms` mirrors the WGSL uniform blocks.
//! - `state` glues everything together behind [`GpuBackend`].

mod context;
mod pipeline;
mod state;
mod surfaces;
mod uniforms;

pub use state::GpuBackend;
