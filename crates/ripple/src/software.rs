//! CPU implementation of both stages.
//!
//! Used for headless rendering and wherever no GPU is around. It shares the
//! store, physics and compositing code with the tests, so frames produced here
//! are the reference the WGSL programs are checked against.

use anyhow::Result;
use image::RgbaImage;
use rippleconfig::{EffectConfig, LabelConfig};

use crate::backdrop::Backdrop;
use crate::backend::SimulationBackend;
use crate::clock::FrameClock;
use crate::composite::{self, CompositeParams};
use crate::field::WaveField;
use crate::lifecycle::{ReleaseReport, ResourceKind};
use crate::physics::{self, PhysicsParams};
use crate::pointer::PointerSample;
use crate::store::PingPong;
use crate::viewport::Viewport;

pub struct SoftwareBackend {
    label: LabelConfig,
    physics: PhysicsParams,
    composite: CompositeParams,
    store: PingPong<WaveField>,
    backdrop: Backdrop,
    frame: RgbaImage,
}

impl SoftwareBackend {
    pub fn new(config: &EffectConfig, viewport: Viewport) -> Self {
        let (width, height) = viewport.physical_size();
        let backdrop = Backdrop::generate(&config.label, width, height, viewport.pixel_density());
        tracing::debug!(width, height, "allocated software wave field");
        Self {
            label: config.label.clone(),
            physics: PhysicsParams::from(&config.simulation),
            composite: CompositeParams::from(&config.compositing),
            store: PingPong::new(|_| WaveField::new(width, height)),
            backdrop,
            frame: RgbaImage::new(width, height),
        }
    }

    pub fn store(&self) -> &PingPong<WaveField> {
        &self.store
    }

    /// Surface holding the latest completed step.
    pub fn current_field(&self) -> &WaveField {
        self.store.read()
    }

    pub fn current_field_mut(&mut self) -> &mut WaveField {
        self.store.read_mut()
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    /// Last composited frame, top row first.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }
}

impl SimulationBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn dispatch_physics(&mut self, clock: FrameClock, pointer: PointerSample) -> Result<()> {
        let (src, dst) = self.store.pair();
        physics::step(src, dst, &self.physics, pointer, clock.frame);
        Ok(())
    }

    fn swap(&mut self) {
        self.store.swap();
    }

    fn dispatch_composite(&mut self) -> Result<()> {
        composite::composite(
            self.store.read(),
            &self.backdrop,
            &self.composite,
            &mut self.frame,
        );
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) -> Result<()> {
        let (width, height) = viewport.physical_size();
        self.store.reallocate(|_| WaveField::new(width, height));
        self.backdrop = Backdrop::generate(&self.label, width, height, viewport.pixel_density());
        self.frame = RgbaImage::new(width, height);
        tracing::debug!(
            width,
            height,
            generation = self.store.generation(),
            "reallocated software wave field"
        );
        Ok(())
    }

    fn release(self) -> ReleaseReport {
        let Self {
            store,
            backdrop,
            frame,
            ..
        } = self;
        let mut report = ReleaseReport::new();
        report.release(ResourceKind::Surfaces, || {
            drop(store);
            Ok(())
        });
        report.release(ResourceKind::Backdrop, || {
            drop(backdrop);
            drop(frame);
            Ok(())
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_config() -> EffectConfig {
        let mut config = EffectConfig::default();
        config.label.text.clear();
        config
    }

    #[test]
    fn resize_to_same_size_twice_is_idempotent() {
        let viewport = Viewport::new(120.0, 110.0, 1.0);
        let mut backend = SoftwareBackend::new(&blank_config(), viewport);
        backend.current_field_mut().set_pressure(3, 3, 0.5);

        for _ in 0..2 {
            backend.resize(viewport).unwrap();
            assert_eq!(backend.current_field().dimensions(), (120, 110));
            assert!(backend.store().read().is_zero());
            assert!(backend.store().write().is_zero());
            assert_eq!(backend.backdrop().dimensions(), (120, 110));
        }
    }

    #[test]
    fn release_reports_surfaces_before_backdrop() {
        let backend = SoftwareBackend::new(&blank_config(), Viewport::from_physical(100, 100));
        let report = backend.release();
        assert!(report.is_clean());
        assert_eq!(
            report.released(),
            &[ResourceKind::Surfaces, ResourceKind::Backdrop]
        );
    }
}
