/// Pointer state observed by the physics stage once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    /// Position in simulation pixels (y up).
    pub position: [f32; 2],
    pub active: bool,
}

impl PointerSample {
    pub const INACTIVE: PointerSample = PointerSample {
        position: [0.0, 0.0],
        active: false,
    };

    pub fn active_at(x: f32, y: f32) -> Self {
        Self {
            position: [x, y],
            active: true,
        }
    }
}

/// Coalesces host pointer events into a single [`PointerSample`].
///
/// Client coordinates are logical pixels with the origin at the top-left of
/// the viewport. The tracker flips the vertical axis and scales by the pixel
/// density so the result lines up with the simulation surface.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    sample: PointerSample,
    pixel_density: f32,
    viewport_height: f32,
}

impl PointerTracker {
    pub fn new(viewport_height: f32, pixel_density: f32) -> Self {
        Self {
            sample: PointerSample::INACTIVE,
            pixel_density: sanitize_density(pixel_density),
            viewport_height,
        }
    }

    pub fn set_viewport(&mut self, viewport_height: f32, pixel_density: f32) {
        self.viewport_height = viewport_height;
        self.pixel_density = sanitize_density(pixel_density);
    }

    pub fn pixel_density(&self) -> f32 {
        self.pixel_density
    }

    pub fn on_move(&mut self, client_x: f32, client_y: f32) {
        self.sample = PointerSample::active_at(
            client_x * self.pixel_density,
            (self.viewport_height - client_y) * self.pixel_density,
        );
    }

    pub fn on_leave(&mut self) {
        self.sample = PointerSample::INACTIVE;
    }

    pub fn sample(&self) -> PointerSample {
        self.sample
    }
}

fn sanitize_density(density: f32) -> f32 {
    if density.is_finite() && density > 0.0 {
        density
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_scales_and_flips_vertical_axis() {
        let mut tracker = PointerTracker::new(600.0, 2.0);
        tracker.on_move(100.0, 150.0);
        let sample = tracker.sample();
        assert!(sample.active);
        assert_eq!(sample.position, [200.0, 900.0]);
    }

    #[test]
    fn leave_resets_to_inactive_origin() {
        let mut tracker = PointerTracker::new(600.0, 1.0);
        tracker.on_move(10.0, 10.0);
        tracker.on_leave();
        assert_eq!(tracker.sample(), PointerSample::INACTIVE);
    }

    #[test]
    fn pointer_on_left_edge_stays_active() {
        let mut tracker = PointerTracker::new(300.0, 1.0);
        tracker.on_move(0.0, 20.0);
        let sample = tracker.sample();
        assert!(sample.active);
        assert_eq!(sample.position[0], 0.0);
    }

    #[test]
    fn invalid_density_falls_back_to_one() {
        let tracker = PointerTracker::new(300.0, f32::NAN);
        assert_eq!(tracker.pixel_density(), 1.0);
    }
}
