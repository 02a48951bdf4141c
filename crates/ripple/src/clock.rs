use std::time::{Duration, Instant};

/// Frame counter plus elapsed time handed to the physics stage.
///
/// Frame 0 is the cold start; the counter only ever increases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame: u64,
}

impl FrameClock {
    pub fn new(seconds: f32, frame: u64) -> Self {
        Self { seconds, frame }
    }

    pub fn is_cold_start(&self) -> bool {
        self.frame == 0
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Produces the clock for the next frame and advances the counter.
    fn sample(&mut self) -> FrameClock;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self) -> FrameClock {
        let clock = FrameClock::new(self.origin.elapsed().as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        clock
    }
}

/// Deterministic time source advancing by a fixed step per frame.
///
/// Used for headless renders so exported frames do not depend on how fast
/// the host happens to be.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepTimeSource {
    step: Duration,
    frame: u64,
}

impl FixedStepTimeSource {
    pub fn new(step: Duration) -> Self {
        Self { step, frame: 0 }
    }

    pub fn at_fps(fps: f32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
        Self::new(Duration::from_secs_f32(1.0 / fps))
    }
}

impl TimeSource for FixedStepTimeSource {
    fn sample(&mut self) -> FrameClock {
        let seconds = self.step.as_secs_f32() * self.frame as f32;
        let clock = FrameClock::new(seconds, self.frame);
        self.frame = self.frame.saturating_add(1);
        clock
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_is_cold_start() {
        let mut source = SystemTimeSource::new();
        let first = source.sample();
        let second = source.sample();
        assert!(first.is_cold_start());
        assert_eq!(second.frame, 1);
        assert!(second.seconds >= first.seconds);
    }

    #[test]
    fn fixed_step_is_deterministic() {
        let mut source = FixedStepTimeSource::at_fps(50.0);
        let samples: Vec<_> = (0..3).map(|_| source.sample()).collect();
        assert_eq!(samples[2].frame, 2);
        assert!((samples[2].seconds - 0.04).abs() < 1e-6);
    }
}
