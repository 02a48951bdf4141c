use anyhow::Result;

use crate::clock::FrameClock;
use crate::lifecycle::ReleaseReport;
use crate::pointer::PointerSample;
use crate::viewport::Viewport;

/// Executes the two stages of a frame cycle against some device.
///
/// The frame driver calls these in a fixed order per cycle:
/// `dispatch_physics`, `swap`, `dispatch_composite`. Implementations own the
/// ping-pong store, the backdrop and whatever programs draw them.
pub trait SimulationBackend {
    fn name(&self) -> &'static str;

    /// Steps the read surface into the write surface.
    fn dispatch_physics(&mut self, clock: FrameClock, pointer: PointerSample) -> Result<()>;

    /// Flips read/write roles after a physics dispatch.
    fn swap(&mut self);

    /// Draws the current surface over the backdrop into the visible target.
    fn dispatch_composite(&mut self) -> Result<()>;

    /// Reallocates surfaces and backdrop for `viewport`. Fields come back zeroed.
    fn resize(&mut self, viewport: Viewport) -> Result<()>;

    /// Releases every resource in order, continuing past failures.
    fn release(self) -> ReleaseReport
    where
        Self: Sized;
}
