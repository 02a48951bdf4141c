//! Frame driver state machine.
//!
//! ```text
//!   Uninitialized ──start()──▶ Running ──dispose()──▶ Disposed
//!                                 │ ▲
//!                                 └─┘ run_cycle(token)
//! ```
//!
//! Each cycle samples the clock, dispatches physics from the read surface
//! into the write surface, swaps roles, composites the now-current surface,
//! and issues the token for the next cycle. Tokens that were cancelled or
//! superseded (by a resize or teardown) are rejected without touching the
//! backend.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info};

use crate::backend::SimulationBackend;
use crate::clock::{BoxedTimeSource, FrameClock};
use crate::error::DriverError;
use crate::lifecycle::ReleaseReport;
use crate::pointer::{PointerSample, PointerTracker};
use crate::schedule::{FrameScheduler, FrameToken};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Running,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// The cycle ran; `next` is the token for the following one.
    Completed { clock: FrameClock, next: FrameToken },
    /// The token was stale or cancelled; nothing was dispatched.
    Rejected,
}

pub struct FrameDriver<B> {
    state: DriverState,
    backend: Option<B>,
    viewport: Viewport,
    pending_resize: Option<Viewport>,
    pointer: PointerTracker,
    time_source: BoxedTimeSource,
    scheduler: FrameScheduler,
    last_clock: Option<FrameClock>,
    stats: RenderStats,
}

impl<B: SimulationBackend> FrameDriver<B> {
    pub fn new(viewport: Viewport, time_source: BoxedTimeSource) -> Self {
        Self {
            state: DriverState::Uninitialized,
            backend: None,
            viewport,
            pending_resize: None,
            pointer: PointerTracker::new(viewport.logical_height(), viewport.pixel_density()),
            time_source,
            scheduler: FrameScheduler::new(),
            last_clock: None,
            stats: RenderStats::new(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Viewport the driver will render at, including a resize not yet applied.
    pub fn viewport(&self) -> Viewport {
        self.pending_resize.unwrap_or(self.viewport)
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    /// Clock of the most recent completed cycle.
    pub fn last_clock(&self) -> Option<FrameClock> {
        self.last_clock
    }

    /// Token of the cycle currently scheduled, if any.
    pub fn pending_token(&self) -> Option<FrameToken> {
        self.scheduler.pending()
    }

    /// Allocates the backend and schedules the first cycle.
    ///
    /// On failure the driver stays uninitialized; `init` is responsible for
    /// dropping whatever it managed to allocate.
    pub fn start(&mut self, init: impl FnOnce(Viewport) -> Result<B>) -> Result<FrameToken> {
        match self.state {
            DriverState::Uninitialized => {}
            DriverState::Running => return Err(DriverError::AlreadyRunning.into()),
            DriverState::Disposed => return Err(DriverError::Disposed.into()),
        }

        let backend = init(self.viewport)?;
        let (width, height) = self.viewport.physical_size();
        info!(backend = backend.name(), width, height, "frame driver running");
        self.backend = Some(backend);
        self.state = DriverState::Running;
        Ok(self.scheduler.schedule())
    }

    /// Runs one frame cycle if `token` is the outstanding request.
    ///
    /// The next cycle is scheduled before any backend error is returned, so a
    /// failed dispatch drops only the current frame. A resize the backend
    /// refuses is discarded and the previous viewport stays in effect.
    pub fn run_cycle(&mut self, token: FrameToken) -> Result<CycleOutcome> {
        let backend = match self.state {
            DriverState::Running => match self.backend.as_mut() {
                Some(backend) => backend,
                None => return Err(DriverError::NotStarted.into()),
            },
            DriverState::Uninitialized => return Err(DriverError::NotStarted.into()),
            DriverState::Disposed => return Err(DriverError::Disposed.into()),
        };

        if !self.scheduler.claim(token) {
            debug!(token = token.id(), "rejecting stale frame token");
            return Ok(CycleOutcome::Rejected);
        }

        if let Some(viewport) = self.pending_resize.take() {
            if let Err(err) = backend.resize(viewport) {
                // Keep rendering at the old size; pointer mapping follows it.
                self.pointer.set_viewport(
                    self.viewport.logical_height(),
                    self.viewport.pixel_density(),
                );
                self.scheduler.schedule();
                return Err(err.context("failed to apply viewport resize"));
            }
            self.viewport = viewport;
        }

        let clock = self.time_source.sample();
        let pointer = self.pointer.sample();
        let result = dispatch(backend, clock, pointer);

        self.last_clock = Some(clock);
        self.stats.record(clock);
        let next = self.scheduler.schedule();
        result?;
        Ok(CycleOutcome::Completed { clock, next })
    }

    pub fn pointer_moved(&mut self, client_x: f32, client_y: f32) {
        if self.state == DriverState::Running {
            self.pointer.on_move(client_x, client_y);
        }
    }

    pub fn pointer_left(&mut self) {
        self.pointer.on_leave();
    }

    /// Records a new viewport, applied at the start of the next cycle.
    ///
    /// Any cycle scheduled against the old dimensions is revoked; the returned
    /// token replaces it.
    pub fn resize(&mut self, viewport: Viewport) -> Result<Option<FrameToken>> {
        match self.state {
            DriverState::Disposed => Err(DriverError::Disposed.into()),
            DriverState::Uninitialized => {
                self.viewport = viewport;
                self.pointer
                    .set_viewport(viewport.logical_height(), viewport.pixel_density());
                Ok(None)
            }
            DriverState::Running => {
                self.pending_resize = Some(viewport);
                self.pointer
                    .set_viewport(viewport.logical_height(), viewport.pixel_density());
                self.scheduler.cancel();
                Ok(Some(self.scheduler.schedule()))
            }
        }
    }

    /// Cancels the scheduled cycle, detaches pointer input and releases the
    /// backend. Terminal: every later call fails with [`DriverError::Disposed`].
    pub fn dispose(&mut self) -> Result<ReleaseReport> {
        if self.state == DriverState::Disposed {
            return Err(DriverError::Disposed.into());
        }

        self.scheduler.cancel();
        self.pointer.on_leave();
        self.pending_resize = None;
        self.state = DriverState::Disposed;

        let report = match self.backend.take() {
            Some(backend) => backend.release(),
            None => ReleaseReport::new(),
        };
        info!(
            released = report.released().len(),
            failures = report.failures().len(),
            "frame driver disposed"
        );
        Ok(report)
    }
}

fn dispatch<B: SimulationBackend>(
    backend: &mut B,
    clock: FrameClock,
    pointer: PointerSample,
) -> Result<()> {
    backend.dispatch_physics(clock, pointer)?;
    backend.swap();
    backend.dispatch_composite()
}

/// Once-per-second frame rate log.
#[derive(Debug)]
struct RenderStats {
    window_start: Instant,
    frames: u32,
}

impl RenderStats {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
        }
    }

    fn record(&mut self, clock: FrameClock) {
        self.frames += 1;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames as f32 / elapsed.as_secs_f32();
            debug!(
                fps = fps.round(),
                frame = clock.frame,
                time = clock.seconds,
                "render stats"
            );
            self.frames = 0;
            self.window_start = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedStepTimeSource;
    use crate::lifecycle::ResourceKind;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Physics(u64, PointerSample),
        Swap,
        Composite,
        Resize((u32, u32)),
    }

    struct RecordingBackend {
        calls: Arc<Mutex<Vec<Call>>>,
        refuse_resize: bool,
    }

    impl SimulationBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn dispatch_physics(&mut self, clock: FrameClock, pointer: PointerSample) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Physics(clock.frame, pointer));
            Ok(())
        }

        fn swap(&mut self) {
            self.calls.lock().unwrap().push(Call::Swap);
        }

        fn dispatch_composite(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Composite);
            Ok(())
        }

        fn resize(&mut self, viewport: Viewport) -> Result<()> {
            if self.refuse_resize {
                anyhow::bail!("viewport exceeds the texture limit");
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Resize(viewport.physical_size()));
            Ok(())
        }

        fn release(self) -> ReleaseReport {
            let mut report = ReleaseReport::new();
            report.release(ResourceKind::Surfaces, || Ok(()));
            report
        }
    }

    fn running_driver() -> (FrameDriver<RecordingBackend>, FrameToken, Arc<Mutex<Vec<Call>>>) {
        running_driver_with(false)
    }

    fn running_driver_with(
        refuse_resize: bool,
    ) -> (FrameDriver<RecordingBackend>, FrameToken, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut driver = FrameDriver::new(
            Viewport::from_physical(200, 100),
            Box::new(FixedStepTimeSource::at_fps(60.0)),
        );
        let recorded = calls.clone();
        let token = driver
            .start(move |_| {
                Ok(RecordingBackend {
                    calls: recorded,
                    refuse_resize,
                })
            })
            .unwrap();
        (driver, token, calls)
    }

    fn next_token(outcome: CycleOutcome) -> FrameToken {
        match outcome {
            CycleOutcome::Completed { next, .. } => next,
            CycleOutcome::Rejected => panic!("cycle was rejected"),
        }
    }

    #[test]
    fn cycle_runs_stages_in_order() {
        let (mut driver, token, calls) = running_driver();
        driver.pointer_moved(10.0, 40.0);
        let outcome = driver.run_cycle(token).unwrap();
        let next = next_token(outcome);
        driver.run_cycle(next).unwrap();

        let pointer = PointerSample::active_at(10.0, 60.0);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Call::Physics(0, pointer),
                Call::Swap,
                Call::Composite,
                Call::Physics(1, pointer),
                Call::Swap,
                Call::Composite,
            ]
        );
        assert_eq!(driver.last_clock().map(|clock| clock.frame), Some(1));
    }

    #[test]
    fn start_twice_is_rejected() {
        let (mut driver, _, _) = running_driver();
        let err = driver
            .start(|_| {
                Ok(RecordingBackend {
                    calls: Arc::default(),
                    refuse_resize: false,
                })
            })
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<DriverError>(),
            Some(&DriverError::AlreadyRunning)
        );
    }

    #[test]
    fn failed_start_stays_uninitialized() {
        let mut driver: FrameDriver<RecordingBackend> = FrameDriver::new(
            Viewport::from_physical(100, 100),
            Box::new(FixedStepTimeSource::at_fps(60.0)),
        );
        assert!(driver.start(|_| anyhow::bail!("no adapter")).is_err());
        assert_eq!(driver.state(), DriverState::Uninitialized);
        assert!(driver.pending_token().is_none());
    }

    #[test]
    fn cycle_after_dispose_is_rejected() {
        let (mut driver, token, calls) = running_driver();
        let report = driver.dispose().unwrap();
        assert!(report.is_clean());
        assert_eq!(driver.state(), DriverState::Disposed);

        let err = driver.run_cycle(token).unwrap_err();
        assert_eq!(err.downcast_ref::<DriverError>(), Some(&DriverError::Disposed));
        assert!(calls.lock().unwrap().is_empty());
        assert!(driver.dispose().is_err());
    }

    #[test]
    fn resize_revokes_old_token_and_applies_at_next_cycle() {
        let (mut driver, stale, calls) = running_driver();
        let fresh = driver
            .resize(Viewport::from_physical(300, 150))
            .unwrap()
            .unwrap();

        assert_eq!(driver.run_cycle(stale).unwrap(), CycleOutcome::Rejected);
        assert!(calls.lock().unwrap().is_empty());

        driver.run_cycle(fresh).unwrap();
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], Call::Resize((300, 150)));
        // Reallocation happens before the physics dispatch of that cycle.
        assert!(matches!(calls[1], Call::Physics(0, _)));
    }

    #[test]
    fn pointer_leave_clears_active_flag() {
        let (mut driver, token, calls) = running_driver();
        driver.pointer_moved(5.0, 5.0);
        driver.pointer_left();
        driver.run_cycle(token).unwrap();
        assert_eq!(
            calls.lock().unwrap()[0],
            Call::Physics(0, PointerSample::INACTIVE)
        );
    }

    #[test]
    fn refused_resize_keeps_previous_viewport_and_pointer_mapping() {
        let (mut driver, _, calls) = running_driver_with(true);
        let token = driver
            .resize(Viewport::from_physical(300, 150))
            .unwrap()
            .unwrap();

        assert!(driver.run_cycle(token).is_err());
        assert_eq!(driver.viewport(), Viewport::from_physical(200, 100));
        assert_eq!(driver.state(), DriverState::Running);
        assert!(calls.lock().unwrap().is_empty());

        // The failed cycle still scheduled its successor.
        let next = driver.pending_token().unwrap();
        driver.pointer_moved(10.0, 40.0);
        driver.run_cycle(next).unwrap();
        assert_eq!(
            calls.lock().unwrap()[0],
            Call::Physics(0, PointerSample::active_at(10.0, 60.0))
        );
    }
}
