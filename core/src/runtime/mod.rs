//! Frame loop orchestration
//!
//! The host's animation callback is the only driver. Each callback asks the
//! [`FrameScheduler`] how many logical frames to run, and each logical frame
//! resumes the game's step function exactly once between `start_frame` and
//! `end_frame` on the [`FrameSink`]. Nothing here runs concurrently: the step
//! function never overlaps compositing.

use anyhow::Result;

mod config;
mod game_loop;
mod scheduler;


pub use config::{PacingConfig, PacingMode};
pub use game_loop::FrameTimings;
pub use scheduler::FrameScheduler;

/// Something that brackets logical frames (the video display processor).
pub trait FrameSink {
    /// Called before the step function runs
    fn start_frame(&mut self) -> Result<()>;
    /// Called after the step function returns; composites the frame
    fn end_frame(&mut self) -> Result<()>;
}

/// Boxed state-passing step function
type StepFn<S, G> = Box<dyn FnMut(S, &mut G) -> S>;

/// Drives a state-passing step function at the scheduler's pace.
///
/// The step function receives the state by value and returns the next one,
/// so a tick is exactly one call: there is no coroutine to resume.
pub struct FrameLoop<S, G: FrameSink> {
    scheduler: FrameScheduler,
    state: Option<S>,
    step: StepFn<S, G>,
    timings: FrameTimings,
}

impl<S, G: FrameSink> FrameLoop<S, G> {
    pub fn new(
        config: PacingConfig,
        initial: S,
        step: impl FnMut(S, &mut G) -> S + 'static,
    ) -> Self {
        Self {
            scheduler: FrameScheduler::new(config),
            state: Some(initial),
            step: Box::new(step),
            timings: FrameTimings::default(),
        }
    }

    /// Handle one animation callback.
    ///
    /// `timestamp` is in seconds on any monotonic clock. Returns the number
    /// of logical frames that ran.
    pub fn on_animation_frame(&mut self, timestamp: f64, sink: &mut G) -> Result<u32> {
        let frames = self.scheduler.frames_for(timestamp);
        for _ in 0..frames {
            self.run_logical_frame(sink)?;
        }
        Ok(frames)
    }

    /// Run exactly one logical frame, bypassing the scheduler.
    pub fn run_logical_frame(&mut self, sink: &mut G) -> Result<()> {
        let budget = self.scheduler.config().cpu_budget();
        game_loop::execute_frame(
            sink,
            &mut self.state,
            &mut self.step,
            budget,
            &mut self.timings,
        )
    }

    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut S> {
        self.state.as_mut()
    }

    pub fn into_state(self) -> Option<S> {
        self.state
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut FrameScheduler {
        &mut self.scheduler
    }

    pub fn timings(&self) -> &FrameTimings {
        &self.timings
    }

    /// Smoothed animation callback rate in Hz
    pub fn average_fps(&self) -> f64 {
        self.scheduler.average_fps()
    }
}
