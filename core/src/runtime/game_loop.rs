//! Single logical frame execution

use std::time::{Duration, Instant};

use anyhow::{Result, bail};

use super::{FrameSink, StepFn};

/// Wall-clock cost of logical frames, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTimings {
    /// Logical frames executed since creation
    pub frames: u64,
    /// Cost of the most recent frame
    pub last: Duration,
    /// Most expensive frame seen
    pub peak: Duration,
    /// Frames that exceeded the CPU budget
    pub over_budget: u64,
}

impl FrameTimings {
    fn record(&mut self, cost: Duration, budget: Duration) {
        self.frames += 1;
        self.last = cost;
        self.peak = self.peak.max(cost);
        if cost > budget {
            self.over_budget += 1;
            tracing::warn!("Frame took {:?}, exceeds budget of {:?}", cost, budget);
        }
    }
}

/// Run one logical frame: start, one step, end.
///
/// The state is moved through the step function; if the sink fails to
/// start the frame the state is left untouched.
pub(super) fn execute_frame<S, G: FrameSink>(
    sink: &mut G,
    state: &mut Option<S>,
    step: &mut StepFn<S, G>,
    budget: Duration,
    timings: &mut FrameTimings,
) -> Result<()> {
    let frame_start = Instant::now();

    sink.start_frame()?;

    let Some(current) = state.take() else {
        bail!("frame loop state was lost by a previous failed frame");
    };
    *state = Some(step(current, sink));

    sink.end_frame()?;

    timings.record(frame_start.elapsed(), budget);
    Ok(())
}
