//! Adaptive frame scheduler
//!
//! Display refresh rates vary (50, 60, 75, 144 Hz, throttled tabs, stalls),
//! but game logic is written against a fixed nominal rate. The scheduler
//! measures the time between animation callbacks and decides how many
//! logical frames to simulate for each one.

use super::{PacingConfig, PacingMode};

/// Slack added before flooring lateness ratios so that float noise on exact
/// multiples of the nominal delta does not lose a frame.
const RATIO_EPSILON: f64 = 1e-6;

/// Decides how many logical frames to run per animation callback.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    config: PacingConfig,
    nominal_delta: f64,
    /// Timestamp (seconds) of the previous callback
    last_timestamp: Option<f64>,
    /// Accumulated real time minus simulated time, in seconds
    lateness: f64,
    /// Smoothed callback delta, for frame rate reporting
    average_delta: f64,
}

impl FrameScheduler {
    pub fn new(config: PacingConfig) -> Self {
        let nominal_delta = config.nominal_delta();
        Self {
            config,
            nominal_delta,
            last_timestamp: None,
            lateness: 0.0,
            average_delta: nominal_delta,
        }
    }

    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    pub fn nominal_delta(&self) -> f64 {
        self.nominal_delta
    }

    /// Current lateness in seconds (positive = behind real time)
    pub fn lateness(&self) -> f64 {
        self.lateness
    }

    /// Smoothed callback rate in Hz
    pub fn average_fps(&self) -> f64 {
        if self.average_delta > 0.0 {
            1.0 / self.average_delta
        } else {
            0.0
        }
    }

    /// Forget timing history (e.g. after the host was suspended)
    pub fn reset(&mut self) {
        self.last_timestamp = None;
        self.lateness = 0.0;
        self.average_delta = self.nominal_delta;
    }

    /// Frames to run for this callback, using the configured mode.
    pub fn frames_for(&mut self, timestamp: f64) -> u32 {
        match self.config.mode {
            PacingMode::Simplest => self.do_simplest(timestamp),
            PacingMode::Standard => self.do_standard(timestamp),
        }
    }

    /// One logical frame per callback, whatever the display does.
    pub fn do_simplest(&mut self, timestamp: f64) -> u32 {
        self.measure(timestamp);
        1
    }

    /// Lateness-tracking strategy.
    ///
    /// Rates within `rate_tolerance` of the target always run exactly one
    /// frame. Otherwise the difference to the nominal delta accumulates into
    /// `lateness`: past +1 frame the scheduler catches up with extra frames,
    /// below -1 frame it skips a callback to let real time catch up.
    pub fn do_standard(&mut self, timestamp: f64) -> u32 {
        let Some(delta) = self.measure(timestamp) else {
            return 1;
        };

        if delta > 0.0 && (1.0 / delta - self.config.tick_rate).abs() <= self.config.rate_tolerance
        {
            return 1;
        }

        let limit = self.config.max_lateness;
        self.lateness = (self.lateness + delta - self.nominal_delta).clamp(-limit, limit);

        if self.lateness > self.nominal_delta {
            let extra = (self.lateness / self.nominal_delta + RATIO_EPSILON).floor();
            self.lateness -= extra * self.nominal_delta;
            1 + extra as u32
        } else if self.lateness < -self.nominal_delta {
            self.lateness += self.nominal_delta;
            0
        } else {
            1
        }
    }

    /// Record a timestamp and return the delta to the previous one.
    ///
    /// Timestamps going backwards count as a zero delta.
    fn measure(&mut self, timestamp: f64) -> Option<f64> {
        let previous = self.last_timestamp.replace(timestamp)?;
        let delta = (timestamp - previous).max(0.0);

        let alpha = 1.0 / f64::from(self.config.average_window.max(1));
        self.average_delta += (delta - self.average_delta) * alpha;

        Some(delta)
    }
}
