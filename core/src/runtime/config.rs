//! Frame pacing configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Strategy used to turn a callback into logical frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PacingMode {
    /// Exactly one logical frame per animation callback
    Simplest,
    /// Lateness-tracking catch-up and pacing
    #[default]
    Standard,
}

/// Frame pacing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Target logical frame rate in Hz
    #[serde(default = "default_tick_rate")]
    pub tick_rate: f64,
    /// Measured rates within this many Hz of `tick_rate` always run one frame
    #[serde(default = "default_rate_tolerance")]
    pub rate_tolerance: f64,
    /// Clamp on accumulated lateness, in seconds (bounds recovery after a stall)
    #[serde(default = "default_max_lateness")]
    pub max_lateness: f64,
    /// Frames over this many milliseconds of wall-clock work are reported
    #[serde(default = "default_cpu_budget_ms")]
    pub cpu_budget_ms: f64,
    /// Number of callbacks averaged for the reported frame rate
    #[serde(default = "default_average_window")]
    pub average_window: u32,
    #[serde(default)]
    pub mode: PacingMode,
}

fn default_tick_rate() -> f64 {
    60.0
}
fn default_rate_tolerance() -> f64 {
    1.0
}
fn default_max_lateness() -> f64 {
    0.25
}
fn default_cpu_budget_ms() -> f64 {
    8.0
}
fn default_average_window() -> u32 {
    60
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            rate_tolerance: default_rate_tolerance(),
            max_lateness: default_max_lateness(),
            cpu_budget_ms: default_cpu_budget_ms(),
            average_window: default_average_window(),
            mode: PacingMode::default(),
        }
    }
}

impl PacingConfig {
    /// Duration of one logical frame, in seconds
    pub fn nominal_delta(&self) -> f64 {
        1.0 / self.tick_rate
    }

    pub fn cpu_budget(&self) -> Duration {
        Duration::try_from_secs_f64(self.cpu_budget_ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX)
    }

    /// Reject values the scheduler cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.tick_rate.is_finite() && self.tick_rate > 0.0,
            "tick rate must be positive, got {}",
            self.tick_rate
        );
        anyhow::ensure!(
            self.rate_tolerance.is_finite() && self.rate_tolerance >= 0.0,
            "rate tolerance must be non-negative, got {}",
            self.rate_tolerance
        );
        anyhow::ensure!(
            self.max_lateness.is_finite() && self.max_lateness >= 0.0,
            "max lateness must be non-negative, got {}",
            self.max_lateness
        );
        anyhow::ensure!(!self.cpu_budget_ms.is_nan(), "cpu budget must be a number");
        anyhow::ensure!(self.average_window > 0, "average window must be non-zero");
        Ok(())
    }
}
