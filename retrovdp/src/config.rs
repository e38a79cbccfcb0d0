//! VDP configuration (vdp.toml)
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::path::Path;

use anyhow::{Context, Result};
use retrovdp_core::PacingConfig;
use retrovdp_shared::constants::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};
use serde::{Deserialize, Serialize};

/// Which compositor renders the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Software rasterizer
    #[default]
    Cpu,
    /// wgpu shader pipeline (headless)
    Gpu,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VdpConfig {
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub buffers: BufferConfig,
    #[serde(default)]
    pub sprites: SpriteBudgetConfig,
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub pacing: PacingConfig,
}

/// Framebuffer dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenConfig {
    #[serde(default = "default_screen_width")]
    pub width: u32,
    #[serde(default = "default_screen_height")]
    pub height: u32,
}

/// Command buffer capacities and the background layer budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Opaque background layers (default: 4)
    #[serde(default = "default_bg_capacity")]
    pub opaque_bg: usize,
    /// Transparent background layers (default: 4)
    #[serde(default = "default_bg_capacity")]
    pub transparent_bg: usize,
    /// Opaque sprites (default: 256)
    #[serde(default = "default_obj_capacity")]
    pub opaque_obj: usize,
    /// Transparent sprites (default: 256)
    #[serde(default = "default_obj_capacity")]
    pub transparent_obj: usize,
    /// Background layers per frame across both classes (default: 4)
    #[serde(default = "default_bg_layer_budget")]
    pub bg_layer_budget: usize,
    /// Rows of "other" memory reserved for line transforms (default: 1024)
    #[serde(default = "default_transform_rows")]
    pub transform_rows: u32,
}

/// Sprite cell budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteBudgetConfig {
    /// Cell edge in pixels (default: 16)
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,
    /// Cells per frame across opaque and transparent sprites (default: 512)
    #[serde(default = "default_cell_budget")]
    pub cell_budget: u32,
}

fn default_screen_width() -> u32 {
    DEFAULT_SCREEN_WIDTH
}

fn default_screen_height() -> u32 {
    DEFAULT_SCREEN_HEIGHT
}

fn default_bg_capacity() -> usize {
    4
}

fn default_obj_capacity() -> usize {
    256
}

fn default_bg_layer_budget() -> usize {
    4
}

fn default_transform_rows() -> u32 {
    1024
}

fn default_cell_size() -> u32 {
    16
}

fn default_cell_budget() -> u32 {
    512
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            opaque_bg: default_bg_capacity(),
            transparent_bg: default_bg_capacity(),
            opaque_obj: default_obj_capacity(),
            transparent_obj: default_obj_capacity(),
            bg_layer_budget: default_bg_layer_budget(),
            transform_rows: default_transform_rows(),
        }
    }
}

impl Default for SpriteBudgetConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            cell_budget: default_cell_budget(),
        }
    }
}

impl VdpConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse VDP config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize VDP config")
    }

    /// Rows of "other" memory: one per screen line for color swaps, then
    /// the line transform rows.
    pub fn other_rows(&self) -> u32 {
        self.screen.height + self.buffers.transform_rows
    }

    /// Checked on every load and by [`crate::Vdp::new`].
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.screen.width > 0 && self.screen.height > 0,
            "screen size must be non-zero"
        );
        anyhow::ensure!(self.sprites.cell_size > 0, "sprite cell size must be non-zero");
        self.pacing.validate().context("Invalid pacing config")?;
        Ok(())
    }
}
