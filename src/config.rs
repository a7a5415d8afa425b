//! Per-run optimization configuration.
//!
//! One [`OptimizationConfig`] is built from CLI flags (or by an embedding
//! caller), validated once, and then shared read-only by every per-file
//! operation of the batch. The engine carries no other configuration state —
//! no config files, no process-wide globals.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Immutable configuration for one batch run.
///
/// `max_width`/`max_height` are advisory caps carried for callers that want
/// to display or enforce them; the optimizer derives its scale factor from
/// file sizes alone.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationConfig {
    /// Target file size in KB. The single-pass heuristic aims toward this;
    /// it does not guarantee hitting it.
    pub target_size_kb: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Quantization effort, 0–100. Higher is slower and more accurate.
    pub quality: u8,
    /// Palette size per encoded image, 1–256.
    pub color_count: u16,
    /// Train one shared global palette across all frames instead of a local
    /// palette per frame.
    pub optimize: bool,
    /// Re-encode multi-frame inputs as animations; when false only the first
    /// frame is kept.
    pub preserve_animation: bool,
    /// Copy each source file into `optimized/originals/` before re-encoding.
    pub backup_original: bool,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            target_size_kb: 100,
            max_width: 800,
            max_height: 600,
            quality: 85,
            color_count: 256,
            optimize: true,
            preserve_animation: true,
            backup_original: true,
        }
    }
}

impl OptimizationConfig {
    /// Check all field invariants, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_size_kb == 0 {
            return Err(ConfigError::Validation(
                "target_size_kb must be positive".to_string(),
            ));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ConfigError::Validation(
                "max_width and max_height must be positive".to_string(),
            ));
        }
        if self.quality > 100 {
            return Err(ConfigError::Validation(format!(
                "quality must be in 0..=100, got {}",
                self.quality
            )));
        }
        if self.color_count == 0 || self.color_count > 256 {
            return Err(ConfigError::Validation(format!(
                "color_count must be in 1..=256, got {}",
                self.color_count
            )));
        }
        Ok(())
    }
}
