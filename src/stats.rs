//! Per-file and aggregate outcome records.
//!
//! [`FileStats`] is the unit result of the single-file optimizer — success
//! with sizes, or failure with a reason, never an exception. [`BatchStats`]
//! folds them into the aggregate returned at the end of a run. Both are
//! serializable so front ends can consume them as data.

use serde::Serialize;

/// Outcome of optimizing one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileStats {
    /// Source file name (no directory).
    pub file_name: String,
    /// Size of the input in KB; 0.0 when the input could not be statted.
    pub original_size_kb: f64,
    /// Size of the written output in KB. Present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_size_kb: Option<f64>,
    pub success: bool,
    /// Failure reason. Present only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileStats {
    pub fn success(file_name: String, original_size_kb: f64, optimized_size_kb: f64) -> Self {
        Self {
            file_name,
            original_size_kb,
            optimized_size_kb: Some(optimized_size_kb),
            success: true,
            error: None,
        }
    }

    pub fn failure(file_name: String, original_size_kb: f64, error: String) -> Self {
        Self {
            file_name,
            original_size_kb,
            optimized_size_kb: None,
            success: false,
            error: Some(error),
        }
    }
}

/// Aggregate statistics for one batch run.
///
/// Created zeroed at batch start, mutated exactly once per processed file by
/// [`record`](Self::record), and returned immutable at batch end. Invariant:
/// `processed == successful + failed` after every record; all fields are
/// monotonically non-decreasing during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub processed: u64,
    pub successful: u64,
    pub failed: u64,
    /// Sum of input sizes for every file whose stat succeeded, including
    /// files that later failed to decode or encode.
    pub total_original_size_kb: f64,
    /// Sum of output sizes for successful files only.
    pub total_optimized_size_kb: f64,
}

impl BatchStats {
    /// Fold one per-file outcome into the aggregate.
    pub fn record(&mut self, file: &FileStats) {
        self.processed += 1;
        self.total_original_size_kb += file.original_size_kb;
        if file.success {
            self.successful += 1;
            self.total_optimized_size_kb += file.optimized_size_kb.unwrap_or(0.0);
        } else {
            self.failed += 1;
        }
    }

    pub fn savings_kb(&self) -> f64 {
        self.total_original_size_kb - self.total_optimized_size_kb
    }

    /// Aggregate savings as a percentage of the original total, 0 when
    /// nothing was measured. Failed files contribute to the original total
    /// but not to the optimized total, which skews this figure upward on
    /// runs with failures; the per-file records are the precise source.
    pub fn savings_percent(&self) -> f64 {
        if self.total_original_size_kb > 0.0 {
            self.savings_kb() / self.total_original_size_kb * 100.0
        } else {
            0.0
        }
    }
}
