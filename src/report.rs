//! Run-log and summary formatting.
//!
//! Format functions are pure — no I/O, no side effects — so tests can assert
//! on exact lines. [`log_summary`] is the thin wrapper that emits the
//! summary through `tracing`, which the CLI routes to both the console and
//! the append-only run log file.

use crate::stats::{BatchStats, FileStats};

/// One human-readable line per processed file.
///
/// ```text
/// Optimized: a.gif (512.3 KB -> 98.7 KB, 80.7% reduction)
/// Failed: b.gif (decode failed: ...)
/// ```
pub fn format_file_line(stats: &FileStats) -> String {
    match stats.optimized_size_kb {
        Some(optimized) if stats.success => {
            let reduction = if stats.original_size_kb > 0.0 {
                (1.0 - optimized / stats.original_size_kb) * 100.0
            } else {
                0.0
            };
            format!(
                "Optimized: {} ({:.1} KB -> {:.1} KB, {:.1}% reduction)",
                stats.file_name, stats.original_size_kb, optimized, reduction
            )
        }
        _ => format!(
            "Failed: {} ({})",
            stats.file_name,
            stats.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// The end-of-run summary banner.
pub fn format_summary(stats: &BatchStats) -> Vec<String> {
    vec![
        "=".repeat(50),
        "OPTIMIZATION COMPLETED".to_string(),
        "=".repeat(50),
        format!("Files processed: {}", stats.processed),
        format!("Successful: {}", stats.successful),
        format!("Failed: {}", stats.failed),
        format!("Original total size: {:.1} KB", stats.total_original_size_kb),
        format!(
            "Optimized total size: {:.1} KB",
            stats.total_optimized_size_kb
        ),
        format!(
            "Total savings: {:.1} KB ({:.1}%)",
            stats.savings_kb(),
            stats.savings_percent()
        ),
    ]
}

/// Emit the summary banner through `tracing` at info level.
pub fn log_summary(stats: &BatchStats) {
    for line in format_summary(stats) {
        tracing::info!("{line}");
    }
}
