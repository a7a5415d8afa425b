//! Batch processing: folder enumeration, the sequential per-file loop,
//! progress reporting, and aggregate statistics.
//!
//! ## Run Shape
//!
//! ```text
//! input_folder/
//! ├── a.gif                        # processed first (sorted by name)
//! ├── B.GIF                        # extension match is case-insensitive
//! └── optimized/                   # created before the first file
//!     ├── optimized_a.gif
//!     ├── optimized_B.GIF
//!     └── originals/               # source backups (when enabled)
//! ```
//!
//! Files are processed strictly one at a time, in sorted filename order.
//! After each file the aggregate [`BatchStats`] is updated and the observer
//! receives `floor(i / N * 100)`; after the last file it receives an
//! unconditional 100, so progress always terminates exactly there.
//!
//! Only two kinds of error abort a run, both raised before any file is
//! touched: an invalid configuration and an unusable input/output folder.
//! Everything per-file is folded into the statistics.

use crate::config::{ConfigError, OptimizationConfig};
use crate::optimizer;
use crate::report;
use crate::stats::BatchStats;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Subfolder of the input folder that receives optimized output.
pub const OUTPUT_DIR_NAME: &str = "optimized";

/// Prefix prepended to each optimized file name.
pub const OUTPUT_PREFIX: &str = "optimized_";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("input folder not found: {0}")]
    MissingFolder(PathBuf),
    #[error("input path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to read input folder {0}: {1}")]
    Unreadable(PathBuf, walkdir::Error),
    #[error("failed to create output folder {0}: {1}")]
    OutputFolder(PathBuf, std::io::Error),
}

/// Receives batch progress as an integer percentage in `[0, 100]`.
///
/// Called synchronously from the batch loop after each file completes;
/// values are non-decreasing and end at exactly 100. Implementations should
/// be cheap, but the engine makes no assumption beyond "returns".
pub trait ProgressObserver {
    fn on_progress(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressObserver for F {
    fn on_progress(&mut self, percent: u8) {
        self(percent);
    }
}

/// Observer that discards all progress updates.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _percent: u8) {}
}

/// Optimize every GIF directly inside `input_folder`.
///
/// Returns the aggregate statistics; per-file outcomes are logged as they
/// happen. An empty folder is a valid degenerate run: the result is all
/// zeros and the observer is never called.
pub fn process_folder(
    input_folder: &Path,
    config: &OptimizationConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<BatchStats, BatchError> {
    config.validate()?;
    if !input_folder.exists() {
        return Err(BatchError::MissingFolder(input_folder.to_path_buf()));
    }
    if !input_folder.is_dir() {
        return Err(BatchError::NotADirectory(input_folder.to_path_buf()));
    }

    let files = list_gif_files(input_folder)?;
    let mut stats = BatchStats::default();

    info!(
        "starting batch: {} ({} files, target {} KB)",
        input_folder.display(),
        files.len(),
        config.target_size_kb
    );

    if files.is_empty() {
        warn!("no GIF files found in {}", input_folder.display());
        return Ok(stats);
    }

    let output_dir = input_folder.join(OUTPUT_DIR_NAME);
    fs::create_dir_all(&output_dir)
        .map_err(|e| BatchError::OutputFolder(output_dir.clone(), e))?;

    let total = files.len();
    for (index, file) in files.iter().enumerate() {
        let output = output_dir.join(output_file_name(file));
        let file_stats = optimizer::optimize_file(file, &output, config);

        if file_stats.success {
            info!("{}", report::format_file_line(&file_stats));
        } else {
            warn!("{}", report::format_file_line(&file_stats));
        }

        stats.record(&file_stats);
        observer.on_progress(progress_percent(index + 1, total));
    }
    observer.on_progress(100);

    report::log_summary(&stats);
    Ok(stats)
}

/// List files with a case-insensitive `.gif` extension directly inside
/// `dir` (non-recursive), sorted by name for a reproducible run order.
fn list_gif_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| BatchError::Unreadable(dir.to_path_buf(), e))?;
        if entry.file_type().is_file() && has_gif_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn has_gif_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"))
}

fn output_file_name(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{OUTPUT_PREFIX}{name}")
}

/// `floor(done / total * 100)`; callers guarantee `total >= 1`.
fn progress_percent(done: usize, total: usize) -> u8 {
    (done * 100 / total) as u8
}
