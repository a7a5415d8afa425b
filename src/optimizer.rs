//! Single-file optimization pipeline.
//!
//! [`optimize_file`] is the failure-isolation boundary of the engine: every
//! error past the initial stat — decode, resize, encode, output stat — is
//! caught here and converted into a failed [`FileStats`]. Nothing from the
//! per-file pipeline escapes to the batch loop.

use crate::codec::{self, DecodeError, EncodeError, EncodeSettings, Frame};
use crate::config::OptimizationConfig;
use crate::scale;
use crate::stats::FileStats;
use image::imageops::FilterType;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Subfolder of the output directory that receives source backups.
pub const BACKUP_DIR_NAME: &str = "originals";

const BYTES_PER_KB: f64 = 1024.0;

#[derive(Error, Debug)]
enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Optimize one GIF from `input` to `output`.
///
/// Measures the input, decodes it, derives a scale factor from the size
/// target, resizes every frame by that factor, re-encodes (animated when the
/// source is animated and the config preserves animation, first-frame static
/// otherwise), and measures the output. All failures are returned as data.
pub fn optimize_file(input: &Path, output: &Path, config: &OptimizationConfig) -> FileStats {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    let original_size_kb = match fs::metadata(input) {
        Ok(meta) => meta.len() as f64 / BYTES_PER_KB,
        Err(e) => {
            return FileStats::failure(file_name, 0.0, format!("cannot stat input: {e}"));
        }
    };

    debug!("processing {file_name} ({original_size_kb:.1} KB)");

    match run_pipeline(input, output, original_size_kb, config) {
        Ok(optimized_size_kb) => FileStats::success(file_name, original_size_kb, optimized_size_kb),
        Err(e) => FileStats::failure(file_name, original_size_kb, e.to_string()),
    }
}

fn run_pipeline(
    input: &Path,
    output: &Path,
    original_size_kb: f64,
    config: &OptimizationConfig,
) -> Result<f64, OptimizeError> {
    if config.backup_original {
        backup_original(input, output)?;
    }

    let decoded = codec::decode(input)?;
    let scale = scale::estimate_scale(original_size_kb, f64::from(config.target_size_kb));
    let frames = resize_frames(decoded.frames, scale);

    let settings = EncodeSettings {
        color_count: config.color_count,
        quality: config.quality,
        optimize: config.optimize,
    };

    if decoded.is_animated && config.preserve_animation {
        codec::encode(&frames, decoded.loop_count, output, &settings)?;
    } else {
        codec::encode(&frames[..1], decoded.loop_count, output, &settings)?;
    }

    Ok(fs::metadata(output)?.len() as f64 / BYTES_PER_KB)
}

/// Resize every frame by the same factor, preserving order and durations.
/// A factor of 1.0 (or more) leaves the frames untouched.
fn resize_frames(frames: Vec<Frame>, scale: f64) -> Vec<Frame> {
    if scale >= 1.0 {
        return frames;
    }
    frames
        .into_iter()
        .map(|frame| {
            let (width, height) = frame.buffer.dimensions();
            let (new_width, new_height) = scale::scaled_dimensions(width, height, scale);
            let resized =
                image::imageops::resize(&frame.buffer, new_width, new_height, FilterType::Lanczos3);
            Frame::new(resized, frame.delay_ms)
        })
        .collect()
}

/// Copy the source into `<output dir>/originals/` before touching it.
fn backup_original(input: &Path, output: &Path) -> io::Result<()> {
    let backup_dir = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(BACKUP_DIR_NAME);
    fs::create_dir_all(&backup_dir)?;
    let name = input
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "input has no file name"))?;
    fs::copy(input, backup_dir.join(name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LoopCount;
    use image::{Rgba, RgbaImage};

    fn test_config() -> OptimizationConfig {
        OptimizationConfig {
            backup_original: false,
            ..Default::default()
        }
    }

    fn noise_buffer(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = x.wrapping_mul(131).wrapping_add(y.wrapping_mul(83));
            Rgba([(v % 255) as u8, (v % 253) as u8, (v % 251) as u8, 255])
        })
    }

    /// Encode a synthetic animation through the crate's own encoder.
    fn write_animated(path: &Path, width: u32, height: u32, frames: usize) {
        let frames: Vec<Frame> = (0..frames)
            .map(|_| Frame::new(noise_buffer(width, height), 100))
            .collect();
        codec::encode(
            &frames,
            LoopCount::Infinite,
            path,
            &EncodeSettings {
                color_count: 256,
                quality: 85,
                optimize: true,
            },
        )
        .unwrap();
    }

    #[test]
    fn resize_keeps_delays_and_order() {
        let frames = vec![
            Frame::new(noise_buffer(100, 50), 70),
            Frame::new(noise_buffer(100, 50), 130),
        ];
        let resized = resize_frames(frames, 0.5);
        assert_eq!(resized.len(), 2);
        assert_eq!(resized[0].delay_ms, 70);
        assert_eq!(resized[1].delay_ms, 130);
        assert_eq!(resized[0].buffer.dimensions(), (50, 25));
    }

    #[test]
    fn resize_noop_at_full_scale() {
        let frames = vec![Frame::new(noise_buffer(40, 30), 100)];
        let resized = resize_frames(frames, 1.0);
        assert_eq!(resized[0].buffer.dimensions(), (40, 30));
    }

    #[test]
    fn small_file_keeps_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("small.gif");
        let output = tmp.path().join("optimized_small.gif");
        write_animated(&input, 32, 24, 1);

        // Huge target: scale stays at 1.0.
        let config = OptimizationConfig {
            target_size_kb: 100_000,
            ..test_config()
        };
        let stats = optimize_file(&input, &output, &config);

        assert!(stats.success, "error: {:?}", stats.error);
        let decoded = codec::decode(&output).unwrap();
        assert_eq!(decoded.frames[0].buffer.dimensions(), (32, 24));
    }

    #[test]
    fn oversized_file_is_downscaled() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("big.gif");
        let output = tmp.path().join("optimized_big.gif");
        write_animated(&input, 128, 128, 4);

        // Tiny target: every real file exceeds 1 KB, so scale < 1.0.
        let config = OptimizationConfig {
            target_size_kb: 1,
            ..test_config()
        };
        let stats = optimize_file(&input, &output, &config);

        assert!(stats.success, "error: {:?}", stats.error);
        let decoded = codec::decode(&output).unwrap();
        assert_eq!(decoded.frames.len(), 4);
        let (w, h) = decoded.frames[0].buffer.dimensions();
        assert!(w < 128 && h < 128);
        assert!(w >= 1 && h >= 1);
    }

    #[test]
    fn animation_flattened_when_not_preserved() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("anim.gif");
        let output = tmp.path().join("optimized_anim.gif");
        write_animated(&input, 16, 16, 5);

        let config = OptimizationConfig {
            target_size_kb: 100_000,
            preserve_animation: false,
            ..test_config()
        };
        let stats = optimize_file(&input, &output, &config);

        assert!(stats.success);
        let decoded = codec::decode(&output).unwrap();
        assert_eq!(decoded.frames.len(), 1);
        assert!(!decoded.is_animated);
    }

    #[test]
    fn corrupt_input_becomes_failed_stats() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("broken.gif");
        let output = tmp.path().join("optimized_broken.gif");
        fs::write(&input, b"GIF89a garbage that is not a gif").unwrap();

        let stats = optimize_file(&input, &output, &test_config());

        assert!(!stats.success);
        assert_eq!(stats.file_name, "broken.gif");
        assert!(stats.original_size_kb > 0.0);
        assert!(stats.optimized_size_kb.is_none());
        assert!(stats.error.is_some());
        assert!(!output.exists());
    }

    #[test]
    fn missing_input_becomes_failed_stats() {
        let tmp = tempfile::TempDir::new().unwrap();
        let stats = optimize_file(
            &tmp.path().join("nope.gif"),
            &tmp.path().join("out.gif"),
            &test_config(),
        );
        assert!(!stats.success);
        assert_eq!(stats.original_size_kb, 0.0);
    }

    #[test]
    fn backup_copies_source_beside_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("keep.gif");
        let out_dir = tmp.path().join("optimized");
        fs::create_dir_all(&out_dir).unwrap();
        let output = out_dir.join("optimized_keep.gif");
        write_animated(&input, 8, 8, 1);

        let config = OptimizationConfig {
            target_size_kb: 100_000,
            backup_original: true,
            ..Default::default()
        };
        let stats = optimize_file(&input, &output, &config);

        assert!(stats.success, "error: {:?}", stats.error);
        let backup = out_dir.join(BACKUP_DIR_NAME).join("keep.gif");
        assert!(backup.exists());
        assert_eq!(
            fs::read(&backup).unwrap(),
            fs::read(&input).unwrap(),
            "backup must be byte-identical to the source"
        );
    }
}
