//! GIF encoding: quantized frames written atomically.

use super::frame::{Frame, LoopCount};
use color_quant::NeuQuant;
use image::RgbaImage;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Pixels with an alpha below this are encoded as transparent.
const ALPHA_OPAQUE_CUTOFF: u8 = 128;

/// NeuQuant degrades below this many palette entries; smaller configured
/// color counts are raised to it.
const MIN_PALETTE_COLORS: usize = 16;

/// Cap on the number of pixels fed to palette training.
const MAX_SAMPLE_PIXELS: usize = 1 << 16;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode failed: {0}")]
    Encoder(String),
    #[error("no frames to encode")]
    Empty,
    #[error("frame dimensions exceed the GIF limit: {0}x{1}")]
    TooLarge(u32, u32),
}

/// Encoder-side knobs, extracted from the run configuration.
#[derive(Debug, Clone, Copy)]
pub struct EncodeSettings {
    /// Palette size per encoded image, 1–256.
    pub color_count: u16,
    /// Quantization effort, 0–100.
    pub quality: u8,
    /// Train one shared global palette across all frames instead of a local
    /// palette per frame.
    pub optimize: bool,
}

/// Encode frames as one GIF at `path`, static or animated.
///
/// Frame order and count are preserved exactly; per-frame delays are written
/// in the GIF's 10 ms units (rounded to nearest) and the loop count is
/// carried through for multi-frame output. The file is written to a
/// temporary sibling and atomically renamed into place, so a failure leaves
/// no partial output behind.
pub fn encode(
    frames: &[Frame],
    loop_count: LoopCount,
    path: &Path,
    settings: &EncodeSettings,
) -> Result<(), EncodeError> {
    let first = frames.first().ok_or(EncodeError::Empty)?;
    let (canvas_w, canvas_h) = first.buffer.dimensions();
    let width =
        u16::try_from(canvas_w).map_err(|_| EncodeError::TooLarge(canvas_w, canvas_h))?;
    let height =
        u16::try_from(canvas_h).map_err(|_| EncodeError::TooLarge(canvas_w, canvas_h))?;

    let sample_fac = sample_factor(settings.quality);
    let colors = usize::from(settings.color_count).clamp(MIN_PALETTE_COLORS, 256);

    // One shared palette for the whole animation, or none (per-frame below).
    let global = settings.optimize.then(|| {
        let buffers: Vec<&RgbaImage> = frames.iter().map(|f| &f.buffer).collect();
        let transparency = frames.iter().any(has_transparency);
        Quantizer::train(&opaque_sample(&buffers), colors, sample_fac, transparency)
    });

    let mut out = Vec::new();
    {
        let mut encoder = match &global {
            Some(q) => gif::Encoder::new(&mut out, width, height, &q.palette),
            None => gif::Encoder::new(&mut out, width, height, &[]),
        }
        .map_err(|e| EncodeError::Encoder(e.to_string()))?;

        // Finite(0) means "play once": that is the absence of the netscape
        // loop extension, not an extension with count 0 (players read a
        // stored 0 as infinite).
        if frames.len() > 1 {
            match loop_count {
                LoopCount::Infinite => encoder
                    .set_repeat(gif::Repeat::Infinite)
                    .map_err(|e| EncodeError::Encoder(e.to_string()))?,
                LoopCount::Finite(n) if n > 0 => encoder
                    .set_repeat(gif::Repeat::Finite(n))
                    .map_err(|e| EncodeError::Encoder(e.to_string()))?,
                LoopCount::Finite(_) => {}
            }
        }

        for frame in frames {
            if frame.buffer.dimensions() != (canvas_w, canvas_h) {
                return Err(EncodeError::Encoder(
                    "frame dimensions differ within one animation".to_string(),
                ));
            }

            let (indices, palette, transparent) = match &global {
                Some(q) => (q.index_frame(&frame.buffer), None, q.transparent),
                None => {
                    let q = Quantizer::train(
                        &opaque_sample(&[&frame.buffer]),
                        colors,
                        sample_fac,
                        has_transparency(frame),
                    );
                    (q.index_frame(&frame.buffer), Some(q.palette), q.transparent)
                }
            };

            let mut gif_frame = gif::Frame::from_indexed_pixels(width, height, indices, transparent);
            gif_frame.delay = delay_units(frame.delay_ms);
            gif_frame.dispose = if transparent.is_some() {
                gif::DisposalMethod::Background
            } else {
                gif::DisposalMethod::Keep
            };
            gif_frame.palette = palette;

            encoder
                .write_frame(&gif_frame)
                .map_err(|e| EncodeError::Encoder(e.to_string()))?;
        }
    }

    write_atomic(path, &out)
}

/// Map quality 0–100 onto the NeuQuant sample factor 30–1
/// (1 = slowest/most accurate).
fn sample_factor(quality: u8) -> i32 {
    let quality = i32::from(quality.min(100));
    1 + (100 - quality) * 29 / 100
}

/// Milliseconds → GIF delay units of 10 ms, rounded to nearest.
fn delay_units(delay_ms: u32) -> u16 {
    ((delay_ms + 5) / 10).min(u32::from(u16::MAX)) as u16
}

fn has_transparency(frame: &Frame) -> bool {
    frame.buffer.pixels().any(|p| p[3] < ALPHA_OPAQUE_CUTOFF)
}

/// Collect an RGBA training sample of the opaque pixels across the given
/// buffers, strided so the total stays under [`MAX_SAMPLE_PIXELS`].
fn opaque_sample(buffers: &[&RgbaImage]) -> Vec<u8> {
    let total: usize = buffers
        .iter()
        .map(|b| (b.width() * b.height()) as usize)
        .sum();
    let stride = (total / MAX_SAMPLE_PIXELS).max(1);

    let mut sample = Vec::new();
    let mut i = 0usize;
    for buffer in buffers {
        for pixel in buffer.pixels() {
            if i % stride == 0 && pixel[3] >= ALPHA_OPAQUE_CUTOFF {
                sample.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 255]);
            }
            i += 1;
        }
    }
    // Fully transparent input: train on a single black entry.
    if sample.is_empty() {
        sample.extend_from_slice(&[0, 0, 0, 255]);
    }
    sample
}

/// A trained palette plus the index mapping for it.
struct Quantizer {
    nq: NeuQuant,
    /// Flat RGB palette; ends with a reserved black entry when `transparent`
    /// is set.
    palette: Vec<u8>,
    transparent: Option<u8>,
}

impl Quantizer {
    fn train(sample: &[u8], colors: usize, sample_fac: i32, with_transparency: bool) -> Self {
        // A transparent slot takes one palette entry.
        let colors = if with_transparency {
            colors.min(255)
        } else {
            colors
        };
        let nq = NeuQuant::new(sample_fac, colors, sample);
        let mut palette = nq.color_map_rgb();
        let transparent = if with_transparency {
            palette.extend_from_slice(&[0, 0, 0]);
            Some((palette.len() / 3 - 1) as u8)
        } else {
            None
        };
        Self {
            nq,
            palette,
            transparent,
        }
    }

    fn index_frame(&self, buffer: &RgbaImage) -> Vec<u8> {
        buffer
            .pixels()
            .map(|p| {
                if p[3] < ALPHA_OPAQUE_CUTOFF {
                    self.transparent.unwrap_or(0)
                } else {
                    self.nq.index_of(&[p[0], p[1], p[2], 255]) as u8
                }
            })
            .collect()
    }
}

/// Write `bytes` to a temporary sibling of `path` and rename it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EncodeError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| EncodeError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DEFAULT_FRAME_DELAY_MS, decode};
    use image::Rgba;

    fn noise_frame(width: u32, height: u32, seed: u32, delay_ms: u32) -> Frame {
        let buffer = RgbaImage::from_fn(width, height, |x, y| {
            let v = x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17)).wrapping_add(seed);
            Rgba([(v % 251) as u8, (v % 241) as u8, (v % 239) as u8, 255])
        });
        Frame::new(buffer, delay_ms)
    }

    fn default_settings() -> EncodeSettings {
        EncodeSettings {
            color_count: 256,
            quality: 85,
            optimize: true,
        }
    }

    #[test]
    fn quality_maps_onto_sample_factor_range() {
        assert_eq!(sample_factor(100), 1);
        assert_eq!(sample_factor(0), 30);
        assert_eq!(sample_factor(85), 5);
    }

    #[test]
    fn delay_units_round_to_nearest() {
        assert_eq!(delay_units(100), 10);
        assert_eq!(delay_units(104), 10);
        assert_eq!(delay_units(105), 11);
        assert_eq!(delay_units(0), 0);
    }

    #[test]
    fn empty_frame_list_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = encode(
            &[],
            LoopCount::Infinite,
            &tmp.path().join("out.gif"),
            &default_settings(),
        );
        assert!(matches!(result, Err(EncodeError::Empty)));
    }

    #[test]
    fn animated_round_trip_preserves_frames_delays_and_loop() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("anim.gif");
        let frames = vec![
            noise_frame(16, 12, 1, 120),
            noise_frame(16, 12, 2, 250),
            noise_frame(16, 12, 3, DEFAULT_FRAME_DELAY_MS),
        ];

        encode(&frames, LoopCount::Infinite, &path, &default_settings()).unwrap();

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.frames.len(), 3);
        assert_eq!(decoded.loop_count, LoopCount::Infinite);
        let delays: Vec<u32> = decoded.frames.iter().map(|f| f.delay_ms).collect();
        assert_eq!(delays, vec![120, 250, 100]);
        assert_eq!(decoded.frames[0].width(), 16);
        assert_eq!(decoded.frames[0].height(), 12);
    }

    #[test]
    fn per_frame_palettes_round_trip_too() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("local.gif");
        let frames = vec![noise_frame(8, 8, 7, 100), noise_frame(8, 8, 11, 100)];
        let settings = EncodeSettings {
            optimize: false,
            ..default_settings()
        };

        encode(&frames, LoopCount::Finite(2), &path, &settings).unwrap();

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.frames.len(), 2);
        assert_eq!(decoded.loop_count, LoopCount::Finite(2));
    }

    #[test]
    fn play_once_animation_stays_play_once() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("once.gif");
        let frames = vec![noise_frame(8, 8, 1, 100), noise_frame(8, 8, 2, 100)];

        encode(&frames, LoopCount::Finite(0), &path, &default_settings()).unwrap();

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.loop_count, LoopCount::Finite(0));
    }

    #[test]
    fn single_frame_writes_static_gif() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("static.gif");
        let frames = vec![noise_frame(10, 10, 0, 100)];

        encode(&frames, LoopCount::Infinite, &path, &default_settings()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
        let decoded = decode(&path).unwrap();
        assert!(!decoded.is_animated);
        // Single-frame output carries no netscape extension.
        assert_eq!(decoded.loop_count, LoopCount::Finite(0));
    }

    #[test]
    fn transparent_pixels_survive_encoding() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("alpha.gif");
        let buffer = RgbaImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                Rgba([200, 40, 40, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let frames = vec![Frame::new(buffer, 100)];

        encode(&frames, LoopCount::Finite(0), &path, &default_settings()).unwrap();

        let decoded = decode(&path).unwrap();
        let pixel = decoded.frames[0].buffer.get_pixel(7, 0);
        assert_eq!(pixel[3], 0, "right half should stay transparent");
        let pixel = decoded.frames[0].buffer.get_pixel(0, 0);
        assert_eq!(pixel[3], 255, "left half should stay opaque");
    }

    #[test]
    fn small_color_count_is_accepted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("few.gif");
        let settings = EncodeSettings {
            color_count: 2,
            ..default_settings()
        };

        encode(
            &[noise_frame(12, 12, 5, 100)],
            LoopCount::Finite(0),
            &path,
            &settings,
        )
        .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn failed_encode_leaves_no_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mismatch.gif");
        let frames = vec![noise_frame(8, 8, 1, 100), noise_frame(9, 8, 2, 100)];

        let result = encode(&frames, LoopCount::Infinite, &path, &default_settings());
        assert!(matches!(result, Err(EncodeError::Encoder(_))));
        assert!(!path.exists());
    }
}
