//! GIF decoding: file → composited RGBA frames + loop metadata.

use super::frame::{DEFAULT_FRAME_DELAY_MS, DecodedImage, Frame, LoopCount};
use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Malformed(String),
    #[error("GIF contains no frames")]
    Empty,
}

/// Decode a GIF file into full-canvas RGBA frames.
///
/// The `image` decoder composites each frame against its predecessors, so
/// disposal methods and partial-canvas frames are already resolved here and
/// every returned frame covers the whole canvas. A stored delay of 0 ms is
/// treated as unspecified and replaced with [`DEFAULT_FRAME_DELAY_MS`].
pub fn decode(path: &Path) -> Result<DecodedImage, DecodeError> {
    let reader = BufReader::new(File::open(path)?);
    let decoder = GifDecoder::new(reader)
        .map_err(|e| DecodeError::Malformed(format!("{}: {e}", path.display())))?;

    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| DecodeError::Malformed(format!("{}: {e}", path.display())))?;
    if frames.is_empty() {
        return Err(DecodeError::Empty);
    }

    let loop_count = read_loop_count(path)?;

    let frames = frames
        .into_iter()
        .map(|frame| {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay_ms = numer / denom.max(1);
            let delay_ms = if delay_ms == 0 {
                DEFAULT_FRAME_DELAY_MS
            } else {
                delay_ms
            };
            Frame::new(frame.into_buffer(), delay_ms)
        })
        .collect();

    Ok(DecodedImage::new(frames, loop_count))
}

/// Recover the loop count with a lightweight `gif`-crate metadata scan.
///
/// The `image` decoder does not expose the netscape loop extension. The
/// extension may sit anywhere before the last frame, so this walks every
/// frame header (no pixel decode) before reading the accumulated value.
fn read_loop_count(path: &Path) -> Result<LoopCount, DecodeError> {
    let file = File::open(path)?;
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    options.allow_unknown_blocks(true);

    let mut decoder = options
        .read_info(file)
        .map_err(|e| DecodeError::Malformed(format!("{}: {e}", path.display())))?;
    while decoder
        .next_frame_info()
        .map_err(|e| DecodeError::Malformed(format!("{}: {e}", path.display())))?
        .is_some()
    {}

    Ok(match decoder.repeat() {
        gif::Repeat::Infinite => LoopCount::Infinite,
        gif::Repeat::Finite(n) => LoopCount::Finite(n),
    })
}
