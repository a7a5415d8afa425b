//! GIF codec adapter — pure Rust, zero external dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + composite** | `image::codecs::gif::GifDecoder` + `AnimationDecoder` |
//! | **Loop-count probe** | `gif::DecodeOptions` metadata scan (no pixel decode) |
//! | **Quantize** | `color_quant::NeuQuant`, palette sized from config |
//! | **Encode** | `gif::Encoder`, per-frame delays + loop metadata |
//! | **Publish** | `tempfile::NamedTempFile::persist` (atomic rename) |
//!
//! The module is split into:
//! - **Frame types**: [`Frame`], [`DecodedImage`], [`LoopCount`] — the data
//!   handed between decode, resize, and encode
//! - **Decode**: file → composited full-canvas RGBA frames with durations
//! - **Encode**: frames → quantized GIF written atomically

mod decode;
mod encode;
mod frame;

pub use decode::{DecodeError, decode};
pub use encode::{EncodeError, EncodeSettings, encode};
pub use frame::{DEFAULT_FRAME_DELAY_MS, DecodedImage, Frame, LoopCount};
