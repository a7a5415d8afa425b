//! Pure scale-factor and dimension math.
//!
//! All functions here are pure and testable without any I/O or images.

/// Smallest scale factor the estimator will return.
pub const MIN_SCALE: f64 = 0.1;

/// Estimate the linear scale factor that brings a file of
/// `original_size_kb` toward `target_size_kb`.
///
/// Encoded size is assumed roughly proportional to pixel count, which scales
/// quadratically with linear dimension — hence the square root of the size
/// ratio. The result is clamped to `[0.1, 1.0]` so pathological inputs can
/// never produce a near-zero output image.
///
/// # Examples
/// ```
/// use gifpress::scale::estimate_scale;
///
/// // Already small enough: no downscale.
/// assert_eq!(estimate_scale(50.0, 100.0), 1.0);
///
/// // 400 KB toward 100 KB: quarter the pixels, halve each dimension.
/// assert_eq!(estimate_scale(400.0, 100.0), 0.5);
/// ```
pub fn estimate_scale(original_size_kb: f64, target_size_kb: f64) -> f64 {
    if original_size_kb <= target_size_kb {
        return 1.0;
    }

    let size_ratio = target_size_kb / original_size_kb;
    size_ratio.sqrt().clamp(MIN_SCALE, 1.0)
}

/// Apply a scale factor to both axes of a frame.
///
/// Both dimensions use the same factor (aspect ratio is preserved), each
/// rounded to the nearest integer and floored at 1 pixel.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (f64::from(width) * scale).round() as u32;
    let h = (f64::from(height) * scale).round() as u32;
    (w.max(1), h.max(1))
}
