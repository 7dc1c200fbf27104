//! Scalar color-transfer math between linear and perceptual encodings.
//!
//! The style-transfer network is trained on gamma-encoded imagery while the
//! render pipeline produces linear intensities, so frames are converted into
//! perceptual space on the way into the network and back out afterwards. The
//! GPU graph composes the same arithmetic out of activation and
//! elementwise-power steps; these host-side versions are the reference the
//! shader path is tested against.

/// Exponent of the perceptual transfer curve.
pub const GAMMA_EXPONENT: f32 = 2.4;

/// Brightness multiplier folded into the linear→perceptual normalization.
pub const BRIGHTNESS_ADJUSTMENT: f32 = 1.7;

/// Scale applied after the encode power curve.
pub const ENCODE_SCALE: f32 = 269.025;

/// Offset applied after the encode power curve.
pub const ENCODE_OFFSET: f32 = -14.025;

/// Offset correction used when normalizing perceptual values.
pub const DECODE_OFFSET: f32 = 0.055;

/// Convert a linear intensity in `[0, 255]` to its perceptual encoding.
///
/// Normalizes to `[0, 1]` (scaled by [`BRIGHTNESS_ADJUSTMENT`]) and applies
/// `x^(1/2.4) * 269.025 - 14.025`, landing back in `[0, 255]`.
pub fn linear_to_perceptual(value: f32) -> f32 {
    let normalized = value / 255.0 * BRIGHTNESS_ADJUSTMENT;
    normalized.max(0.0).powf(1.0 / GAMMA_EXPONENT) * ENCODE_SCALE + ENCODE_OFFSET
}

/// Convert a perceptual intensity in `[0, 255]` back to linear.
///
/// Normalizes with the `0.055` offset correction and `1/1.055` scale, then
/// applies `x^2.4 * 255`.
pub fn perceptual_to_linear(value: f32) -> f32 {
    let normalized = (value / 255.0 + DECODE_OFFSET) / (1.0 + DECODE_OFFSET);
    normalized.max(0.0).powf(GAMMA_EXPONENT) * 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_recovers_linear_values() {
        for i in 0..=255 {
            let x = i as f32;
            let recovered = perceptual_to_linear(linear_to_perceptual(x)) / BRIGHTNESS_ADJUSTMENT;
            assert!(
                (recovered - x).abs() < 1e-2,
                "round trip diverged at {x}: got {recovered}"
            );
        }
    }

    #[test]
    fn encode_is_monotonic() {
        let mut previous = linear_to_perceptual(0.0);
        for i in 1..=255 {
            let current = linear_to_perceptual(i as f32);
            assert!(current > previous, "encode not monotonic at {i}");
            previous = current;
        }
    }

    #[test]
    fn encode_brightens_midtones() {
        // The brightness multiplier pushes mid-range intensities up.
        let mid = linear_to_perceptual(128.0);
        assert!(mid > 128.0, "midtone {mid} should exceed its linear value");
    }
}
