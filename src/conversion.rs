//! Internal timestamp and rational helpers.

use ffmpeg_next::Rational;

/// Collapse a rational to a float, zero when the denominator is zero.
pub(crate) fn rational_to_f64(value: Rational) -> f64 {
    if value.denominator() != 0 {
        value.numerator() as f64 / value.denominator() as f64
    } else {
        0.0
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * rational_to_f64(time_base)
}
