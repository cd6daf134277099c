/// Value→color ramp for the colorgramme heatmap and its scale bar.
///
/// A piecewise-linear HSV-like ramp over five mutually exclusive domains,
/// evaluated in order with first match winning:
///
///   value < 0          → near-black (defensive, unreachable for counts)
///   0 ..= max/3        → blue ramp, green channel rising
///   max/3 ..= 2·max/3  → green plateau, red rising / blue falling
///   2·max/3 ..= max    → red ramp, green falling
///   value > max        → flat gray, the masked/over-threshold sentinel

use image::Rgb;

/// Maps a count to its heatmap color against a scale maximum.
///
/// `scale_max` must be positive. Channel arithmetic is bounded by the domain
/// guards, but each channel is still clamped so floating-point rounding at
/// the domain boundaries cannot overflow.
pub fn color_for(value: f64, scale_max: f64) -> Rgb<u8> {
    let scale_255 = 255.0 / scale_max;
    let channel = |v: f64| v.clamp(0.0, 255.0) as u8;

    if value < 0.0 {
        Rgb([5, 5, 5])
    } else if value <= scale_max / 3.0 {
        Rgb([0, channel(3.0 * value * scale_255), 255])
    } else if value <= scale_max / 3.0 * 2.0 {
        Rgb([
            channel(3.0 * value * scale_255 - 255.0),
            255,
            channel(3.0 * (scale_max - value) * scale_255 - 255.0),
        ])
    } else if value <= scale_max {
        Rgb([255, channel(3.0 * (scale_max - value) * scale_255), 0])
    } else {
        Rgb([128, 128, 128])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
