//! Pure helpers behind the spectrum view: bar normalization, peak
//! detection, and the per-bar color ramp.

use eframe::epaint::Color32;
use voxpanel_messages::Hertz;

/// Bars are scaled to this fraction of the drawable height to leave
/// visual headroom.
pub const BAR_HEIGHT_FRACTION: f32 = 0.9;

/// Guard for flat signals where max == min.
const FLAT_RANGE_EPSILON: f32 = 1e-6;

/// Normalize magnitudes to 0..=1 bar heights. A flat signal normalizes
/// to all-zero heights rather than dividing by zero.
pub fn normalized_heights(magnitudes: &[f32]) -> Vec<f32> {
    let Some(&first) = magnitudes.first() else {
        return Vec::new();
    };
    let (min, max) = magnitudes
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = (max - min).max(FLAT_RANGE_EPSILON);

    magnitudes.iter().map(|&v| (v - min) / range).collect()
}

/// Frequency of the strongest bin; first occurrence wins on ties.
pub fn peak_frequency(magnitudes: &[f32], frequencies: &[f32]) -> Option<Hertz> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in magnitudes.iter().enumerate() {
        match best {
            Some((_, top)) if v <= top => {}
            _ => best = Some((i, v)),
        }
    }
    best.and_then(|(i, _)| frequencies.get(i).copied().map(Hertz))
}

/// Bar color: hue sweeps 0° (red) to 280° (violet) across the bins,
/// lightness rises with amplitude so louder bars glow brighter.
pub fn bar_color(index: usize, count: usize, normalized: f32) -> Color32 {
    let hue = if count > 1 {
        index as f32 / count as f32 * 280.0
    } else {
        0.0
    };
    let lightness = (40.0 + normalized * 30.0) / 100.0;
    hsl_to_color(hue, 1.0, lightness)
}

/// Standard HSL to RGB conversion; hue in degrees.
fn hsl_to_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = (hue.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    Color32::from_rgb(
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::Smoother;

    #[test]
    fn flat_signal_renders_all_bars_at_zero_height() {
        let heights = normalized_heights(&[5.0, 5.0, 5.0, 5.0]);
        assert_eq!(heights, vec![0.0; 4]);
    }

    #[test]
    fn heights_span_zero_to_one() {
        let heights = normalized_heights(&[2.0, 6.0, 4.0]);
        assert_eq!(heights[0], 0.0);
        assert_eq!(heights[1], 1.0);
        assert!((heights[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_frame_normalizes_to_nothing() {
        assert!(normalized_heights(&[]).is_empty());
    }

    #[test]
    fn peak_takes_first_occurrence_on_ties() {
        let peak = peak_frequency(&[1.0, 9.0, 9.0, 0.0], &[50.0, 100.0, 150.0, 200.0]);
        assert_eq!(peak, Some(Hertz(100.0)));
    }

    #[test]
    fn peak_is_stable_across_smoothed_repeats() {
        let mut smoother = Smoother::new();
        let magnitudes = [0.0f32, 10.0, 0.0];
        let frequencies = [100.0f32, 200.0, 300.0];

        for _ in 0..2 {
            let smoothed = smoother.apply(&magnitudes);
            let peak = peak_frequency(&smoothed, &frequencies);
            assert_eq!(peak, Some(Hertz(200.0)));
        }
    }

    #[test]
    fn bar_colors_are_deterministic() {
        assert_eq!(bar_color(3, 16, 0.5), bar_color(3, 16, 0.5));
        // Amplitude only changes lightness, never hue direction.
        assert_ne!(bar_color(0, 16, 0.0), bar_color(15, 16, 0.0));
    }
}
