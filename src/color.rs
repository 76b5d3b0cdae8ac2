use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Measured series.
pub const PRIMARY: RGBColor = RGBColor(31, 90, 220);
/// Averages, second axes and chart notes.
pub const SECONDARY: RGBColor = RGBColor(214, 39, 40);

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> RGBColor {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    RGBColor(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| hsl_to_rgb((i as f32 / n as f32) * 360.0, 0.75, 0.45))
        .collect()
}

/// A lighter variant of `color`, used for the second line of a workload
/// that plots two fields in one colour.
pub fn lighten(color: RGBColor) -> RGBColor {
    let RGBColor(r, g, b) = color;
    let mix = |c: u8| c + (255 - c) / 2;
    RGBColor(mix(r), mix(g), mix(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(c: RGBColor) -> (u8, u8, u8) {
        let RGBColor(r, g, b) = c;
        (r, g, b)
    }

    #[test]
    fn palette_has_distinct_colours() {
        let colors: Vec<_> = generate_palette(5).into_iter().map(channels).collect();
        assert_eq!(colors.len(), 5);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn lighten_moves_towards_white() {
        assert_eq!(channels(lighten(RGBColor(0, 100, 255))), (127, 177, 255));
    }
}
