use plotters::style::RGBColor;

const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

fn lerp(a: (u8, u8, u8), b: (u8, u8, u8), t: f32) -> RGBColor {
    let mix = |x: u8, y: u8| (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Maps `t` in `[0, 1]` to a sequential colour, dark for low values. Out of range values
/// are clamped.
pub fn heat_color(t: f32) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f32;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    lerp(VIRIDIS[i], VIRIDIS[i + 1], scaled - i as f32)
}

/// Maps `t` in `[-1, 1]` to red for negative values and green for positive ones, white at
/// zero.
pub fn diverging_color(t: f32) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(-1.0, 1.0) };
    let white = (255, 255, 255);
    if t < 0.0 {
        lerp(white, (200, 30, 30), -t)
    } else {
        lerp(white, (30, 160, 60), t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_color_hits_the_ends() {
        assert_eq!(heat_color(0.0), RGBColor(68, 1, 84));
        assert_eq!(heat_color(1.0), RGBColor(253, 231, 37));
        assert_eq!(heat_color(7.0), heat_color(1.0));
        assert_eq!(heat_color(f32::NAN), heat_color(0.0));
    }

    #[test]
    fn diverging_color_is_white_at_zero() {
        assert_eq!(diverging_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(diverging_color(-1.0), RGBColor(200, 30, 30));
        assert_eq!(diverging_color(1.0), RGBColor(30, 160, 60));
    }
}
