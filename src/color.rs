use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Dark theme colours
// ---------------------------------------------------------------------------

pub const BACKGROUND: Color32 = Color32::from_rgb(0x0e, 0x11, 0x17);
pub const ACCENT: Color32 = Color32::from_rgb(0x8b, 0xff, 0x80);
pub const SELECTED: Color32 = Color32::from_rgb(0x45, 0x41, 0x58);
pub const EMPTY_CELL: Color32 = Color32::from_rgb(0x26, 0x29, 0x30);

// ---------------------------------------------------------------------------
// Sequential colour scale
// ---------------------------------------------------------------------------

/// Light-to-dark purple scale.
const PURPOR: [(u8, u8, u8); 7] = [
    (0xf3, 0xe0, 0xf7),
    (0xe4, 0xc7, 0xf1),
    (0xd1, 0xaf, 0xe8),
    (0xb9, 0x98, 0xdd),
    (0x9f, 0x82, 0xce),
    (0x82, 0x6d, 0xba),
    (0x63, 0x58, 0x9f),
];

/// Evenly spaced colour stops, interpolated in linear RGB.
#[derive(Debug, Clone)]
pub struct Colorscale {
    stops: Vec<LinSrgb>,
}

impl Default for Colorscale {
    fn default() -> Self {
        Self::purpor()
    }
}

impl Colorscale {
    pub fn purpor() -> Self {
        let stops = PURPOR
            .iter()
            .map(|&(r, g, b)| {
                Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0).into_linear()
            })
            .collect();
        Self { stops }
    }

    /// Colour at `t` in `[0, 1]`; out-of-range values are clamped.
    pub fn color_at(&self, t: f64) -> Color32 {
        let Some(last) = self.stops.len().checked_sub(1) else {
            return Color32::GRAY;
        };
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) } as f32;
        let pos = t * last as f32;
        let lo = (pos.floor() as usize).min(last);
        let hi = (lo + 1).min(last);
        let mixed = self.stops[lo].mix(self.stops[hi], pos - lo as f32);

        let rgb: Srgb = Srgb::from_linear(mixed);
        Color32::from_rgb(
            (rgb.red * 255.0).round() as u8,
            (rgb.green * 255.0).round() as u8,
            (rgb.blue * 255.0).round() as u8,
        )
    }

    /// Heatmap colour for `value` relative to `max`; zero days stay blank.
    pub fn heat_color(&self, value: f64, max: f64) -> Color32 {
        if value <= 0.0 || max <= 0.0 {
            EMPTY_CELL
        } else {
            self.color_at(value / max)
        }
    }
}
