use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// starting from the hue of `base`.
pub fn generate_palette(n: usize, base: Color32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    let start: Hsl = Srgb::new(base.r(), base.g(), base.b())
        .into_format::<f32>()
        .into_color();
    let start_hue = start.hue.into_positive_degrees();

    (0..n)
        .map(|i| {
            let hue = (start_hue + (i as f32 / n as f32) * 360.0) % 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Parse `#rrggbb`, falling back to light blue.
pub fn parse_hex(text: &str) -> Color32 {
    let channel = |i: usize| {
        text.get(1 + 2 * i..3 + 2 * i)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    match (text.len(), text.starts_with('#'), channel(0), channel(1), channel(2)) {
        (7, true, Some(r), Some(g), Some(b)) => Color32::from_rgb(r, g, b),
        _ => {
            log::warn!("Invalid colour '{text}', using default");
            Color32::LIGHT_BLUE
        }
    }
}

/// `#rrggbb` for a colour, as stored in configuration.
pub fn to_hex(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a category column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the distinct values of a category column.
    pub fn new(distinct_values: &BTreeSet<Value>, base: Color32) -> Self {
        let palette = generate_palette(distinct_values.len(), base);
        let mapping: BTreeMap<Value, Color32> = distinct_values
            .iter()
            .zip(palette)
            .map(|(v, c)| (v.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given category value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}
