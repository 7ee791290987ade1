use std::collections::HashMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::view::{ColorBy, ScatterPoint};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: legend group → Color32
// ---------------------------------------------------------------------------

/// Assigns each legend group of the plotted points a distinct colour.
///
/// Groups keep the order in which they first appear among the points, so
/// year groups come out newest first.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub color_by: ColorBy,
    entries: Vec<(String, Color32)>,
    lookup: HashMap<String, usize>,
}

impl ColorMap {
    pub fn new(color_by: ColorBy, points: &[ScatterPoint]) -> Self {
        let mut keys: Vec<String> = Vec::new();
        let mut lookup = HashMap::new();
        for point in points {
            let key = point.color_key(color_by);
            if !lookup.contains_key(&key) {
                lookup.insert(key.clone(), keys.len());
                keys.push(key);
            }
        }
        let entries = keys.into_iter().zip(generate_palette(lookup.len())).collect();

        ColorMap {
            color_by,
            entries,
            lookup,
        }
    }

    /// Index of the legend group `point` belongs to.
    pub fn group_of(&self, point: &ScatterPoint) -> Option<usize> {
        self.lookup.get(&point.color_key(self.color_by)).copied()
    }

    /// Legend entries (group label → colour) in display order.
    pub fn legend_entries(&self) -> &[(String, Color32)] {
        &self.entries
    }
}
