//! Typography and color defaults for rendered figures.
//!
//! A [`Theme`] is plain data threaded through every render call; nothing here
//! mutates process-wide rendering state, so concurrent renders with different
//! themes cannot race.

use crate::palette::Rgba;
use serde::{Deserialize, Serialize};

/// Font sizes in points (converted to pixels at the render DPI) plus the
/// shared text colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub title_pt: f64,
    pub subtitle_pt: f64,
    pub source_pt: f64,
    pub tick_pt: f64,
    pub legend_title_pt: f64,
    pub text_color: Rgba,
    pub muted_color: Rgba,
    pub outline_color: Rgba,
    pub outline_width: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            font_family: "sans-serif".to_string(),
            title_pt: 18.0,
            subtitle_pt: 12.0,
            source_pt: 9.0,
            tick_pt: 9.0,
            legend_title_pt: 10.0,
            text_color: Rgba::rgb(0x33, 0x33, 0x33),
            muted_color: Rgba::rgb(0x44, 0x44, 0x44),
            outline_color: Rgba::rgb(0xcc, 0xcc, 0xcc),
            outline_width: 0.6,
        }
    }
}

impl Theme {
    /// Point size to pixels at a given DPI (72 points per inch).
    pub fn px(&self, points: f64, dpi: u32) -> u32 {
        ((points * dpi as f64) / 72.0).round().max(1.0) as u32
    }
}
