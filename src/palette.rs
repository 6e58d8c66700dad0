//! Palette resolution: named discrete tables and continuous color ramps.
//!
//! A palette name resolves once into a tagged [`PaletteSource`]; discrete
//! colors for binned legends are either taken verbatim from a brewer-style
//! table or sampled from a ramp at evenly spaced positions in [0.1, 0.9]
//! (keeps bins away from the washed-out ramp extremes).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Linear interpolation toward `other`, `t` in [0, 1].
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * t).round() as u8 };
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// Reserved fill for features with no data value.
pub const MISSING_DATA: Rgba = Rgba::rgb(230, 230, 230);

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("unknown palette: {0}")]
    UnknownPalette(String),
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgba {
    Rgba::rgb(r, g, b)
}

// Sequential brewer ramps (9-class anchors, interpolated in between).
const YLORRD: [Rgba; 9] = [
    rgb(255, 255, 204), rgb(255, 237, 160), rgb(254, 217, 118), rgb(254, 178, 76),
    rgb(253, 141, 60), rgb(252, 78, 42), rgb(227, 26, 28), rgb(189, 0, 38),
    rgb(128, 0, 38),
];
const YLGNBU: [Rgba; 9] = [
    rgb(255, 255, 217), rgb(237, 248, 177), rgb(199, 233, 180), rgb(127, 205, 187),
    rgb(65, 182, 196), rgb(29, 145, 192), rgb(34, 94, 168), rgb(37, 52, 148),
    rgb(8, 29, 88),
];
const BLUES: [Rgba; 9] = [
    rgb(247, 251, 255), rgb(222, 235, 247), rgb(198, 219, 239), rgb(158, 202, 225),
    rgb(107, 174, 214), rgb(66, 146, 198), rgb(33, 113, 181), rgb(8, 81, 156),
    rgb(8, 48, 107),
];
const GREENS: [Rgba; 9] = [
    rgb(247, 252, 245), rgb(229, 245, 224), rgb(199, 233, 192), rgb(161, 217, 155),
    rgb(116, 196, 118), rgb(65, 171, 93), rgb(35, 139, 69), rgb(0, 109, 44),
    rgb(0, 68, 27),
];
const REDS: [Rgba; 9] = [
    rgb(255, 245, 240), rgb(254, 224, 210), rgb(252, 187, 161), rgb(252, 146, 114),
    rgb(251, 106, 74), rgb(239, 59, 44), rgb(203, 24, 29), rgb(165, 15, 21),
    rgb(103, 0, 13),
];
const ORANGES: [Rgba; 9] = [
    rgb(255, 245, 235), rgb(254, 230, 206), rgb(253, 208, 162), rgb(253, 174, 107),
    rgb(253, 141, 60), rgb(241, 105, 19), rgb(217, 72, 1), rgb(166, 54, 3),
    rgb(127, 39, 4),
];
const PURPLES: [Rgba; 9] = [
    rgb(252, 251, 253), rgb(239, 237, 245), rgb(218, 218, 235), rgb(188, 189, 220),
    rgb(158, 154, 200), rgb(128, 125, 186), rgb(106, 81, 163), rgb(84, 39, 143),
    rgb(63, 0, 125),
];

// Diverging ramps.
const SPECTRAL: [Rgba; 11] = [
    rgb(158, 1, 66), rgb(213, 62, 79), rgb(244, 109, 67), rgb(253, 174, 97),
    rgb(254, 224, 139), rgb(255, 255, 191), rgb(230, 245, 152), rgb(171, 221, 164),
    rgb(102, 194, 165), rgb(50, 136, 189), rgb(94, 79, 162),
];
const RDYLGN: [Rgba; 11] = [
    rgb(165, 0, 38), rgb(215, 48, 39), rgb(244, 109, 67), rgb(253, 174, 97),
    rgb(254, 224, 139), rgb(255, 255, 191), rgb(217, 239, 139), rgb(166, 217, 106),
    rgb(102, 189, 99), rgb(26, 152, 80), rgb(0, 104, 55),
];

// Perceptually uniform ramps.
const VIRIDIS: [Rgba; 8] = [
    rgb(68, 1, 84), rgb(70, 50, 126), rgb(54, 92, 141), rgb(39, 127, 142),
    rgb(31, 161, 135), rgb(74, 193, 109), rgb(160, 218, 57), rgb(253, 231, 37),
];
const MAGMA: [Rgba; 8] = [
    rgb(0, 0, 4), rgb(29, 17, 71), rgb(81, 18, 124), rgb(130, 38, 129),
    rgb(183, 55, 121), rgb(231, 82, 99), rgb(252, 137, 97), rgb(252, 253, 191),
];

// Qualitative brewer tables, used verbatim rather than interpolated.
const SET2: [Rgba; 8] = [
    rgb(102, 194, 165), rgb(252, 141, 98), rgb(141, 160, 203), rgb(231, 138, 195),
    rgb(166, 216, 84), rgb(255, 217, 47), rgb(229, 196, 148), rgb(179, 179, 179),
];
const DARK2: [Rgba; 8] = [
    rgb(27, 158, 119), rgb(217, 95, 2), rgb(117, 112, 179), rgb(231, 41, 138),
    rgb(102, 166, 30), rgb(230, 171, 2), rgb(166, 118, 29), rgb(102, 102, 102),
];
const ACCENT: [Rgba; 8] = [
    rgb(127, 201, 127), rgb(190, 174, 212), rgb(253, 192, 134), rgb(255, 255, 153),
    rgb(56, 108, 176), rgb(240, 2, 127), rgb(191, 91, 23), rgb(102, 102, 102),
];
const PASTEL1: [Rgba; 9] = [
    rgb(251, 180, 174), rgb(179, 205, 227), rgb(204, 235, 197), rgb(222, 203, 228),
    rgb(254, 217, 166), rgb(255, 255, 204), rgb(229, 216, 189), rgb(253, 218, 236),
    rgb(242, 242, 242),
];

/// A resolved palette: either a discrete table used as-is, or a ramp sampled
/// per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteSource {
    NamedDiscrete(&'static [Rgba]),
    ContinuousRamp(&'static [Rgba]),
}

/// Look a palette name up, case-insensitively.
pub fn resolve_palette(name: &str) -> Result<PaletteSource, PaletteError> {
    use PaletteSource::*;
    match name.to_ascii_lowercase().as_str() {
        "ylorrd" => Ok(ContinuousRamp(&YLORRD)),
        "ylgnbu" => Ok(ContinuousRamp(&YLGNBU)),
        "blues" => Ok(ContinuousRamp(&BLUES)),
        "greens" => Ok(ContinuousRamp(&GREENS)),
        "reds" => Ok(ContinuousRamp(&REDS)),
        "oranges" => Ok(ContinuousRamp(&ORANGES)),
        "purples" => Ok(ContinuousRamp(&PURPLES)),
        "spectral" => Ok(ContinuousRamp(&SPECTRAL)),
        "rdylgn" => Ok(ContinuousRamp(&RDYLGN)),
        "viridis" => Ok(ContinuousRamp(&VIRIDIS)),
        "magma" => Ok(ContinuousRamp(&MAGMA)),
        "set2" => Ok(NamedDiscrete(&SET2)),
        "dark2" => Ok(NamedDiscrete(&DARK2)),
        "accent" => Ok(NamedDiscrete(&ACCENT)),
        "pastel1" => Ok(NamedDiscrete(&PASTEL1)),
        _ => Err(PaletteError::UnknownPalette(name.to_string())),
    }
}

impl PaletteSource {
    /// Color at position `t` in [0, 1], linearly interpolated between anchors.
    pub fn sample(&self, t: f64) -> Rgba {
        let anchors = match self {
            PaletteSource::NamedDiscrete(c) | PaletteSource::ContinuousRamp(c) => *c,
        };
        let t = t.clamp(0.0, 1.0);
        if anchors.len() == 1 {
            return anchors[0];
        }
        let pos = t * (anchors.len() - 1) as f64;
        let lo = (pos.floor() as usize).min(anchors.len() - 2);
        anchors[lo].lerp(anchors[lo + 1], pos - lo as f64)
    }

    /// Exactly `n` discrete colors.
    ///
    /// Discrete tables hand out their leading colors verbatim; ramps (and
    /// oversize requests against a table) are sampled across [0.1, 0.9].
    pub fn discrete(&self, n: usize) -> Vec<Rgba> {
        match self {
            PaletteSource::NamedDiscrete(colors) if n <= colors.len() => {
                colors[..n].to_vec()
            }
            _ => (0..n)
                .map(|i| {
                    let t = if n == 1 {
                        0.1
                    } else {
                        0.1 + 0.8 * (i as f64 / (n - 1) as f64)
                    };
                    self.sample(t)
                })
                .collect(),
        }
    }
}

/// Resolve `base` and return exactly `n` discrete colors.
pub fn discrete_palette(base: &str, n: usize) -> Result<Vec<Rgba>, PaletteError> {
    Ok(resolve_palette(base)?.discrete(n))
}
