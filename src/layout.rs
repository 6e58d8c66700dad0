//! Canvas layout: partition the figure into map, legend, and text bands.
//!
//! All rectangles are in figure-normalized [0, 1] coordinates with the origin
//! at the bottom-left. Pure functions of their inputs; rendering converts to
//! pixels later.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Legend flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendKind {
    /// Discrete color-to-range mapping.
    Binned,
    /// Smooth gradient between vmin and vmax.
    Continuous,
}

/// Where the legend strip sits relative to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendLocation {
    Top,
    Bottom,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Figure margins as fractions of the canvas, per side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            left: 0.06,
            right: 0.06,
            bottom: 0.06,
            top: 0.06,
        }
    }
}

/// Normalized rectangle, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn top(&self) -> f64 {
        self.y + self.h
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }
}

/// Result of the layout computation.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRects {
    pub map_rect: Rect,
    pub legend_rect: Option<Rect>,
    /// Orientation the chosen location forces, overriding any request.
    pub enforced: Option<Orientation>,
}

/// Tunables for the top-located legend strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopLegendOptions {
    /// Maximum legend width as a canvas fraction; clamped to the usable width.
    pub width_frac: f64,
    pub height_frac: f64,
    /// Extra gap between the title band and the legend.
    pub top_offset: f64,
    /// Gap between the legend and the map below it.
    pub gap_frac: f64,
    /// Vertical band reserved for title and subtitle text.
    pub title_band: f64,
}

impl Default for TopLegendOptions {
    fn default() -> Self {
        TopLegendOptions {
            width_frac: 0.35,
            height_frac: 0.025,
            top_offset: 0.05,
            gap_frac: 0.015,
            title_band: 0.08,
        }
    }
}

const RIGHT_LEGEND_WIDTH: f64 = 0.03;
const RIGHT_LEGEND_GAP: f64 = 0.02;
const RIGHT_LEGEND_INSET: f64 = 0.15;
const BOTTOM_LEGEND_HEIGHT: f64 = 0.04;
const BOTTOM_LEGEND_GAP: f64 = 0.02;
const BOTTOM_LEGEND_INSET: f64 = 0.2;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("margins and legend reserve more than the canvas: map rect is {w:.3} x {h:.3}")]
    EmptyMapRect { w: f64, h: f64 },
    #[error("no room for the legend strip: legend rect is {w:.3} x {h:.3}")]
    EmptyLegendRect { w: f64, h: f64 },
}

fn checked(map_rect: Rect, legend_rect: Rect, enforced: Orientation) -> Result<LayoutRects, LayoutError> {
    if map_rect.w <= 0.0 || map_rect.h <= 0.0 {
        return Err(LayoutError::EmptyMapRect {
            w: map_rect.w,
            h: map_rect.h,
        });
    }
    if legend_rect.w <= 0.0 || legend_rect.h <= 0.0 {
        return Err(LayoutError::EmptyLegendRect {
            w: legend_rect.w,
            h: legend_rect.h,
        });
    }
    Ok(LayoutRects {
        map_rect,
        legend_rect: Some(legend_rect),
        enforced: Some(enforced),
    })
}

/// Margin-inset full-canvas map rectangle, for renders without a legend.
pub fn map_only_rect(margins: Margins) -> Result<Rect, LayoutError> {
    let Margins {
        left,
        right,
        bottom,
        top,
    } = margins;
    let rect = Rect {
        x: left,
        y: bottom,
        w: 1.0 - left - right,
        h: 1.0 - bottom - top,
    };
    if rect.w <= 0.0 || rect.h <= 0.0 {
        return Err(LayoutError::EmptyMapRect {
            w: rect.w,
            h: rect.h,
        });
    }
    Ok(rect)
}

/// Compute non-overlapping map and legend rectangles for a legend location.
///
/// The location dictates the legend orientation (returned as `enforced`).
/// Margins or reserved space exceeding the canvas is a caller configuration
/// error, reported before anything is drawn.
pub fn legend_rectangles(
    location: LegendLocation,
    margins: Margins,
    top_opts: &TopLegendOptions,
) -> Result<LayoutRects, LayoutError> {
    let Margins {
        left,
        right,
        bottom,
        top,
    } = margins;
    match location {
        LegendLocation::Right => {
            let map_w = 1.0 - left - right - (RIGHT_LEGEND_WIDTH + RIGHT_LEGEND_GAP);
            let drawable_h = 1.0 - bottom - top;
            let map_rect = Rect {
                x: left,
                y: bottom,
                w: map_w,
                h: drawable_h,
            };
            let legend_rect = Rect {
                x: left + map_w + RIGHT_LEGEND_GAP,
                y: bottom + RIGHT_LEGEND_INSET,
                w: RIGHT_LEGEND_WIDTH,
                h: drawable_h - 2.0 * RIGHT_LEGEND_INSET,
            };
            checked(map_rect, legend_rect, Orientation::Vertical)
        }
        LegendLocation::Bottom => {
            let reserved = BOTTOM_LEGEND_HEIGHT + BOTTOM_LEGEND_GAP;
            let map_rect = Rect {
                x: left,
                y: bottom + reserved,
                w: 1.0 - left - right,
                h: 1.0 - (bottom + reserved) - top,
            };
            let legend_rect = Rect {
                x: left + BOTTOM_LEGEND_INSET,
                y: bottom,
                w: 1.0 - left - right - 2.0 * BOTTOM_LEGEND_INSET,
                h: BOTTOM_LEGEND_HEIGHT,
            };
            checked(map_rect, legend_rect, Orientation::Horizontal)
        }
        LegendLocation::Top => {
            let usable_w = 1.0 - left - right;
            let legend_w = top_opts.width_frac.min(usable_w);
            let legend_x = left + (usable_w - legend_w) / 2.0;
            let reserved = top_opts.title_band
                + top_opts.top_offset
                + top_opts.height_frac
                + top_opts.gap_frac;
            let legend_y = 1.0 - top_opts.title_band - top_opts.top_offset - top_opts.height_frac;
            let map_rect = Rect {
                x: left,
                y: bottom,
                w: usable_w,
                h: 1.0 - bottom - top - reserved,
            };
            let legend_rect = Rect {
                x: legend_x,
                y: legend_y,
                w: legend_w,
                h: top_opts.height_frac,
            };
            checked(map_rect, legend_rect, Orientation::Horizontal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn margins() -> Margins {
        Margins::default()
    }

    fn assert_disjoint_and_bounded(rects: &LayoutRects) {
        let map = rects.map_rect;
        let legend = rects.legend_rect.expect("legend present");
        assert!(!map.overlaps(&legend), "map {map:?} overlaps legend {legend:?}");
        for r in [map, legend] {
            assert!(r.x >= 0.0 && r.y >= 0.0, "{r:?} outside canvas");
            assert!(r.right() <= 1.0 + 1e-9 && r.top() <= 1.0 + 1e-9, "{r:?} outside canvas");
            assert!(r.w > 0.0 && r.h > 0.0);
        }
    }

    #[test]
    fn right_location_forces_vertical() {
        let rects =
            legend_rectangles(LegendLocation::Right, margins(), &TopLegendOptions::default())
                .unwrap();
        assert_disjoint_and_bounded(&rects);
        assert_eq!(rects.enforced, Some(Orientation::Vertical));
        let legend = rects.legend_rect.unwrap();
        assert!((legend.w - 0.03).abs() < 1e-12);
        assert!(legend.x >= rects.map_rect.right());
    }

    #[test]
    fn bottom_location_forces_horizontal() {
        let rects =
            legend_rectangles(LegendLocation::Bottom, margins(), &TopLegendOptions::default())
                .unwrap();
        assert_disjoint_and_bounded(&rects);
        assert_eq!(rects.enforced, Some(Orientation::Horizontal));
        let legend = rects.legend_rect.unwrap();
        assert!((legend.h - 0.04).abs() < 1e-12);
        assert!(rects.map_rect.y >= legend.top());
    }

    #[test]
    fn top_location_reserves_title_band() {
        let opts = TopLegendOptions::default();
        let rects = legend_rectangles(LegendLocation::Top, margins(), &opts).unwrap();
        assert_disjoint_and_bounded(&rects);
        assert_eq!(rects.enforced, Some(Orientation::Horizontal));
        let legend = rects.legend_rect.unwrap();
        // legend sits above the map and below the title band
        assert!(legend.y >= rects.map_rect.top());
        assert!(legend.top() <= 1.0 - opts.title_band);
        // centered horizontally
        let center = legend.x + legend.w / 2.0;
        assert!((center - 0.5).abs() < 1e-9);
    }

    #[test]
    fn map_only_rect_is_margin_inset() {
        let rect = map_only_rect(margins()).unwrap();
        assert_eq!(
            rect,
            Rect {
                x: 0.06,
                y: 0.06,
                w: 0.88,
                h: 0.88
            }
        );
    }

    #[test]
    fn absurd_margins_error_out() {
        let m = Margins {
            left: 0.6,
            right: 0.6,
            bottom: 0.06,
            top: 0.06,
        };
        assert!(matches!(
            map_only_rect(m),
            Err(LayoutError::EmptyMapRect { .. })
        ));
        assert!(legend_rectangles(LegendLocation::Right, m, &TopLegendOptions::default()).is_err());
        let tall = Margins {
            left: 0.06,
            right: 0.06,
            bottom: 0.5,
            top: 0.45,
        };
        assert!(matches!(
            legend_rectangles(LegendLocation::Top, tall, &TopLegendOptions::default()),
            Err(LayoutError::EmptyMapRect { .. })
        ));
    }
}
