//! End-to-end choropleth composition: projection, classification, palette,
//! layout, and the final draw, from one dataset + one column + one config.

use crate::classify::{self, Scheme};
use crate::layout::{
    self, LayoutRects, LegendKind, LegendLocation, Margins, Orientation, Rect, TopLegendOptions,
};
use crate::models::GeoTable;
use crate::palette::{self, MISSING_DATA, Rgba};
use crate::projection::{self, Crs};
use crate::render::{self, ColorMapping, FigureSpec, LegendPanel, TextBlocks};
use crate::style::Theme;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use plotters::prelude::IntoDrawingArea;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

/// Legend configuration errors, surfaced before any drawing occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid legend config: binned legend needs explicit breaks, a scheme, or a palette size")]
    InvalidBinnedLegend,
    #[error("invalid legend config: continuous legend needs vmin < vmax")]
    InvalidContinuousLegend,
}

/// Legend request: what kind of legend, where, and how to derive its bins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegendConfig {
    pub kind: LegendKind,
    pub title: Option<String>,
    pub location: LegendLocation,
    /// Requested orientation; top/bottom/right placements override it.
    pub orientation: Orientation,
    pub breaks: Option<Vec<f64>>,
    pub labels: Option<Vec<String>>,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub scheme: Option<Scheme>,
    pub k: usize,
    /// Palette name and color count; the count also sizes derived breaks.
    pub palette: Option<(String, usize)>,
}

impl Default for LegendConfig {
    fn default() -> Self {
        LegendConfig {
            kind: LegendKind::Binned,
            title: None,
            location: LegendLocation::Top,
            orientation: Orientation::Horizontal,
            breaks: None,
            labels: None,
            vmin: None,
            vmax: None,
            scheme: Some(Scheme::Quantiles),
            k: 5,
            palette: None,
        }
    }
}

/// Figure-level configuration: text blocks, size, margins, projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub source: Option<String>,
    pub credit: Option<String>,
    /// Width and height in inches.
    pub figure_size: (f64, f64),
    pub margins: Margins,
    pub projection: Option<Crs>,
    pub auto_project: Option<bool>,
    pub theme: Theme,
    pub dpi: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            title: None,
            subtitle: None,
            source: None,
            credit: None,
            figure_size: (12.0, 8.0),
            margins: Margins::default(),
            projection: None,
            auto_project: None,
            theme: Theme::default(),
            dpi: 100,
        }
    }
}

/// Full render configuration.
#[derive(Debug, Clone)]
pub struct ChoroplethConfig {
    /// Base colormap name used when the legend names no palette.
    pub cmap: String,
    pub missing_color: Rgba,
    pub edge_color: Rgba,
    pub line_width: f64,
    /// `None` renders without a legend (values still shade via min/max).
    pub legend: Option<LegendConfig>,
    pub layout: LayoutConfig,
    pub auto_project: bool,
    /// Explicit target CRS; always wins over auto-projection.
    pub projection: Option<Crs>,
}

impl Default for ChoroplethConfig {
    fn default() -> Self {
        ChoroplethConfig {
            cmap: "YlOrRd".to_string(),
            missing_color: MISSING_DATA,
            edge_color: Rgba::rgb(255, 255, 255),
            line_width: 0.5,
            legend: Some(LegendConfig::default()),
            layout: LayoutConfig::default(),
            auto_project: true,
            projection: None,
        }
    }
}

struct Resolved {
    table: GeoTable,
    values: Vec<Option<f64>>,
    mapping: Option<ColorMapping>,
    legend: Option<LegendPanel>,
    map_rect: Rect,
}

/// Top-legend spacing used by the composer (tighter than the engine defaults).
fn rects_for(location: LegendLocation, margins: Margins) -> Result<LayoutRects, layout::LayoutError> {
    let opts = match location {
        LegendLocation::Top => TopLegendOptions {
            width_frac: 0.3,
            height_frac: 0.02,
            top_offset: 0.03,
            gap_frac: 0.01,
            ..TopLegendOptions::default()
        },
        _ => TopLegendOptions::default(),
    };
    layout::legend_rectangles(location, margins, &opts)
}

fn resolve_figure(table: &GeoTable, value: &str, cfg: &ChoroplethConfig) -> Result<Resolved> {
    // projection: explicit override wins, then the auto rules, else as-is
    let effective_auto = cfg.layout.auto_project.unwrap_or(cfg.auto_project);
    let override_crs = cfg
        .projection
        .clone()
        .or_else(|| cfg.layout.projection.clone());
    let plot_table = if let Some(target) = override_crs {
        projection::transform_table(table, &target)
            .with_context(|| format!("projecting dataset to {target}"))?
    } else if effective_auto {
        projection::ensure_projected(table.clone(), None)
    } else {
        table.clone()
    };

    let values: Vec<Option<f64>> = plot_table
        .column(value)
        .ok_or_else(|| anyhow!("column {value:?} not found in dataset"))?
        .to_vec();

    let mut mapping = None;
    let mut panel = None;
    let mut map_rect = layout::map_only_rect(cfg.layout.margins)?;

    match &cfg.legend {
        Some(legend) => match legend.kind {
            LegendKind::Binned => {
                let (palette_name, palette_n) = match &legend.palette {
                    Some((name, n)) => (Some(name.as_str()), Some(*n)),
                    None => (None, None),
                };
                let breaks = match &legend.breaks {
                    Some(b) => b.clone(),
                    None => {
                        if let Some(scheme) = legend.scheme {
                            classify::compute_breaks(&values, scheme, palette_n.unwrap_or(legend.k))
                        } else if let Some(n) = palette_n {
                            classify::compute_breaks(&values, Scheme::EqualInterval, n)
                        } else {
                            return Err(ConfigError::InvalidBinnedLegend.into());
                        }
                    }
                };
                // an empty break list means an empty series: render without a legend
                if breaks.len() >= 2 {
                    let labels = legend
                        .labels
                        .clone()
                        .unwrap_or_else(|| classify::interval_labels(&breaks));
                    let base = palette_name.unwrap_or(cfg.cmap.as_str());
                    let colors =
                        palette::discrete_palette(base, palette_n.unwrap_or(breaks.len() - 1))?;
                    let rects = rects_for(legend.location, cfg.layout.margins)?;
                    map_rect = rects.map_rect;
                    panel = rects.legend_rect.map(|rect| LegendPanel {
                        rect,
                        orientation: rects.enforced.unwrap_or(legend.orientation),
                        title: legend.title.clone(),
                        labels,
                    });
                    mapping = Some(ColorMapping::Binned { breaks, colors });
                }
            }
            LegendKind::Continuous => {
                let (vmin, vmax) = match (legend.vmin, legend.vmax) {
                    (Some(lo), Some(hi)) if lo < hi => (lo, hi),
                    _ => return Err(ConfigError::InvalidContinuousLegend.into()),
                };
                let ramp = palette::resolve_palette(&cfg.cmap)?;
                let rects = rects_for(legend.location, cfg.layout.margins)?;
                map_rect = rects.map_rect;
                panel = rects.legend_rect.map(|rect| LegendPanel {
                    rect,
                    orientation: rects.enforced.unwrap_or(legend.orientation),
                    title: legend.title.clone(),
                    labels: Vec::new(),
                });
                mapping = Some(ColorMapping::Continuous { vmin, vmax, ramp });
            }
        },
        None => {
            // no legend requested: still shade by value over the series range
            let finite: Vec<f64> = values
                .iter()
                .flatten()
                .copied()
                .filter(|v| v.is_finite())
                .collect();
            let lo = finite.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            if lo.is_finite() && hi.is_finite() {
                let (vmin, vmax) = if lo < hi { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
                mapping = Some(ColorMapping::Continuous {
                    vmin,
                    vmax,
                    ramp: palette::resolve_palette(&cfg.cmap)?,
                });
            }
        }
    }

    Ok(Resolved {
        table: plot_table,
        values,
        mapping,
        legend: panel,
        map_rect,
    })
}

/// Render a choropleth of `table[value]` to `out_path`.
///
/// Output format follows the extension: `.svg` gets the SVG backend,
/// everything else the bitmap backend. Figure pixels are
/// `figure_size * dpi`. Optional text fields are simply omitted when absent.
pub fn render_choropleth<P: AsRef<Path>>(
    table: &GeoTable,
    value: &str,
    out_path: P,
    cfg: &ChoroplethConfig,
) -> Result<()> {
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();
    let (w_in, h_in) = cfg.layout.figure_size;
    let dpi = cfg.layout.dpi.max(1);
    let width = (w_in * dpi as f64).round().max(1.0) as u32;
    let height = (h_in * dpi as f64).round().max(1.0) as u32;

    let resolved = resolve_figure(table, value, cfg)?;
    let spec = FigureSpec {
        table: &resolved.table,
        values: &resolved.values,
        mapping: resolved.mapping,
        legend: resolved.legend,
        map_rect: resolved.map_rect,
        text: TextBlocks {
            title: cfg.layout.title.clone(),
            subtitle: cfg.layout.subtitle.clone(),
            source: cfg.layout.source.clone(),
            credit: cfg.layout.credit.clone(),
        },
        theme: &cfg.layout.theme,
        margins: cfg.layout.margins,
        missing_color: cfg.missing_color,
        edge_color: cfg.edge_color,
        line_width: cfg.line_width,
        dpi,
    };

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        render::draw_figure(&root, &spec)?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        render::draw_figure(&root, &spec)?;
    }
    Ok(())
}

/// Convenience: render with the default configuration.
pub fn render_choropleth_default<P: AsRef<Path>>(
    table: &GeoTable,
    value: &str,
    out_path: P,
) -> Result<()> {
    render_choropleth(table, value, out_path, &ChoroplethConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, MultiPolygon, Polygon};

    fn square(x0: f64, y0: f64) -> MultiPolygon<f64> {
        let ring = LineString::from(vec![
            (x0, y0),
            (x0 + 1.0, y0),
            (x0 + 1.0, y0 + 1.0),
            (x0, y0 + 1.0),
            (x0, y0),
        ]);
        MultiPolygon(vec![Polygon::new(ring, vec![])])
    }

    fn table(values: Vec<Option<f64>>) -> GeoTable {
        let geoms = (0..values.len()).map(|i| square(i as f64 * 2.0, 0.0)).collect();
        GeoTable::new(geoms, None).with_column("v", values)
    }

    #[test]
    fn binned_without_any_source_is_an_error() {
        let cfg = ChoroplethConfig {
            legend: Some(LegendConfig {
                scheme: None,
                ..LegendConfig::default()
            }),
            ..ChoroplethConfig::default()
        };
        let t = table(vec![Some(1.0), Some(2.0)]);
        let err = resolve_figure(&t, "v", &cfg).unwrap_err();
        assert!(err.to_string().contains("binned legend"));
    }

    #[test]
    fn continuous_without_range_is_an_error() {
        let cfg = ChoroplethConfig {
            legend: Some(LegendConfig {
                kind: LegendKind::Continuous,
                vmin: Some(4.0),
                vmax: Some(4.0),
                ..LegendConfig::default()
            }),
            ..ChoroplethConfig::default()
        };
        let t = table(vec![Some(1.0), Some(2.0)]);
        assert!(resolve_figure(&t, "v", &cfg).is_err());
    }

    #[test]
    fn empty_series_renders_without_a_legend() {
        let t = table(vec![None, None]);
        let resolved = resolve_figure(&t, "v", &ChoroplethConfig::default()).unwrap();
        assert!(resolved.legend.is_none());
        assert!(resolved.mapping.is_none());
    }

    #[test]
    fn derived_breaks_size_the_palette() {
        let t = table(vec![Some(1.0), Some(2.0), Some(3.0), Some(8.0), Some(9.0)]);
        let resolved = resolve_figure(&t, "v", &ChoroplethConfig::default()).unwrap();
        let Some(ColorMapping::Binned { breaks, colors }) = resolved.mapping else {
            panic!("expected binned mapping");
        };
        assert_eq!(breaks.len(), 6);
        assert_eq!(colors.len(), 5);
        let panel = resolved.legend.unwrap();
        assert_eq!(panel.labels.len(), 5);
        assert_eq!(panel.orientation, Orientation::Horizontal);
    }

    #[test]
    fn missing_column_is_an_error() {
        let t = table(vec![Some(1.0)]);
        assert!(resolve_figure(&t, "nope", &ChoroplethConfig::default()).is_err());
    }

    #[test]
    fn palette_count_overrides_class_count() {
        let cfg = ChoroplethConfig {
            legend: Some(LegendConfig {
                palette: Some(("Blues".to_string(), 4)),
                scheme: Some(Scheme::EqualInterval),
                ..LegendConfig::default()
            }),
            ..ChoroplethConfig::default()
        };
        let t = table(vec![Some(0.0), Some(10.0), Some(20.0), Some(30.0)]);
        let resolved = resolve_figure(&t, "v", &cfg).unwrap();
        let Some(ColorMapping::Binned { breaks, colors }) = resolved.mapping else {
            panic!("expected binned mapping");
        };
        assert_eq!(breaks.len(), 5);
        assert_eq!(colors.len(), 4);
    }
}
