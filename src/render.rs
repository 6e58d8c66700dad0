//! Plotters-backed drawing: polygon shading, colorbars, and text blocks.
//!
//! The composer resolves colors and rectangles; this module only turns them
//! into backend draw calls. Text is drawn best-effort: a missing font logs a
//! warning instead of failing the whole figure.

use crate::classify::fmt_number;
use crate::layout::{Margins, Orientation, Rect};
use crate::models::GeoTable;
use crate::palette::{PaletteSource, Rgba};
use crate::style::Theme;
use anyhow::Result;
use log::warn;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use std::sync::Once;

/// One-time registration of a fallback "sans-serif" face for the `ab_glyph`
/// text path, which does not discover OS fonts on its own. Checked locations
/// cover the usual Linux and macOS installs; `CHOROMAP_FONT` overrides.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let mut candidates: Vec<String> = Vec::new();
        if let Ok(path) = std::env::var("CHOROMAP_FONT") {
            candidates.push(path);
        }
        candidates.extend(
            [
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/TTF/DejaVuSans.ttf",
                "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
                "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
                "/System/Library/Fonts/Supplemental/Arial.ttf",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        for path in candidates {
            if let Ok(bytes) = std::fs::read(&path) {
                let data: &'static [u8] = Box::leak(bytes.into_boxed_slice());
                if plotters::style::register_font("sans-serif", FontStyle::Normal, data).is_ok() {
                    return;
                }
            }
        }
        warn!("no usable sans-serif font found; figure text will be skipped");
    });
}

/// How feature values map to fill colors.
#[derive(Debug, Clone)]
pub enum ColorMapping {
    Binned { breaks: Vec<f64>, colors: Vec<Rgba> },
    Continuous { vmin: f64, vmax: f64, ramp: PaletteSource },
}

impl ColorMapping {
    pub fn color_for(&self, v: f64) -> Rgba {
        match self {
            ColorMapping::Binned { breaks, colors } => {
                let nbins = breaks.len().saturating_sub(1).max(1);
                let mut idx = 0;
                for (i, w) in breaks.windows(2).enumerate() {
                    if v >= w[0] {
                        idx = i;
                    }
                }
                // proportional when the palette size differs from the bin count
                let ci = idx * colors.len() / nbins;
                colors[ci.min(colors.len() - 1)]
            }
            ColorMapping::Continuous { vmin, vmax, ramp } => {
                let t = (v - vmin) / (vmax - vmin);
                ramp.sample(t)
            }
        }
    }
}

/// Resolved legend artwork: where it goes and what it says.
#[derive(Debug, Clone)]
pub struct LegendPanel {
    pub rect: Rect,
    pub orientation: Orientation,
    pub title: Option<String>,
    /// Per-bin tick labels; empty for continuous legends.
    pub labels: Vec<String>,
}

/// Title, subtitle and footer strings; absent fields are simply omitted.
#[derive(Debug, Clone, Default)]
pub struct TextBlocks {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub source: Option<String>,
    pub credit: Option<String>,
}

/// Everything the composer resolved for one figure.
pub struct FigureSpec<'a> {
    pub table: &'a GeoTable,
    pub values: &'a [Option<f64>],
    pub mapping: Option<ColorMapping>,
    pub legend: Option<LegendPanel>,
    pub map_rect: Rect,
    pub text: TextBlocks,
    pub theme: &'a Theme,
    pub margins: Margins,
    pub missing_color: Rgba,
    pub edge_color: Rgba,
    pub line_width: f64,
    pub dpi: u32,
}

fn to_plotters(c: Rgba) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a as f64 / 255.0)
}

/// Normalized bottom-left rect to pixel top-left rect.
fn to_pixels(rect: &Rect, width: u32, height: u32) -> (i32, i32, i32, i32) {
    let w = width as f64;
    let h = height as f64;
    (
        (rect.x * w).round() as i32,
        ((1.0 - rect.y - rect.h) * h).round() as i32,
        (rect.w * w).round() as i32,
        (rect.h * h).round() as i32,
    )
}

fn draw_text_best_effort<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    s: &str,
    pos: (i32, i32),
    style: &TextStyle,
) {
    if let Err(e) = root.draw(&Text::new(s.to_string(), pos, style.clone())) {
        warn!("skipping text {s:?}: {e:?}");
    }
}

/// Draw the complete figure onto `root`.
pub fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &FigureSpec<'_>,
) -> Result<()> {
    ensure_fonts_registered();
    root.fill(&WHITE).map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let (width, height) = root.dim_in_pixel();
    draw_polygons(root, spec, width, height)?;
    if let Some(panel) = &spec.legend {
        match &spec.mapping {
            Some(ColorMapping::Binned { colors, .. }) => {
                draw_binned_colorbar(root, spec, panel, colors, width, height)?;
            }
            Some(ColorMapping::Continuous { vmin, vmax, ramp }) => {
                draw_continuous_colorbar(root, spec, panel, *vmin, *vmax, ramp, width, height)?;
            }
            None => {}
        }
    }
    draw_text_blocks(root, spec, width, height);
    root.present().map_err(|e| anyhow::anyhow!("{:?}", e))?;
    Ok(())
}

fn draw_polygons<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &FigureSpec<'_>,
    width: u32,
    height: u32,
) -> Result<()> {
    let Some(bounds) = spec.table.bounds() else {
        return Ok(()); // empty table: nothing to shade
    };
    let (px, py, pw, ph) = to_pixels(&spec.map_rect, width, height);

    // fit the data extent into the map rect, preserving aspect ratio
    let dx = (bounds.max_x - bounds.min_x).max(f64::EPSILON);
    let dy = (bounds.max_y - bounds.min_y).max(f64::EPSILON);
    let scale = (pw as f64 / dx).min(ph as f64 / dy);
    let off_x = px as f64 + (pw as f64 - dx * scale) / 2.0;
    let off_y = py as f64 + (ph as f64 - dy * scale) / 2.0;
    let project = |x: f64, y: f64| -> (i32, i32) {
        (
            (off_x + (x - bounds.min_x) * scale).round() as i32,
            (off_y + (bounds.max_y - y) * scale).round() as i32,
        )
    };

    let stroke = (spec.line_width.round() as u32).max(1);
    let edge = to_plotters(spec.edge_color);

    for (i, mp) in spec.table.geometries.iter().enumerate() {
        let value = spec.values.get(i).copied().flatten();
        let fill = match (value, &spec.mapping) {
            (Some(v), Some(mapping)) => mapping.color_for(v),
            _ => spec.missing_color,
        };
        for poly in &mp.0 {
            let exterior: Vec<(i32, i32)> = poly
                .exterior()
                .coords()
                .map(|c| project(c.x, c.y))
                .collect();
            root.draw(&Polygon::new(exterior.clone(), to_plotters(fill).filled()))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            // holes are punched by refilling with the background
            for interior in poly.interiors() {
                let ring: Vec<(i32, i32)> =
                    interior.coords().map(|c| project(c.x, c.y)).collect();
                root.draw(&Polygon::new(ring.clone(), WHITE.filled()))
                    .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                root.draw(&PathElement::new(ring, edge.stroke_width(stroke)))
                    .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            }
            root.draw(&PathElement::new(exterior, edge.stroke_width(stroke)))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
    }
    Ok(())
}

fn draw_colorbar_frame<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &FigureSpec<'_>,
    panel: &LegendPanel,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
) -> Result<()> {
    let outline = to_plotters(spec.theme.outline_color);
    let stroke = (spec.theme.outline_width.round() as u32).max(1);
    root.draw(&Rectangle::new(
        [(x, y), (x + w, y + h)],
        outline.stroke_width(stroke),
    ))
    .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    if let Some(title) = &panel.title {
        let title_px = spec.theme.px(spec.theme.legend_title_pt, spec.dpi);
        let style = TextStyle::from(theme_font(spec, title_px, FontStyle::Bold))
            .color(&to_plotters(spec.theme.text_color))
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        draw_text_best_effort(root, title, (x + w / 2, y - 4), &style);
    }
    Ok(())
}

fn theme_font<'a>(spec: &'a FigureSpec<'_>, px: u32, style: FontStyle) -> FontDesc<'a> {
    FontDesc::new(
        FontFamily::Name(spec.theme.font_family.as_str()),
        px as f64,
        style,
    )
}

fn tick_style<'a>(spec: &'a FigureSpec<'_>, pos: Pos) -> TextStyle<'a> {
    let tick_px = spec.theme.px(spec.theme.tick_pt, spec.dpi);
    TextStyle::from(theme_font(spec, tick_px, FontStyle::Normal))
        .color(&to_plotters(spec.theme.text_color))
        .pos(pos)
}

fn draw_binned_colorbar<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &FigureSpec<'_>,
    panel: &LegendPanel,
    colors: &[Rgba],
    width: u32,
    height: u32,
) -> Result<()> {
    let (x, y, w, h) = to_pixels(&panel.rect, width, height);
    let k = colors.len().max(1) as i32;

    for (i, color) in colors.iter().enumerate() {
        let i = i as i32;
        let cell = match panel.orientation {
            Orientation::Horizontal => {
                let x0 = x + i * w / k;
                let x1 = x + (i + 1) * w / k;
                [(x0, y), (x1, y + h)]
            }
            Orientation::Vertical => {
                // low values at the bottom
                let y0 = y + h - (i + 1) * h / k;
                let y1 = y + h - i * h / k;
                [(x, y0), (x + w, y1)]
            }
        };
        root.draw(&Rectangle::new(cell, to_plotters(*color).filled()))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    draw_colorbar_frame(root, spec, panel, x, y, w, h)?;

    // one label per color segment, centered on the segment
    for (i, label) in panel.labels.iter().enumerate() {
        let i = i as i32;
        match panel.orientation {
            Orientation::Horizontal => {
                let cx = x + i * w / k + w / (2 * k);
                let style = tick_style(spec, Pos::new(HPos::Center, VPos::Top));
                draw_text_best_effort(root, label, (cx, y + h + 4), &style);
            }
            Orientation::Vertical => {
                let cy = y + h - i * h / k - h / (2 * k);
                let style = tick_style(spec, Pos::new(HPos::Left, VPos::Center));
                draw_text_best_effort(root, label, (x + w + 6, cy), &style);
            }
        }
    }
    Ok(())
}

fn draw_continuous_colorbar<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &FigureSpec<'_>,
    panel: &LegendPanel,
    vmin: f64,
    vmax: f64,
    ramp: &PaletteSource,
    width: u32,
    height: u32,
) -> Result<()> {
    let (x, y, w, h) = to_pixels(&panel.rect, width, height);
    let steps = match panel.orientation {
        Orientation::Horizontal => w.max(1),
        Orientation::Vertical => h.max(1),
    };
    for i in 0..steps {
        let t = i as f64 / (steps - 1).max(1) as f64;
        let color = to_plotters(ramp.sample(t)).filled();
        let cell = match panel.orientation {
            Orientation::Horizontal => [(x + i, y), (x + i + 1, y + h)],
            Orientation::Vertical => [(x, y + h - i - 1), (x + w, y + h - i)],
        };
        root.draw(&Rectangle::new(cell, color))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    draw_colorbar_frame(root, spec, panel, x, y, w, h)?;

    let (lo, hi) = (fmt_number(vmin), fmt_number(vmax));
    match panel.orientation {
        Orientation::Horizontal => {
            let style = tick_style(spec, Pos::new(HPos::Center, VPos::Top));
            draw_text_best_effort(root, &lo, (x, y + h + 4), &style);
            draw_text_best_effort(root, &hi, (x + w, y + h + 4), &style);
        }
        Orientation::Vertical => {
            let style = tick_style(spec, Pos::new(HPos::Left, VPos::Center));
            draw_text_best_effort(root, &lo, (x + w + 6, y + h), &style);
            draw_text_best_effort(root, &hi, (x + w + 6, y), &style);
        }
    }
    Ok(())
}

fn draw_text_blocks<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &FigureSpec<'_>,
    width: u32,
    height: u32,
) {
    let w = width as f64;
    let h = height as f64;
    let left_px = (spec.margins.left * w).round() as i32;
    let right_px = ((1.0 - spec.margins.right) * w).round() as i32;
    let text_color = to_plotters(spec.theme.text_color);
    let muted = to_plotters(spec.theme.muted_color);

    if let Some(title) = &spec.text.title {
        let px = spec.theme.px(spec.theme.title_pt, spec.dpi);
        let style = TextStyle::from(theme_font(spec, px, FontStyle::Bold))
            .color(&text_color)
            .pos(Pos::new(HPos::Left, VPos::Top));
        draw_text_best_effort(root, title, (left_px, (0.01 * h).round() as i32), &style);
    }
    if let Some(subtitle) = &spec.text.subtitle {
        let px = spec.theme.px(spec.theme.subtitle_pt, spec.dpi);
        let style = TextStyle::from(theme_font(spec, px, FontStyle::Normal))
            .color(&text_color)
            .pos(Pos::new(HPos::Left, VPos::Top));
        draw_text_best_effort(root, subtitle, (left_px, (0.043 * h).round() as i32), &style);
    }

    let footer_y = ((1.0 - spec.margins.bottom * 0.6) * h).round() as i32;
    let footer_px = spec.theme.px(spec.theme.source_pt, spec.dpi);
    if let Some(source) = &spec.text.source {
        let style = TextStyle::from(theme_font(spec, footer_px, FontStyle::Normal))
            .color(&muted)
            .pos(Pos::new(HPos::Left, VPos::Bottom));
        draw_text_best_effort(root, source, (left_px, footer_y), &style);
    }
    if let Some(credit) = &spec.text.credit {
        let style = TextStyle::from(theme_font(spec, footer_px, FontStyle::Normal))
            .color(&muted)
            .pos(Pos::new(HPos::Right, VPos::Bottom));
        draw_text_best_effort(root, credit, (right_px, footer_y), &style);
    }
}
