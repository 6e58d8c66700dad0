//! choromap
//!
//! A lightweight Rust library for rendering choropleth maps from polygon
//! datasets with consistent, publication-quality layout. Pairs with the
//! `choromap` CLI.
//!
//! ### Features
//! - Automatic map-projection selection from geometry bounds (CONUS Albers,
//!   UTM zones, Web Mercator fallback)
//! - Classification into color bins: quantiles, equal intervals, Fisher-Jenks
//! - Brewer-style palettes and continuous color ramps
//! - Legend/colorbar placement (top, bottom, right) that reserves figure
//!   area relative to title and subtitle text
//! - SVG/PNG output via plotters
//!
//! ### Example
//! ```no_run
//! use choromap::{ChoroplethConfig, storage};
//!
//! let table = storage::load_geojson("counties.geojson")?;
//! let mut cfg = ChoroplethConfig::default();
//! cfg.layout.title = Some("Population density".into());
//! choromap::render_choropleth(&table, "density", "density.png", &cfg)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod classify;
pub mod layout;
pub mod models;
pub mod palette;
pub mod projection;
pub mod render;
pub mod storage;
pub mod style;

pub use api::{ChoroplethConfig, LayoutConfig, LegendConfig, render_choropleth};
pub use classify::Scheme;
pub use layout::{LegendKind, LegendLocation, Margins, Orientation};
pub use models::{BoundingBox, GeoTable};
pub use projection::Crs;
pub use style::Theme;
