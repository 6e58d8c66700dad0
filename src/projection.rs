//! Projection selection and coordinate transforms.
//!
//! - `select_projection` picks a target planar CRS from geometry bounds
//! - `ensure_projected` applies it with a layered never-fail fallback chain
//! - Transforms run through `proj4rs` with proj strings from `crs-definitions`

use crate::models::{BoundingBox, GeoTable};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A coordinate reference system: an EPSG code or a raw proj string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    Epsg(u32),
    Proj(String),
}

/// WGS 84 geographic coordinates (degrees).
pub const WGS84: Crs = Crs::Epsg(4326);
/// Web Mercator (EPSG:3857), the last-resort target of `ensure_projected`.
pub const WEB_MERCATOR: Crs = Crs::Epsg(3857);
/// CONUS Albers Equal Area (EPSG:5070).
pub const CONUS_ALBERS: Crs = Crs::Epsg(5070);

impl Crs {
    /// Parse user input: a bare number is an EPSG code, anything else a proj string.
    pub fn parse(s: &str) -> Crs {
        match s.trim().parse::<u32>() {
            Ok(code) => Crs::Epsg(code),
            Err(_) => Crs::Proj(s.trim().to_string()),
        }
    }

    /// Proj string for this CRS, from the crs-definitions database for EPSG codes.
    pub fn proj_string(&self) -> Option<String> {
        match self {
            Crs::Epsg(code) => u16::try_from(*code)
                .ok()
                .and_then(crs_definitions::from_code)
                .map(|def| def.proj4.to_string()),
            Crs::Proj(s) => Some(s.clone()),
        }
    }

    /// Whether coordinates are in degrees (longitude/latitude) rather than linear units.
    pub fn is_geographic(&self) -> bool {
        match self {
            Crs::Epsg(code) => {
                if let Some(proj_str) = self.proj_string() {
                    proj_str.contains("+proj=longlat")
                } else {
                    // Not in the database: geographic codes cluster in 4000-4999
                    *code == 4326 || (4000..5000).contains(code)
                }
            }
            Crs::Proj(s) => s.contains("+proj=longlat"),
        }
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{code}"),
            Crs::Proj(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("dataset has no CRS; cannot transform")]
    MissingCrs,
    #[error("{0} is not in the crs-definitions database")]
    UnknownCrs(Crs),
    #[error("invalid projection {crs}: {detail}")]
    InvalidProjection { crs: Crs, detail: String },
    #[error("transform from {from} to {to} failed: {detail}")]
    Transform { from: Crs, to: Crs, detail: String },
}

/// Longitude/latitude window of the continental-US heuristic.
const CONUS_LON: (f64, f64) = (-180.0, -50.0);
const CONUS_LAT: (f64, f64) = (10.0, 75.0);

/// Spans at least this many degrees get the fixed Albers pick inside the CONUS window.
const WIDE_SPAN_DEG: f64 = 8.0;

fn is_conus_bounds(b: &BoundingBox) -> bool {
    b.min_x >= CONUS_LON.0 && b.max_x <= CONUS_LON.1 && b.min_y >= CONUS_LAT.0 && b.max_y <= CONUS_LAT.1
}

/// UTM zone CRS for a geographic midpoint: 60 zones of 6 degrees each,
/// EPSG 32600+zone north of the equator, 32700+zone south.
fn utm_crs(mid_lon: f64, mid_lat: f64) -> Crs {
    let zone = (((mid_lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u32;
    if mid_lat >= 0.0 {
        Crs::Epsg(32600 + zone)
    } else {
        Crs::Epsg(32700 + zone)
    }
}

/// Choose a target planar CRS for a geometry collection.
///
/// Rules:
/// - already projected input comes back unchanged (no-op, idempotent)
/// - wide geographic extents (span >= 8 deg) inside the continental-US
///   window get CONUS Albers (EPSG:5070)
/// - narrow extents (span < 8 deg) get the UTM zone of their midpoint
/// - otherwise the fallback if one was supplied, else the input
pub fn select_projection(bounds: &BoundingBox, current: &Crs, fallback: Option<&Crs>) -> Crs {
    if !current.is_geographic() {
        return current.clone();
    }
    let span = bounds.largest_span();
    let (mid_lon, mid_lat) = bounds.midpoint();
    if span >= WIDE_SPAN_DEG && is_conus_bounds(bounds) {
        CONUS_ALBERS
    } else if span < WIDE_SPAN_DEG {
        utm_crs(mid_lon, mid_lat)
    } else if let Some(f) = fallback {
        f.clone()
    } else {
        current.clone()
    }
}

/// Reproject a table to `target`, point by point.
pub fn transform_table(table: &GeoTable, target: &Crs) -> Result<GeoTable, ProjectionError> {
    use proj4rs::proj::Proj;
    use proj4rs::transform::transform;

    let source = table.crs.clone().ok_or(ProjectionError::MissingCrs)?;
    if source == *target {
        return Ok(table.clone());
    }

    let source_str = source
        .proj_string()
        .ok_or_else(|| ProjectionError::UnknownCrs(source.clone()))?;
    let target_str = target
        .proj_string()
        .ok_or_else(|| ProjectionError::UnknownCrs(target.clone()))?;

    let source_proj = Proj::from_proj_string(&source_str).map_err(|e| {
        ProjectionError::InvalidProjection {
            crs: source.clone(),
            detail: format!("{e:?}"),
        }
    })?;
    let target_proj = Proj::from_proj_string(&target_str).map_err(|e| {
        ProjectionError::InvalidProjection {
            crs: target.clone(),
            detail: format!("{e:?}"),
        }
    })?;

    let source_is_geographic = source.is_geographic();
    let target_is_geographic = target.is_geographic();

    let mut project_coord = |c: &Coord<f64>| -> Result<Coord<f64>, ProjectionError> {
        // proj4rs works in radians on the geographic side
        let (x_in, y_in) = if source_is_geographic {
            (c.x.to_radians(), c.y.to_radians())
        } else {
            (c.x, c.y)
        };
        let mut point = (x_in, y_in, 0.0);
        transform(&source_proj, &target_proj, &mut point).map_err(|e| {
            ProjectionError::Transform {
                from: source.clone(),
                to: target.clone(),
                detail: format!("{e:?}"),
            }
        })?;
        let (x_out, y_out) = if target_is_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        Ok(Coord { x: x_out, y: y_out })
    };

    let mut geometries = Vec::with_capacity(table.geometries.len());
    for mp in &table.geometries {
        let mut polys = Vec::with_capacity(mp.0.len());
        for poly in &mp.0 {
            let exterior = project_ring(poly.exterior(), &mut project_coord)?;
            let interiors = poly
                .interiors()
                .iter()
                .map(|r| project_ring(r, &mut project_coord))
                .collect::<Result<Vec<_>, _>>()?;
            polys.push(Polygon::new(exterior, interiors));
        }
        geometries.push(MultiPolygon(polys));
    }

    let mut out = GeoTable::new(geometries, Some(target.clone()));
    out.columns = table.columns.clone();
    Ok(out)
}

fn project_ring<F>(ring: &LineString<f64>, project: &mut F) -> Result<LineString<f64>, ProjectionError>
where
    F: FnMut(&Coord<f64>) -> Result<Coord<f64>, ProjectionError>,
{
    let coords = ring
        .coords()
        .map(project)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LineString::from(coords))
}

/// Project a geographic table to a sensible planar CRS, never failing.
///
/// Fallback chain, each tier logged when taken:
/// 1. a dataset labeled geographic whose coordinate magnitudes exceed valid
///    degree ranges is relabeled Web Mercator without touching coordinates
/// 2. the auto-selection rule of [`select_projection`] is applied
/// 3. a still-geographic result is force-transformed to Web Mercator
/// 4. any transform failure leaves the geometry unchanged
///
/// A table with no CRS comes back untouched; nothing can be inferred.
pub fn ensure_projected(table: GeoTable, fallback: Option<&Crs>) -> GeoTable {
    let Some(current) = table.crs.clone() else {
        return table;
    };
    let Some(bounds) = table.bounds() else {
        return table;
    };

    let mut working = table;
    if current.is_geographic()
        && (bounds.min_x.abs() > 180.0
            || bounds.max_x.abs() > 180.0
            || bounds.min_y.abs() > 90.0
            || bounds.max_y.abs() > 90.0)
    {
        warn!(
            "dataset labeled {current} but coordinates exceed degree ranges; relabeling as {WEB_MERCATOR}"
        );
        working.crs = Some(WEB_MERCATOR);
    }

    let effective = working.crs.clone().unwrap_or(WGS84);
    let selected = select_projection(&bounds, &effective, fallback);
    if selected != effective {
        debug!("auto-projecting {effective} -> {selected}");
        match transform_table(&working, &selected) {
            Ok(projected) => return projected,
            Err(e) => warn!("projection to {selected} failed ({e}); trying Web Mercator"),
        }
    }

    if working.crs.as_ref().is_some_and(Crs::is_geographic) {
        match transform_table(&working, &WEB_MERCATOR) {
            Ok(projected) => return projected,
            Err(e) => warn!("Web Mercator fallback failed ({e}); rendering unprojected"),
        }
    }

    working
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, Polygon};

    fn bbox(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[test]
    fn projected_input_is_a_noop() {
        let b = bbox(0.0, 0.0, 1000.0, 1000.0);
        let out = select_projection(&b, &WEB_MERCATOR, None);
        assert_eq!(out, WEB_MERCATOR);
        // idempotent on its own output
        assert_eq!(select_projection(&b, &out, None), out);
    }

    #[test]
    fn conus_bounds_pick_albers() {
        let b = bbox(-124.0, 24.0, -66.0, 50.0);
        assert_eq!(select_projection(&b, &WGS84, None), CONUS_ALBERS);
    }

    #[test]
    fn narrow_bounds_pick_utm_zone() {
        // London: mid-longitude -0.1 deg -> zone 30 north
        let b = bbox(-0.5, 51.3, 0.3, 51.7);
        assert_eq!(select_projection(&b, &WGS84, None), Crs::Epsg(32630));
        // Sydney-ish: southern hemisphere base code
        let b = bbox(150.5, -34.2, 151.5, -33.5);
        assert_eq!(select_projection(&b, &WGS84, None), Crs::Epsg(32756));
    }

    #[test]
    fn wide_non_conus_bounds_use_fallback_or_input() {
        let b = bbox(0.0, 40.0, 30.0, 60.0);
        assert_eq!(select_projection(&b, &WGS84, None), WGS84);
        assert_eq!(
            select_projection(&b, &WGS84, Some(&Crs::Epsg(3035))),
            Crs::Epsg(3035)
        );
    }

    #[test]
    fn geographic_lookup() {
        assert!(WGS84.is_geographic());
        assert!(!WEB_MERCATOR.is_geographic());
        assert!(!CONUS_ALBERS.is_geographic());
        assert!(!Crs::Epsg(32633).is_geographic());
    }

    #[test]
    fn parse_epsg_or_proj() {
        assert_eq!(Crs::parse("5070"), Crs::Epsg(5070));
        assert_eq!(
            Crs::parse("+proj=longlat +datum=WGS84"),
            Crs::Proj("+proj=longlat +datum=WGS84".into())
        );
    }

    fn unit_square_at(lon: f64, lat: f64) -> MultiPolygon<f64> {
        let ring = LineString::from(vec![
            (lon, lat),
            (lon + 0.1, lat),
            (lon + 0.1, lat + 0.1),
            (lon, lat + 0.1),
            (lon, lat),
        ]);
        MultiPolygon(vec![Polygon::new(ring, vec![])])
    }

    #[test]
    fn transform_wgs84_to_mercator_origin() {
        let table = GeoTable::new(vec![unit_square_at(-0.05, -0.05)], Some(WGS84));
        let out = transform_table(&table, &WEB_MERCATOR).unwrap();
        let b = out.bounds().unwrap();
        // origin square straddles (0, 0) in mercator meters
        assert!(b.min_x < 0.0 && b.max_x > 0.0);
        assert!(b.min_y < 0.0 && b.max_y > 0.0);
        assert_eq!(out.crs, Some(WEB_MERCATOR));
    }

    #[test]
    fn transform_roundtrip_close() {
        let table = GeoTable::new(vec![unit_square_at(15.0, 52.0)], Some(WGS84));
        let there = transform_table(&table, &Crs::Epsg(32633)).unwrap();
        let back = transform_table(&there, &WGS84).unwrap();
        let b0 = table.bounds().unwrap();
        let b1 = back.bounds().unwrap();
        assert!((b0.min_x - b1.min_x).abs() < 1e-5);
        assert!((b0.max_y - b1.max_y).abs() < 1e-5);
    }

    #[test]
    fn ensure_projected_relabels_mislabeled_geographic() {
        // mercator-scale magnitudes labeled as degrees
        let ring = LineString::from(vec![
            (1_000_000.0, 6_000_000.0),
            (1_100_000.0, 6_000_000.0),
            (1_100_000.0, 6_100_000.0),
            (1_000_000.0, 6_100_000.0),
            (1_000_000.0, 6_000_000.0),
        ]);
        let table = GeoTable::new(
            vec![MultiPolygon(vec![Polygon::new(ring, vec![])])],
            Some(WGS84),
        );
        let before = table.bounds().unwrap();
        let out = ensure_projected(table, None);
        assert_eq!(out.crs, Some(WEB_MERCATOR));
        // relabel only, coordinates untouched
        assert_eq!(out.bounds().unwrap(), before);
    }

    #[test]
    fn ensure_projected_without_crs_is_unchanged() {
        let table = GeoTable::new(vec![unit_square_at(10.0, 50.0)], None);
        let out = ensure_projected(table.clone(), None);
        assert!(out.crs.is_none());
        assert_eq!(out.bounds(), table.bounds());
    }

    #[test]
    fn ensure_projected_projects_narrow_geographic_extent() {
        let table = GeoTable::new(vec![unit_square_at(-0.1, 51.5)], Some(WGS84));
        let out = ensure_projected(table, None);
        assert_eq!(out.crs, Some(Crs::Epsg(32630)));
        // UTM eastings sit near 500 km at zone center
        let b = out.bounds().unwrap();
        assert!(b.min_x > 100_000.0 && b.max_x < 1_000_000.0);
    }
}
