//! GeoJSON input: read a FeatureCollection into a [`GeoTable`].
//!
//! Thin pass-through to the `geojson` crate: polygonal geometries are kept,
//! numeric properties become columns, everything else is skipped with a
//! warning. GeoJSON coordinates are WGS 84 by definition.

use crate::models::GeoTable;
use crate::projection::WGS84;
use anyhow::{Context, Result, bail};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{GeoJson, Value};
use log::warn;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn ring_from_positions(positions: &[Vec<f64>]) -> LineString<f64> {
    LineString::from(
        positions
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| Coord { x: p[0], y: p[1] })
            .collect::<Vec<_>>(),
    )
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let mut it = rings.iter();
    let exterior = ring_from_positions(it.next()?);
    let interiors = it.map(|r| ring_from_positions(r)).collect();
    Some(Polygon::new(exterior, interiors))
}

fn multipolygon_from_value(value: &Value) -> Option<MultiPolygon<f64>> {
    match value {
        Value::Polygon(rings) => polygon_from_rings(rings).map(|p| MultiPolygon(vec![p])),
        Value::MultiPolygon(polys) => {
            let parts: Vec<Polygon<f64>> =
                polys.iter().filter_map(|rings| polygon_from_rings(rings)).collect();
            if parts.is_empty() {
                None
            } else {
                Some(MultiPolygon(parts))
            }
        }
        _ => None,
    }
}

/// Load a GeoJSON file as a polygon table with numeric attribute columns.
pub fn load_geojson<P: AsRef<Path>>(path: P) -> Result<GeoTable> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        bail!("{} is not a GeoJSON FeatureCollection", path.display());
    };

    let mut geometries: Vec<MultiPolygon<f64>> = Vec::new();
    let mut columns: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
    let mut skipped = 0usize;

    for feature in &collection.features {
        let Some(mp) = feature
            .geometry
            .as_ref()
            .and_then(|g| multipolygon_from_value(&g.value))
        else {
            skipped += 1;
            continue;
        };
        let row = geometries.len();
        geometries.push(mp);

        if let Some(props) = &feature.properties {
            for (key, value) in props {
                if let Some(num) = value.as_f64() {
                    columns
                        .entry(key.clone())
                        .or_insert_with(|| vec![None; row])
                        .push(Some(num));
                }
            }
        }
        // pad columns this feature did not provide
        for col in columns.values_mut() {
            if col.len() <= row {
                col.push(None);
            }
        }
    }

    if skipped > 0 {
        warn!(
            "{}: skipped {skipped} feature(s) without polygonal geometry",
            path.display()
        );
    }

    let mut table = GeoTable::new(geometries, Some(WGS84));
    table.columns = columns;
    Ok(table)
}
