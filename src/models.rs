//! Dataset model: polygon geometries plus an attribute table.

use crate::projection::Crs;
use geo_types::MultiPolygon;
use std::collections::BTreeMap;

/// Axis-aligned bounds of a geometry collection, in the units of its CRS.
///
/// Invariant: `min_x <= max_x` and `min_y <= max_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Build from an iterator of `(x, y)` coordinates. `None` if the iterator is empty.
    pub fn from_coords<I: IntoIterator<Item = (f64, f64)>>(coords: I) -> Option<Self> {
        let mut it = coords.into_iter();
        let (x0, y0) = it.next()?;
        let mut bb = BoundingBox {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            bb.min_x = bb.min_x.min(x);
            bb.min_y = bb.min_y.min(y);
            bb.max_x = bb.max_x.max(x);
            bb.max_y = bb.max_y.max(y);
        }
        Some(bb)
    }

    /// The larger of the two axis spans.
    pub fn largest_span(&self) -> f64 {
        (self.max_x - self.min_x).max(self.max_y - self.min_y)
    }

    /// Center point `(mid_x, mid_y)`.
    pub fn midpoint(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// A polygon dataset: one `MultiPolygon` per row plus named numeric columns.
///
/// Rows in `columns` align with `geometries` by index. Constructed fresh per
/// render call; the core never mutates a table it was handed.
#[derive(Debug, Clone)]
pub struct GeoTable {
    pub geometries: Vec<MultiPolygon<f64>>,
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
    pub crs: Option<Crs>,
}

impl GeoTable {
    pub fn new(geometries: Vec<MultiPolygon<f64>>, crs: Option<Crs>) -> Self {
        Self {
            geometries,
            columns: BTreeMap::new(),
            crs,
        }
    }

    /// Attach a numeric column. The column must have one entry per geometry.
    pub fn with_column(mut self, name: &str, values: Vec<Option<f64>>) -> Self {
        self.columns.insert(name.to_string(), values);
        self
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// Bounds over every coordinate of every ring. `None` for an empty table.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_coords(self.coords())
    }

    /// Flat iterator over all coordinates (exterior and interior rings).
    pub fn coords(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.geometries.iter().flat_map(|mp| {
            mp.0.iter().flat_map(|poly| {
                poly.exterior()
                    .coords()
                    .chain(poly.interiors().iter().flat_map(|r| r.coords()))
                    .map(|c| (c.x, c.y))
            })
        })
    }
}
