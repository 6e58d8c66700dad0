use choromap::{
    ChoroplethConfig, GeoTable, LegendConfig, LegendKind, LegendLocation, render_choropleth,
};
use geo_types::{LineString, MultiPolygon, Polygon};
use std::fs;
use std::path::PathBuf;

fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
    let ring = LineString::from(vec![
        (x0, y0),
        (x0 + size, y0),
        (x0 + size, y0 + size),
        (x0, y0 + size),
        (x0, y0),
    ]);
    MultiPolygon(vec![Polygon::new(ring, vec![])])
}

fn sample_table() -> GeoTable {
    let geoms = vec![
        square(0.0, 0.0, 1.0),
        square(1.2, 0.0, 1.0),
        square(0.0, 1.2, 1.0),
        square(1.2, 1.2, 1.0),
    ];
    GeoTable::new(geoms, None).with_column(
        "density",
        vec![Some(12.0), Some(45.0), None, Some(88.0)],
    )
}

fn small_config() -> ChoroplethConfig {
    let mut cfg = ChoroplethConfig::default();
    cfg.layout.figure_size = (4.0, 3.0);
    cfg.layout.dpi = 100;
    cfg
}

fn write_and_check<F: Fn(&PathBuf)>(maker: F, name: &str, ext: &str) {
    let path = std::env::temp_dir().join(format!("choromap_{name}.{ext}"));
    maker(&path);
    let meta = fs::metadata(&path).expect("file created");
    assert!(meta.len() > 0, "{} has content", path.display());
    fs::remove_file(&path).ok();
}

#[test]
fn legend_locations_produce_files() {
    let table = sample_table();
    let locations = [
        LegendLocation::Top,
        LegendLocation::Bottom,
        LegendLocation::Right,
    ];
    for (i, location) in locations.iter().enumerate() {
        write_and_check(
            |p| {
                let mut cfg = small_config();
                cfg.legend = Some(LegendConfig {
                    location: *location,
                    title: Some("Density".into()),
                    ..LegendConfig::default()
                });
                cfg.layout.title = Some("Legend placement".into());
                render_choropleth(&table, "density", p, &cfg).unwrap();
            },
            &format!("loc{i}"),
            "svg",
        );
    }
}

#[test]
fn continuous_legend_renders_png_and_svg() {
    let table = sample_table();
    for ext in ["png", "svg"] {
        write_and_check(
            |p| {
                let mut cfg = small_config();
                cfg.cmap = "viridis".into();
                cfg.legend = Some(LegendConfig {
                    kind: LegendKind::Continuous,
                    vmin: Some(0.0),
                    vmax: Some(100.0),
                    location: LegendLocation::Right,
                    ..LegendConfig::default()
                });
                render_choropleth(&table, "density", p, &cfg).unwrap();
            },
            &format!("continuous_{ext}"),
            ext,
        );
    }
}

#[test]
fn all_text_blocks_render() {
    let table = sample_table();
    write_and_check(
        |p| {
            let mut cfg = small_config();
            cfg.layout.title = Some("Population density".into());
            cfg.layout.subtitle = Some("Fictional squares, 2026".into());
            cfg.layout.source = Some("Source: made up".into());
            cfg.layout.credit = Some("Map: choromap".into());
            render_choropleth(&table, "density", p, &cfg).unwrap();
        },
        "text_blocks",
        "svg",
    );
}

#[test]
fn empty_series_renders_without_legend_or_error() {
    let geoms = vec![square(0.0, 0.0, 1.0), square(1.2, 0.0, 1.0)];
    let table = GeoTable::new(geoms, None).with_column("density", vec![None, None]);
    write_and_check(
        |p| {
            render_choropleth(&table, "density", p, &small_config()).unwrap();
        },
        "empty_series",
        "svg",
    );
}

#[test]
fn no_legend_requested_still_shades_the_map() {
    let table = sample_table();
    write_and_check(
        |p| {
            let mut cfg = small_config();
            cfg.legend = None;
            render_choropleth(&table, "density", p, &cfg).unwrap();
        },
        "no_legend",
        "svg",
    );
}

#[test]
fn explicit_breaks_and_labels_are_used() {
    let table = sample_table();
    write_and_check(
        |p| {
            let mut cfg = small_config();
            cfg.legend = Some(LegendConfig {
                breaks: Some(vec![0.0, 30.0, 60.0, 90.0]),
                labels: Some(vec!["low".into(), "mid".into(), "high".into()]),
                location: LegendLocation::Bottom,
                ..LegendConfig::default()
            });
            render_choropleth(&table, "density", p, &cfg).unwrap();
        },
        "explicit_breaks",
        "svg",
    );
}

#[test]
fn missing_column_fails_before_drawing() {
    let table = sample_table();
    let path = std::env::temp_dir().join("choromap_should_not_exist.svg");
    let err = render_choropleth(&table, "unknown", &path, &small_config());
    assert!(err.is_err());
    assert!(!path.exists());
}
