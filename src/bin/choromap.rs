use anyhow::Result;
use choromap::{
    ChoroplethConfig, Crs, LegendConfig, LegendKind, LegendLocation, Orientation, Scheme, storage,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "choromap",
    version,
    about = "Make a clean choropleth from a GeoJSON file and a numeric column"
)]
struct Cli {
    /// Path to a GeoJSON FeatureCollection
    geo: PathBuf,
    /// Column name to visualize
    value: String,
    /// Output image path (.png or .svg)
    #[arg(short, long)]
    output: PathBuf,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    subtitle: Option<String>,
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    credit: Option<String>,
    /// Base colormap name (e.g. YlOrRd, Blues, viridis)
    #[arg(long, default_value = "YlOrRd")]
    cmap: String,
    #[arg(long)]
    legend_title: Option<String>,
    #[arg(long, value_enum, default_value = "binned")]
    legend_kind: LegendKindArg,
    #[arg(long, value_enum, default_value = "top")]
    legend_location: LegendLocationArg,
    #[arg(long, value_enum)]
    legend_orientation: Option<OrientationArg>,
    /// Comma-separated breaks for a binned legend (e.g. 0,10,20,30)
    #[arg(long)]
    legend_breaks: Option<String>,
    /// Comma-separated labels for a binned legend (must align with breaks)
    #[arg(long)]
    legend_labels: Option<String>,
    /// Classification scheme: quantiles, equal, natural
    #[arg(long)]
    scheme: Option<String>,
    /// Number of classes when using --scheme
    #[arg(short, default_value_t = 5)]
    k: usize,
    /// Palette name and count like Reds:5 or Spectral:7 (overrides --cmap)
    #[arg(long)]
    palette: Option<String>,
    #[arg(long)]
    vmin: Option<f64>,
    #[arg(long)]
    vmax: Option<f64>,
    /// Do not auto-project geographic data
    #[arg(long)]
    no_auto_project: bool,
    /// Target CRS (EPSG code like 5070 or a proj string)
    #[arg(long)]
    projection: Option<String>,
    /// Figure size as width,height in inches (e.g. 10,10)
    #[arg(long)]
    figsize: Option<String>,
    /// Output resolution in dots per inch
    #[arg(long, default_value_t = 300)]
    dpi: u32,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LegendKindArg {
    Binned,
    Continuous,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LegendLocationArg {
    Top,
    Bottom,
    Right,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Vertical,
    Horizontal,
}

fn parse_float_list(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(|x| {
            x.parse::<f64>()
                .map_err(|_| anyhow::anyhow!("invalid number in list: {x:?}"))
        })
        .collect()
}

fn parse_string_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// `NAME:COUNT` with an optional count; an unparsable count is ignored.
fn parse_palette(s: &str, fallback_n: usize) -> (String, usize) {
    match s.split_once(':') {
        Some((name, n)) => (
            name.trim().to_string(),
            n.trim().parse().unwrap_or(fallback_n),
        ),
        None => (s.trim().to_string(), fallback_n),
    }
}

fn parse_figsize(s: &str) -> Result<(f64, f64)> {
    let Some((w, h)) = s.split_once(',') else {
        anyhow::bail!("invalid --figsize, expected W,H");
    };
    let w: f64 = w
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid --figsize width: {w:?}"))?;
    let h: f64 = h
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid --figsize height: {h:?}"))?;
    Ok((w, h))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let table = storage::load_geojson(&cli.geo)?;

    let breaks = cli.legend_breaks.as_deref().map(parse_float_list).transpose()?;
    let labels = cli.legend_labels.as_deref().map(parse_string_list);
    let scheme = cli
        .scheme
        .as_deref()
        .map(Scheme::parse)
        .transpose()?
        .or(Some(Scheme::Quantiles));
    let palette = cli
        .palette
        .as_deref()
        .map(|s| parse_palette(s, cli.k));

    let mut cfg = ChoroplethConfig::default();
    cfg.cmap = cli.cmap.clone();
    cfg.auto_project = !cli.no_auto_project;
    cfg.projection = cli.projection.as_deref().map(Crs::parse);
    cfg.legend = Some(LegendConfig {
        kind: match cli.legend_kind {
            LegendKindArg::Binned => LegendKind::Binned,
            LegendKindArg::Continuous => LegendKind::Continuous,
        },
        title: cli.legend_title.clone(),
        location: match cli.legend_location {
            LegendLocationArg::Top => LegendLocation::Top,
            LegendLocationArg::Bottom => LegendLocation::Bottom,
            LegendLocationArg::Right => LegendLocation::Right,
        },
        orientation: match cli.legend_orientation {
            Some(OrientationArg::Vertical) => Orientation::Vertical,
            // top/bottom placements force horizontal anyway
            _ => Orientation::Horizontal,
        },
        breaks,
        labels,
        vmin: cli.vmin,
        vmax: cli.vmax,
        scheme,
        k: cli.k,
        palette,
    });
    cfg.layout.title = cli.title.clone();
    cfg.layout.subtitle = cli.subtitle.clone();
    cfg.layout.source = cli.source.clone();
    cfg.layout.credit = cli.credit.clone();
    cfg.layout.dpi = cli.dpi;
    if let Some(figsize) = cli.figsize.as_deref() {
        cfg.layout.figure_size = parse_figsize(figsize)?;
    }

    choromap::render_choropleth(&table, &cli.value, &cli.output, &cfg)?;
    eprintln!(
        "Wrote choropleth of {} ({} features) to {}",
        cli.value,
        table.len(),
        cli.output.display()
    );
    Ok(())
}
