use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pointshade::hash::draw_lane;
use pointshade::{
    render_points, CancelToken, ColormapSpec, Execution, LodBudget, Point, Reducer, RenderConfig,
    Rendered, Rescale,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pickup hotspots of the synthetic cloud: (lon, lat, spread in degrees, weight)
const HOTSPOTS: [(f64, f64, f64, f64); 5] = [
    (-73.985, 40.758, 0.012, 0.40), // Midtown
    (-74.008, 40.711, 0.008, 0.20), // Financial District
    (-73.960, 40.780, 0.015, 0.20), // Upper East Side
    (-73.990, 40.730, 0.010, 0.15), // Village
    (-73.870, 40.770, 0.004, 0.05), // LaGuardia, outside the default view
];

/// Time point-cloud renders across zoom levels, data fractions and canvas sizes
#[derive(Parser, Debug)]
#[command(name = "pointshade-bench")]
struct Args {
    /// Synthetic points per render
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    points: usize,

    /// Canvas width (overrides the config file)
    #[arg(long)]
    width: Option<usize>,

    /// Canvas height (overrides the config file)
    #[arg(long)]
    height: Option<usize>,

    /// Zoom levels to time; LOD budget follows from each
    #[arg(long, value_delimiter = ',', default_value = "5,8,10,12,15")]
    zoom: Vec<f64>,

    /// Data fractions to time
    #[arg(long, value_delimiter = ',', default_value = "0.01,0.05,0.1,0.5,1")]
    fraction: Vec<f64>,

    /// Square canvas sizes to time
    #[arg(long, value_delimiter = ',', default_value = "500,2000")]
    sizes: Vec<usize>,

    /// Rescale method: linear, log or eq_hist
    #[arg(long)]
    how: Option<Rescale>,

    /// Colormap preset or comma-separated stop colors
    #[arg(long)]
    colormap: Option<String>,

    /// Split each chunk across the rayon pool
    #[arg(long)]
    parallel: bool,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// JSON render config used as the base for every run
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let base = base_config(&args)?;
    base.validate().context("invalid render config")?;

    info!(
        points = args.points,
        width = base.width,
        height = base.height,
        reducer = base.reducer.name(),
        how = base.how.name(),
        execution = ?base.execution,
        "starting benchmark"
    );

    println!("{:<24} {:>10} {:>10} {:>10} {:>12}", "run", "seen", "sampled", "dropped", "ms");

    for &zoom in &args.zoom {
        let config = RenderConfig {
            lod: LodBudget::from_zoom(zoom),
            ..base.clone()
        };
        let out = run(&args, &config)?;
        report(&format!("zoom {zoom}"), &out);
    }

    for &fraction in &args.fraction {
        let config = RenderConfig {
            lod: LodBudget::Fraction(fraction),
            ..base.clone()
        };
        let out = run(&args, &config)?;
        report(&format!("fraction {fraction}"), &out);
    }

    for &size in &args.sizes {
        let config = RenderConfig {
            width: size,
            height: size,
            ..base.clone()
        };
        let out = run(&args, &config)?;
        report(&format!("canvas {size}x{size}"), &out);
    }

    for execution in [Execution::Sequential, Execution::Parallel] {
        let config = RenderConfig {
            execution,
            ..base.clone()
        };
        let out = run(&args, &config)?;
        report(&format!("{execution:?}").to_lowercase(), &out);
    }

    Ok(())
}

fn base_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            RenderConfig::from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => RenderConfig::default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(how) = args.how {
        config.how = how;
    }
    if let Some(colormap) = &args.colormap {
        let stops: Vec<String> = colormap.split(',').map(|s| s.trim().to_string()).collect();
        config.colormap = if stops.len() == 1 {
            ColormapSpec::Named(stops[0].clone())
        } else {
            ColormapSpec::Stops(stops)
        };
    }
    if args.parallel {
        config.execution = Execution::Parallel;
    }
    if args.config.is_none() || args.seed != 0 {
        config.seed = args.seed;
    }
    Ok(config)
}

fn run(args: &Args, config: &RenderConfig) -> Result<Rendered> {
    let points = taxi_cloud(args.points, args.seed, &config.reducer);
    render_points(points, config, &CancelToken::new()).context("render failed")
}

fn report(label: &str, out: &Rendered) {
    println!(
        "{:<24} {:>10} {:>10} {:>10} {:>12.2}",
        label,
        out.stats.seen,
        out.stats.sampled,
        out.stats.dropped,
        out.stats.elapsed.as_secs_f64() * 1000.0
    );
}

/// Lazily generated pickups clustered around Manhattan hotspots
fn taxi_cloud(n: usize, seed: u64, reducer: &Reducer) -> impl Iterator<Item = Point> + '_ {
    (0..n as u64).map(move |i| {
        let pick = draw_lane(seed, i, 0);
        let mut acc = 0.0;
        let &(lon, lat, spread, _) = HOTSPOTS
            .iter()
            .find(|h| {
                acc += h.3;
                pick < acc
            })
            .unwrap_or(&HOTSPOTS[0]);

        // Sum of three uniforms: cheap bell-shaped offset
        let bell = |k: u64| {
            (draw_lane(seed, i, k)
                + draw_lane(seed, i, k + 1)
                + draw_lane(seed, i, k + 2)
                - 1.5)
                * spread
        };
        let x = lon + bell(1);
        let y = lat + bell(4);

        match reducer {
            Reducer::Count => Point::new(x, y),
            Reducer::Sum { .. } | Reducer::Mean { .. } => {
                let fare = 2.5 + 40.0 * draw_lane(seed, i, 7).powi(2);
                Point::weighted(x, y, fare)
            }
            Reducer::CategoricalCount { .. } => {
                let base = (draw_lane(seed, i, 8) * 5.0) as u32;
                Point::categorical(x, y, base.min(4))
            }
        }
    })
}
