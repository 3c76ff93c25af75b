//! `polesnap`: snap utility poles to their nearest road intersection.
//!
//! Reads `poleblock1.csv` … `poleblock11.csv`, downloads the drivable road
//! network around the poles, and writes three GeoJSON files.
//!
//! Run with:
//!   cargo run -p polesnap --release -- --input-dir data
//!
//! Logging is controlled by `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ps_pipeline::{PipelineConfig, make_source, run};

#[derive(Debug, Parser)]
#[command(name = "polesnap", version, about)]
struct Cli {
    /// TOML configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory containing the pole CSV files.
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory for the GeoJSON output (created if missing).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Search radius around the pole centroid, in metres.
    #[arg(long)]
    radius_m: Option<f64>,

    /// Network download timeout, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Overpass API endpoint.
    #[arg(long)]
    overpass_url: Option<String>,

    /// Read the road network from a local OSM PBF extract instead.
    #[arg(long)]
    pbf: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = self.input_dir {
            config.input.dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output.dir = dir;
        }
        if let Some(r) = self.radius_m {
            config.network.radius_m = r;
        }
        if let Some(t) = self.timeout_secs {
            config.network.timeout_secs = t;
        }
        if let Some(url) = self.overpass_url {
            config.network.overpass_url = url;
        }
        if let Some(pbf) = self.pbf {
            config.network.pbf_path = Some(pbf);
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn try_main(cli: Cli) -> Result<()> {
    let t0 = Instant::now();
    let config = cli.into_config()?;
    let source = make_source(&config)?;

    let summary = run(&config, source.as_ref())?;

    info!(
        poles = summary.poles_snapped,
        dropped = summary.rows_dropped,
        nodes = summary.nodes,
        edges = summary.edges,
        "finished in {:.1}s",
        t0.elapsed().as_secs_f64()
    );
    for path in &summary.outputs {
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    match try_main(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
