//! Run configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! reproduces the standard run:
//!
//! ```toml
//! [input]
//! dir = "."
//! file_stem = "poleblock"
//! file_count = 11
//!
//! [network]
//! radius_m = 2000.0
//! network_type = "drive"
//! timeout_secs = 180
//! overpass_url = "https://overpass-api.de/api/interpreter"
//! strongly_connected = false
//! # pbf_path = "region.osm.pbf"
//!
//! [network.speeds]
//! # Both unset: missing speeds come from observed `maxspeed` values only.
//! # fallback_kph = 32.0
//! # highway_kph = { residential = 32.0, primary = 72.0 }
//!
//! [output]
//! dir = "OUTPUT_GEOJSON"
//! nodes_file = "road_network_nodes.geojson"
//! edges_file = "road_network_edges.geojson"
//! poles_file = "meter_poles_snapped.geojson"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use ps_core::GeoPoint;
use ps_output::OutputFiles;
use ps_spatial::{DEFAULT_OVERPASS_URL, GraphOptions, NetworkQuery, NetworkType, SpeedSettings};

use crate::{PipelineError, PipelineResult};

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input:   InputConfig,
    pub network: NetworkConfig,
    pub output:  OutputConfig,
}

/// Where the pole CSV files are.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub dir:        PathBuf,
    /// Files are `{file_stem}1.csv` … `{file_stem}{file_count}.csv`.
    pub file_stem:  String,
    pub file_count: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("."), file_stem: "poleblock".into(), file_count: 11 }
    }
}

/// What network to fetch and how to build it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub radius_m:           f64,
    pub network_type:       NetworkType,
    /// Bounds both the HTTP client and the server-side query.
    pub timeout_secs:       u64,
    pub overpass_url:       String,
    pub strongly_connected: bool,
    /// Read from this PBF extract instead of Overpass.
    pub pbf_path:           Option<PathBuf>,
    pub speeds:             SpeedSettings,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            radius_m:           2_000.0,
            network_type:       NetworkType::Drive,
            timeout_secs:       180,
            overpass_url:       DEFAULT_OVERPASS_URL.into(),
            strongly_connected: false,
            pbf_path:           None,
            speeds:             SpeedSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir:        PathBuf,
    pub nodes_file: String,
    pub edges_file: String,
    pub poles_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let files = OutputFiles::default();
        Self {
            dir:        PathBuf::from("OUTPUT_GEOJSON"),
            nodes_file: files.nodes,
            edges_file: files.edges,
            poles_file: files.poles,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> PipelineResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Reject values no run can succeed with.
    pub fn validate(&self) -> PipelineResult<()> {
        let fail = |msg: String| Err(PipelineError::Config(msg));
        if self.input.file_count == 0 {
            return fail("input.file_count must be at least 1".into());
        }
        if self.input.file_stem.is_empty() {
            return fail("input.file_stem must not be empty".into());
        }
        if !(self.network.radius_m.is_finite() && self.network.radius_m > 0.0) {
            return fail(format!("network.radius_m must be positive, got {}", self.network.radius_m));
        }
        if self.network.timeout_secs == 0 {
            return fail("network.timeout_secs must be positive".into());
        }
        let speeds = &self.network.speeds;
        if let Some((class, kph)) = speeds.highway_kph.iter().find(|&(_, &v)| !(v.is_finite() && v > 0.0)) {
            return fail(format!("network.speeds.highway_kph.{class} must be positive, got {kph}"));
        }
        if speeds.fallback_kph.is_some_and(|v| !(v.is_finite() && v > 0.0)) {
            return fail("network.speeds.fallback_kph must be positive".into());
        }
        if self.output.nodes_file.is_empty()
            || self.output.edges_file.is_empty()
            || self.output.poles_file.is_empty()
        {
            return fail("output file names must not be empty".into());
        }
        Ok(())
    }

    /// CSV file names to look for, in load order.
    pub fn expected_files(&self) -> Vec<String> {
        ps_ingest::expected_files(&self.input.file_stem, self.input.file_count)
    }

    pub fn output_files(&self) -> OutputFiles {
        OutputFiles {
            nodes: self.output.nodes_file.clone(),
            edges: self.output.edges_file.clone(),
            poles: self.output.poles_file.clone(),
        }
    }

    pub fn query(&self, center: GeoPoint) -> NetworkQuery {
        NetworkQuery { center, radius_m: self.network.radius_m, network_type: self.network.network_type }
    }

    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions { strongly_connected: self.network.strongly_connected, simplify: true }
    }
}
