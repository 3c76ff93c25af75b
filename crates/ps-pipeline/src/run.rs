//! Stage orchestration.
//!
//! [`run`] executes the stages strictly in order; the first error aborts
//! the run.  Each stage is also public so callers can stop part-way, e.g.
//! to inspect the projected network.

use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};

use ps_core::{Crs, GeoPoint};
use ps_ingest::{Pole, SnappedPole, geocode, load_directory};
use ps_output::{GeoJsonWriter, export};
use ps_spatial::{
    NetworkSource, OverpassSource, RoadNetwork, SpatialError, add_edge_speeds,
    add_edge_travel_times, fetch_network,
};

use crate::{PipelineConfig, PipelineError, PipelineResult};

/// Output of [`load_poles`].
#[derive(Debug)]
pub struct LoadedPoles {
    pub poles:         Vec<Pole>,
    /// Mean pole position, the network search centre.
    pub center:        GeoPoint,
    pub files_loaded:  Vec<String>,
    pub files_skipped: Vec<String>,
    pub rows_read:     usize,
    pub rows_dropped:  usize,
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub files_loaded:  usize,
    pub files_skipped: Vec<String>,
    pub rows_read:     usize,
    pub rows_dropped:  usize,
    pub poles_snapped: usize,
    pub nodes:         usize,
    pub edges:         usize,
    pub outputs:       Vec<PathBuf>,
}

/// Pick the network provider the configuration asks for.
pub fn make_source(config: &PipelineConfig) -> PipelineResult<Box<dyn NetworkSource>> {
    if let Some(path) = &config.network.pbf_path {
        #[cfg(feature = "osm")]
        {
            return Ok(Box::new(ps_spatial::PbfSource::new(path.clone())));
        }
        #[cfg(not(feature = "osm"))]
        {
            return Err(PipelineError::Config(format!(
                "network.pbf_path = {} requires the `osm` feature",
                path.display()
            )));
        }
    }
    let timeout = Duration::from_secs(config.network.timeout_secs);
    let source = OverpassSource::new(config.network.overpass_url.clone(), timeout)?;
    Ok(Box::new(source))
}

/// Run every stage with `source` as the network provider.
pub fn run(config: &PipelineConfig, source: &dyn NetworkSource) -> PipelineResult<RunSummary> {
    config.validate()?;

    let loaded = load_poles(config)?;
    let net = fetch_projected_network(config, source, loaded.center)?;
    let snapped = snap_poles(&net, loaded.poles)?;
    let outputs = write_outputs(config, &net, &snapped)?;

    let summary = RunSummary {
        files_loaded:  loaded.files_loaded.len(),
        files_skipped: loaded.files_skipped,
        rows_read:     loaded.rows_read,
        rows_dropped:  loaded.rows_dropped,
        poles_snapped: snapped.len(),
        nodes:         net.node_count(),
        edges:         net.edge_count(),
        outputs,
    };
    info!(
        "done: {} poles snapped to a {}-node network, files in {}",
        summary.poles_snapped,
        summary.nodes,
        config.output.dir.display()
    );
    Ok(summary)
}

// ── Stage 1 + 2: load and geocode ─────────────────────────────────────────────

/// Load the CSV files and parse pole locations.
///
/// # Errors
///
/// [`PipelineError::Ingest`] when no file could be read,
/// [`PipelineError::NoValidPoles`] when none of the rows has a usable
/// location.  Either way no network is fetched.
pub fn load_poles(config: &PipelineConfig) -> PipelineResult<LoadedPoles> {
    let loaded = load_directory(&config.input.dir, &config.expected_files())?;
    if !loaded.files_skipped.is_empty() {
        warn!("{} of {} input files skipped", loaded.files_skipped.len(), config.input.file_count);
    }

    let rows_read = loaded.records.len();
    let geocoded = geocode(loaded.records);
    let Some(center) = geocoded.center() else {
        return Err(PipelineError::NoValidPoles { total: rows_read, dropped: geocoded.dropped });
    };
    info!("{} poles centred on {}", geocoded.poles.len(), center);

    Ok(LoadedPoles {
        poles: geocoded.poles,
        center,
        files_loaded: loaded.files_loaded,
        files_skipped: loaded.files_skipped,
        rows_read,
        rows_dropped: geocoded.dropped,
    })
}

// ── Stage 3: network ──────────────────────────────────────────────────────────

/// Fetch the network around `center`, project it to UTM and add speeds and
/// travel times.
pub fn fetch_projected_network(
    config: &PipelineConfig,
    source: &dyn NetworkSource,
    center: GeoPoint,
) -> PipelineResult<RoadNetwork> {
    let net = fetch_network(source, &config.query(center), config.graph_options())?;
    let mut projected = net.project_to_utm()?;
    info!("projected network to {}", projected.crs);

    add_edge_speeds(&mut projected, &config.network.speeds)?;
    add_edge_travel_times(&mut projected)?;
    Ok(projected)
}

// ── Stage 4: snap and export ──────────────────────────────────────────────────

/// Assign each pole the OSM id of the nearest node of `net`.
///
/// Pole locations are projected into `net.crs` first, so distances are in
/// metres when the network is projected.
pub fn snap_poles(net: &RoadNetwork, poles: Vec<Pole>) -> PipelineResult<Vec<SnappedPole>> {
    let to_net = Crs::Wgs84.transformer(net.crs).map_err(SpatialError::from)?;
    let coords = poles
        .iter()
        .map(|p| to_net.transform(p.location.to_coord()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(SpatialError::from)?;
    let nearest = net.nearest_nodes(&coords)?;

    let snapped: Vec<SnappedPole> = poles
        .into_iter()
        .zip(nearest)
        .map(|(pole, (node, dist))| pole.snap(net.node_osm_id[node.index()], dist))
        .collect();

    if let Some(max) = snapped.iter().map(|s| s.snap_distance_m).reduce(f64::max) {
        info!("snapped {} poles, farthest {:.1} m from its node", snapped.len(), max);
    }
    Ok(snapped)
}

/// Reproject `net` to WGS84 and write the three GeoJSON files.
pub fn write_outputs(
    config: &PipelineConfig,
    net: &RoadNetwork,
    poles: &[SnappedPole],
) -> PipelineResult<Vec<PathBuf>> {
    let wgs84 = net.to_crs(Crs::Wgs84)?;
    let mut writer = GeoJsonWriter::new(&config.output.dir, config.output_files())?;
    export(&mut writer, &wgs84, poles)?;
    Ok(writer.written().to_vec())
}
