//! GeoJSON file backend.
//!
//! Creates three files in the configured output directory:
//! - `road_network_nodes.geojson`
//! - `road_network_edges.geojson`
//! - `meter_poles_snapped.geojson`

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use geojson::Feature;
use log::debug;

use crate::features::collection;
use crate::writer::OutputWriter;
use crate::{EdgeRow, NodeRow, OutputResult, PoleRow};

/// File names of the three layers, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub nodes: String,
    pub edges: String,
    pub poles: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            nodes: "road_network_nodes.geojson".into(),
            edges: "road_network_edges.geojson".into(),
            poles: "meter_poles_snapped.geojson".into(),
        }
    }
}

/// Writes each layer as one FeatureCollection file.
pub struct GeoJsonWriter {
    dir:      PathBuf,
    files:    OutputFiles,
    written:  Vec<PathBuf>,
    finished: bool,
}

impl GeoJsonWriter {
    /// Create `dir` (and parents) if missing.
    pub fn new(dir: &Path, files: OutputFiles) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf(), files, written: Vec::new(), finished: false })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_layer(&mut self, name: &str, features: Vec<Feature>) -> OutputResult<()> {
        let path = self.dir.join(name);
        let count = features.len();
        let mut out = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut out, &collection(features))?;
        out.flush()?;
        debug!("wrote {count} features to {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

impl OutputWriter for GeoJsonWriter {
    fn write_nodes(&mut self, rows: &[NodeRow]) -> OutputResult<()> {
        let features = rows.iter().map(NodeRow::to_feature).collect::<OutputResult<Vec<_>>>()?;
        let name = self.files.nodes.clone();
        self.write_layer(&name, features)
    }

    fn write_edges(&mut self, rows: &[EdgeRow]) -> OutputResult<()> {
        let features = rows.iter().map(EdgeRow::to_feature).collect::<OutputResult<Vec<_>>>()?;
        let name = self.files.edges.clone();
        self.write_layer(&name, features)
    }

    fn write_poles(&mut self, rows: &[PoleRow]) -> OutputResult<()> {
        let features = rows.iter().map(PoleRow::to_feature).collect::<OutputResult<Vec<_>>>()?;
        let name = self.files.poles.clone();
        self.write_layer(&name, features)
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        debug!("{} GeoJSON files in {}", self.written.len(), self.dir.display());
        Ok(())
    }
}
