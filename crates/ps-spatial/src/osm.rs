//! OSM PBF provider, enabled with the `osm` Cargo feature.
//!
//! # Usage
//!
//! ```ignore
//! use ps_spatial::{NetworkQuery, NetworkSource, PbfSource};
//!
//! let source = PbfSource::new("new_york.osm.pbf");
//! let data = source.fetch(&NetworkQuery::new(center, 2_000.0))?;
//! ```
//!
//! # What is loaded
//!
//! Ways admitted by the query's [`crate::NetworkType`] with at least one
//! node inside the query bbox, plus every node those ways reference.
//! Truncation to the bbox happens later in [`crate::build_graph`], exactly
//! as for Overpass data.
//!
//! # Memory note
//!
//! The reader buffers every OSM node position in a `HashMap<i64, OsmNode>`
//! during the single sequential pass, because ways reference nodes by id
//! and may precede them in the file.  The map is pruned to road nodes
//! before returning.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use log::info;
use osmpbf::{Element, ElementReader};

use ps_core::GeoPoint;

use crate::source::{NetworkQuery, NetworkSource, OsmData, OsmNode, OsmWay};
use crate::{SpatialError, SpatialResult};

/// Road data read from a local `.osm.pbf` extract.
#[derive(Debug, Clone)]
pub struct PbfSource {
    path: PathBuf,
}

impl PbfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NetworkSource for PbfSource {
    fn describe(&self) -> String {
        format!("PBF extract {}", self.path.display())
    }

    fn fetch(&self, query: &NetworkQuery) -> SpatialResult<OsmData> {
        if !self.path.is_file() {
            return Err(SpatialError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", self.path.display()),
            )));
        }

        // ── Phase 1: all node positions + admitted road ways ──────────────
        let reader = ElementReader::from_path(&self.path)
            .map_err(|e| SpatialError::Osm(e.to_string()))?;

        let mut data = OsmData::default();
        reader
            .for_each(|elem| match elem {
                Element::Node(n) => {
                    let node = osm_node(n.lat(), n.lon(), n.tags());
                    data.nodes.insert(n.id(), node);
                }
                Element::DenseNode(n) => {
                    let node = osm_node(n.lat(), n.lon(), n.tags());
                    data.nodes.insert(n.id(), node);
                }
                Element::Way(w) => {
                    // Collect tags eagerly so &str lifetimes don't escape the closure.
                    let tags: BTreeMap<String, String> =
                        w.tags().map(|(k, v)| (k.to_owned(), v.to_owned())).collect();
                    if query.network_type.admits(&tags) {
                        data.ways.push(OsmWay { id: w.id(), refs: w.refs().collect(), tags });
                    }
                }
                _ => {}
            })
            .map_err(|e| SpatialError::Osm(e.to_string()))?;

        // ── Phase 2: keep ways touching the bbox and the nodes they use ───
        let bbox = query.bbox();
        let nodes = &data.nodes;
        data.ways.retain(|w| {
            w.refs.iter().any(|r| nodes.get(r).is_some_and(|n| bbox.contains(n.pos)))
        });
        let used: HashSet<i64> = data.ways.iter().flat_map(|w| w.refs.iter().copied()).collect();
        data.nodes.retain(|id, _| used.contains(id));

        info!(
            "{}: {} ways, {} nodes near {}",
            self.path.display(),
            data.ways.len(),
            data.nodes.len(),
            query.center
        );
        Ok(data)
    }
}

fn osm_node<'a>(lat: f64, lon: f64, tags: impl Iterator<Item = (&'a str, &'a str)>) -> OsmNode {
    let mut node = OsmNode { pos: GeoPoint::new(lat, lon), highway: None, reference: None };
    for (k, v) in tags {
        match k {
            "highway" => node.highway = Some(v.to_owned()),
            "ref" => node.reference = Some(v.to_owned()),
            _ => {}
        }
    }
    node
}
