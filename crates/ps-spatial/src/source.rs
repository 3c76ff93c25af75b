//! Provider-neutral OSM input model and the [`NetworkSource`] seam.
//!
//! Every provider (Overpass over HTTP, a local PBF extract, a test stub)
//! returns the same [`OsmData`]: the drivable ways around the query centre
//! and every node they reference.  Graph construction in [`crate::graph`]
//! never sees where the data came from.

use std::collections::{BTreeMap, HashMap};

use ps_core::GeoPoint;
use ps_core::point::EARTH_RADIUS_M;

use crate::{NetworkType, SpatialResult};

// ── Query ─────────────────────────────────────────────────────────────────────

/// What to fetch: a drivable network within `radius_m` of `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkQuery {
    pub center:       GeoPoint,
    pub radius_m:     f64,
    pub network_type: NetworkType,
}

impl NetworkQuery {
    pub fn new(center: GeoPoint, radius_m: f64) -> Self {
        Self { center, radius_m, network_type: NetworkType::Drive }
    }

    /// Bounding box `radius_m` north/south/east/west of the centre.
    ///
    /// ```text
    /// Δlat = radius / R  (degrees)
    /// Δlon = Δlat / cos(lat)
    /// ```
    pub fn bbox(&self) -> BBox {
        let d_lat = (self.radius_m / EARTH_RADIUS_M).to_degrees();
        let d_lon = d_lat / self.center.lat.to_radians().cos();
        BBox {
            south: self.center.lat - d_lat,
            west:  self.center.lon - d_lon,
            north: self.center.lat + d_lat,
            east:  self.center.lon + d_lon,
        }
    }
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub south: f64,
    pub west:  f64,
    pub north: f64,
    pub east:  f64,
}

impl BBox {
    /// Inclusive containment test.
    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.south..=self.north).contains(&p.lat) && (self.west..=self.east).contains(&p.lon)
    }
}

// ── OSM data ──────────────────────────────────────────────────────────────────

/// An OSM node referenced by at least one road way.
#[derive(Debug, Clone, PartialEq)]
pub struct OsmNode {
    pub pos:     GeoPoint,
    /// Node-level `highway` tag (`traffic_signals`, `stop`, …), if any.
    pub highway:   Option<String>,
    /// Node `ref` tag, e.g. a motorway junction number.
    pub reference: Option<String>,
}

/// An OSM way with its ordered node references and tags.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OsmWay {
    pub id:   i64,
    pub refs: Vec<i64>,
    pub tags: BTreeMap<String, String>,
}

impl OsmWay {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Raw OSM elements returned by a provider.
#[derive(Debug, Clone, Default)]
pub struct OsmData {
    pub nodes: HashMap<i64, OsmNode>,
    pub ways:  Vec<OsmWay>,
}

impl OsmData {
    pub fn is_empty(&self) -> bool {
        self.ways.is_empty()
    }
}

// ── Provider trait ────────────────────────────────────────────────────────────

/// A provider of OSM road data.
///
/// Implementations block until the data is available or the provider
/// fails; there is no retry.  Any error is fatal for the run.
pub trait NetworkSource {
    /// Human-readable provider description for log output.
    fn describe(&self) -> String;

    /// Fetch the ways matching `query.network_type` around `query.center`.
    fn fetch(&self, query: &NetworkQuery) -> SpatialResult<OsmData>;
}
