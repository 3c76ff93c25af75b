//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph is a directed multigraph stored as parallel per-node and
//! per-edge `Vec`s.  Edges are sorted by `(from, to)`; parallel edges
//! between the same pair are numbered by `edge_key` in insertion order
//! (0, 1, …).
//!
//! # Coordinates
//!
//! Node coordinates and edge geometries are stored in the network's
//! [`Crs`]: `(lon, lat)` degrees for WGS84, `(easting, northing)` metres
//! for UTM.  [`RoadNetwork::to_crs`] returns a reprojected copy.  Edge
//! lengths are great-circle metres fixed at construction and do not change
//! with the CRS.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over node coordinates answers nearest-node
//! queries.  It is bulk-loaded once per build and once per reprojection.

use std::collections::{BTreeMap, HashMap, HashSet};

use geo::{Coord, LineString};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use ps_core::{Crs, GeoPoint, NodeId, UtmZone};

use crate::{SpatialError, SpatialResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a 2-D `[x, y]` point with its `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in CRS units.  Only meaningful as metres
    /// once the network is projected.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

fn build_index(coords: &[Coord<f64>]) -> RTree<NodeEntry> {
    let entries: Vec<NodeEntry> = coords
        .iter()
        .enumerate()
        .map(|(i, c)| NodeEntry { point: [c.x, c.y], id: NodeId(i as u32) })
        .collect();
    RTree::bulk_load(entries)
}

// ── Edge attributes ───────────────────────────────────────────────────────────

/// Way tags copied onto edges besides the ones [`EdgeTags`] names.
pub const WAY_ATTRIBUTE_TAGS: &[&str] = &[
    "ref", "lanes", "bridge", "tunnel", "junction", "access", "service", "width", "est_width",
    "area", "landuse",
];

/// OSM attributes of an edge.
///
/// An edge produced by simplification spans several OSM segments, possibly
/// from several ways, so the string tags are de-duplicated lists in
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeTags {
    pub way_ids:  Vec<i64>,
    pub highway:  Vec<String>,
    pub name:     Vec<String>,
    pub maxspeed: Vec<String>,
    /// Values of the [`WAY_ATTRIBUTE_TAGS`] present on the source ways.
    pub other:    BTreeMap<String, Vec<String>>,
    pub oneway:   bool,
    /// `true` for the reverse direction of a two-way street.
    pub reversed: bool,
}

impl EdgeTags {
    /// The highway class used for speed imputation (first value).
    pub fn primary_highway(&self) -> Option<&str> {
        self.highway.first().map(String::as_str)
    }

    /// Fold another segment's tags into these.  `oneway` and `reversed`
    /// keep the first segment's value.
    pub(crate) fn absorb(&mut self, other: &EdgeTags) {
        fn push_unique<T: PartialEq + Clone>(into: &mut Vec<T>, from: &[T]) {
            for v in from {
                if !into.contains(v) {
                    into.push(v.clone());
                }
            }
        }
        push_unique(&mut self.way_ids, &other.way_ids);
        push_unique(&mut self.highway, &other.highway);
        push_unique(&mut self.name, &other.name);
        push_unique(&mut self.maxspeed, &other.maxspeed);
        for (key, values) in &other.other {
            push_unique(self.other.entry(key.clone()).or_default(), values);
        }
    }
}

/// Everything needed to add one directed edge.
#[derive(Debug, Clone)]
pub struct EdgeSpec {
    /// Great-circle length in metres.
    pub length_m: f64,
    /// Polyline from the source node to the target node, in the builder's CRS.
    pub geometry: LineString<f64>,
    pub tags:     EdgeTags,
}

impl EdgeSpec {
    /// Same edge traversed in the opposite direction.
    fn reversed(&self) -> EdgeSpec {
        let mut coords = self.geometry.0.clone();
        coords.reverse();
        let mut tags = self.tags.clone();
        tags.reversed = true;
        EdgeSpec { length_m: self.length_m, geometry: LineString::new(coords), tags }
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road multigraph plus a spatial index for snapping.
///
/// All fields are `pub` for direct indexed access.  Do not construct
/// directly; use [`RoadNetworkBuilder`] or [`crate::build_graph`].
#[derive(Clone)]
pub struct RoadNetwork {
    /// CRS of `node_coord` and `edge_geometry`.
    pub crs: Crs,

    // ── Node data (indexed by NodeId) ─────────────────────────────────────
    pub node_osm_id:       Vec<i64>,
    pub node_coord:        Vec<Coord<f64>>,
    /// Node-level OSM `highway` tag (`traffic_signals`, …).
    pub node_highway:      Vec<Option<String>>,
    /// Node-level OSM `ref` tag.
    pub node_ref:          Vec<Option<String>>,
    /// Number of physical streets meeting at the node; a two-way street
    /// counts once and a self-loop twice.
    pub node_street_count: Vec<u32>,

    // ── Edge data (indexed by edge position) ──────────────────────────────
    pub edge_from:     Vec<NodeId>,
    pub edge_to:       Vec<NodeId>,
    /// Parallel-edge index among edges with the same `(from, to)`.
    pub edge_key:      Vec<u32>,
    pub edge_length_m: Vec<f64>,
    pub edge_geometry: Vec<LineString<f64>>,
    pub edge_tags:     Vec<EdgeTags>,

    /// Set by [`crate::add_edge_speeds`].
    pub edge_speed_kph:     Option<Vec<f64>>,
    /// Set by [`crate::add_edge_travel_times`]; seconds.
    pub edge_travel_time_s: Option<Vec<f64>>,

    // ── Lookup structures ─────────────────────────────────────────────────
    spatial_idx: RTree<NodeEntry>,
    osm_index:   HashMap<i64, NodeId>,
}

impl RoadNetwork {
    /// A network with no nodes or edges.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_coord.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_coord.is_empty()
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    /// Dense id of the node with OSM id `osm_id`.
    pub fn node_by_osm_id(&self, osm_id: i64) -> Option<NodeId> {
        self.osm_index.get(&osm_id).copied()
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest node to `c` (in the network CRS) and its distance.
    ///
    /// Returns `None` only if the network has no nodes.
    pub fn nearest_node(&self, c: Coord<f64>) -> Option<(NodeId, f64)> {
        let q = [c.x, c.y];
        self.spatial_idx
            .nearest_neighbor(&q)
            .map(|e| (e.id, e.distance_2(&q).sqrt()))
    }

    /// One nearest node per query coordinate, in query order.
    ///
    /// # Errors
    ///
    /// [`SpatialError::EmptyNetwork`] if there is nothing to snap to.
    pub fn nearest_nodes(&self, coords: &[Coord<f64>]) -> SpatialResult<Vec<(NodeId, f64)>> {
        if self.is_empty() {
            return Err(SpatialError::EmptyNetwork("cannot snap to a network without nodes".into()));
        }
        coords
            .iter()
            .map(|&c| {
                self.nearest_node(c).ok_or_else(|| {
                    SpatialError::EmptyNetwork("spatial index returned no neighbour".into())
                })
            })
            .collect()
    }

    // ── Reprojection ──────────────────────────────────────────────────────

    /// Mean node position in WGS84, or `None` for an empty network.
    pub fn geographic_center(&self) -> SpatialResult<Option<GeoPoint>> {
        let to_geo = self.crs.transformer(Crs::Wgs84)?;
        let points = self
            .node_coord
            .iter()
            .map(|&c| to_geo.transform(c).map(GeoPoint::from_coord))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GeoPoint::mean(points))
    }

    /// A copy of the network with every coordinate transformed into `to`.
    pub fn to_crs(&self, to: Crs) -> SpatialResult<RoadNetwork> {
        let t = self.crs.transformer(to)?;
        let node_coord = self
            .node_coord
            .iter()
            .map(|&c| t.transform(c))
            .collect::<Result<Vec<_>, _>>()?;
        let edge_geometry = self
            .edge_geometry
            .iter()
            .map(|line| {
                line.0
                    .iter()
                    .map(|&c| t.transform(c))
                    .collect::<Result<Vec<_>, _>>()
                    .map(LineString::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RoadNetwork {
            crs: to,
            spatial_idx: build_index(&node_coord),
            node_coord,
            edge_geometry,
            ..self.clone()
        })
    }

    /// Project into the UTM zone of the network's mean position.
    pub fn project_to_utm(&self) -> SpatialResult<RoadNetwork> {
        let center = self
            .geographic_center()?
            .ok_or_else(|| SpatialError::EmptyNetwork("cannot project a network without nodes".into()))?;
        self.to_crs(Crs::Utm(UtmZone::containing(center)?))
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use geo::{Coord, LineString};
/// use ps_spatial::{EdgeSpec, EdgeTags, RoadNetworkBuilder};
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(1, Coord { x: -74.0060, y: 40.7128 }, None);
/// let c = b.add_node(2, Coord { x: -74.0062, y: 40.7130 }, None);
/// let geometry = LineString::new(vec![b.node_coord(a), b.node_coord(c)]);
/// b.add_road(a, c, EdgeSpec { length_m: 27.5, geometry, tags: EdgeTags::default() });
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct RoadNetworkBuilder {
    crs:       Crs,
    nodes:     Vec<RawNode>,
    raw_edges: Vec<RawEdge>,
}

struct RawNode {
    osm_id:    i64,
    coord:     Coord<f64>,
    highway:   Option<String>,
    reference: Option<String>,
}

struct RawEdge {
    from: NodeId,
    to:   NodeId,
    spec: EdgeSpec,
}

impl RoadNetworkBuilder {
    /// Builder for a WGS84 network.
    pub fn new() -> Self {
        Self::with_crs(Crs::Wgs84)
    }

    pub fn with_crs(crs: Crs) -> Self {
        Self { crs, nodes: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            crs:       Crs::Wgs84,
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, osm_id: i64, coord: Coord<f64>, highway: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(RawNode { osm_id, coord, highway, reference: None });
        id
    }

    /// Attach the OSM `ref` tag of node `id`.
    pub fn set_node_ref(&mut self, id: NodeId, reference: String) {
        self.nodes[id.index()].reference = Some(reference);
    }

    /// Add a **directed** edge from `from` to `to`.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, spec: EdgeSpec) {
        self.raw_edges.push(RawEdge { from, to, spec });
    }

    /// Add edges in **both directions**; the return edge gets the reversed
    /// geometry and `reversed = true`.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, spec: EdgeSpec) {
        let back = spec.reversed();
        self.add_directed_edge(a, b, spec);
        self.add_directed_edge(b, a, back);
    }

    pub fn node_coord(&self, id: NodeId) -> Coord<f64> {
        self.nodes[id.index()].coord
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// Time complexity: O(E log E) for the edge sort + O(N log N) for the
    /// R-tree bulk load.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Stable sort keeps insertion order among parallel edges.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| (e.from.0, e.to.0));

        // Parallel-edge keys.
        let mut edge_key = Vec::with_capacity(edge_count);
        for (i, e) in raw.iter().enumerate() {
            let key = match i.checked_sub(1).map(|p| &raw[p]) {
                Some(prev) if prev.from == e.from && prev.to == e.to => edge_key[i - 1] + 1,
                _ => 0,
            };
            edge_key.push(key);
        }

        // Street count over the undirected view: (u, v, key) and (v, u, key)
        // are one street.
        let mut node_street_count = vec![0u32; node_count];
        let mut streets: HashSet<(u32, u32, u32)> = HashSet::with_capacity(edge_count);
        for (e, &key) in raw.iter().zip(&edge_key) {
            let (a, b) = (e.from.0.min(e.to.0), e.from.0.max(e.to.0));
            if streets.insert((a, b, key)) {
                node_street_count[a as usize] += 1;
                node_street_count[b as usize] += 1;
            }
        }

        let mut edge_from     = Vec::with_capacity(edge_count);
        let mut edge_to       = Vec::with_capacity(edge_count);
        let mut edge_length_m = Vec::with_capacity(edge_count);
        let mut edge_geometry = Vec::with_capacity(edge_count);
        let mut edge_tags     = Vec::with_capacity(edge_count);
        for e in raw {
            edge_from.push(e.from);
            edge_to.push(e.to);
            edge_length_m.push(e.spec.length_m);
            edge_geometry.push(e.spec.geometry);
            edge_tags.push(e.spec.tags);
        }

        let mut node_osm_id  = Vec::with_capacity(node_count);
        let mut node_coord   = Vec::with_capacity(node_count);
        let mut node_highway = Vec::with_capacity(node_count);
        let mut node_ref     = Vec::with_capacity(node_count);
        let mut osm_index    = HashMap::with_capacity(node_count);
        for (i, n) in self.nodes.into_iter().enumerate() {
            osm_index.insert(n.osm_id, NodeId(i as u32));
            node_osm_id.push(n.osm_id);
            node_coord.push(n.coord);
            node_highway.push(n.highway);
            node_ref.push(n.reference);
        }

        RoadNetwork {
            crs: self.crs,
            spatial_idx: build_index(&node_coord),
            node_osm_id,
            node_coord,
            node_highway,
            node_ref,
            node_street_count,
            edge_from,
            edge_to,
            edge_key,
            edge_length_m,
            edge_geometry,
            edge_tags,
            edge_speed_kph: None,
            edge_travel_time_s: None,
            osm_index,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
