//! Graph construction from raw OSM data.
//!
//! # Pipeline
//!
//! ```text
//! OsmData ─► segments ─► truncate to bbox ─► simplify ─► largest component ─► RoadNetwork
//! ```
//!
//! 1. **Segments.**  Each admitted way becomes one directed edge per pair of
//!    consecutive nodes.  Two-way ways also get the reverse edge with
//!    `reversed = true`.  `oneway=-1` ways are walked backwards.
//! 2. **Truncate.**  Nodes outside the query bbox are removed along with
//!    their edges.
//! 3. **Simplify.**  Interior nodes of a chain (exactly two distinct
//!    neighbours, total degree 2 or 4, no self-loop) are removed and the
//!    chain's segments are merged into one edge whose geometry keeps every
//!    intermediate point.
//! 4. **Largest component.**  Only the largest weakly (or, optionally,
//!    strongly) connected component is kept.
//!
//! The result is in WGS84 with great-circle edge lengths.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use geo::{Haversine, Length, LineString};
use log::{debug, info};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;

use crate::network::{EdgeSpec, EdgeTags, RoadNetwork, RoadNetworkBuilder, WAY_ATTRIBUTE_TAGS};
use crate::source::{NetworkQuery, NetworkSource, OsmData, OsmWay};
use crate::{SpatialError, SpatialResult};

/// Knobs for [`build_graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphOptions {
    /// Keep the largest strongly connected component instead of the
    /// largest weakly connected one.
    pub strongly_connected: bool,
    /// Merge chain nodes into single edges.
    pub simplify: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self { strongly_connected: false, simplify: true }
    }
}

/// Fetch raw data from `source` and build the network.
///
/// # Errors
///
/// Any provider error, or [`SpatialError::EmptyNetwork`] when nothing
/// drivable is found around the query centre.
pub fn fetch_network(
    source: &dyn NetworkSource,
    query: &NetworkQuery,
    options: GraphOptions,
) -> SpatialResult<RoadNetwork> {
    info!(
        "fetching {:?} network within {} m of {} from {}",
        query.network_type,
        query.radius_m,
        query.center,
        source.describe()
    );
    let data = source.fetch(query)?;
    if data.is_empty() {
        return Err(SpatialError::EmptyNetwork(format!(
            "no drivable ways within {} m of {}",
            query.radius_m, query.center
        )));
    }
    info!("received {} ways referencing {} nodes", data.ways.len(), data.nodes.len());
    build_graph(&data, query, options)
}

/// Build a [`RoadNetwork`] from raw OSM elements.
pub fn build_graph(
    data: &OsmData,
    query: &NetworkQuery,
    options: GraphOptions,
) -> SpatialResult<RoadNetwork> {
    let mut g = SegmentGraph::from_ways(data, query);
    debug!("unsimplified graph: {} nodes, {} edges", g.node_count(), g.edges.len());

    let bbox = query.bbox();
    g.retain_nodes(|id| data.nodes.get(&id).is_some_and(|n| bbox.contains(n.pos)));
    debug!("truncated to bbox: {} nodes, {} edges", g.node_count(), g.edges.len());

    if options.simplify {
        g = g.simplified();
        debug!("simplified: {} nodes, {} edges", g.node_count(), g.edges.len());
    }

    let keep = g.largest_component(options.strongly_connected);
    g.retain_nodes(|id| keep.contains(&id));

    if g.edges.is_empty() {
        return Err(SpatialError::EmptyNetwork(format!(
            "no connected road network within {} m of {}",
            query.radius_m, query.center
        )));
    }

    let net = g.into_network(data);
    info!("road network: {} nodes, {} edges", net.node_count(), net.edge_count());
    Ok(net)
}

// ── One-way interpretation ────────────────────────────────────────────────────

const ONEWAY_VALUES: &[&str] = &["yes", "true", "1", "-1", "reverse", "T", "F"];
const REVERSED_VALUES: &[&str] = &["-1", "reverse", "T"];

/// `(oneway, walk_backwards)` for a way.
fn oneway_of(way: &OsmWay) -> (bool, bool) {
    if let Some(v) = way.tag("oneway") {
        if ONEWAY_VALUES.contains(&v) {
            return (true, REVERSED_VALUES.contains(&v));
        }
    }
    (way.tag("junction") == Some("roundabout"), false)
}

fn tags_of(way: &OsmWay, oneway: bool) -> EdgeTags {
    let single = |k: &str| way.tag(k).map(|v| vec![v.to_owned()]).unwrap_or_default();
    EdgeTags {
        way_ids:  vec![way.id],
        highway:  single("highway"),
        name:     single("name"),
        maxspeed: single("maxspeed"),
        other:    WAY_ATTRIBUTE_TAGS
            .iter()
            .filter_map(|&k| way.tag(k).map(|v| (k.to_owned(), vec![v.to_owned()])))
            .collect(),
        oneway,
        reversed: false,
    }
}

// ── Intermediate graph keyed by OSM id ────────────────────────────────────────

/// A directed edge through `path` (OSM node ids, at least two).
#[derive(Debug, Clone)]
struct Segment {
    path: Vec<i64>,
    tags: EdgeTags,
}

impl Segment {
    fn from(&self) -> i64 {
        self.path[0]
    }

    fn to(&self) -> i64 {
        self.path[self.path.len() - 1]
    }
}

#[derive(Default)]
struct SegmentGraph {
    edges: Vec<Segment>,
}

impl SegmentGraph {
    fn from_ways(data: &OsmData, query: &NetworkQuery) -> Self {
        let mut edges = Vec::new();
        let mut skipped = 0usize;
        for way in &data.ways {
            if !query.network_type.admits(&way.tags) {
                skipped += 1;
                continue;
            }
            let (oneway, backwards) = oneway_of(way);
            let mut refs: Vec<i64> =
                way.refs.iter().copied().filter(|r| data.nodes.contains_key(r)).collect();
            refs.dedup();
            if backwards {
                refs.reverse();
            }
            let tags = tags_of(way, oneway);
            for pair in refs.windows(2) {
                edges.push(Segment { path: pair.to_vec(), tags: tags.clone() });
                if !oneway {
                    let mut back = tags.clone();
                    back.reversed = true;
                    edges.push(Segment { path: vec![pair[1], pair[0]], tags: back });
                }
            }
        }
        if skipped > 0 {
            debug!("ignored {skipped} ways outside the network filter");
        }
        Self { edges }
    }

    fn nodes(&self) -> BTreeSet<i64> {
        self.edges.iter().flat_map(|e| [e.from(), e.to()]).collect()
    }

    fn node_count(&self) -> usize {
        self.nodes().len()
    }

    /// Drop every edge with an endpoint failing `keep`.
    fn retain_nodes(&mut self, mut keep: impl FnMut(i64) -> bool) {
        self.edges.retain(|e| keep(e.from()) && keep(e.to()));
    }

    fn simplified(self) -> SegmentGraph {
        let mut succ: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        let mut pred: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        let mut first_edge: HashMap<(i64, i64), usize> = HashMap::new();
        for (i, e) in self.edges.iter().enumerate() {
            succ.entry(e.from()).or_default().push(e.to());
            pred.entry(e.to()).or_default().push(e.from());
            first_edge.entry((e.from(), e.to())).or_insert(i);
        }
        let successors = |n: i64| succ.get(&n).map(Vec::as_slice).unwrap_or(&[]);
        let predecessors = |n: i64| pred.get(&n).map(Vec::as_slice).unwrap_or(&[]);

        let is_endpoint = |n: i64| {
            let (s, p) = (successors(n), predecessors(n));
            let neighbours: BTreeSet<i64> = s.iter().chain(p).copied().collect();
            let degree = s.len() + p.len();
            neighbours.contains(&n)
                || s.is_empty()
                || p.is_empty()
                || neighbours.len() != 2
                || !(degree == 2 || degree == 4)
        };

        let all_nodes = self.nodes();
        let endpoints: BTreeSet<i64> = all_nodes.iter().copied().filter(|&n| is_endpoint(n)).collect();

        let mut paths: Vec<Vec<i64>> = Vec::new();
        for &start in &endpoints {
            let distinct: BTreeSet<i64> = successors(start).iter().copied().collect();
            for next in distinct {
                if endpoints.contains(&next) {
                    continue;
                }
                let mut path = vec![start, next];
                let mut current = next;
                while !endpoints.contains(&current) {
                    let mut onward: Vec<i64> =
                        successors(current).iter().copied().filter(|n| !path.contains(n)).collect();
                    onward.sort_unstable();
                    onward.dedup();
                    match onward.as_slice() {
                        [only] => {
                            current = *only;
                            path.push(current);
                        }
                        [] => {
                            // Chain closes back on its start.
                            if successors(current).contains(&start) {
                                path.push(start);
                            }
                            break;
                        }
                        _ => break,
                    }
                }
                paths.push(path);
            }
        }

        let mut removed: BTreeSet<i64> = BTreeSet::new();
        let mut merged = Vec::with_capacity(paths.len());
        for path in paths {
            let mut tags: Option<EdgeTags> = None;
            for pair in path.windows(2) {
                let Some(&i) = first_edge.get(&(pair[0], pair[1])) else { continue };
                match tags.as_mut() {
                    Some(t) => t.absorb(&self.edges[i].tags),
                    None => tags = Some(self.edges[i].tags.clone()),
                }
            }
            let Some(tags) = tags else { continue };
            removed.extend(path[1..path.len() - 1].iter().copied());
            merged.push(Segment { path, tags });
        }
        debug!("simplification removed {} interior nodes", removed.len());

        let mut edges: Vec<Segment> = self
            .edges
            .into_iter()
            .filter(|e| !removed.contains(&e.from()) && !removed.contains(&e.to()))
            .collect();
        edges.extend(merged);
        SegmentGraph { edges }
    }

    /// Node set of the largest connected component.
    fn largest_component(&self, strongly: bool) -> BTreeSet<i64> {
        let nodes: Vec<i64> = self.nodes().into_iter().collect();
        let index: HashMap<i64, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let components: Vec<Vec<usize>> = if strongly {
            let mut g: DiGraph<(), ()> = DiGraph::with_capacity(nodes.len(), self.edges.len());
            for _ in &nodes {
                g.add_node(());
            }
            for e in &self.edges {
                g.add_edge(NodeIndex::new(index[&e.from()]), NodeIndex::new(index[&e.to()]), ());
            }
            tarjan_scc(&g)
                .into_iter()
                .map(|c| c.into_iter().map(NodeIndex::index).collect())
                .collect()
        } else {
            let mut uf = UnionFind::<usize>::new(nodes.len());
            for e in &self.edges {
                uf.union(index[&e.from()], index[&e.to()]);
            }
            let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for i in 0..nodes.len() {
                groups.entry(uf.find(i)).or_default().push(i);
            }
            groups.into_values().collect()
        };

        let count = components.len();
        let best = components
            .into_iter()
            .reduce(|best, c| if c.len() > best.len() { c } else { best })
            .unwrap_or_default();
        if count > 1 {
            debug!("kept largest of {count} components ({} nodes)", best.len());
        }
        best.into_iter().map(|i| nodes[i]).collect()
    }

    fn into_network(self, data: &OsmData) -> RoadNetwork {
        let nodes = self.nodes();
        let mut b = RoadNetworkBuilder::with_capacity(nodes.len(), self.edges.len());
        let mut ids = HashMap::with_capacity(nodes.len());
        for osm_id in nodes {
            // Every node that reaches this point passed the bbox check.
            if let Some(n) = data.nodes.get(&osm_id) {
                let id = b.add_node(osm_id, n.pos.to_coord(), n.highway.clone());
                if let Some(r) = &n.reference {
                    b.set_node_ref(id, r.clone());
                }
                ids.insert(osm_id, id);
            }
        }
        for seg in self.edges {
            let geometry: LineString<f64> = seg
                .path
                .iter()
                .filter_map(|id| data.nodes.get(id).map(|n| n.pos.to_coord()))
                .collect();
            let length_m = Haversine.length(&geometry);
            if let (Some(&from), Some(&to)) = (ids.get(&seg.from()), ids.get(&seg.to())) {
                b.add_directed_edge(from, to, EdgeSpec { length_m, geometry, tags: seg.tags });
            }
        }
        b.build()
    }
}
